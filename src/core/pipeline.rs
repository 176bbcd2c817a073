use crate::config::form::FormConfig;
use crate::core::validate::is_row_submittable;
use crate::domain::model::{PersistOutcome, SheetRow, SubmitPolicy, SubmitReport, UserInfo};
use crate::domain::ports::{PersistenceGateway, RowSubmitter};
use crate::utils::error::{FillerError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    pub policy: SubmitPolicy,
    /// 保存呼叫的逾時上限；None 表示等到天荒地老（與原始行為一致）
    pub persist_timeout: Option<Duration>,
}

/// One submission pass: validate → transport (strictly sequential, display
/// order) → bulk persist → aggregate report. Transport failures never abort
/// the pass; persistence always runs over the full valid set.
pub struct SubmitPipeline<S: RowSubmitter, G: PersistenceGateway> {
    submitter: S,
    gateway: G,
    in_flight: AtomicBool,
}

/// 確保 in_flight 在任何離開路徑都會歸位
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: RowSubmitter, G: PersistenceGateway> SubmitPipeline<S, G> {
    pub fn new(submitter: S, gateway: G) -> Self {
        Self {
            submitter,
            gateway,
            in_flight: AtomicBool::new(false),
        }
    }

    /// 是否有一輪正在進行
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn run(
        &self,
        rows: &[SheetRow],
        config: &FormConfig,
        user: &UserInfo,
        options: &SubmitOptions,
    ) -> Result<SubmitReport> {
        // 重入防護：一輪沒跑完前拒絕第二輪，避免列序在途中被改
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FillerError::PipelineBusy);
        }
        let _guard = RunGuard(&self.in_flight);

        // 進入循環前鎖定快照；之後只看快照
        let rows: Vec<SheetRow> = rows.to_vec();
        let config = config.clone();

        // --- Validating ---
        tracing::debug!("Validating {} rows", rows.len());
        let mut valid: Vec<(usize, SheetRow)> = Vec::new();
        let mut skipped_rows: Vec<usize> = Vec::new();

        for (index, row) in rows.into_iter().enumerate() {
            let position = index + 1;
            if is_row_submittable(&row) {
                valid.push((position, row));
            } else {
                tracing::warn!("Row {} failed validation, skipping transport", position);
                skipped_rows.push(position);
            }
        }

        // --- Submitting ---
        let mut attempted = 0usize;
        let mut submitted = 0usize;
        let mut failed_rows: Vec<usize> = Vec::new();

        for (position, row) in &valid {
            if let SubmitPolicy::NewRowsOnly { watermark } = options.policy {
                if *position <= watermark {
                    tracing::debug!("Row {} below watermark {}, not re-sent", position, watermark);
                    continue;
                }
            }

            attempted += 1;
            tracing::info!("⏳ Sending row {} of {}...", position, valid.len());

            // 嚴格逐列：上一列 resolve/reject 前不碰下一列
            match self.submitter.submit_row(row, &config).await {
                Ok(()) => submitted += 1,
                Err(e) => {
                    tracing::warn!("Row {} transport failed: {}", position, e);
                    failed_rows.push(*position);
                }
            }
        }

        // --- Persisting ---
        // 傳輸失敗不影響保存：有效列全部送去後端存檔
        let valid_rows: Vec<SheetRow> = valid.into_iter().map(|(_, row)| row).collect();
        tracing::info!("⏳ Saving {} rows...", valid_rows.len());

        let persistence = match options.persist_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.gateway.save_data(&valid_rows, &user.email))
                    .await
                {
                    Ok(outcome) => Self::persist_outcome(outcome),
                    Err(_) => {
                        let seconds = limit.as_secs();
                        tracing::error!(
                            "{}",
                            FillerError::PersistenceTimeout { seconds }
                        );
                        PersistOutcome::TimedOut { seconds }
                    }
                }
            }
            None => Self::persist_outcome(self.gateway.save_data(&valid_rows, &user.email).await),
        };

        // --- Done ---
        let report = SubmitReport {
            attempted,
            submitted,
            skipped_rows,
            failed_rows,
            persistence,
        };
        tracing::info!("{}", report.status_line());
        Ok(report)
    }

    fn persist_outcome(outcome: Result<usize>) -> PersistOutcome {
        match outcome {
            Ok(rows) => PersistOutcome::Saved { rows },
            Err(e) => {
                tracing::error!("Persistence failed: {}", e);
                PersistOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gateway::InMemoryGateway;
    use crate::domain::model::UserMetrics;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockSubmitter {
        calls: Arc<Mutex<Vec<String>>>,
        fail_dnis: Arc<HashSet<String>>,
        delay: Duration,
    }

    impl MockSubmitter {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_dnis: Arc::new(HashSet::new()),
                delay: Duration::from_millis(0),
            }
        }

        fn failing_for(mut self, dnis: &[&str]) -> Self {
            self.fail_dnis = Arc::new(dnis.iter().map(|s| s.to_string()).collect());
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        async fn submitted_dnis(&self) -> Vec<String> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl RowSubmitter for MockSubmitter {
        async fn submit_row(&self, row: &SheetRow, _config: &FormConfig) -> Result<()> {
            self.calls.lock().await.push(row.dni.clone());
            if self.delay > Duration::from_millis(0) {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail_dnis.contains(&row.dni) {
                return Err(FillerError::TransportError {
                    message: "forced failure".to_string(),
                });
            }
            Ok(())
        }
    }

    fn user() -> UserInfo {
        UserInfo {
            email: "rep@example.com".to_string(),
            name: "Rep".to_string(),
        }
    }

    fn row_with_dni(dni: &str) -> SheetRow {
        let mut row = SheetRow::template();
        row.year = "2024".to_string();
        row.month = "05".to_string();
        row.day = "10".to_string();
        row.producto = "Flow Flex".to_string();
        row.dni = dni.to_string();
        row
    }

    fn invalid_date_row() -> SheetRow {
        let mut row = row_with_dni("99999999");
        row.month = "2".to_string();
        row.day = "30".to_string();
        row
    }

    #[tokio::test]
    async fn test_rows_sent_in_display_order() {
        let submitter = MockSubmitter::new();
        let gateway = Arc::new(InMemoryGateway::new(user()));
        let pipeline = SubmitPipeline::new(submitter.clone(), gateway);

        let rows = vec![row_with_dni("1"), row_with_dni("2"), row_with_dni("3")];
        let report = pipeline
            .run(&rows, &FormConfig::test_preset(), &user(), &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(report.submitted, 3);
        assert_eq!(report.attempted, 3);
        assert_eq!(submitter.submitted_dnis().await, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_partial_transport_failure_still_persists_all_valid_rows() {
        let submitter = MockSubmitter::new().failing_for(&["2"]);
        let gateway = Arc::new(InMemoryGateway::new(user()));
        let pipeline = SubmitPipeline::new(submitter.clone(), gateway.clone());

        let rows = vec![row_with_dni("1"), row_with_dni("2"), row_with_dni("3")];
        let report = pipeline
            .run(&rows, &FormConfig::test_preset(), &user(), &SubmitOptions::default())
            .await
            .unwrap();

        // 第 2 列傳輸失敗：繼續送第 3 列，保存仍涵蓋全部有效列
        assert_eq!(report.attempted, 3);
        assert_eq!(report.submitted, 2);
        assert_eq!(report.failed_rows, vec![2]);
        assert_eq!(submitter.submitted_dnis().await, vec!["1", "2", "3"]);
        assert_eq!(gateway.stored_rows().await.len(), 3);
        assert_eq!(report.persistence, PersistOutcome::Saved { rows: 3 });
    }

    #[tokio::test]
    async fn test_invalid_rows_excluded_from_transport_and_persistence() {
        let submitter = MockSubmitter::new();
        let gateway = Arc::new(InMemoryGateway::new(user()));
        let pipeline = SubmitPipeline::new(submitter.clone(), gateway.clone());

        let rows = vec![invalid_date_row(), row_with_dni("2")];
        let report = pipeline
            .run(&rows, &FormConfig::test_preset(), &user(), &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(report.skipped_rows, vec![1]);
        assert_eq!(report.submitted, 1);
        assert_eq!(submitter.submitted_dnis().await, vec!["2"]);
        assert_eq!(gateway.stored_rows().await.len(), 1);
    }

    #[tokio::test]
    async fn test_all_invalid_rows_means_zero_transport_but_persistence_still_runs() {
        let submitter = MockSubmitter::new();
        let gateway = Arc::new(InMemoryGateway::new(user()).with_rows(vec![row_with_dni("old")]));
        let pipeline = SubmitPipeline::new(submitter.clone(), gateway.clone());

        let rows = vec![invalid_date_row()];
        let report = pipeline
            .run(&rows, &FormConfig::test_preset(), &user(), &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(report.attempted, 0);
        assert_eq!(report.submitted, 0);
        assert!(submitter.submitted_dnis().await.is_empty());
        // 空的有效集合仍會呼叫保存
        assert_eq!(report.persistence, PersistOutcome::Saved { rows: 0 });
        assert!(gateway.stored_rows().await.is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_reported_distinctly() {
        let submitter = MockSubmitter::new();
        let gateway = Arc::new(InMemoryGateway::new(user()).failing_save());
        let pipeline = SubmitPipeline::new(submitter, gateway);

        let rows = vec![row_with_dni("1")];
        let report = pipeline
            .run(&rows, &FormConfig::test_preset(), &user(), &SubmitOptions::default())
            .await
            .unwrap();

        // 傳輸全數成功，保存失敗要另外回報
        assert_eq!(report.submitted, 1);
        assert!(report.failed_rows.is_empty());
        assert!(matches!(report.persistence, PersistOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_watermark_skips_transport_but_not_persistence() {
        let submitter = MockSubmitter::new();
        let gateway = Arc::new(InMemoryGateway::new(user()));
        let pipeline = SubmitPipeline::new(submitter.clone(), gateway.clone());

        let rows = vec![row_with_dni("1"), row_with_dni("2"), row_with_dni("3")];
        let options = SubmitOptions {
            policy: SubmitPolicy::NewRowsOnly { watermark: 2 },
            persist_timeout: None,
        };
        let report = pipeline
            .run(&rows, &FormConfig::test_preset(), &user(), &options)
            .await
            .unwrap();

        // 前兩列上輪存過，只送第 3 列；保存照舊是全部
        assert_eq!(report.attempted, 1);
        assert_eq!(report.submitted, 1);
        assert_eq!(submitter.submitted_dnis().await, vec!["3"]);
        assert_eq!(gateway.stored_rows().await.len(), 3);
    }

    #[tokio::test]
    async fn test_reentry_rejected_while_run_in_flight() {
        let submitter = MockSubmitter::new().with_delay(Duration::from_millis(100));
        let gateway = Arc::new(InMemoryGateway::new(user()));
        let pipeline = Arc::new(SubmitPipeline::new(submitter.clone(), gateway));

        let rows = vec![row_with_dni("1"), row_with_dni("2")];
        let first = {
            let pipeline = pipeline.clone();
            let rows = rows.clone();
            tokio::spawn(async move {
                pipeline
                    .run(&rows, &FormConfig::test_preset(), &user(), &SubmitOptions::default())
                    .await
            })
        };

        // 等第一輪進入傳輸階段
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(pipeline.is_running());

        let second = pipeline
            .run(&rows, &FormConfig::test_preset(), &user(), &SubmitOptions::default())
            .await;
        assert!(matches!(second, Err(FillerError::PipelineBusy)));

        let report = first.await.unwrap().unwrap();
        assert_eq!(report.submitted, 2);
        // 第二輪完全沒碰 submitter：只有第一輪的兩列
        assert_eq!(submitter.submitted_dnis().await, vec!["1", "2"]);
        assert!(!pipeline.is_running());
    }

    #[tokio::test]
    async fn test_persistence_timeout_reported_as_timeout() {
        struct SlowGateway;

        #[async_trait]
        impl PersistenceGateway for SlowGateway {
            async fn get_user_info(&self) -> Result<UserInfo> {
                Ok(user())
            }
            async fn get_user_metrics(&self, _email: &str) -> Result<UserMetrics> {
                Ok(UserMetrics::default())
            }
            async fn load_data(&self, _email: &str) -> Result<Vec<SheetRow>> {
                Ok(Vec::new())
            }
            async fn save_data(&self, _rows: &[SheetRow], _email: &str) -> Result<usize> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(0)
            }
        }

        let pipeline = SubmitPipeline::new(MockSubmitter::new(), SlowGateway);
        let options = SubmitOptions {
            policy: SubmitPolicy::AllRows,
            persist_timeout: Some(Duration::from_millis(50)),
        };

        let rows = vec![row_with_dni("1")];
        let report = pipeline
            .run(&rows, &FormConfig::test_preset(), &user(), &options)
            .await
            .unwrap();

        assert_eq!(report.submitted, 1);
        assert_eq!(report.persistence, PersistOutcome::TimedOut { seconds: 0 });
    }
}
