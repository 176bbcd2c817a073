use crate::domain::model::{SheetRow, UserInfo, UserMetrics};
use crate::domain::ports::PersistenceGateway;
use crate::utils::error::{FillerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::Mutex;

/// HTTP client for the script-exec backend. Every operation is one POST of
/// `{ "function": name, "args": [...] }`, answered with a
/// `{ "result": ... }` or `{ "error": "..." }` envelope.
pub struct ScriptGateway {
    client: Client,
    exec_url: String,
}

impl ScriptGateway {
    pub fn new(exec_url: String) -> Self {
        Self {
            client: Client::new(),
            exec_url,
        }
    }

    async fn call(&self, function: &str, args: Vec<Value>) -> Result<Value> {
        tracing::debug!("Calling backend function '{}'", function);

        let response = self
            .client
            .post(&self.exec_url)
            .json(&json!({ "function": function, "args": args }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FillerError::GatewayError {
                call: function.to_string(),
                message: format!("backend returned HTTP {}", status),
            });
        }

        let envelope: Value = response.json().await?;

        // 後端把應用層錯誤放在 error 欄位，HTTP 層仍回 200
        if let Some(error) = envelope.get("error").and_then(|e| e.as_str()) {
            return Err(FillerError::GatewayError {
                call: function.to_string(),
                message: error.to_string(),
            });
        }

        Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl PersistenceGateway for ScriptGateway {
    async fn get_user_info(&self) -> Result<UserInfo> {
        let result = self.call("getUserInfo", vec![]).await?;
        let info: UserInfo = serde_json::from_value(result)?;
        Ok(info)
    }

    async fn get_user_metrics(&self, email: &str) -> Result<UserMetrics> {
        let result = self
            .call("getUserMetrics", vec![json!(email)])
            .await?;
        let metrics: UserMetrics = serde_json::from_value(result)?;
        Ok(metrics)
    }

    async fn load_data(&self, email: &str) -> Result<Vec<SheetRow>> {
        let result = self.call("loadData", vec![json!(email)]).await?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        let rows: Vec<SheetRow> = serde_json::from_value(result)?;
        Ok(rows)
    }

    async fn save_data(&self, rows: &[SheetRow], email: &str) -> Result<usize> {
        let result = self
            .call("saveData", vec![serde_json::to_value(rows)?, json!(email)])
            .await?;

        // 後端可能回 {"saved": n}、裸數字或 null；抓不到就用送出的列數
        let saved = result
            .get("saved")
            .and_then(|v| v.as_u64())
            .or_else(|| result.as_u64())
            .unwrap_or(rows.len() as u64);

        Ok(saved as usize)
    }
}

/// In-memory stand-in for the script backend, injected in tests and offline
/// runs instead of being presence-detected at runtime.
#[derive(Debug)]
pub struct InMemoryGateway {
    user: UserInfo,
    metrics: UserMetrics,
    rows: Mutex<Vec<SheetRow>>,
    fail_save: bool,
}

impl InMemoryGateway {
    pub fn new(user: UserInfo) -> Self {
        Self {
            user,
            metrics: UserMetrics::default(),
            rows: Mutex::new(Vec::new()),
            fail_save: false,
        }
    }

    pub fn with_rows(self, rows: Vec<SheetRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..self
        }
    }

    pub fn with_metrics(self, metrics: UserMetrics) -> Self {
        Self { metrics, ..self }
    }

    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    pub async fn stored_rows(&self) -> Vec<SheetRow> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn get_user_info(&self) -> Result<UserInfo> {
        Ok(self.user.clone())
    }

    async fn get_user_metrics(&self, _email: &str) -> Result<UserMetrics> {
        Ok(self.metrics.clone())
    }

    async fn load_data(&self, _email: &str) -> Result<Vec<SheetRow>> {
        Ok(self.rows.lock().await.clone())
    }

    async fn save_data(&self, rows: &[SheetRow], _email: &str) -> Result<usize> {
        if self.fail_save {
            return Err(FillerError::GatewayError {
                call: "saveData".to_string(),
                message: "simulated save failure".to_string(),
            });
        }
        let mut stored = self.rows.lock().await;
        *stored = rows.to_vec();
        Ok(stored.len())
    }
}
