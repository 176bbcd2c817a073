use crate::domain::model::{SheetRow, UserInfo, UserMetrics};
use crate::domain::ports::PersistenceGateway;
use crate::utils::error::{FillerError, Result};

/// Startup state for one user session: resolved identity plus dashboard
/// metrics. Identity failure is fatal; a metrics failure just zeroes the
/// dashboard.
#[derive(Debug)]
pub struct Session<G: PersistenceGateway> {
    gateway: G,
    pub user: UserInfo,
    pub metrics: UserMetrics,
}

impl<G: PersistenceGateway> Session<G> {
    pub async fn start(gateway: G) -> Result<Self> {
        let user = gateway
            .get_user_info()
            .await
            .map_err(|e| FillerError::IdentityError {
                message: e.to_string(),
            })?;

        if user.email.trim().is_empty() {
            return Err(FillerError::IdentityError {
                message: "backend returned no email address".to_string(),
            });
        }
        tracing::info!("Signed in as {} <{}>", user.name, user.email);

        // 指標算不出來不擋人，歸零繼續
        let metrics = match gateway.get_user_metrics(&user.email).await {
            Ok(metrics) => metrics,
            Err(e) => {
                tracing::warn!("Could not compute metrics, showing zeros: {}", e);
                UserMetrics::default()
            }
        };

        Ok(Self {
            gateway,
            user,
            metrics,
        })
    }

    /// 載入先前保存的列；後端沒資料或掛了就退回一張模板列
    pub async fn load_rows(&self) -> Vec<SheetRow> {
        match self.gateway.load_data(&self.user.email).await {
            Ok(rows) if !rows.is_empty() => {
                tracing::info!("✅ Loaded {} saved rows", rows.len());
                rows
            }
            Ok(_) => {
                tracing::info!("No saved rows, starting with a fresh template row");
                vec![SheetRow::template()]
            }
            Err(e) => {
                tracing::warn!("❌ Could not load saved rows, using template: {}", e);
                vec![SheetRow::template()]
            }
        }
    }
}
