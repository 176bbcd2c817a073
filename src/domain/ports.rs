use crate::config::form::FormConfig;
use crate::domain::model::{SheetRow, UserInfo, UserMetrics};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Remote script backend: identity, metrics and row storage. One round trip
/// per call, no batching.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn get_user_info(&self) -> Result<UserInfo>;
    async fn get_user_metrics(&self, email: &str) -> Result<UserMetrics>;
    async fn load_data(&self, email: &str) -> Result<Vec<SheetRow>>;
    async fn save_data(&self, rows: &[SheetRow], email: &str) -> Result<usize>;
}

// 讓 Session 與 Pipeline 能共用同一個 gateway 實例
#[async_trait]
impl<G: PersistenceGateway + ?Sized> PersistenceGateway for std::sync::Arc<G> {
    async fn get_user_info(&self) -> Result<UserInfo> {
        (**self).get_user_info().await
    }

    async fn get_user_metrics(&self, email: &str) -> Result<UserMetrics> {
        (**self).get_user_metrics(email).await
    }

    async fn load_data(&self, email: &str) -> Result<Vec<SheetRow>> {
        (**self).load_data(email).await
    }

    async fn save_data(&self, rows: &[SheetRow], email: &str) -> Result<usize> {
        (**self).save_data(rows, email).await
    }
}

/// Delivers one encoded row to the form endpoint. Fire-and-forget: Ok means
/// the submission was dispatched, not that the endpoint accepted it.
#[async_trait]
pub trait RowSubmitter: Send + Sync {
    async fn submit_row(&self, row: &SheetRow, config: &FormConfig) -> Result<()>;
}
