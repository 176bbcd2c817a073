pub mod pipeline;
pub mod session;
pub mod submitter;
pub mod validate;

pub use crate::domain::model::{
    PersistOutcome, SheetRow, SubmitPolicy, SubmitReport, UserInfo, UserMetrics,
};
pub use crate::domain::ports::{PersistenceGateway, RowSubmitter, Storage};
pub use crate::utils::error::Result;
