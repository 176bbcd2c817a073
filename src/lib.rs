pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{InMemoryGateway, LocalStorage, ScriptGateway};
pub use config::{CliConfig, ConfigStore, FormConfig};
pub use core::pipeline::{SubmitOptions, SubmitPipeline};
pub use core::session::Session;
pub use core::submitter::FormSubmitter;
pub use domain::model::{
    PersistOutcome, SheetRow, SubmitPolicy, SubmitReport, UserInfo, UserMetrics,
};
pub use utils::error::{FillerError, Result};
