pub mod cli;
pub mod form;
pub mod store;

pub use cli::CliConfig;
pub use form::FormConfig;
pub use store::ConfigStore;
