use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_positive_number, validate_url, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "form-loader")]
#[command(about = "Submits sheet rows to an external form endpoint and saves them via the script backend")]
pub struct CliConfig {
    /// Script backend exec URL (identity, metrics, row storage)
    #[arg(long)]
    pub script_url: String,

    /// Directory holding the persisted configuration key
    #[arg(long, default_value = ".")]
    pub config_dir: String,

    /// Load rows from a local JSON file instead of the backend
    #[arg(long)]
    pub rows_file: Option<String>,

    /// Use the test-form preset instead of the saved configuration
    #[arg(long)]
    pub use_test_preset: bool,

    /// Only transport rows past this watermark (earlier rows were already
    /// saved in a previous pass); the full set is still persisted
    #[arg(long)]
    pub watermark: Option<usize>,

    /// Abort the persistence call after this many seconds
    #[arg(long)]
    pub persist_timeout_secs: Option<u64>,

    /// Keep the submission channel around longer and log full payloads
    #[arg(long)]
    pub debug_mode: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("script_url", &self.script_url)?;
        validate_path("config_dir", &self.config_dir)?;

        if let Some(rows_file) = &self.rows_file {
            validate_path("rows_file", rows_file)?;
        }
        if let Some(secs) = self.persist_timeout_secs {
            validate_positive_number("persist_timeout_secs", secs as usize, 1)?;
        }

        Ok(())
    }
}
