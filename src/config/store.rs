use crate::config::form::FormConfig;
use crate::domain::ports::Storage;
use crate::utils::error::{FillerError, Result};
use crate::utils::validation::Validate;

/// 持久化配置的固定鍵（沿用前端 localStorage 的鍵名）
pub const CONFIG_KEY: &str = "fillerAppConfig.toml";

/// Persisted user configuration over a [`Storage`] backend. Read once at
/// startup, written only on an explicit save action.
pub struct ConfigStore<S: Storage> {
    storage: S,
}

impl<S: Storage> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// 載入自訂配置；鍵不存在時退回預設 preset
    pub async fn load(&self) -> Result<FormConfig> {
        let bytes = match self.storage.read_file(CONFIG_KEY).await {
            Ok(bytes) => bytes,
            Err(FillerError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No saved configuration, using default preset");
                return Ok(FormConfig::default_preset());
            }
            Err(e) => return Err(e),
        };

        let content = String::from_utf8(bytes).map_err(|e| FillerError::ConfigError {
            message: format!("Configuration is not valid UTF-8: {}", e),
        })?;

        let config = from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 明確的保存動作；先驗證再寫入
    pub async fn save(&self, config: &FormConfig) -> Result<()> {
        config.validate()?;

        let content = toml::to_string_pretty(config).map_err(|e| FillerError::ConfigError {
            message: format!("Could not serialize configuration: {}", e),
        })?;

        self.storage.write_file(CONFIG_KEY, content.as_bytes()).await?;
        tracing::info!("Configuration saved under '{}'", CONFIG_KEY);
        Ok(())
    }
}

/// 解析 TOML 字串，先做環境變數替換
pub fn from_toml_str(content: &str) -> Result<FormConfig> {
    let processed_content = substitute_env_vars(content);

    toml::from_str(&processed_content).map_err(|e| FillerError::ConfigError {
        message: format!("TOML parsing error: {}", e),
    })
}

/// 替換環境變數（例如 ${FORM_URL}）；未定義時保留原樣
fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}
