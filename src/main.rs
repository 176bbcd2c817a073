use clap::Parser;
use form_loader::utils::{logger, validation::Validate};
use form_loader::{
    CliConfig, ConfigStore, FormConfig, FormSubmitter, LocalStorage, ScriptGateway, Session,
    SheetRow, SubmitOptions, SubmitPipeline, SubmitPolicy,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting form-loader");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 表單配置：啟動時讀一次，送單過程視為不可變
    let form_config: FormConfig = if cli.use_test_preset {
        tracing::info!("Using test-form preset");
        FormConfig::test_preset()
    } else {
        let store = ConfigStore::new(LocalStorage::new(cli.config_dir.clone()));
        match store.load().await {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("❌ Could not load configuration: {}", e);
                tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
                eprintln!("❌ {}", e.user_friendly_message());
                std::process::exit(1);
            }
        }
    };

    // 明確注入後端，不做執行期偵測
    let gateway = Arc::new(ScriptGateway::new(cli.script_url.clone()));

    let session = match Session::start(gateway.clone()).await {
        Ok(session) => session,
        Err(e) => {
            // 身份無法確認：整個工作階段作廢
            tracing::error!("❌ {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(3);
        }
    };

    tracing::info!(
        "📊 Ventas hoy: {} | Ventas mes: {} | SPH mes: {} | SPH hoy: {}",
        session.metrics.ventas_hoy,
        session.metrics.ventas_mes,
        session.metrics.sph_total,
        session.metrics.sph_hoy,
    );

    // 列來源：本機檔案優先，否則抓後端保存的列
    let rows: Vec<SheetRow> = match &cli.rows_file {
        Some(path) => {
            let content = tokio::fs::read_to_string(path).await?;
            let rows: Vec<SheetRow> = serde_json::from_str(&content)?;
            tracing::info!("Loaded {} rows from {}", rows.len(), path);
            rows
        }
        None => session.load_rows().await,
    };

    let submitter = FormSubmitter::new(cli.debug_mode);
    let pipeline = SubmitPipeline::new(submitter, gateway);

    let options = SubmitOptions {
        policy: match cli.watermark {
            Some(watermark) => SubmitPolicy::NewRowsOnly { watermark },
            None => SubmitPolicy::AllRows,
        },
        persist_timeout: cli.persist_timeout_secs.map(Duration::from_secs),
    };

    match pipeline.run(&rows, &form_config, &session.user, &options).await {
        Ok(report) => {
            println!("{}", report.status_line());
        }
        Err(e) => {
            tracing::error!(
                "❌ Submission pass failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 依嚴重程度決定退出碼
            let exit_code = match e.severity() {
                form_loader::utils::error::ErrorSeverity::Low => 0,
                form_loader::utils::error::ErrorSeverity::Medium => 2,
                form_loader::utils::error::ErrorSeverity::High => 1,
                form_loader::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
