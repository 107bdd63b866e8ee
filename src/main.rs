use anyhow::Context;
use bulk_scan::adapters::terminal::{render_table, ProgressBarHandler};
use bulk_scan::utils::error::ErrorSeverity;
use bulk_scan::utils::{logger, validation::Validate};
use bulk_scan::{
    CliArgs, HttpScanClient, InputFile, LocalStorage, LoggingHandler, ProgressHandler,
    ReportExporter, ScanEngine, ScanError, ScanRequest,
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting bulk-scan CLI");
    if args.verbose {
        tracing::debug!("CLI args: input={:?}, config={:?}", args.input, args.config);
    }

    // 載入並驗證配置
    let config = match args.resolve_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let input = match &args.input {
        Some(path) => {
            let contents = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read input file '{}'", path))?;
            Some(InputFile::new(path.clone(), contents))
        }
        None => None,
    };

    let client = match HttpScanClient::new(config.api.clone()) {
        Ok(client) => client,
        Err(e) => exit_with(&e),
    };

    let handler: Arc<dyn ProgressHandler> = if args.no_progress || args.json_logs {
        Arc::new(LoggingHandler)
    } else {
        Arc::new(ProgressBarHandler::new())
    };

    let engine = ScanEngine::new(client)
        .with_cooldown(config.cooldown())
        .with_progress_handler(handler);

    if let Some(input) = &input {
        engine.select_input(input);
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let exporter = ReportExporter::new(storage, config.output_path(), config.filename());

    let request = ScanRequest {
        credential: config.api.api_key.clone(),
        input,
    };

    match engine.run(request, &exporter).await {
        Ok((report, output_path)) => {
            println!("{}", render_table(&report.results));
            println!(
                "✅ Scanned {} records ({} submitted, {} failed, {} with metrics)",
                report.results.len(),
                report.succeeded(),
                report.failed(),
                report.enriched()
            );
            println!("📁 Report saved to: {}", output_path);
            tracing::info!(
                "Run finished in {}s",
                (report.finished_at - report.started_at).num_seconds()
            );
        }
        Err(e) => {
            if let ScanError::ExportError { report, .. } = &e {
                println!("{}", render_table(&report.results));
            }
            exit_with(&e)
        }
    }

    Ok(())
}

fn exit_with(e: &ScanError) -> ! {
    tracing::error!(
        "❌ Bulk scan failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
