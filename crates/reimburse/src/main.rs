use anyhow::Context;
use clap::Parser;
use reimburse::args::{Args, Command, ExportArgs, UpperArgs};
use reimburse::{
    ExportConfig, ExportError, Exporter, MemoryStore, PdftoppmRasterizer, SofficeConverter, UserId,
};
use std::process::ExitCode;
use template::Template;
use tracing::{debug, error, info, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Exit status for requests rejected because of caller input
const EXIT_USER_ERROR: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            let user_error = e
                .downcast_ref::<ExportError>()
                .map(ExportError::is_user_error)
                .unwrap_or(false);
            if user_error {
                ExitCode::from(EXIT_USER_ERROR)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn main_inner(args: Args) -> anyhow::Result<()> {
    trace!("{args:?}");
    let config = match args.common().config() {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::default(),
    };

    match args.command() {
        Command::Export(export_args) => export(config, export_args),
        Command::Upper(upper_args) => upper(upper_args),
    }
}

fn export(config: ExportConfig, args: &ExportArgs) -> anyhow::Result<()> {
    let store = MemoryStore::load(args.store())?;
    let template = Template::from_file(&config.template)
        .with_context(|| format!("loading template {}", config.template.display()))?;

    let exporter = Exporter::new(
        store,
        SofficeConverter::new(&config.soffice),
        PdftoppmRasterizer::new(&config.pdftoppm),
        template,
        config,
    )?;

    let today = args
        .date()
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let pdf = exporter.export(UserId(args.user()), args.ids(), today)?;

    let path = args.out().join(&pdf.filename);
    std::fs::write(&path, &pdf.bytes)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), sheets = pdf.sheets, "wrote {}", pdf.mime);
    println!("{}", path.display());
    Ok(())
}

fn upper(args: &UpperArgs) -> anyhow::Result<()> {
    let amount = rmb_text::parse_amount(args.amount())?;
    println!("{}", rmb_text::format_rmb_upper(amount));
    Ok(())
}

/// Initializes the tracing subscriber.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        // RUST_LOG wins when present
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
