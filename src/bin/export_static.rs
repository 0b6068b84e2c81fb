use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use wacc_dashboard::export::{generate_static_data, DEFAULT_EXPORT_PATH};

#[derive(Parser)]
#[command(name = "export-static")]
#[command(about = "Generate the static dashboard JSON from the WACC spreadsheet", long_about = None)]
struct Cli {
    /// Directory containing the WACC spreadsheet
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Where to write the JSON document
    #[arg(long, env = "EXPORT_PATH", default_value = DEFAULT_EXPORT_PATH)]
    output: PathBuf,
}

fn main() -> ExitCode {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!(
        "Exporting {} to {}",
        cli.data_dir.display(),
        cli.output.display()
    );

    match generate_static_data(&cli.data_dir, &cli.output) {
        Ok(document) => {
            if document.yearly_data.is_none() {
                info!("Yearly data omitted: dates could not be parsed");
            }
            println!("Static data generated successfully!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Static export failed: {}", e);
            eprintln!("Error generating static data: {e}");
            ExitCode::FAILURE
        }
    }
}
