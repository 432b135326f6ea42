//! `dms` management CLI entry point.

use clap::Parser;

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match commands::load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };

    dms::telemetry::init_logging(&config.logging);

    if let Err(e) = cli.execute(config).await {
        output::print_error(&e.to_string());
        if e.details.len() > 1 {
            for detail in &e.details {
                eprintln!("  - {}", detail);
            }
        }
        std::process::exit(1);
    }
}
