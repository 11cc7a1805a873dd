//! Kibitzer CLI entry point.

use clap::Parser;

use kibitzer::cli::{handle_error, Cli, Commands};
use kibitzer::infrastructure::config::ConfigLoader;
use kibitzer::infrastructure::logging::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(err) => handle_error(&err, cli.json),
    };

    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(err) => handle_error(&err, cli.json),
    };

    let result = match cli.command {
        Commands::Review(args) => {
            kibitzer::cli::commands::review::execute(args, &config, cli.json).await
        }
        Commands::Status(args) => {
            kibitzer::cli::commands::status::execute(args, &config, cli.json).await
        }
    };

    if let Err(err) = result {
        handle_error(&err, cli.json);
    }
}
