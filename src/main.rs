use clap::Parser;

use log::{error, info};
use std::process::ExitCode;

use convert_dataset::{convert_dataset, Args};

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize the logger
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    info!("Starting the conversion process...");

    match convert_dataset(&args.to_options()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to convert dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
