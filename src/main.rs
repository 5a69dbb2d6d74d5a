use clap::Parser;
use rate_watch::cli::{Args, init_logging};
use rate_watch::driver;
use spdlog::prelude::*;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level);

    info!("[System] Booting rate-watch...");
    match driver::run(&args) {
        Ok(_) => {
            info!("[System] Done!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("[System] {}", e);
            ExitCode::FAILURE
        }
    }
}
