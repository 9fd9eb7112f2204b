use clap::Parser;
use imgsort::cli::{Args, run_cli};
use imgsort::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match run_cli(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("run aborted: {:?}", e);
            OutputFormatter::error(&format!("Error! {}", e));
            ExitCode::FAILURE
        }
    }
}
