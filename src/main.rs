mod command;
mod coordinator;
mod error;
mod logging;
mod monitor;
mod overlay;

use std::process::ExitCode;

use crate::overlay::OverlayConfig;

fn main() -> ExitCode {
    logging::init(cfg!(debug_assertions));

    match run(OverlayConfig::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(windows)]
fn run(config: OverlayConfig) -> anyhow::Result<()> {
    coordinator::run(config)
}

#[cfg(not(windows))]
fn run(_config: OverlayConfig) -> anyhow::Result<()> {
    Err(error::OverlayError::Unsupported.into())
}
