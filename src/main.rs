mod buffer;
mod capture;
mod cli;
mod config;
mod core;
mod domain;
mod error;
mod localize;
mod ocr;
mod pipeline;
mod session;
mod translate;
mod wayland;
mod widget;

use std::process::ExitCode;

use config::{Command, SessionConfig};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let command = SessionConfig::from_env().and_then(|c| c.with_args(std::env::args().skip(1)));
    let config = match command {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            cli::print_help();
            return ExitCode::SUCCESS;
        }
        Ok(Command::Version) => {
            cli::print_version();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("ERROR: {err}");
            eprintln!("Run with --help for usage.");
            return ExitCode::from(2);
        }
    };

    match ocr::check_engine() {
        Ok(version) => log::info!("Using {version}"),
        Err(err) => {
            log::debug!("Tesseract check failed: {err}");
            eprintln!("ERROR: Tesseract is either not installed or cannot be reached.");
            eprintln!("Have you installed it and added the install directory to PATH?");
            return ExitCode::FAILURE;
        }
    }

    match ocr::installed_languages() {
        Ok(installed) => {
            for lang in ocr::missing_languages(&config.source_lang, &installed) {
                log::warn!("Tesseract language data for {lang:?} is not installed");
            }
        }
        Err(err) => log::warn!("Could not list tesseract languages: {err}"),
    }

    let wayland_helper = match wayland_client::Connection::connect_to_env()
        .map_err(anyhow::Error::from)
        .and_then(wayland::WaylandHelper::new)
    {
        Ok(helper) => helper,
        Err(err) => {
            log::error!("Failed to connect to the Wayland display: {err:#}");
            eprintln!("ERROR: Unable to connect to the Wayland display: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    localize::localize();
    log::info!(
        "Translating {} -> {} with {:?}",
        config.source_lang,
        config.target_lang,
        config.translator
    );

    match core::app::run(core::app::Flags {
        config,
        wayland_helper,
    }) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Application error: {err}");
            ExitCode::FAILURE
        }
    }
}
