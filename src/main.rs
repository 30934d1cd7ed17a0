// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Release | Modes | Options | Inis | Version
//! ```

use std::process::ExitCode;

use shelf_rs::cli::global::GlobalOptions;
use shelf_rs::cli::{self, Command};
use shelf_rs::cmd::config::{run_inis_command, run_options_command};
use shelf_rs::cmd::modes::run_modes_command;
use shelf_rs::cmd::release::run_release_command;
use shelf_rs::config::Config;
use shelf_rs::config::loader::ConfigLoader;
use shelf_rs::logging::{LogConfig, LogGuard, init_logging};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    if matches!(cli.command, Some(Command::Version)) {
        handle_version_command();
        return ExitCode::SUCCESS;
    }

    let loader = match build_config_loader(&cli.global) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let loaded_files = loader.format_loaded_files();
    let config = match loader.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match start_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    dispatch_command(&cli, &config, &loaded_files).await
}

fn start_logging(config: &Config) -> shelf_rs::error::Result<LogGuard> {
    let global = &config.global;
    let log_config = LogConfig::builder()
        .with_console_level(global.log_level)
        .with_file_level(global.file_log_level)
        .maybe_with_log_file(global.log_file.as_ref().map(|p| p.display().to_string()))
        .with_json_file(global.log_json)
        .build();
    init_logging(&log_config)
}

async fn dispatch_command(cli: &cli::Cli, config: &Config, loaded_files: &[String]) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            Ok(())
        }
        Some(Command::Options) => {
            run_options_command(config);
            Ok(())
        }
        Some(Command::Inis) => {
            run_inis_command(loaded_files);
            Ok(())
        }
        Some(Command::Release(args)) => run_release_command(args, config).await,
        Some(Command::Modes(args)) => run_modes_command(args, config),
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

fn build_config_loader(global: &GlobalOptions) -> shelf_rs::error::Result<ConfigLoader> {
    Config::standard_loader(&global.inis, &global.to_config_overrides())
}
