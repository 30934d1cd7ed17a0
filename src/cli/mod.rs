// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for shelf-rs using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! shelf [global options] <command>
//! release [PATH] [-m MSG] [-j N] [-t EPOCH] [--allow-not-latest] [--vcs NAME]
//! modes [PATH]
//! options
//! inis
//! version
//! ```

pub mod global;
pub mod release;


use std::path::PathBuf;

use crate::cli::global::GlobalOptions;
use crate::cli::release::ReleaseArgs;
use clap::{Args, Parser, Subcommand};

/// Central Package Release Tool
///
/// Releases a versioned, multi-variant package into a shared central store.
#[derive(Debug, Parser)]
#[command(
    name = "shelf",
    author,
    version,
    about = "Central Package Release Tool",
    long_about = "shelf-rs Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Validates the working copy, builds every variant from a clean\n\
                  export, installs them centrally and tags the release.\n\n\
                  Invoking `shelf release` in a package directory releases it.\n\
                  See `shelf <command> --help` for more information about a command.",
    after_help = "CONFIGURATION:\n\n\
                  shelf reads `shelf.toml` from the current directory if present,\n\
                  then every --ini file in order, then SHELF_<SECTION>__<KEY>\n\
                  environment variables, then --set overrides. Later sources win."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    Version,

    /// Lists all options and their effective values.
    Options,

    /// Lists the configuration files that were loaded.
    Inis,

    /// Releases the package in PATH.
    Release(ReleaseArgs),

    /// Lists the release modes that apply to PATH, highest priority first.
    Modes(ModesArgs),
}

/// Arguments for the `modes` command.
#[derive(Debug, Clone, Args)]
pub struct ModesArgs {
    /// Package directory.
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}
