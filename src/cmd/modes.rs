// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Lists the release modes that apply to a package directory.

use anyhow::Context;

use crate::cli::ModesArgs;
use crate::config::Config;
use crate::error::Result;
use crate::vcs::BackendRegistry;

/// Prints every applicable mode, highest priority first.
///
/// # Errors
///
/// Returns an error if probing a backend fails for a reason other than
/// the backend not applying.
pub fn run_modes_command(args: &ModesArgs, config: &Config) -> Result<()> {
    let registry = BackendRegistry::with_builtins(&config.vcs);
    let modes = registry
        .probe_available(&args.path)
        .with_context(|| format!("Failed to probe release modes for {}", args.path.display()))?;

    if modes.is_empty() {
        println!("No release mode applies to {}", args.path.display());
    } else {
        for mode in modes {
            println!("{mode}");
        }
    }
    Ok(())
}
