// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers
//!   release, modes, options, inis
//! ```

pub mod config;
pub mod modes;
pub mod release;
