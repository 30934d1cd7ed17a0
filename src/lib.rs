// shelf-rs: Central Package Release Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |          release / modes / config
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |          config           |
//!              |   TOML, env, --set layers |
//!              '------+-------------+------'
//!                     |             |
//!                     v             v
//!                  release         vcs
//!                  pipeline    base/svn/git/hg
//!                     |             |
//!                     +------+------+
//!                            v
//!                         version
//!
//!   +-----------------------------------------+
//!   |  core      async process runner         |
//!   +-----------------------------------------+
//!   |  foundation   error, logging            |
//!   +-----------------------------------------+
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod release;
pub mod vcs;
pub mod version;
