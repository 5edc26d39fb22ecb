//! Dotfile deployment by symlink.
//!
//! Walks a source tree of dotfiles and links every file into a destination
//! tree at the same relative position.  A file may carry a trailing
//! `<qualifier>` naming a host, a user or `user@host`; for each destination
//! the most specific variant that matches the current [`identity`] wins.
//!
//! The public API is organised into layers:
//!
//! - **[`specialization`]**: parse `name<qualifier>` and rank it for an identity
//! - **[`destination_map`]**: keep the winning source per destination path
//! - **[`scan`]**: walk the source tree and build a [`scan::DeployPlan`]
//! - **[`resources`]**: idempotent `check + apply` primitives for directories and symlinks
//! - **[`commands`]**: the `deploy` command that ties the layers together
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod destination_map;
pub mod error;
pub mod identity;
pub mod logging;
pub mod resources;
pub mod scan;
pub mod specialization;
