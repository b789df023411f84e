//! Curlscrub library crate.
//!
//! Turns copied `curl` command lines into a structured request, filters its
//! headers, query parameters, form fields and JSON body fields with
//! prioritized rules, and rebuilds an equivalent command.
//!
//! The stable, supported API surface is exposed via [`crate::api`] and
//! [`crate::prelude`]. Other modules back the CLI and may change more
//! frequently.

pub mod api;
pub mod prelude;

pub mod cli;
pub mod command;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod router;
pub mod rules;
pub mod store;
