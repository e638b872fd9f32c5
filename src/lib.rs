//! witsweep - list and close Azure DevOps work items from the terminal.
//!
//! The work is a two-step batch: one WIQL search for the open work items
//! assigned to a user, then one state update per result.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod sweep;
pub mod wiql;
