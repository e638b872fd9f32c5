//! Azure DevOps work item API client and types.
//!
//! This module provides the interface for communicating with the work item
//! tracking REST API.

pub mod auth;
mod client;
pub mod error;
pub mod types;

pub use auth::Auth;
pub use client::DevOpsClient;
pub use error::ApiError;
pub use types::{PatchOperation, WorkItemId};
