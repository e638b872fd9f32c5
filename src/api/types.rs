//! Work item REST API request and response types.
//!
//! These model the `wit/wiql` and `wit/workitems` endpoints of API version 7.0.

use serde::{Deserialize, Serialize};

use crate::wiql::{fields, CLOSED_STATE};

/// A work item identifier.
pub type WorkItemId = u32;

/// Body of `POST _apis/wit/wiql`.
#[derive(Debug, Clone, Serialize)]
pub struct WiqlRequest {
    /// The rendered WIQL query.
    pub query: String,
}

/// Response of `POST _apis/wit/wiql`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiqlResponse {
    /// Matching work items in server order.
    pub work_items: Vec<WorkItemReference>,
}

impl WiqlResponse {
    /// The identifiers of the matching work items, in server order.
    pub fn ids(&self) -> Vec<WorkItemId> {
        self.work_items.iter().map(|w| w.id).collect()
    }
}

/// A reference to a work item returned by a query.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemReference {
    /// The work item ID.
    pub id: WorkItemId,
    /// REST URL of the work item.
    #[serde(default)]
    pub url: Option<String>,
}

/// JSON Patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
    Test,
}

/// A single field-patch instruction for `PATCH _apis/wit/workitems/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOperation {
    /// The operation kind.
    pub op: PatchOp,
    /// Target path, e.g. `/fields/System.State`.
    pub path: String,
    /// New value.
    pub value: serde_json::Value,
}

impl PatchOperation {
    /// Set a field to a value.
    pub fn set_field(field: &str, value: impl Into<serde_json::Value>) -> Self {
        Self {
            op: PatchOp::Add,
            path: format!("/fields/{}", field),
            value: value.into(),
        }
    }

    /// Move the work item to the closed state.
    pub fn close() -> Self {
        Self::set_field(fields::STATE, CLOSED_STATE)
    }
}
