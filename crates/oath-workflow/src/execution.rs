//! Per-invocation execution context.

use alloy_primitives::{keccak256, B256};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity of one handler invocation. Every trigger firing gets a fresh
/// one; nothing in it is shared with other invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    /// Registered workflow this invocation belongs to.
    pub workflow_id: B256,
    /// Unique invocation id, bound into every report it signs.
    pub id: B256,
    pub started_at: DateTime<Utc>,
}

impl Execution {
    pub fn new(workflow_id: B256) -> Self {
        Self {
            workflow_id,
            id: keccak256(Uuid::new_v4().as_bytes()),
            started_at: Utc::now(),
        }
    }
}
