//! Persistence seam for checks and violations.
//!
//! The pipeline consumes a repository-style [`CheckStore`] trait; the worker
//! is the only writer of status, modified text and violations after a check
//! is created. The bundled [`MemoryCheckStore`] keeps everything in process;
//! a relational implementation plugs in behind the same trait.

pub mod memory;

pub use memory::{MemoryCheckStore, MemoryDirectory};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Check lifecycle states.
///
/// `Completed` and `Failed` are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl CheckStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckStatus::Completed | CheckStatus::Failed)
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckStatus::Pending => "pending",
            CheckStatus::Processing => "processing",
            CheckStatus::Completed => "completed",
            CheckStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How the text was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    #[default]
    Text,
    File,
}

/// One text-compliance request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    pub id: String,
    pub organization_id: String,
    pub user_id: String,
    /// Immutable once set.
    pub original_text: String,
    /// Set only on completion.
    pub modified_text: Option<String>,
    pub status: CheckStatus,
    /// Set only on failure; always non-empty then.
    pub error_message: Option<String>,
    pub input_type: InputType,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Soft-delete flag; the pipeline never hard-deletes.
    #[serde(default)]
    pub deleted: bool,
}

impl Check {
    /// New pending check with a fresh id.
    pub fn new(
        organization_id: String,
        user_id: String,
        original_text: String,
        input_type: InputType,
        file_name: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id,
            user_id,
            original_text,
            modified_text: None,
            status: CheckStatus::Pending,
            error_message: None,
            input_type,
            file_name,
            created_at: Utc::now(),
            completed_at: None,
            deleted: false,
        }
    }
}

/// One detected non-compliant span within a check's original text.
///
/// Offsets are half-open **character** offsets into `original_text`:
/// `0 <= start_pos < end_pos <= original_text.chars().count()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    pub check_id: String,
    pub start_pos: usize,
    pub end_pos: usize,
    pub reason: String,
    /// Weak reference to the dictionary entry that matched, for audit.
    pub dictionary_id: Option<String>,
}

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Check not found: {0}")]
    NotFound(String),

    /// Attempted transition conflicts with the current persisted state.
    #[error("Conflicting state for check {id}: {message}")]
    Conflict { id: String, message: String },

    /// Backend storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Repository for checks and their violations.
///
/// # Atomicity contract
///
/// `claim_processing` must be atomic: of N concurrent claims for the same
/// pending check, exactly one returns `true`. A SQL implementation should
/// use a conditional update (`UPDATE checks SET status='processing' WHERE
/// id=$1 AND status='pending'`) and treat `rows_affected == 1` as success.
///
/// `complete_check` must be observably atomic: no reader may see status
/// `completed` without the accompanying violations.
#[async_trait]
pub trait CheckStore: Send + Sync + 'static {
    /// Persist a freshly created pending check.
    async fn create_check(&self, check: Check) -> Result<(), StoreError>;

    /// Fetch a check with its violations. Soft-deleted checks read as absent.
    async fn get_check(&self, id: &str) -> Result<Option<(Check, Vec<Violation>)>, StoreError>;

    /// Exclusive claim: `pending → processing`. Returns false when the check
    /// was not pending (another worker holds it, or it is terminal).
    async fn claim_processing(&self, id: &str) -> Result<bool, StoreError>;

    /// Terminal transition `processing → completed`, writing the rewritten
    /// text and all violations in one observable unit.
    async fn complete_check(
        &self,
        id: &str,
        modified_text: String,
        violations: Vec<Violation>,
    ) -> Result<(), StoreError>;

    /// Terminal transition to `failed` (from pending or processing) with a
    /// non-empty, human-readable error message.
    async fn fail_check(&self, id: &str, error_message: String) -> Result<(), StoreError>;

    /// Soft-delete a check. Violations go with the parent.
    async fn soft_delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Organization membership lookup.
///
/// Authentication itself lives upstream; the pipeline only needs to verify
/// that the submitting user belongs to the organization they submitted for.
pub trait Directory: Send + Sync + 'static {
    fn is_member(&self, user_id: &str, organization_id: &str) -> bool;
}
