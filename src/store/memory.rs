//! In-process store implementation.
//!
//! Backed by DashMap; all state transitions for a check happen under its
//! entry lock, which is what makes `claim_processing` and `complete_check`
//! atomic without a separate lock primitive.

use super::{Check, CheckStatus, CheckStore, Directory, StoreError, Violation};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashSet;

struct CheckRecord {
    check: Check,
    violations: Vec<Violation>,
}

/// DashMap-backed [`CheckStore`].
#[derive(Default)]
pub struct MemoryCheckStore {
    records: DashMap<String, CheckRecord>,
}

impl MemoryCheckStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored checks, soft-deleted included. Test helper.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids of all stored checks, soft-deleted included. Test helper.
    pub fn ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.key().clone()).collect()
    }
}

#[async_trait]
impl CheckStore for MemoryCheckStore {
    async fn create_check(&self, check: Check) -> Result<(), StoreError> {
        let id = check.id.clone();
        let record = CheckRecord {
            check,
            violations: Vec::new(),
        };
        if self.records.insert(id.clone(), record).is_some() {
            return Err(StoreError::Conflict {
                id,
                message: "check id already exists".to_string(),
            });
        }
        Ok(())
    }

    async fn get_check(&self, id: &str) -> Result<Option<(Check, Vec<Violation>)>, StoreError> {
        Ok(self
            .records
            .get(id)
            .filter(|r| !r.check.deleted)
            .map(|r| (r.check.clone(), r.violations.clone())))
    }

    async fn claim_processing(&self, id: &str) -> Result<bool, StoreError> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if record.check.status != CheckStatus::Pending {
            return Ok(false);
        }
        record.check.status = CheckStatus::Processing;
        Ok(true)
    }

    async fn complete_check(
        &self,
        id: &str,
        modified_text: String,
        violations: Vec<Violation>,
    ) -> Result<(), StoreError> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if record.check.status != CheckStatus::Processing {
            return Err(StoreError::Conflict {
                id: id.to_string(),
                message: format!(
                    "cannot complete from status '{}'",
                    record.check.status
                ),
            });
        }

        record.check.status = CheckStatus::Completed;
        record.check.modified_text = Some(modified_text);
        record.check.completed_at = Some(Utc::now());
        record.violations = violations;
        Ok(())
    }

    async fn fail_check(&self, id: &str, error_message: String) -> Result<(), StoreError> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if record.check.status.is_terminal() {
            return Err(StoreError::Conflict {
                id: id.to_string(),
                message: format!(
                    "cannot fail from terminal status '{}'",
                    record.check.status
                ),
            });
        }

        record.check.status = CheckStatus::Failed;
        record.check.error_message = Some(error_message);
        record.check.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn soft_delete(&self, id: &str) -> Result<(), StoreError> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.check.deleted = true;
        Ok(())
    }
}

/// In-memory [`Directory`].
///
/// `permissive()` accepts any user/organization pair; the deployed system
/// delegates membership to the upstream auth provider. The strict form backs
/// authorization tests.
pub struct MemoryDirectory {
    permissive: bool,
    members: DashMap<String, HashSet<String>>,
}

impl MemoryDirectory {
    /// Directory that accepts every membership claim.
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            members: DashMap::new(),
        }
    }

    /// Directory that only accepts registered memberships.
    pub fn strict() -> Self {
        Self {
            permissive: false,
            members: DashMap::new(),
        }
    }

    pub fn add_member(&self, user_id: &str, organization_id: &str) {
        self.members
            .entry(user_id.to_string())
            .or_default()
            .insert(organization_id.to_string());
    }
}

impl Directory for MemoryDirectory {
    fn is_member(&self, user_id: &str, organization_id: &str) -> bool {
        if self.permissive {
            return true;
        }
        self.members
            .get(user_id)
            .map(|orgs| orgs.contains(organization_id))
            .unwrap_or(false)
    }
}
