use std::collections::{BTreeSet, HashMap};

use accessgate_application::{AccessStore, GrantRecord, RoleRecord};
use accessgate_core::{AccessKey, AppError, AppResult, TenantId, UserId};
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Default, Clone)]
struct MemberEntry {
    role: Option<String>,
    grants: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct StoreState {
    members: HashMap<AccessKey, MemberEntry>,
    unavailable: bool,
}

/// In-memory adapter for role and grant lookups.
///
/// Values are stored verbatim, so callers can seed legacy or unknown role
/// and permission strings.
#[derive(Default)]
pub struct InMemoryAccessStore {
    state: RwLock<StoreState>,
}

impl InMemoryAccessStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stored role value of a member.
    pub async fn set_role(&self, user_id: UserId, tenant_id: TenantId, role: impl Into<String>) {
        self.state
            .write()
            .await
            .members
            .entry(AccessKey::new(user_id, tenant_id))
            .or_default()
            .role = Some(role.into());
    }

    /// Adds one permission grant value for a member.
    pub async fn grant(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
        permission: impl Into<String>,
    ) {
        self.state
            .write()
            .await
            .members
            .entry(AccessKey::new(user_id, tenant_id))
            .or_default()
            .grants
            .insert(permission.into());
    }

    /// Removes one permission grant value. Returns whether it existed.
    pub async fn revoke(&self, user_id: UserId, tenant_id: TenantId, permission: &str) -> bool {
        self.state
            .write()
            .await
            .members
            .get_mut(&AccessKey::new(user_id, tenant_id))
            .is_some_and(|entry| entry.grants.remove(permission))
    }

    /// Removes the role record and every grant of a member.
    pub async fn remove_member(&self, user_id: UserId, tenant_id: TenantId) {
        self.state
            .write()
            .await
            .members
            .remove(&AccessKey::new(user_id, tenant_id));
    }

    /// Makes every lookup fail until switched back.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    fn ensure_available(state: &StoreState) -> AppResult<()> {
        if state.unavailable {
            return Err(AppError::Internal("access store is unavailable".to_owned()));
        }

        Ok(())
    }
}

#[async_trait]
impl AccessStore for InMemoryAccessStore {
    async fn fetch_role(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> AppResult<Option<RoleRecord>> {
        let state = self.state.read().await;
        Self::ensure_available(&state)?;

        Ok(state
            .members
            .get(&AccessKey::new(user_id, tenant_id))
            .and_then(|entry| entry.role.clone())
            .map(|role| RoleRecord { role }))
    }

    async fn fetch_grants(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<GrantRecord>> {
        let state = self.state.read().await;
        Self::ensure_available(&state)?;

        Ok(state
            .members
            .get(&AccessKey::new(user_id, tenant_id))
            .map(|entry| {
                entry
                    .grants
                    .iter()
                    .map(|permission| GrantRecord {
                        permission: permission.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
