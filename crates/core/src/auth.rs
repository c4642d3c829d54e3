use serde::{Deserialize, Serialize};

use crate::{TenantId, UserId};

/// Identity and active tenant reported by the session provider.
///
/// Either half may be missing: a signed-out visitor has no user, and a
/// freshly registered user may not have selected or joined a tenant yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionContext {
    user_id: Option<UserId>,
    tenant_id: Option<TenantId>,
}

impl SessionContext {
    /// Creates a context from optional identity and tenant values.
    #[must_use]
    pub fn new(user_id: Option<UserId>, tenant_id: Option<TenantId>) -> Self {
        Self { user_id, tenant_id }
    }

    /// Context with neither identity nor tenant.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for a signed-in user acting within a tenant.
    #[must_use]
    pub fn signed_in(user_id: UserId, tenant_id: TenantId) -> Self {
        Self::new(Some(user_id), Some(tenant_id))
    }

    /// Returns the authenticated user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the active tenant, if any.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns a copy of this context with a different active tenant.
    #[must_use]
    pub fn with_tenant(self, tenant_id: Option<TenantId>) -> Self {
        Self { tenant_id, ..self }
    }

    /// Returns a copy of this context with a different identity.
    #[must_use]
    pub fn with_user(self, user_id: Option<UserId>) -> Self {
        Self { user_id, ..self }
    }

    /// Returns the lookup key, present only when both halves are known.
    #[must_use]
    pub fn access_key(&self) -> Option<AccessKey> {
        match (self.user_id, self.tenant_id) {
            (Some(user_id), Some(tenant_id)) => Some(AccessKey::new(user_id, tenant_id)),
            _ => None,
        }
    }
}

/// The `(user, tenant)` pair every role and grant lookup is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccessKey {
    user_id: UserId,
    tenant_id: TenantId,
}

impl AccessKey {
    /// Creates a key for one user in one tenant.
    #[must_use]
    pub fn new(user_id: UserId, tenant_id: TenantId) -> Self {
        Self { user_id, tenant_id }
    }

    /// Returns the user half of the key.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the tenant half of the key.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

impl std::fmt::Display for AccessKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}@{}", self.user_id, self.tenant_id)
    }
}
