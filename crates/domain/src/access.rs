use accessgate_core::{AccessKey, AppError, AppResult, SessionContext};
use serde::Serialize;

use crate::{Permission, PermissionSet, Role};

/// Settlement state of one asynchronous lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QueryState<T> {
    /// The lookup has not settled for the current key.
    #[default]
    Pending,
    /// The lookup returned a value.
    Resolved(T),
    /// The lookup failed; the error was reported elsewhere.
    Failed,
}

impl<T> QueryState<T> {
    /// Returns whether the lookup is still in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl QueryState<Option<Role>> {
    /// Collapses a role lookup into the role the decision unit sees.
    ///
    /// A missing record and a failed lookup both yield [`Role::Restricted`].
    #[must_use]
    pub fn effective_role(&self) -> Option<Role> {
        match self {
            Self::Pending => None,
            Self::Resolved(Some(role)) => Some(*role),
            Self::Resolved(None) | Self::Failed => Some(Role::Restricted),
        }
    }
}

impl QueryState<PermissionSet> {
    /// Collapses a grant lookup into the set the decision unit sees.
    #[must_use]
    pub fn effective_permissions(&self) -> PermissionSet {
        match self {
            Self::Resolved(permissions) => permissions.clone(),
            Self::Pending | Self::Failed => PermissionSet::new(),
        }
    }
}

/// Outcome of a capability check for consumers that render a loading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// Lookups are still in flight; treat as not permitted for now.
    Loading,
    /// The permission is granted.
    Granted,
    /// The permission is not granted.
    Denied,
}

/// Derived authorization state for the current `(user, tenant)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationView {
    is_admin: bool,
    permissions: PermissionSet,
    is_loading: bool,
}

impl AuthorizationView {
    /// Composes the view from the collapsed lookup results.
    ///
    /// - No IO
    /// - No panics
    /// - Loading yields the empty, non-admin view
    #[must_use]
    pub fn compose(role: Option<Role>, permissions: PermissionSet, is_loading: bool) -> Self {
        if is_loading {
            return Self::loading();
        }

        let is_admin = role.is_some_and(|role| role.is_admin());
        let permissions = if is_admin {
            PermissionSet::full()
        } else {
            permissions
        };

        Self {
            is_admin,
            permissions,
            is_loading: false,
        }
    }

    /// View published while lookups for a new key are in flight.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            is_admin: false,
            permissions: PermissionSet::new(),
            is_loading: true,
        }
    }

    /// View for a missing identity or tenant.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            is_admin: false,
            permissions: PermissionSet::new(),
            is_loading: false,
        }
    }

    /// Returns whether the resolved role is exactly admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Returns the effective permission set.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Returns whether either lookup is still in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Returns whether the permission is currently granted.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        // Loading pre-empts admin, admin pre-empts membership.
        if self.is_loading {
            return false;
        }

        if self.is_admin {
            return true;
        }

        self.permissions.contains(permission)
    }

    /// Returns a three-way decision for route guards.
    #[must_use]
    pub fn decide(&self, permission: Permission) -> AccessDecision {
        if self.is_loading {
            AccessDecision::Loading
        } else if self.has_permission(permission) {
            AccessDecision::Granted
        } else {
            AccessDecision::Denied
        }
    }

    /// Ensures the permission is granted.
    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.has_permission(permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "missing permission '{}'",
            permission.as_str()
        )))
    }
}

/// Identifies one round of lookups for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    key: AccessKey,
    generation: u64,
}

impl FetchTicket {
    /// Returns the key the lookups were issued for.
    #[must_use]
    pub fn key(&self) -> AccessKey {
        self.key
    }

    /// Returns the round number the ticket belongs to.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Keyed state merged from the role and grant lookups.
///
/// Settlements carry the ticket they were issued with and are dropped when
/// the key has moved on, so a slow lookup for a previous tenant never leaks
/// into the current view. Role and grant settlements touch disjoint fields,
/// which makes their order irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessSnapshot {
    key: Option<AccessKey>,
    generation: u64,
    role: QueryState<Option<Role>>,
    grants: QueryState<PermissionSet>,
}

impl AccessSnapshot {
    /// Creates a snapshot with no key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key the snapshot is tracking.
    #[must_use]
    pub fn key(&self) -> Option<AccessKey> {
        self.key
    }

    /// Moves the snapshot to the key of `context`.
    ///
    /// Returns a ticket when lookups must be issued for a new key. An
    /// unchanged key keeps the current state and returns `None`.
    pub fn rekey(&mut self, context: &SessionContext) -> Option<FetchTicket> {
        let key = context.access_key();
        if key == self.key {
            return None;
        }

        self.key = key;
        self.restart()
    }

    /// Discards the settled state for the current key and starts a new round.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        self.restart()
    }

    fn restart(&mut self) -> Option<FetchTicket> {
        self.generation = self.generation.wrapping_add(1);
        self.role = QueryState::Pending;
        self.grants = QueryState::Pending;

        self.key.map(|key| FetchTicket {
            key,
            generation: self.generation,
        })
    }

    /// Returns whether settlements carrying `ticket` still apply.
    #[must_use]
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.key == Some(ticket.key) && self.generation == ticket.generation
    }

    /// Records the role lookup result. Returns `false` for stale tickets.
    pub fn settle_role(&mut self, ticket: &FetchTicket, state: QueryState<Option<Role>>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.role = state;
        true
    }

    /// Records the grant lookup result. Returns `false` for stale tickets.
    pub fn settle_grants(&mut self, ticket: &FetchTicket, state: QueryState<PermissionSet>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.grants = state;
        true
    }

    /// Derives the view for the current key.
    #[must_use]
    pub fn view(&self) -> AuthorizationView {
        if self.key.is_none() {
            return AuthorizationView::signed_out();
        }

        let is_loading = self.role.is_pending() || self.grants.is_pending();
        AuthorizationView::compose(
            self.role.effective_role(),
            self.grants.effective_permissions(),
            is_loading,
        )
    }
}
