use std::sync::Arc;

use accessgate_core::AccessKey;
use accessgate_domain::{PermissionSet, QueryState};

use crate::access_ports::{AccessLookup, AccessStore, ResolutionErrorReporter, report_failure};

/// Resolves explicit permission grants of the current user in the active tenant.
#[derive(Clone)]
pub struct PermissionSetResolver {
    store: Arc<dyn AccessStore>,
    reporter: Arc<dyn ResolutionErrorReporter>,
}

impl PermissionSetResolver {
    /// Creates a resolver over a store and an error reporter.
    #[must_use]
    pub fn new(store: Arc<dyn AccessStore>, reporter: Arc<dyn ResolutionErrorReporter>) -> Self {
        Self { store, reporter }
    }

    /// Resolves the grant set for an optional key.
    ///
    /// An absent key or a store error yields the empty set.
    pub async fn resolve(&self, key: Option<AccessKey>) -> PermissionSet {
        match key {
            Some(key) => self.lookup(key).await.effective_permissions(),
            None => PermissionSet::new(),
        }
    }

    /// Runs the store lookup for a key without collapsing the outcome.
    pub async fn lookup(&self, key: AccessKey) -> QueryState<PermissionSet> {
        match self.store.fetch_grants(key.user_id(), key.tenant_id()).await {
            Ok(grants) => QueryState::Resolved(PermissionSet::from_grant_values(
                grants.iter().map(|grant| grant.permission.as_str()),
            )),
            Err(error) => {
                report_failure(self.reporter.clone(), key, AccessLookup::Grants, &error).await;
                QueryState::Failed
            }
        }
    }
}
