use std::sync::Arc;

use accessgate_core::AccessKey;
use accessgate_domain::{QueryState, Role};

use crate::access_ports::{AccessLookup, AccessStore, ResolutionErrorReporter, report_failure};

/// Resolves the role of the current user in the active tenant.
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn AccessStore>,
    reporter: Arc<dyn ResolutionErrorReporter>,
}

impl RoleResolver {
    /// Creates a resolver over a store and an error reporter.
    #[must_use]
    pub fn new(store: Arc<dyn AccessStore>, reporter: Arc<dyn ResolutionErrorReporter>) -> Self {
        Self { store, reporter }
    }

    /// Resolves the role for an optional key.
    ///
    /// Returns `None` without touching the store when the key is absent.
    /// Missing records and store errors both resolve to [`Role::Restricted`].
    pub async fn resolve(&self, key: Option<AccessKey>) -> Option<Role> {
        let key = key?;
        self.lookup(key).await.effective_role()
    }

    /// Runs the store lookup for a key without collapsing the outcome.
    pub async fn lookup(&self, key: AccessKey) -> QueryState<Option<Role>> {
        match self.store.fetch_role(key.user_id(), key.tenant_id()).await {
            Ok(record) => {
                QueryState::Resolved(record.map(|record| Role::from_stored(record.role.as_str())))
            }
            Err(error) => {
                report_failure(self.reporter.clone(), key, AccessLookup::Role, &error).await;
                QueryState::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use accessgate_core::{AccessKey, AppError, AppResult, TenantId, UserId};
    use accessgate_domain::{QueryState, Role};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::{
        AccessStore, GrantRecord, ResolutionErrorReporter, ResolutionFailure, RoleRecord,
    };

    use super::RoleResolver;

    enum RoleAnswer {
        Record(&'static str),
        Missing,
        Error,
    }

    struct FakeRoleStore {
        answer: RoleAnswer,
        calls: AtomicUsize,
    }

    impl FakeRoleStore {
        fn new(answer: RoleAnswer) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AccessStore for FakeRoleStore {
        async fn fetch_role(
            &self,
            _user_id: UserId,
            _tenant_id: TenantId,
        ) -> AppResult<Option<RoleRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                RoleAnswer::Record(role) => Ok(Some(RoleRecord {
                    role: role.to_owned(),
                })),
                RoleAnswer::Missing => Ok(None),
                RoleAnswer::Error => Err(AppError::Internal("query timed out".to_owned())),
            }
        }

        async fn fetch_grants(
            &self,
            _user_id: UserId,
            _tenant_id: TenantId,
        ) -> AppResult<Vec<GrantRecord>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct FakeReporter {
        failures: Mutex<Vec<ResolutionFailure>>,
    }

    #[async_trait]
    impl ResolutionErrorReporter for FakeReporter {
        async fn report(&self, failure: ResolutionFailure) -> AppResult<()> {
            self.failures.lock().await.push(failure);
            Ok(())
        }
    }

    fn key() -> AccessKey {
        AccessKey::new(UserId::new(), TenantId::new())
    }

    #[tokio::test]
    async fn absent_key_is_unresolved_and_skips_store() {
        let store = Arc::new(FakeRoleStore::new(RoleAnswer::Record("admin")));
        let resolver = RoleResolver::new(store.clone(), Arc::new(FakeReporter::default()));

        assert_eq!(resolver.resolve(None).await, None);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stored_admin_value_resolves_to_admin() {
        let resolver = RoleResolver::new(
            Arc::new(FakeRoleStore::new(RoleAnswer::Record("admin"))),
            Arc::new(FakeReporter::default()),
        );

        assert_eq!(resolver.resolve(Some(key())).await, Some(Role::Admin));
    }

    #[tokio::test]
    async fn unrecognized_stored_value_is_restricted() {
        let resolver = RoleResolver::new(
            Arc::new(FakeRoleStore::new(RoleAnswer::Record("owner"))),
            Arc::new(FakeReporter::default()),
        );

        assert_eq!(resolver.resolve(Some(key())).await, Some(Role::Restricted));
    }

    #[tokio::test]
    async fn missing_record_is_restricted_without_report() {
        let reporter = Arc::new(FakeReporter::default());
        let resolver = RoleResolver::new(
            Arc::new(FakeRoleStore::new(RoleAnswer::Missing)),
            reporter.clone(),
        );

        assert_eq!(resolver.lookup(key()).await, QueryState::Resolved(None));
        assert_eq!(resolver.resolve(Some(key())).await, Some(Role::Restricted));
        assert!(reporter.failures.lock().await.is_empty());
    }

    #[tokio::test]
    async fn store_error_is_restricted_and_reported() {
        let reporter = Arc::new(FakeReporter::default());
        let resolver = RoleResolver::new(
            Arc::new(FakeRoleStore::new(RoleAnswer::Error)),
            reporter.clone(),
        );
        let key = key();

        assert_eq!(resolver.resolve(Some(key)).await, Some(Role::Restricted));

        let failures = reporter.failures.lock().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].key, key);
        assert!(failures[0].message.contains("query timed out"));
    }
}
