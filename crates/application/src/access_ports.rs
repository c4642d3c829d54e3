use std::sync::Arc;

use accessgate_core::{AccessKey, AppError, AppResult, SessionContext, TenantId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

/// Membership row holding the stored role of one user in one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Raw stored role value.
    pub role: String,
}

/// Explicit permission grant row for one user in one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRecord {
    /// Raw stored permission value.
    pub permission: String,
}

/// Repository port for role and grant lookups.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Finds the role record for a user in a tenant.
    async fn fetch_role(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> AppResult<Option<RoleRecord>>;

    /// Lists explicit permission grants for a user in a tenant.
    async fn fetch_grants(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<GrantRecord>>;
}

/// Lookup that produced a [`ResolutionFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLookup {
    /// Role record lookup.
    Role,
    /// Permission grant lookup.
    Grants,
}

impl AccessLookup {
    /// Returns a stable label for logs and reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Grants => "grants",
        }
    }
}

/// Store failure swallowed by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    /// Key the lookup was issued for.
    pub key: AccessKey,
    /// Which lookup failed.
    pub lookup: AccessLookup,
    /// Rendered store error.
    pub message: String,
    /// When the failure was observed.
    pub occurred_at: DateTime<Utc>,
}

/// Observability port receiving swallowed store failures.
#[async_trait]
pub trait ResolutionErrorReporter: Send + Sync {
    /// Records one failure.
    async fn report(&self, failure: ResolutionFailure) -> AppResult<()>;
}

/// Identity and tenant provider with change notification.
pub trait SessionContextSource: Send + Sync {
    /// Returns the current context.
    fn current(&self) -> SessionContext;

    /// Returns a receiver notified on every context change.
    fn subscribe(&self) -> watch::Receiver<SessionContext>;
}

/// Logs a swallowed store failure and hands it to the reporter.
///
/// Delivery runs on its own task so that aborting the lookup that observed
/// the failure does not drop the report.
pub(crate) async fn report_failure(
    reporter: Arc<dyn ResolutionErrorReporter>,
    key: AccessKey,
    lookup: AccessLookup,
    error: &AppError,
) {
    warn!(
        user_id = %key.user_id(),
        tenant_id = %key.tenant_id(),
        lookup = lookup.as_str(),
        error = %error,
        "access lookup failed; falling back to restrictive default"
    );

    let failure = ResolutionFailure {
        key,
        lookup,
        message: error.to_string(),
        occurred_at: Utc::now(),
    };

    let delivery = tokio::spawn(async move {
        if let Err(report_error) = reporter.report(failure).await {
            warn!(
                lookup = lookup.as_str(),
                error = %report_error,
                "failed to report access lookup failure"
            );
        }
    });

    if let Err(join_error) = delivery.await {
        warn!(
            lookup = lookup.as_str(),
            error = %join_error,
            "access lookup failure report did not complete"
        );
    }
}
