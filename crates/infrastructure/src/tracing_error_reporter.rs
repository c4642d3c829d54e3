use accessgate_application::{ResolutionErrorReporter, ResolutionFailure};
use accessgate_core::AppResult;
use async_trait::async_trait;
use tracing::error;

/// Reporter that writes swallowed lookup failures to the tracing pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl TracingErrorReporter {
    /// Creates the reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResolutionErrorReporter for TracingErrorReporter {
    async fn report(&self, failure: ResolutionFailure) -> AppResult<()> {
        error!(
            user_id = %failure.key.user_id(),
            tenant_id = %failure.key.tenant_id(),
            lookup = failure.lookup.as_str(),
            occurred_at = %failure.occurred_at,
            error = %failure.message,
            "access lookup failure"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use accessgate_application::{AccessLookup, ResolutionErrorReporter, ResolutionFailure};
    use accessgate_core::{AccessKey, TenantId, UserId};
    use chrono::Utc;

    use super::TracingErrorReporter;

    #[tokio::test]
    async fn reporting_never_fails() {
        let result = TracingErrorReporter::new()
            .report(ResolutionFailure {
                key: AccessKey::new(UserId::new(), TenantId::new()),
                lookup: AccessLookup::Grants,
                message: "pool timed out".to_owned(),
                occurred_at: Utc::now(),
            })
            .await;

        assert!(result.is_ok());
    }
}
