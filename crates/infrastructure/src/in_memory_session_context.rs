use accessgate_application::SessionContextSource;
use accessgate_core::{SessionContext, TenantId, UserId};
use tokio::sync::watch;

/// Session context holder for embedding applications and tests.
///
/// Every mutation notifies subscribers, including mutations that leave the
/// context unchanged; sessions ignore those because the key is unchanged.
pub struct InMemorySessionContext {
    sender: watch::Sender<SessionContext>,
}

impl InMemorySessionContext {
    /// Creates a holder starting from `initial`.
    #[must_use]
    pub fn new(initial: SessionContext) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Records a sign-in, keeping any previously selected tenant.
    pub fn sign_in(&self, user_id: UserId) {
        self.sender
            .send_modify(|context| *context = context.with_user(Some(user_id)));
    }

    /// Clears both the identity and the active tenant.
    pub fn sign_out(&self) {
        self.sender.send_replace(SessionContext::anonymous());
    }

    /// Makes `tenant_id` the active tenant.
    pub fn select_tenant(&self, tenant_id: TenantId) {
        self.sender
            .send_modify(|context| *context = context.with_tenant(Some(tenant_id)));
    }

    /// Leaves the active tenant.
    pub fn clear_tenant(&self) {
        self.sender
            .send_modify(|context| *context = context.with_tenant(None));
    }
}

impl Default for InMemorySessionContext {
    fn default() -> Self {
        Self::new(SessionContext::anonymous())
    }
}

impl SessionContextSource for InMemorySessionContext {
    fn current(&self) -> SessionContext {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<SessionContext> {
        self.sender.subscribe()
    }
}
