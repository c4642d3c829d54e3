use std::sync::{Arc, RwLock};

use accessgate_core::{AccessKey, AppResult, SessionContext};
use accessgate_domain::{
    AccessSnapshot, AuthorizationView, FetchTicket, Permission, PermissionSet, QueryState, Role,
};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::access_ports::{AccessStore, ResolutionErrorReporter, SessionContextSource};
use crate::{PermissionSetResolver, RoleResolver};

/// Keeps an [`AuthorizationView`] in step with the current `(user, tenant)` key.
///
/// Every key change publishes a loading view, aborts lookups still running
/// for the previous key and starts the role and grant lookups for the new
/// one. Lookups settle independently; a settlement for a key that is no
/// longer current is discarded.
#[derive(Clone)]
pub struct AuthorizationSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    role_resolver: RoleResolver,
    permission_resolver: PermissionSetResolver,
    state: Mutex<SessionState>,
    view_sender: watch::Sender<KeyedView>,
    followed: RwLock<Option<watch::Receiver<SessionContext>>>,
}

#[derive(Default)]
struct SessionState {
    snapshot: AccessSnapshot,
    in_flight: Vec<JoinHandle<()>>,
}

enum Settlement {
    Role(QueryState<Option<Role>>),
    Grants(QueryState<PermissionSet>),
}

/// Published view together with the key it was derived for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedView {
    key: Option<AccessKey>,
    view: AuthorizationView,
}

impl KeyedView {
    /// Returns the key the view belongs to.
    #[must_use]
    pub fn key(&self) -> Option<AccessKey> {
        self.key
    }

    /// Returns the derived view.
    #[must_use]
    pub fn view(&self) -> &AuthorizationView {
        &self.view
    }

    /// Returns the view as seen by a caller whose context maps to `expected`.
    ///
    /// A view published for another key is never handed out: the caller
    /// gets the loading view, or the signed-out view when `expected` is absent.
    #[must_use]
    pub fn for_key(&self, expected: Option<AccessKey>) -> AuthorizationView {
        if self.key == expected {
            return self.view.clone();
        }

        match expected {
            Some(_) => AuthorizationView::loading(),
            None => AuthorizationView::signed_out(),
        }
    }
}

impl AuthorizationSession {
    /// Creates a session with no identity and no tenant.
    #[must_use]
    pub fn new(store: Arc<dyn AccessStore>, reporter: Arc<dyn ResolutionErrorReporter>) -> Self {
        Self::from_resolvers(
            RoleResolver::new(store.clone(), reporter.clone()),
            PermissionSetResolver::new(store, reporter),
        )
    }

    /// Creates a session from already configured resolvers.
    #[must_use]
    pub fn from_resolvers(
        role_resolver: RoleResolver,
        permission_resolver: PermissionSetResolver,
    ) -> Self {
        let (view_sender, _) = watch::channel(KeyedView {
            key: None,
            view: AuthorizationView::signed_out(),
        });

        Self {
            inner: Arc::new(SessionInner {
                role_resolver,
                permission_resolver,
                state: Mutex::new(SessionState::default()),
                view_sender,
                followed: RwLock::new(None),
            }),
        }
    }

    /// Returns the current view.
    ///
    /// While following a context source, a context change that the session
    /// has not re-keyed to yet already reads as loading (or signed out).
    #[must_use]
    pub fn view(&self) -> AuthorizationView {
        let followed = self.followed_key();
        let published = self.inner.view_sender.borrow();
        match followed {
            Some(expected) => published.for_key(expected),
            None => published.view.clone(),
        }
    }

    /// Returns whether the permission is granted in the current view.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.view().has_permission(permission)
    }

    /// Ensures the permission is granted in the current view.
    pub fn require_permission(&self, permission: Permission) -> AppResult<()> {
        self.view().require(permission)
    }

    /// Returns a receiver notified whenever the published view changes.
    ///
    /// Subscribers that track their own context should read through
    /// [`KeyedView::for_key`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<KeyedView> {
        self.inner.view_sender.subscribe()
    }

    /// Waits until no lookup is in flight for the current key and returns that view.
    ///
    /// Lookups have no local timeout; a store that never answers keeps this
    /// pending.
    pub async fn settled_view(&self) -> AuthorizationView {
        let mut receiver = self.inner.view_sender.subscribe();
        let settled = receiver
            .wait_for(|published| {
                !published.view.is_loading()
                    && self
                        .followed_key()
                        .is_none_or(|expected| expected == published.key)
            })
            .await
            .map(|published| published.view.clone());

        match settled {
            Ok(view) => view,
            Err(_) => self.view(),
        }
    }

    /// Returns the key the session is currently tracking.
    pub async fn current_key(&self) -> Option<AccessKey> {
        self.inner.state.lock().await.snapshot.key()
    }

    /// Moves the session to a new identity/tenant context.
    ///
    /// Does nothing when the derived key is unchanged. Lookups aborted by
    /// the switch still deliver any store failure they already observed to
    /// the reporter.
    pub async fn switch_context(&self, context: SessionContext) {
        let mut state = self.inner.state.lock().await;
        if state.snapshot.key() == context.access_key() {
            return;
        }

        let ticket = state.snapshot.rekey(&context);
        debug!(
            key = ?state.snapshot.key(),
            "authorization context changed"
        );
        self.restart_lookups(&mut state, ticket);
    }

    /// Discards the resolved state for the current key and looks it up again.
    pub async fn refresh(&self) {
        let mut state = self.inner.state.lock().await;
        if state.snapshot.key().is_none() {
            return;
        }

        let ticket = state.snapshot.refresh();
        self.restart_lookups(&mut state, ticket);
    }

    /// Keeps the session keyed to a context source until it closes.
    ///
    /// The source becomes authoritative: reads never return a view for a key
    /// other than the one the source currently maps to.
    pub fn follow(&self, source: &dyn SessionContextSource) -> JoinHandle<()> {
        let mut receiver = source.subscribe();
        let session = self.clone();

        match self.inner.followed.write() {
            Ok(mut followed) => *followed = Some(source.subscribe()),
            Err(poisoned) => *poisoned.into_inner() = Some(source.subscribe()),
        }

        tokio::spawn(async move {
            let initial = *receiver.borrow_and_update();
            session.switch_context(initial).await;

            while receiver.changed().await.is_ok() {
                let context = *receiver.borrow_and_update();
                session.switch_context(context).await;
            }

            debug!("session context source closed");
        })
    }

    /// Key of the followed source, `None` when not following.
    fn followed_key(&self) -> Option<Option<AccessKey>> {
        let followed = match self.inner.followed.read() {
            Ok(followed) => followed,
            Err(poisoned) => poisoned.into_inner(),
        };

        followed
            .as_ref()
            .map(|receiver| receiver.borrow().access_key())
    }

    fn restart_lookups(&self, state: &mut SessionState, ticket: Option<FetchTicket>) {
        for handle in state.in_flight.drain(..) {
            handle.abort();
        }

        self.publish(&state.snapshot);

        if let Some(ticket) = ticket {
            state.in_flight = self.spawn_lookups(ticket);
        }
    }

    fn spawn_lookups(&self, ticket: FetchTicket) -> Vec<JoinHandle<()>> {
        let role_session = self.clone();
        let role_task = tokio::spawn(async move {
            let state = role_session.inner.role_resolver.lookup(ticket.key()).await;
            role_session.settle(ticket, Settlement::Role(state)).await;
        });

        let grants_session = self.clone();
        let grants_task = tokio::spawn(async move {
            let state = grants_session
                .inner
                .permission_resolver
                .lookup(ticket.key())
                .await;
            grants_session
                .settle(ticket, Settlement::Grants(state))
                .await;
        });

        vec![role_task, grants_task]
    }

    async fn settle(&self, ticket: FetchTicket, settlement: Settlement) {
        let mut state = self.inner.state.lock().await;
        let applied = match settlement {
            Settlement::Role(role) => state.snapshot.settle_role(&ticket, role),
            Settlement::Grants(grants) => state.snapshot.settle_grants(&ticket, grants),
        };

        if !applied {
            debug!(
                key = %ticket.key(),
                generation = ticket.generation(),
                "discarded stale access lookup"
            );
            return;
        }

        self.publish(&state.snapshot);
    }

    fn publish(&self, snapshot: &AccessSnapshot) {
        let next = KeyedView {
            key: snapshot.key(),
            view: snapshot.view(),
        };
        self.inner.view_sender.send_if_modified(|current| {
            if *current == next {
                return false;
            }

            *current = next;
            true
        });
    }
}
