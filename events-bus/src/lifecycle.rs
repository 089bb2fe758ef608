//! Binds a session's lifetime to the owning view and to tenant identity
//!
//! ```text
//! Idle ──tenant available──▶ Subscribing ──opens returned──▶ Active
//!  ▲                                                           │
//!  └──────── all handles closed ◀── Closing ◀── unmount / tenant change / logout
//! ```
//!
//! A tenant change closes every handle of the old session before the first
//! open for the new tenant is issued.

use std::fmt;
use std::future::Future;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::session::{SessionHandle, SessionSummary, SubscriptionSession};
use crate::tenant::{TenantContext, TenantId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Subscribing(TenantId),
    Active(TenantId),
    Closing(TenantId),
}

impl LifecycleState {
    pub fn tenant(&self) -> Option<&TenantId> {
        match self {
            LifecycleState::Idle => None,
            LifecycleState::Subscribing(t) | LifecycleState::Active(t) | LifecycleState::Closing(t) => Some(t),
        }
    }

    pub fn is_active_for(&self, tenant: &TenantId) -> bool {
        matches!(self, LifecycleState::Active(t) if t == tenant)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Idle => f.write_str("idle"),
            LifecycleState::Subscribing(t) => write!(f, "subscribing({t})"),
            LifecycleState::Active(t) => write!(f, "active({t})"),
            LifecycleState::Closing(t) => write!(f, "closing({t})"),
        }
    }
}

pub struct LifecycleController {
    session: SubscriptionSession,
    tenants: watch::Receiver<Option<TenantId>>,
    state: watch::Sender<LifecycleState>,
    current: Option<SessionHandle>,
    summaries: Vec<SessionSummary>,
}

impl LifecycleController {
    pub fn new(session: SubscriptionSession, tenants: &TenantContext) -> Self {
        let (state, _) = watch::channel(LifecycleState::Idle);
        Self {
            session,
            tenants: tenants.subscribe(),
            state,
            current: None,
            summaries: Vec::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state.borrow().clone()
    }

    /// Observe state transitions while [`LifecycleController::run`] is executing
    pub fn watch_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Drive the state machine until `unmount` resolves
    ///
    /// Returns the summary of every session opened during the view's lifetime.
    /// Resolving `unmount` is the only orderly shutdown: if the returned future
    /// is dropped or its task aborted instead, the live [`SessionHandle`] is
    /// dropped unclosed and its transport channels leak (see its `Drop`).
    pub async fn run<F>(mut self, unmount: F) -> Vec<SessionSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(unmount);

        let initial = self.tenants.borrow_and_update().clone();
        if let Some(tenant) = initial {
            self.subscribe(tenant).await;
        }

        let mut tenants_open = true;
        loop {
            tokio::select! {
                () = &mut unmount => {
                    debug!("View unmounted, tearing down realtime session");
                    break;
                }
                changed = self.tenants.changed(), if tenants_open => {
                    if changed.is_err() {
                        // Provider dropped: treat as logout and wait for unmount
                        tenants_open = false;
                        self.teardown().await;
                        continue;
                    }

                    let next = self.tenants.borrow_and_update().clone();
                    let current = self.current.as_ref().map(|h| h.tenant().clone());
                    if next == current {
                        continue;
                    }

                    self.teardown().await;
                    if let Some(tenant) = next {
                        self.subscribe(tenant).await;
                    }
                }
            }
        }

        self.teardown().await;
        self.summaries
    }

    async fn subscribe(&mut self, tenant: TenantId) {
        self.state.send_replace(LifecycleState::Subscribing(tenant.clone()));
        let handle = self.session.open(&tenant).await;
        info!(
            tenant_id = %tenant,
            channels = handle.channel_count(),
            degraded = handle.degraded().len(),
            "Realtime session active"
        );
        self.current = Some(handle);
        self.state.send_replace(LifecycleState::Active(tenant));
    }

    async fn teardown(&mut self) {
        let Some(handle) = self.current.take() else {
            return;
        };

        self.state.send_replace(LifecycleState::Closing(handle.tenant().clone()));
        let summary = self.session.close(handle).await;
        self.summaries.push(summary);
        self.state.send_replace(LifecycleState::Idle);
    }
}
