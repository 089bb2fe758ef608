//! Current hospital scope and its change point

use std::fmt;

use tokio::sync::watch;

/// Identifier of a hospital; never empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantId(String);

impl TenantId {
    /// `None` for empty or whitespace-only input
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tenant context provider
///
/// Set on login, cleared on logout or session expiry. Lifecycle controllers
/// subscribe to it and re-scope their channels whenever it changes.
#[derive(Debug)]
pub struct TenantContext {
    tx: watch::Sender<Option<TenantId>>,
}

impl TenantContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<TenantId>> {
        self.tx.subscribe()
    }

    /// Replace the tenant; subscribers are only woken when the value differs
    pub fn set_tenant(&self, tenant: Option<TenantId>) {
        self.tx.send_if_modified(|current| {
            if *current == tenant {
                false
            } else {
                *current = tenant;
                true
            }
        });
    }

    pub fn login(&self, tenant: TenantId) {
        self.set_tenant(Some(tenant));
    }

    pub fn logout(&self) {
        self.set_tenant(None);
    }
}

impl Default for TenantContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_tenant_is_absent() {
        assert!(TenantId::new("").is_none());
        assert!(TenantId::new("   ").is_none());
        assert_eq!(TenantId::new(" hosp-1 ").unwrap().as_str(), "hosp-1");
    }

    #[tokio::test]
    async fn test_same_tenant_does_not_notify() {
        let ctx = TenantContext::new();
        let mut rx = ctx.subscribe();

        ctx.login(TenantId::new("hosp-1").unwrap());
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        ctx.login(TenantId::new("hosp-1").unwrap());
        assert!(!rx.has_changed().unwrap());

        ctx.logout();
        assert!(rx.has_changed().unwrap());
        assert!(ctx.tenant_id().is_none());
    }
}
