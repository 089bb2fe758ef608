//! Property tests for channel scoping

use std::sync::Arc;

use events_bus::{InMemoryTransport, SubscriptionManager, TenantId, TransportCall, WatchedEntity};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn every_open_carries_the_current_tenant(raw in "[a-z0-9][a-z0-9-]{0,23}") {
        let tenant = TenantId::new(&raw).unwrap();
        let transport = Arc::new(InMemoryTransport::new(4));
        let manager = SubscriptionManager::new(transport.clone(), "hospital_id");

        let opened = runtime().block_on(manager.open_all(Some(&tenant), &WatchedEntity::ALL));
        prop_assert_eq!(opened.handles.len(), WatchedEntity::ALL.len());

        let expected = format!("hospital_id=eq.{raw}");
        for call in transport.calls() {
            match call {
                TransportCall::Open { filter, .. } => prop_assert_eq!(&filter, &expected),
                TransportCall::Close { .. } => prop_assert!(false, "no close expected"),
            }
        }
    }

    #[test]
    fn blank_tenants_never_reach_the_transport(raw in "[ \t]{0,8}") {
        prop_assert!(TenantId::new(&raw).is_none());

        let transport = Arc::new(InMemoryTransport::new(4));
        let manager = SubscriptionManager::new(transport.clone(), "hospital_id");
        let tenant = TenantId::new(&raw);

        let opened = runtime().block_on(manager.open_all(tenant.as_ref(), &WatchedEntity::ALL));
        prop_assert!(opened.handles.is_empty());
        prop_assert!(transport.calls().is_empty());
    }
}
