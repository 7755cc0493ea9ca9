use std::sync::{Arc, Mutex};

use booking_engine::{
    db_types::{NewTenant, TenantId},
    events::{EventHandlers, EventHooks, EventProducers, ReservationCreatedEvent},
    test_utils::{
        fakes::{FakeGateway, FakeRemoteSequence},
        prepare_env::{new_test_database, seed_tenants, tear_down, tenant_t1},
    },
    ReconciliationApi,
    ReservationStore,
    SqliteDatabase,
};
use log::*;
use tokio::task::JoinHandle;

pub type TestApi = ReconciliationApi<SqliteDatabase, FakeGateway, FakeRemoteSequence>;

/// Collects every `ReservationCreatedEvent` a hook receives.
#[derive(Clone, Default)]
pub struct CreatedEvents(Arc<Mutex<Vec<ReservationCreatedEvent>>>);

impl CreatedEvents {
    pub fn hooks(&self) -> EventHooks {
        let events = self.clone();
        let mut hooks = EventHooks::default();
        hooks.on_reservation_created(move |ev| {
            let events = events.clone();
            Box::pin(async move {
                info!("🪝️ Reservation created: {}", ev.reservation.reservation_number);
                events.0.lock().unwrap().push(ev);
            })
        });
        hooks
    }

    pub fn events(&self) -> Vec<ReservationCreatedEvent> {
        self.0.lock().unwrap().clone()
    }
}

pub struct TestSystem {
    pub api: TestApi,
    pub gateway: FakeGateway,
    pub remote: FakeRemoteSequence,
    created: CreatedEvents,
    handles: Vec<JoinHandle<()>>,
}

pub fn start_hooks(created: &CreatedEvents) -> (EventProducers, Vec<JoinHandle<()>>) {
    let handlers = EventHandlers::new(25, created.hooks());
    let producers = handlers.producers();
    (producers, handlers.start_handlers())
}

impl std::fmt::Debug for TestSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TestSystem ({})", self.api.db().url())
    }
}

impl TestSystem {
    /// A fresh database with tenants `T1` (initials `T1P`) and `T2` (no initials), an empty fake gateway and a remote
    /// sequence that is down.
    pub async fn new() -> Self {
        let db = new_test_database(5).await;
        seed_tenants(&db, vec![tenant_t1(), NewTenant::new(TenantId::from("T2"), "Reef Divers Ltd")]).await;
        let gateway = FakeGateway::default();
        let remote = FakeRemoteSequence::default();
        let created = CreatedEvents::default();
        let (producers, handles) = start_hooks(&created);
        let api = ReconciliationApi::new(db, gateway.clone(), remote.clone(), producers);
        Self { api, gateway, remote, created, handles }
    }

    /// Shuts the system down and returns every reservation created event that was published. Dropping the API drops
    /// the event producers, which lets the handlers drain their queues and finish.
    pub async fn shutdown(self) -> Vec<ReservationCreatedEvent> {
        let TestSystem { mut api, created, handles, .. } = self;
        let url = api.db().url().to_string();
        if let Err(e) = api.db_mut().close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        drop(api);
        for handle in handles {
            handle.await.expect("Event handler panicked");
        }
        tear_down(&url).await;
        created.events()
    }
}
