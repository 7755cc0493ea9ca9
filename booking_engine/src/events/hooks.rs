use std::{future::Future, pin::Pin, sync::Arc};

use tokio::task::JoinHandle;

use crate::events::{EventHandler, EventProducer, Handler, ReservationCreatedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub reservation_created_producer: Vec<EventProducer<ReservationCreatedEvent>>,
}

pub struct EventHandlers {
    pub on_reservation_created: Option<EventHandler<ReservationCreatedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_reservation_created = hooks.on_reservation_created.map(|f| EventHandler::new(buffer_size, f));
        Self { on_reservation_created }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_reservation_created {
            result.reservation_created_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns every configured handler. Each handle resolves once all producers for that handler are dropped and
    /// its queued events have been handled.
    pub fn start_handlers(self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        if let Some(handler) = self.on_reservation_created {
            handles.push(tokio::spawn(handler.start_handler()));
        }
        handles
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_reservation_created: Option<Handler<ReservationCreatedEvent>>,
}

impl EventHooks {
    pub fn on_reservation_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReservationCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_reservation_created = Some(Arc::new(f));
        self
    }
}
