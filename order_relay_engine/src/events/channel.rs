use std::time::Duration;

use log::*;
use thiserror::Error;
use tokio::{sync::mpsc, time::timeout};

use crate::{
    events::{dedup::RecentEventIds, envelope::Envelope, event_types::OrderEvent},
    reconciler::{OrderReconciler, ReconcileError},
    traits::OrderStore,
};

/// How many envelopes may be queued before producers start feeling backpressure.
pub const DEFAULT_QUEUE_SIZE: usize = 512;
/// How long the worker waits on storage before giving up on an event.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventQueueError {
    #[error("The event queue is full. The delivery was not accepted.")]
    QueueFull,
    #[error("The event worker has shut down. No further deliveries can be queued.")]
    WorkerGone,
}

/// The sending half of the event queue. Cheap to clone and safe to share across request handlers.
#[derive(Debug, Clone)]
pub struct EventProducer {
    sender: mpsc::Sender<Envelope>,
}

impl EventProducer {
    pub fn new(sender: mpsc::Sender<Envelope>) -> Self {
        Self { sender }
    }

    /// Queues an envelope for processing, waiting for a slot when the queue is full. This is the call the webhook
    /// endpoint makes, so a slow store ultimately slows down acknowledgements rather than losing deliveries.
    pub async fn enqueue(&self, envelope: Envelope) -> Result<(), EventQueueError> {
        self.sender.send(envelope).await.map_err(|_| EventQueueError::WorkerGone)
    }

    /// Queues an envelope without waiting. Callers that cannot block get [`EventQueueError::QueueFull`] back and
    /// must decide for themselves whether to drop or retry.
    pub fn try_enqueue(&self, envelope: Envelope) -> Result<(), EventQueueError> {
        self.sender.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EventQueueError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => EventQueueError::WorkerGone,
        })
    }
}

/// The consuming half of the event queue.
///
/// Exactly one worker runs per pipeline. It pulls envelopes off the queue in arrival order, skips deliveries it has
/// seen recently, decodes the rest and applies them through the reconciler. Nothing an envelope contains can panic
/// the worker. Bad payloads and store failures are logged and the loop moves on to the next delivery.
pub struct EventWorker<B> {
    receiver: mpsc::Receiver<Envelope>,
    recent_ids: RecentEventIds,
    reconciler: OrderReconciler<B>,
    store_timeout: Duration,
}

impl<B> EventWorker<B>
where B: OrderStore
{
    pub fn new(
        receiver: mpsc::Receiver<Envelope>,
        reconciler: OrderReconciler<B>,
        dedup_capacity: usize,
        store_timeout: Duration,
    ) -> Self {
        Self { receiver, recent_ids: RecentEventIds::new(dedup_capacity), reconciler, store_timeout }
    }

    /// Runs the event loop until every producer has been dropped and the queue has been drained.
    pub async fn run(mut self) {
        debug!(
            "📬️ Event worker started. Remembering the last {} delivery ids, store timeout {}s.",
            self.recent_ids.capacity(),
            self.store_timeout.as_secs()
        );
        while let Some(envelope) = self.receiver.recv().await {
            self.process(envelope).await;
        }
        info!("📬️ Event queue closed. The event worker is shutting down.");
    }

    async fn process(&mut self, envelope: Envelope) {
        let event_id = envelope.event_id().to_string();
        if self.recent_ids.contains(&event_id) {
            debug!("📬️ Skipping duplicate delivery {event_id} ({envelope})");
            return;
        }
        // Record the id up front so that a duplicate arriving while we are busy with the store is still caught.
        self.recent_ids.add(&event_id);
        let event = match OrderEvent::decode(&envelope) {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!("📬️ Ignoring delivery for unhandled topic ({envelope})");
                return;
            },
            Err(e) => {
                warn!("📬️ Dropping malformed delivery {event_id}. {e}");
                return;
            },
        };
        let description = event.to_string();
        match timeout(self.store_timeout, self.apply(event)).await {
            Ok(Ok(())) => debug!("📬️ Processed {description} from {}", envelope.shop()),
            Ok(Err(e)) => error!("📬️ Could not apply {description}. The event has been dropped. {e}"),
            Err(_) => error!(
                "📬️ Storage did not respond within {}s while applying {description}. The event has been dropped.",
                self.store_timeout.as_secs()
            ),
        }
    }

    async fn apply(&self, event: OrderEvent) -> Result<(), ReconcileError> {
        match event {
            OrderEvent::Created(snapshot) => self.reconciler.on_order_created(snapshot).await.map(|_| ()),
            OrderEvent::Updated(snapshot) => self.reconciler.on_order_updated(snapshot).await.map(|_| ()),
            OrderEvent::Fulfilled(snapshot) => self.reconciler.on_order_fulfilled(snapshot).await.map(|_| ()),
            OrderEvent::Paid(snapshot) => self.reconciler.on_order_paid(snapshot).await.map(|_| ()),
            OrderEvent::Cancelled(snapshot) => self.reconciler.on_order_cancelled(snapshot).await.map(|_| ()),
            OrderEvent::Deleted(id) => self.reconciler.on_order_deleted(id).await,
        }
    }
}

/// Wires up a producer/worker pair around a bounded queue.
///
/// Spawn the worker's [`EventWorker::run`] on the runtime and hand clones of the producer to whatever captures
/// deliveries. Dropping every producer closes the queue, which lets the worker drain outstanding envelopes and
/// exit cleanly.
pub fn event_pipeline<B>(
    reconciler: OrderReconciler<B>,
    queue_size: usize,
    dedup_capacity: usize,
    store_timeout: Duration,
) -> (EventProducer, EventWorker<B>)
where
    B: OrderStore,
{
    let (sender, receiver) = mpsc::channel(queue_size.max(1));
    let producer = EventProducer::new(sender);
    let worker = EventWorker::new(receiver, reconciler, dedup_capacity, store_timeout);
    (producer, worker)
}
