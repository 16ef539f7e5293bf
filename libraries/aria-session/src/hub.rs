//! Notification hub
//!
//! Single-threaded fan-out of session events to registered listeners,
//! decoupled from the posting thread. Listeners are never invoked on the
//! mutator's own stack: posts enqueue onto a FIFO channel drained by one
//! dedicated delivery thread, so events arrive in commit order.
//!
//! Each post captures a stable snapshot of the listener set, so a listener
//! added or removed mid-notification cannot corrupt an in-flight delivery.

use crate::events::SessionEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::JoinHandle;
use tracing::debug;

/// A registered listener callback
pub type Listener = std::sync::Arc<dyn Fn(&SessionEvent) + Send + Sync + 'static>;

/// Handle identifying a registered listener for later removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

enum Delivery {
    Event(SessionEvent, Vec<Listener>),
    Shutdown,
}

/// Single-consumer event fan-out with a dedicated delivery thread
pub struct NotificationHub {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
    tx: Sender<Delivery>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationHub {
    /// Create a hub and spawn its delivery thread
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<Delivery>();

        let worker = std::thread::Builder::new()
            .name("aria-notify".into())
            .spawn(move || {
                while let Ok(delivery) = rx.recv() {
                    match delivery {
                        Delivery::Event(event, snapshot) => {
                            for listener in &snapshot {
                                listener(&event);
                            }
                        }
                        Delivery::Shutdown => break,
                    }
                }
            })
            .expect("failed to spawn notification delivery thread");

        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Register a listener; returns a handle for [`Self::unsubscribe`]
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .expect("listener set poisoned")
            .push((id, std::sync::Arc::new(listener)));
        id
    }

    /// Remove a listener; false if it was never registered or already removed
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().expect("listener set poisoned");
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Post an event for delivery.
    ///
    /// The listener set is snapshotted here, at post time; delivery happens
    /// later on the hub thread, in post order.
    pub fn post(&self, event: SessionEvent) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .expect("listener set poisoned")
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        if self.tx.send(Delivery::Event(event, snapshot)).is_err() {
            debug!("notification hub already shut down, dropping event");
        }
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NotificationHub {
    fn drop(&mut self) {
        let _ = self.tx.send(Delivery::Shutdown);
        if let Some(worker) = self.worker.lock().expect("worker poisoned").take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn delivers_events_in_post_order() {
        let hub = NotificationHub::new();
        let (tx, rx) = channel();

        hub.subscribe(move |event| {
            if let SessionEvent::QueueChanged { length } = event {
                tx.send(*length).unwrap();
            }
        });

        for length in 0..50 {
            hub.post(SessionEvent::QueueChanged { length });
        }

        for expected in 0..50 {
            let got = rx.recv_timeout(Duration::from_secs(2)).unwrap();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn never_delivers_on_the_posting_thread() {
        let hub = NotificationHub::new();
        let (tx, rx) = channel();
        let poster = std::thread::current().id();

        hub.subscribe(move |_| {
            tx.send(std::thread::current().id()).unwrap();
        });

        hub.post(SessionEvent::FavoriteChanged);

        let delivery_thread = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_ne!(delivery_thread, poster);
    }

    #[test]
    fn unsubscribe_stops_future_deliveries() {
        let hub = NotificationHub::new();
        let (tx, rx) = channel();

        let id = hub.subscribe(move |_| {
            tx.send(()).unwrap();
        });

        hub.post(SessionEvent::FavoriteChanged);
        rx.recv_timeout(Duration::from_secs(2)).unwrap();

        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));

        hub.post(SessionEvent::FavoriteChanged);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn listener_removed_after_post_still_sees_inflight_event() {
        let hub = Arc::new(NotificationHub::new());
        let (tx, rx) = channel();

        // A listener that blocks the delivery thread long enough for the
        // unsubscribe below to race with delivery
        let gate = Arc::new(std::sync::Barrier::new(2));
        let gate_clone = gate.clone();
        hub.subscribe(move |_| {
            gate_clone.wait();
        });

        let id = hub.subscribe(move |_| {
            tx.send(()).unwrap();
        });

        // Snapshot taken here includes both listeners
        hub.post(SessionEvent::FavoriteChanged);

        // Remove the second listener while the first blocks delivery
        hub.unsubscribe(id);
        gate.wait();

        // The in-flight delivery still reaches the removed listener
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
    }
}
