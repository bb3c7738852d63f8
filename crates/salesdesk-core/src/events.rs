//! Client-wide notifications.
//!
//! Anything that holds state derived from the session (cached lists, a copy
//! of the access token, a logged-in banner) subscribes here:
//!
//! - `LoginRequired` is published when the session is invalidated; the host
//!   should route the user back to login.
//! - `Reinitialize` is published shortly after a token refresh; subscribers
//!   drop cached state and rebuild it from the current session.

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::debug;

/// Events are tiny and rare; lagging subscribers only lose old signals.
const EVENT_BUFFER_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    LoginRequired { reason: String },
    Reinitialize,
}

/// Broadcast bus for `ClientEvent`s. Clone is cheap and shares the channel.
#[derive(Clone)]
pub struct ClientEvents {
    tx: broadcast::Sender<ClientEvent>,
}

impl ClientEvents {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: ClientEvent) {
        // Err only means nobody is listening right now
        if self.tx.send(event.clone()).is_err() {
            debug!(?event, "No subscribers for client event");
        }
    }

    pub fn login_required(&self, reason: impl Into<String>) {
        self.publish(ClientEvent::LoginRequired {
            reason: reason.into(),
        });
    }

    /// Publish `Reinitialize` after `delay` from a background task.
    pub fn schedule_reinitialize(&self, delay: Duration) {
        let events = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("Publishing client reinitialize");
            events.publish(ClientEvent::Reinitialize);
        });
    }
}

impl Default for ClientEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_login_required_reaches_every_subscriber() {
        let events = ClientEvents::new();
        let mut a = events.subscribe();
        let mut b = events.subscribe();

        events.login_required("signed out");

        let expected = ClientEvent::LoginRequired {
            reason: "signed out".to_string(),
        };
        assert_eq!(a.recv().await.expect("event"), expected);
        assert_eq!(b.recv().await.expect("event"), expected);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_harmless() {
        let events = ClientEvents::new();
        events.publish(ClientEvent::Reinitialize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reinitialize_waits_for_delay() {
        let events = ClientEvents::new();
        let mut rx = events.subscribe();

        events.schedule_reinitialize(Duration::from_millis(100));
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(150)).await;
        let event = rx.recv().await.expect("event");
        assert_eq!(event, ClientEvent::Reinitialize);
    }
}
