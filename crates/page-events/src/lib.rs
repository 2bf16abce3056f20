//! Typed page network events and the in-process hub that fans them out.
//!
//! The hub carries the `response` / `request-failed` stream of a single
//! page. Subscribers each observe the full stream independently; the hub
//! never filters or reorders, so any relevance decision belongs to the
//! consumer.

pub mod model;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

pub use model::{PageEvent, RequestFailure, ResourceType, ResponseBody, ResponseEvent};

/// Identifier of the page whose traffic is being observed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Errors surfaced by the hub.
#[derive(Clone, Debug, Error)]
pub enum PageEventError {
    #[error("no live subscribers")]
    Closed,
}

/// In-process fan-out of one page's network events.
pub struct PageEvents {
    page: PageId,
    sender: broadcast::Sender<PageEvent>,
}

impl PageEvents {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self {
            page: PageId::new(),
            sender,
        })
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    /// Deliver an event to all current subscribers.
    pub fn publish(&self, event: PageEvent) -> Result<(), PageEventError> {
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|_| PageEventError::Closed)
    }

    /// Independent subscription; slow subscribers may observe `Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn response(url: &str) -> PageEvent {
        PageEvent::Response(ResponseEvent {
            url: url.to_string(),
            method: "GET".to_string(),
            resource_type: ResourceType::Fetch,
            status: 200,
            status_text: "OK".to_string(),
            headers: HashMap::new(),
            body: ResponseBody::Omitted,
        })
    }

    #[tokio::test]
    async fn fan_out_reaches_every_subscriber() {
        let hub = PageEvents::new(8);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.publish(response("https://fakestoreapi.com/products"))
            .expect("publish");

        for rx in [&mut first, &mut second] {
            match rx.recv().await.expect("receive") {
                PageEvent::Response(event) => {
                    assert_eq!(event.url, "https://fakestoreapi.com/products")
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_an_error() {
        let hub = PageEvents::new(8);
        let err = hub
            .publish(response("https://fakestoreapi.com/products"))
            .expect_err("no subscribers");
        assert!(matches!(err, PageEventError::Closed));
    }

    #[test]
    fn unknown_resource_types_deserialize_to_other() {
        let parsed: ResourceType = serde_json::from_str("\"websocket\"").expect("deserialize");
        assert_eq!(parsed, ResourceType::Other);
        assert!(!parsed.is_api_initiated());
    }
}
