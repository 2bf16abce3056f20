//! Event payloads emitted for a page's network traffic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Resource type of the request that produced a network event.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Script,
    Xhr,
    Fetch,
    #[serde(other)]
    Other,
}

impl ResourceType {
    /// True for requests initiated by application code rather than the
    /// document loader.
    pub fn is_api_initiated(self) -> bool {
        matches!(self, ResourceType::Xhr | ResourceType::Fetch)
    }
}

/// Payload attached to a response event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ResponseBody {
    /// The runtime did not attach a payload.
    Omitted,
    /// Raw payload bytes as delivered on the wire.
    Bytes(Vec<u8>),
    /// The payload could not be read back from the runtime.
    Unavailable { reason: String },
}

impl ResponseBody {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }
}

/// One completed HTTP response observed on a page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseEvent {
    pub url: String,
    pub method: String,
    pub resource_type: ResourceType,
    pub status: u16,
    pub status_text: String,
    /// Header names and values exactly as received.
    pub headers: HashMap<String, String>,
    pub body: ResponseBody,
}

/// One network-level request failure observed on a page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestFailure {
    pub url: String,
    pub method: String,
    pub resource_type: ResourceType,
    /// Failure reason as reported by the runtime, e.g. `net::ERR_ABORTED`.
    pub reason: String,
}

/// Events fanned out by [`PageEvents`](crate::PageEvents).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PageEvent {
    Response(ResponseEvent),
    RequestFailed(RequestFailure),
}
