//! Tracker attachment, the observation path, and the query/assertion
//! surface.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use page_events::{
    PageEvent, PageEvents, PageId, RequestFailure, ResourceType, ResponseBody, ResponseEvent,
};

use crate::config::TrackerConfig;
use crate::errors::{ErrorCall, ErrorReport, FailedCall, TrackerError};
use crate::log::ResponseLog;
use crate::model::{FailureEntry, ObservationError, ResponseEntry};
use crate::pattern::{StatusExpectation, UrlMatch};
use crate::summary;

/// Observes a page's network traffic and retains a filtered, bounded
/// history of API-relevant responses and failures.
///
/// Attaching subscribes to the page's event stream and spawns the
/// consumer task; the tracker itself is the subscription handle.
/// [`detach`](Self::detach) releases it explicitly, and dropping the
/// tracker aborts the task. Several trackers may observe the same page;
/// each filters and stores independently.
pub struct ResponseTracker {
    state: Arc<TrackerState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ResponseTracker {
    /// Attach a tracker with default configuration.
    pub fn attach(events: &PageEvents) -> Self {
        Self::attach_with(events, TrackerConfig::default())
    }

    /// Attach a tracker to a page's event stream.
    pub fn attach_with(events: &PageEvents, config: TrackerConfig) -> Self {
        let state = Arc::new(TrackerState::new(config, events.page()));
        let cancel = CancellationToken::new();
        let task = spawn_consumer(Arc::clone(&state), events.subscribe(), cancel.clone());
        Self {
            state,
            cancel,
            task: Some(task),
        }
    }

    /// Stop consuming events and await the consumer task. Recorded data
    /// stays readable after detaching.
    pub async fn detach(&mut self) -> Result<(), tokio::task::JoinError> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(()) => Ok(()),
                Err(err) if err.is_cancelled() => Ok(()),
                Err(err) => Err(err),
            }
        } else {
            Ok(())
        }
    }

    /// True if at least one recorded response matches the pattern and,
    /// when given, the exact method.
    pub fn has_call(&self, url: impl Into<UrlMatch>, method: Option<&str>) -> bool {
        self.get_call_count(url, method) > 0
    }

    /// Number of recorded responses matching the pattern and, when
    /// given, the exact method.
    pub fn get_call_count(&self, url: impl Into<UrlMatch>, method: Option<&str>) -> usize {
        let pattern = url.into();
        self.state
            .responses
            .count_matches(|entry| entry_matches(entry, &pattern, method))
    }

    /// Parsed body of the first matching response in insertion order.
    pub fn get_response_body(
        &self,
        url: impl Into<UrlMatch>,
        method: Option<&str>,
    ) -> Option<Value> {
        let pattern = url.into();
        self.state
            .responses
            .first_match(|entry| entry_matches(entry, &pattern, method))
            .and_then(|entry| entry.body)
    }

    /// Assert that a call matching the pattern and exact method was
    /// recorded with an accepted status; returns the first such entry.
    pub fn assert_called(
        &self,
        url: impl Into<UrlMatch>,
        method: &str,
        expected: impl Into<StatusExpectation>,
    ) -> Result<ResponseEntry, TrackerError> {
        let pattern = url.into();
        let expected = expected.into();
        let entry = self
            .state
            .responses
            .first_match(|entry| entry_matches(entry, &pattern, Some(method)))
            .ok_or_else(|| TrackerError::NotCalled {
                pattern: pattern.to_string(),
                method: method.to_string(),
            })?;
        if !expected.accepts(entry.status) {
            return Err(TrackerError::UnexpectedStatus {
                pattern: pattern.to_string(),
                method: method.to_string(),
                url: entry.url.clone(),
                actual: entry.status,
                expected,
            });
        }
        Ok(entry)
    }

    /// Assert that no error-status responses or request failures were
    /// recorded. Every offender is reported before the error is
    /// returned.
    pub fn assert_no_errors(&self) -> Result<(), TrackerError> {
        let mut report = ErrorReport::default();
        for entry in self.state.responses.snapshot() {
            if entry.status >= 400 {
                error!(
                    target: "response-tracker",
                    method = %entry.method,
                    url = %entry.url,
                    status = entry.status,
                    "error response recorded"
                );
                report.error_responses.push(ErrorCall {
                    method: entry.method,
                    url: entry.url,
                    status: entry.status,
                });
            }
        }
        for failure in self.state.failures.lock().iter() {
            error!(
                target: "response-tracker",
                method = %failure.method,
                url = %failure.url,
                reason = %failure.failure,
                "request failure recorded"
            );
            report.failures.push(FailedCall {
                method: failure.method.clone(),
                url: failure.url.clone(),
                reason: failure.failure.clone(),
            });
        }
        if report.is_empty() {
            Ok(())
        } else {
            Err(TrackerError::ErrorsObserved(report))
        }
    }

    /// Snapshot of recorded responses in insertion order.
    pub fn responses(&self) -> Vec<ResponseEntry> {
        self.state.responses.snapshot()
    }

    /// Snapshot of recorded request failures.
    pub fn failures(&self) -> Vec<FailureEntry> {
        self.state.failures.lock().clone()
    }

    /// Internal errors recovered on the observation path.
    pub fn observation_errors(&self) -> Vec<ObservationError> {
        self.state.observation_errors.lock().clone()
    }

    /// Clear the response and failure logs in place; the subscription
    /// stays attached and new events continue to be captured.
    pub fn reset(&self) {
        self.state.responses.clear();
        self.state.failures.lock().clear();
    }

    /// Grouped per-call counts rendered for human consumption.
    pub fn summary(&self, title: Option<&str>) -> String {
        summary::render(
            title,
            &self.state.config.api_host,
            &self.state.responses.snapshot(),
        )
    }

    /// Emit the summary through the diagnostic log.
    pub fn print_summary(&self, title: Option<&str>) {
        info!(target: "response-tracker", page = ?self.state.page, "{}", self.summary(title));
    }

    /// Readable form of a URL as it appears in summaries. Cosmetic only;
    /// match semantics never use it.
    pub fn simplify_url(&self, url: &str) -> String {
        summary::simplify_url(url, &self.state.config.api_host)
    }
}

impl Drop for ResponseTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn spawn_consumer(
    state: Arc<TrackerState>,
    mut rx: broadcast::Receiver<PageEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Ok(PageEvent::Response(response)) => state.handle_response(response),
                    Ok(PageEvent::RequestFailed(failure)) => state.handle_failure(failure),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            target: "response-tracker",
                            page = ?state.page,
                            skipped,
                            "subscriber lagged; events lost"
                        );
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    })
}

fn entry_matches(entry: &ResponseEntry, pattern: &UrlMatch, method: Option<&str>) -> bool {
    if !pattern.matches(&entry.url) {
        return false;
    }
    // Method comparison is exact; call sites use canonical uppercase verbs.
    method.map_or(true, |expected| entry.method == expected)
}

struct TrackerState {
    config: TrackerConfig,
    page: PageId,
    responses: ResponseLog,
    failures: Mutex<Vec<FailureEntry>>,
    observation_errors: Mutex<Vec<ObservationError>>,
}

impl TrackerState {
    fn new(config: TrackerConfig, page: PageId) -> Self {
        Self {
            responses: ResponseLog::new(config.max_responses),
            failures: Mutex::new(Vec::new()),
            observation_errors: Mutex::new(Vec::new()),
            page,
            config,
        }
    }

    /// Boundary around the fallible observation path: errors land in the
    /// internal log and never propagate out of the consumer task.
    fn handle_response(&self, event: ResponseEvent) {
        if !self.is_relevant(&event) {
            return;
        }
        if let Err(err) = self.observe_response(event) {
            warn!(
                target: "response-tracker",
                page = ?self.page,
                %err,
                "response observation failed"
            );
            self.observation_errors.lock().push(ObservationError {
                timestamp: Utc::now(),
                message: err.to_string(),
            });
        }
    }

    fn is_relevant(&self, event: &ResponseEvent) -> bool {
        if !event.url.contains(&self.config.api_host) {
            return false;
        }
        !self.config.api_resource_types_only || event.resource_type.is_api_initiated()
    }

    fn observe_response(&self, event: ResponseEvent) -> Result<(), ObserveError> {
        let mut entry = ResponseEntry {
            is_ok: (200..300).contains(&event.status),
            url: event.url,
            method: event.method,
            status: event.status,
            status_text: event.status_text,
            headers: event.headers,
            timestamp: Utc::now(),
            body: None,
            body_error: None,
            body_text: None,
        };

        let mut deferred = None;
        if self.config.capture_body && is_json(&entry) {
            match event.body {
                ResponseBody::Bytes(bytes) => match serde_json::from_slice(&bytes) {
                    Ok(value) => entry.body = Some(value),
                    Err(err) => {
                        entry.body_error = Some(err.to_string());
                        // Non-UTF-8 payloads lose the text fallback too.
                        entry.body_text = String::from_utf8(bytes).ok();
                    }
                },
                ResponseBody::Unavailable { reason } => {
                    deferred = Some(ObserveError::BodyUnavailable {
                        url: entry.url.clone(),
                        reason,
                    });
                }
                ResponseBody::Omitted => {}
            }
        }

        if entry.status >= 400 {
            warn!(
                target: "response-tracker",
                method = %entry.method,
                url = %entry.url,
                status = entry.status,
                "api returned error status"
            );
        }

        self.responses.push(entry);

        match deferred {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn handle_failure(&self, failure: RequestFailure) {
        // Single-page-app navigations abort in-flight loads; expected,
        // not tracked.
        if failure.reason.contains("ERR_ABORTED") {
            return;
        }
        if failure.resource_type == ResourceType::Image {
            return;
        }
        if !failure.url.contains(&self.config.api_host) {
            return;
        }
        warn!(
            target: "response-tracker",
            method = %failure.method,
            url = %failure.url,
            reason = %failure.reason,
            "request failed"
        );
        self.failures.lock().push(FailureEntry {
            url: failure.url,
            method: failure.method,
            failure: failure.reason,
            timestamp: Utc::now(),
        });
    }
}

fn is_json(entry: &ResponseEntry) -> bool {
    entry
        .header("content-type")
        .map(|value| value.contains("application/json"))
        .unwrap_or(false)
}

#[derive(Debug, Error)]
enum ObserveError {
    #[error("body for {url} could not be read: {reason}")]
    BodyUnavailable { url: String, reason: String },
}
