//! Errors raised by the tracker's assertion methods.

use std::fmt;

use thiserror::Error;

use crate::pattern::StatusExpectation;

/// One error-status response referenced by an [`ErrorReport`].
#[derive(Clone, Debug)]
pub struct ErrorCall {
    pub method: String,
    pub url: String,
    pub status: u16,
}

/// One request failure referenced by an [`ErrorReport`].
#[derive(Clone, Debug)]
pub struct FailedCall {
    pub method: String,
    pub url: String,
    pub reason: String,
}

/// Every offender found by `assert_no_errors`, enumerated so the test
/// report names each call rather than just a count.
#[derive(Clone, Debug, Default)]
pub struct ErrorReport {
    pub error_responses: Vec<ErrorCall>,
    pub failures: Vec<FailedCall>,
}

impl ErrorReport {
    pub fn is_empty(&self) -> bool {
        self.error_responses.is_empty() && self.failures.is_empty()
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error response(s), {} request failure(s)",
            self.error_responses.len(),
            self.failures.len()
        )?;
        for call in &self.error_responses {
            write!(f, "; {} {} -> {}", call.method, call.url, call.status)?;
        }
        for failure in &self.failures {
            write!(
                f,
                "; failed {} {} ({})",
                failure.method, failure.url, failure.reason
            )?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Error)]
pub enum TrackerError {
    #[error("no {method} call matching `{pattern}` was recorded")]
    NotCalled { pattern: String, method: String },
    #[error("{method} call matching `{pattern}` ({url}) responded {actual}, expected {expected}")]
    UnexpectedStatus {
        pattern: String,
        method: String,
        url: String,
        actual: u16,
        expected: StatusExpectation,
    },
    #[error("api errors were recorded: {0}")]
    ErrorsObserved(ErrorReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_enumerates_every_offender() {
        let report = ErrorReport {
            error_responses: vec![ErrorCall {
                method: "GET".to_string(),
                url: "https://fakestoreapi.com/products".to_string(),
                status: 500,
            }],
            failures: vec![FailedCall {
                method: "POST".to_string(),
                url: "https://fakestoreapi.com/carts".to_string(),
                reason: "net::ERR_FAILED".to_string(),
            }],
        };
        let rendered = TrackerError::ErrorsObserved(report).to_string();
        assert!(rendered.contains("GET https://fakestoreapi.com/products -> 500"));
        assert!(rendered.contains("failed POST https://fakestoreapi.com/carts (net::ERR_FAILED)"));
    }
}
