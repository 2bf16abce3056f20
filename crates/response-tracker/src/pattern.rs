//! Match arguments accepted by the query operations.

use std::fmt;

use regex::Regex;

/// URL match argument: a literal substring or a compiled pattern.
///
/// Literal fragments test containment against the stored URL; patterns
/// test a structural match. Both forms are accepted uniformly by every
/// query operation.
#[derive(Clone, Debug)]
pub enum UrlMatch {
    Literal(String),
    Pattern(Regex),
}

impl UrlMatch {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlMatch::Literal(fragment) => url.contains(fragment.as_str()),
            UrlMatch::Pattern(pattern) => pattern.is_match(url),
        }
    }
}

impl fmt::Display for UrlMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlMatch::Literal(fragment) => write!(f, "{fragment}"),
            UrlMatch::Pattern(pattern) => write!(f, "{}", pattern.as_str()),
        }
    }
}

impl From<&str> for UrlMatch {
    fn from(value: &str) -> Self {
        UrlMatch::Literal(value.to_string())
    }
}

impl From<String> for UrlMatch {
    fn from(value: String) -> Self {
        UrlMatch::Literal(value)
    }
}

impl From<Regex> for UrlMatch {
    fn from(value: Regex) -> Self {
        UrlMatch::Pattern(value)
    }
}

/// Accepted status outcome(s) for [`assert_called`].
///
/// [`assert_called`]: crate::ResponseTracker::assert_called
#[derive(Clone, Debug)]
pub enum StatusExpectation {
    One(u16),
    AnyOf(Vec<u16>),
}

impl StatusExpectation {
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            StatusExpectation::One(expected) => *expected == status,
            StatusExpectation::AnyOf(expected) => expected.contains(&status),
        }
    }
}

impl fmt::Display for StatusExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusExpectation::One(expected) => write!(f, "{expected}"),
            StatusExpectation::AnyOf(expected) => {
                let rendered: Vec<String> = expected.iter().map(u16::to_string).collect();
                write!(f, "one of [{}]", rendered.join(", "))
            }
        }
    }
}

impl From<u16> for StatusExpectation {
    fn from(value: u16) -> Self {
        StatusExpectation::One(value)
    }
}

impl From<Vec<u16>> for StatusExpectation {
    fn from(value: Vec<u16>) -> Self {
        StatusExpectation::AnyOf(value)
    }
}

impl From<&[u16]> for StatusExpectation {
    fn from(value: &[u16]) -> Self {
        StatusExpectation::AnyOf(value.to_vec())
    }
}

impl<const N: usize> From<[u16; N]> for StatusExpectation {
    fn from(value: [u16; N]) -> Self {
        StatusExpectation::AnyOf(value.to_vec())
    }
}
