//! Failure types for one polling cycle.
//!
//! Every variant is recoverable: the poll loop logs it and treats the cycle as
//! having produced no usable data.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Connect/read timeout, DNS failure, non-2xx status or any other transport error.
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid feed endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("could not read local feed '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse failure: {0}")]
    Parse(#[from] ParseFailure),
}

impl FeedError {
    /// Short machine-readable tag used in cycle records.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Network(_) | FeedError::InvalidEndpoint { .. } | FeedError::Io { .. } => {
                "fetch_error"
            }
            FeedError::Parse(_) => "parse_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("feed is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("feed is not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// `index` is the position of the `Bus` element in the document, counting skipped ones.
    #[error("Bus element #{index} has no <{field}> field")]
    MissingField { index: usize, field: &'static str },

    /// The field element is present but has no text, e.g. `<RouteColor/>`.
    #[error("Bus element #{index} has an empty <{field}> field")]
    EmptyField { index: usize, field: &'static str },

    #[error("Bus element #{index} has a non-numeric {field} '{value}'")]
    InvalidCoordinate {
        index: usize,
        field: &'static str,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        let parse = FeedError::from(ParseFailure::MissingField {
            index: 0,
            field: "latitude",
        });
        assert_eq!(parse.kind(), "parse_error");

        let endpoint = FeedError::InvalidEndpoint {
            endpoint: "nope".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert_eq!(endpoint.kind(), "fetch_error");
    }

    #[test]
    fn test_missing_field_message_names_field() {
        let err = ParseFailure::MissingField {
            index: 3,
            field: "RouteColor",
        };
        assert_eq!(err.to_string(), "Bus element #3 has no <RouteColor> field");
    }
}
