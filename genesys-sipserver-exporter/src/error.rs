//! Error types for the scrape pipeline.

use thiserror::Error;

/// Malformed status document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid UTF-8 in element or attribute name")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Document has no root element")]
    NoRoot,

    #[error("Document has more than one root element")]
    MultipleRoots,

    #[error("Element <{0}> is not closed")]
    Unclosed(String),

    #[error("Unexpected closing tag </{0}>")]
    UnexpectedEnd(String),
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        ParseError::Xml(e.into())
    }
}

/// Failure to obtain a usable status document from a target.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed status document: {0}")]
    Parse(#[from] ParseError),
}

/// The status document does not match the expected schema.
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("Required node '{0}' not found")]
    MissingNode(String),

    #[error("Node '{path}' has no '{attribute}' attribute")]
    MissingAttribute { path: String, attribute: String },

    #[error("Node '{path}' has non-numeric value '{value}'")]
    InvalidNumber { path: String, value: String },
}

/// Metric families could not be rendered.
#[derive(Debug, Error, PartialEq)]
pub enum EncodingError {
    #[error("Metric '{name}' has {expected} label names but a sample with {actual} values")]
    LabelArity {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Scrape-level failure for one target.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}
