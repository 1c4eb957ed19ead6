//! Error types for the form composition engine

use thiserror::Error;

/// Configuration errors surfaced while binding a page.
///
/// These are reported once, at bind time. The component that hit the error
/// is left unbound; every other component still binds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormworkError {
    /// Formset has no template element to clone rows from
    #[error("Formset '{formset_id}' has no template element '#{template_id}'")]
    MissingTemplate {
        formset_id: String,
        template_id: String,
    },

    /// Two live rows of the same formset claim the same index
    #[error("Formset '{prefix}' has more than one row with index {index}")]
    IndexCollision { prefix: String, index: usize },

    /// Formset prefix cannot be turned into an index pattern
    #[error("Invalid formset prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: String },

    /// Row field identity does not embed a usable index
    #[error("Element '{id}' does not embed a row index for prefix '{prefix}'")]
    MissingRowIndex { prefix: String, id: String },

    /// Inline label lookup JSON could not be parsed
    #[error("Malformed lookup in attribute '{attribute}': {reason}")]
    MalformedLookup { attribute: String, reason: String },

    /// Decorated field points at a linked field that does not exist
    #[error("Linked field '#{id}' not found")]
    MissingLinkedField { id: String },

    /// Links need a submission form and the page has none
    #[error("Submission form '#{id}' not found")]
    MissingPostForm { id: String },

    /// A binding references a table the store does not hold
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// A binding references an element that does not exist
    #[error("Element '#{0}' not found")]
    MissingElement(String),

    /// Required attribute missing on a bound element
    #[error("Element '{element}' is missing attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },
}

/// Errors from the remote schema endpoint
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request could not be sent or did not complete
    #[error("Request failed: {0}")]
    Request(String),

    /// Endpoint answered with a non-success status
    #[error("Endpoint returned status {status}")]
    Status { status: u16 },

    /// Response body was not a valid schema
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Failure reported by the cosmetic enhancement collaborator
#[derive(Debug, Error)]
#[error("Enhancement failed: {0}")]
pub struct EnhanceError(pub String);

pub type FormworkResult<T> = Result<T, FormworkError>;
