//! Error types for Riskwise core services.
//!
//! Uses `thiserror` for public API error types. Service callers see three
//! kinds of failure: validation (bad request), not-found, and computation
//! (an engine result that violated its preconditions). Storage and
//! configuration errors are wrapped alongside them.

/// Top-level error type for the Riskwise core library.
#[derive(Debug, thiserror::Error)]
pub enum RiskwiseError {
    /// Missing or malformed required fields, or an unrecognized method/format.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No record with the requested identifier.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The engine produced an unusable result.
    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Register error: {0}")]
    Register(#[from] RegisterError),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RiskwiseError {
    /// Message safe to show to API clients.
    ///
    /// Validation and not-found messages are user-facing already. Computation
    /// detail is truncated; everything else is replaced by a generic message.
    pub fn client_message(&self) -> String {
        match self {
            RiskwiseError::Validation(msg) | RiskwiseError::NotFound(msg) => msg.clone(),
            RiskwiseError::Computation(msg) => {
                format!("Error durante el cálculo: {}", truncate(msg, MAX_DETAIL_CHARS))
            }
            _ => "Error interno del servidor".to_string(),
        }
    }
}

/// Longest error detail passed through to clients.
const MAX_DETAIL_CHARS: usize = 200;

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Errors from risk register storage backends.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("register I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("register file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("register lock poisoned")]
    LockPoisoned,
}

/// Result type alias using [`RiskwiseError`].
pub type Result<T> = std::result::Result<T, RiskwiseError>;
