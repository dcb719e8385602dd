//! Error types for the isochrone library
//!
//! Every failure inside the computation surfaces here; nothing is logged and dropped.

use strsim::{jaro_winkler, normalized_levenshtein};
use thiserror::Error;

/// Broad classification of a failure, used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing origin, intervals or options
    Validation,
    /// HTTP status, content type, connectivity or body decoding failures
    Transport,
    /// The provider answered but reported a failure code
    Provider,
    /// Hull construction or polygon operations failed
    Geometry,
}

/// Main error type for isochrone computations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration or parameters, detected before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider answered with a non-200 status
    #[error("invalid statusCode({status}) from server for {url}")]
    HttpStatus { status: u16, url: String },

    /// The provider answered without a JSON content type
    #[error("{0}")]
    ContentType(String),

    /// Connection, timeout or other transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// The provider body could not be decoded
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// The provider's own status code indicates failure
    #[error("Routing provider returned code '{code}'{}", provider_detail(.message))]
    Provider { code: String, message: Option<String> },

    /// Degenerate geometry in hull construction or boolean operations
    #[error("Geometry error: {0}")]
    Geometry(String),
}

fn provider_detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl Error {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::Validation,
            Error::HttpStatus { .. }
            | Error::ContentType(_)
            | Error::Network(_)
            | Error::MalformedResponse(_) => ErrorKind::Transport,
            Error::Provider { .. } => ErrorKind::Provider,
            Error::Geometry(_) => ErrorKind::Geometry,
        }
    }

    /// True when the caller supplied bad input
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Error::HttpStatus {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else if err.is_decode() {
            Error::MalformedResponse(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedResponse(err.to_string())
    }
}

/// Convenience result type for isochrone operations
pub type Result<T> = std::result::Result<T, Error>;

/// Suggest the closest known name for a misspelled one
///
/// Scores candidates with 70% Jaro-Winkler and 30% normalized Levenshtein and
/// returns the best candidate above 0.7. An exact case-insensitive match yields
/// `None` because nothing needs correcting.
pub fn suggest_correction(input: &str, candidates: &[&str]) -> Option<String> {
    let input_lower = input.to_lowercase();
    if candidates.iter().any(|c| c.eq_ignore_ascii_case(&input_lower)) {
        return None;
    }

    let mut best_match = None;
    let mut best_score = 0.7f64;

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();
        let score = jaro_winkler(&input_lower, &candidate_lower) * 0.7
            + normalized_levenshtein(&input_lower, &candidate_lower) * 0.3;

        if score > best_score {
            best_score = score;
            best_match = Some(candidate.to_string());
        }
    }

    best_match
}

/// Build an "unknown name" validation error with a suggestion when one exists
pub(crate) fn unknown_name(what: &str, input: &str, candidates: &[&str]) -> Error {
    match suggest_correction(input, candidates) {
        Some(suggestion) => Error::InvalidInput(format!(
            "Invalid {what}: {input}. Did you mean '{suggestion}'?"
        )),
        None => Error::InvalidInput(format!(
            "Invalid {what}: {input}. Use one of: {}",
            candidates.join(", ")
        )),
    }
}
