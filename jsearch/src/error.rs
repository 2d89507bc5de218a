//! Error types for the jsearch client.

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by [`crate::Client`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure, non-2xx status, or a body that is not JSON.
    #[error("request to {url} failed")]
    Http {
        /// The requested URL.
        url: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The JSON body did not have the expected shape.
    #[error("unexpected payload from {url}")]
    Decode {
        /// The requested URL.
        url: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A required top-level field was absent or `null`.
    #[error("response from {url} has no `{field}` field")]
    MissingField {
        /// The requested URL.
        url: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// Every attempt failed; carries the error of the final attempt.
    #[error("giving up on {url} after {attempts} attempts")]
    RetriesExhausted {
        /// The requested URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Error from the last attempt.
        #[source]
        last: Box<Self>,
    },

    /// The HTTP client could not be constructed.
    #[error("building HTTP client")]
    Builder(#[source] reqwest::Error),
}

impl Error {
    /// This error followed by its sources, joined with `": "`.
    pub(crate) fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(e) = source {
            out.push_str(": ");
            out.push_str(&e.to_string());
            source = e.source();
        }
        out
    }
}
