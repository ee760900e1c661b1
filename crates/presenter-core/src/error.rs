//! Unified error type for iiif-presenter.
//!
//! Provider, cache and image-service failures are all represented here so the
//! engine can decide which ones degrade a descriptor and which ones surface to
//! the caller. [`Error::http_status`] gives the server its response code.

use std::fmt;

/// Unified error type covering all failure modes in iiif-presenter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A provider API could not be reached or answered with a failure status.
    #[error("Provider unavailable [{provider}]: {message}")]
    ProviderUnavailable {
        /// Handler tag or service name.
        provider: String,
        /// Human-readable error description.
        message: String,
    },

    /// A provider answered, but the payload could not be interpreted.
    #[error("Malformed response [{provider}]: {message}")]
    MalformedResponse {
        /// Handler tag or service name.
        provider: String,
        /// Human-readable error description.
        message: String,
    },

    /// The manifest cache backend failed.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Neither an id nor a URL could be mapped to a source.
    #[error("Unresolvable source: {0}")]
    UnresolvableSource(String),

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "manifest", "entity").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested operation exists but is not served by this build.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::ProviderUnavailable { .. } => 502,
            Error::MalformedResponse { .. } => 502,
            Error::CacheUnavailable(_) => 503,
            Error::UnresolvableSource(_) => 422,
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::NotImplemented(_) => 501,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::ProviderUnavailable`].
    pub fn provider(provider: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::ProviderUnavailable {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::MalformedResponse`].
    pub fn malformed(provider: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::MalformedResponse {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::malformed("json", err)
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_display() {
        let err = Error::provider("flickr", "status 503");
        assert_eq!(err.to_string(), "Provider unavailable [flickr]: status 503");
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn malformed_display() {
        let err = Error::malformed("met", "missing primaryImage");
        assert_eq!(err.to_string(), "Malformed response [met]: missing primaryImage");
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn not_found_display() {
        let err = Error::not_found("manifest", "gh:a/b/c.jpg");
        assert_eq!(err.to_string(), "manifest not found: gh:a/b/c.jpg");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn not_implemented_maps_to_501() {
        let err = Error::NotImplemented("presentation 2".into());
        assert_eq!(err.http_status(), 501);
    }

    #[test]
    fn cache_unavailable_maps_to_503() {
        assert_eq!(Error::CacheUnavailable("disk full".into()).http_status(), 503);
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("gone"));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }
}
