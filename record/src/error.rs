//! Error types for record operations.

use thiserror::Error;

/// Boxed error returned by [`RemoteApi`](crate::RemoteApi) implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All possible errors from a record.
#[derive(Debug, Error)]
pub enum Error {
    // Sync errors
    #[error("record not found in {application_id}/{table_id}")]
    RecordNotFound {
        application_id: String,
        table_id: String,
    },

    #[error("no remote client bound to record")]
    ClientUnbound,

    // Decoding errors
    #[error("json argument must be an object or a valid JSON string: {0}")]
    TypeMismatch(String),

    // Passed through from the remote client untouched
    #[error(transparent)]
    Remote(#[from] BoxError),
}

impl Error {
    /// Whether this is the not-found outcome of a load.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::RecordNotFound { .. })
    }

    /// Borrow the remote client's error, if this wraps one.
    pub fn remote(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Remote(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Result type for record operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("quota exceeded")]
    struct QuotaExceeded;

    #[test]
    fn error_display() {
        let err = Error::RecordNotFound {
            application_id: "app1".into(),
            table_id: "tbl1".into(),
        };
        assert_eq!(err.to_string(), "record not found in app1/tbl1");
        assert!(err.is_not_found());

        let err = Error::TypeMismatch("expected object, got number".into());
        assert_eq!(
            err.to_string(),
            "json argument must be an object or a valid JSON string: expected object, got number"
        );
    }

    #[test]
    fn remote_error_is_transparent() {
        let err = Error::from(Box::new(QuotaExceeded) as BoxError);
        assert_eq!(err.to_string(), "quota exceeded");
        assert!(!err.is_not_found());

        let inner = err.remote().unwrap();
        assert!(inner.downcast_ref::<QuotaExceeded>().is_some());
    }
}
