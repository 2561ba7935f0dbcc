//! Error types for the beacon-core crate.

use thiserror::Error;

/// Top-level error type for all beacon-core operations.
///
/// Storage unavailability and refused writes are deliberately *not* errors:
/// the engine degrades to in-memory identity and keeps tracking. Only
/// conditions the embedding application must fix (bad configuration,
/// unreadable config files) surface here.
#[derive(Debug, Error)]
pub enum BeaconError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience Result alias that defaults to [`BeaconError`].
pub type Result<T> = std::result::Result<T, BeaconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = BeaconError::Config("namespace must not be empty".into());
        assert_eq!(
            err.to_string(),
            "configuration error: namespace must not be empty"
        );
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = BeaconError::from(io_err);
        assert!(matches!(err, BeaconError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: Result<i32> = Err(BeaconError::Config("bad".into()));
        assert!(err.is_err());
    }
}
