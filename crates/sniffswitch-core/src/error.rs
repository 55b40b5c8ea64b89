use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to connect to OBS at {address}: {message}")]
    Connection { address: String, message: String },

    #[error("Invalid game state payload: {0}")]
    Protocol(String),

    #[error("Network error: {0}")]
    Network(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Check if this error comes from a malformed or unreadable settings file
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_config() {
        assert!(Error::config("missing section [behaviour]").is_config());
        assert!(!Error::Network("timed out".into()).is_config());
        assert!(!Error::Protocol("currentState missing".into()).is_config());
    }

    #[test]
    fn test_display() {
        let err = Error::Connection {
            address: "localhost:4455".into(),
            message: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to connect to OBS at localhost:4455: connection refused"
        );
    }
}
