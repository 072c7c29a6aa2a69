use std::fmt;

/// Result type alias for Cadence core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Cadence core operations
#[derive(Debug)]
pub enum Error {
    /// Unrecognized input while lexing a schedule expression
    Tokenizer { position: usize, message: String },

    /// Structural violation of the schedule grammar
    Parser { position: usize, message: String },

    /// Configuration errors
    Config(String),

    /// Other errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Tokenizer { position, message } => {
                write!(f, "Schedule tokenizer error at offset {position}: {message}")
            }
            Error::Parser { position, message } => {
                write!(f, "Schedule parser error at offset {position}: {message}")
            }
            Error::Config(msg) => write!(f, "Configuration error: {msg}"),
            Error::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_position() {
        let err = Error::Parser {
            position: 7,
            message: "expected a time unit".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("offset 7"), "got: {text}");
        assert!(text.contains("expected a time unit"));
    }
}
