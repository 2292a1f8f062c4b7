use std::io;

#[derive(Debug)]
pub enum IdentityError {
    /// Truncated or structurally invalid bytes
    MalformedInput(String),
    /// Version ordinal this reader does not know how to decode
    IncompatibleVersion(i16),
    /// Operation invoked on an identity missing a required field
    InvalidState(String),
    InvalidConfig(String),
    IoError(io::Error),
    SerializationError(String),
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::MalformedInput(msg) => write!(f, "Malformed input: {}", msg),
            IdentityError::IncompatibleVersion(ordinal) => {
                write!(f, "Incompatible version: unknown ordinal {}", ordinal)
            }
            IdentityError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            IdentityError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            IdentityError::IoError(err) => write!(f, "IO error: {}", err),
            IdentityError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for IdentityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IdentityError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for IdentityError {
    fn from(err: io::Error) -> Self {
        // A short read while decoding is a truncated stream, not an I/O fault.
        if err.kind() == io::ErrorKind::UnexpectedEof {
            IdentityError::MalformedInput("unexpected end of stream".to_string())
        } else {
            IdentityError::IoError(err)
        }
    }
}

impl From<toml::de::Error> for IdentityError {
    fn from(err: toml::de::Error) -> Self {
        IdentityError::SerializationError(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for IdentityError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        IdentityError::MalformedInput(format!("invalid UTF-8 string: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
