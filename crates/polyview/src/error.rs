use std::io;

/// Viewer related errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The server answered with a non-2xx status. `message` is the server's
    /// `{"error": ...}` text when it sent one.
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("build parameter: unimplemented parameter type: {0}")]
    UnimplementedParameterType(String),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("live link error: {0}")]
    Live(#[from] roomlink::Error),

    #[error("generic error: {0}")]
    Generic(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

impl Error {
    /// Text suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            Error::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
