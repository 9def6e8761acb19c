use thiserror::Error;

/// Failure taxonomy shared by the identity store, credential vault,
/// device-flow authenticator and connectivity manager.
#[derive(Debug, Error)]
pub enum Error {
    /// Local disk or platform keystore unavailable. Callers degrade to
    /// in-memory or alternate storage instead of aborting.
    #[error("storage unavailable: {0}")]
    Storage(String),

    /// Non-2xx response from the backend.
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// Network-level failure (connect, timeout, broken body).
    #[error("transport failure: {0}")]
    Transport(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("device authorization expired; run `cyberwave login` to retry")]
    Expired,

    #[error("device authorization was denied")]
    Denied,

    #[error("not authenticated; run `cyberwave login`")]
    NotAuthenticated,
}

impl Error {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }
}
