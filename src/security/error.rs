use std::fmt;

/// Token handling error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credentials on the request.
    MissingToken,
    /// Credentials present but rejected (bad signature, expired, malformed).
    InvalidToken(String),
    /// Signing a new token failed.
    Encode(String),
    /// Signing method not supported by this authenticator.
    UnsupportedAlgorithm(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "authorization token missing"),
            AuthError::InvalidToken(reason) => write!(f, "invalid token: {reason}"),
            AuthError::Encode(reason) => write!(f, "failed to sign token: {reason}"),
            AuthError::UnsupportedAlgorithm(alg) => {
                write!(f, "unsupported signing method '{alg}', expected HS256, HS384 or HS512")
            }
        }
    }
}

impl std::error::Error for AuthError {}
