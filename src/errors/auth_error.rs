use crate::errors::ToolError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Catalogue credentials are not configured")]
    MissingCredentials,
    #[error("Catalogue login rejected (HTTP {status})")]
    LoginRejected { status: u16, body: String },
    #[error("Catalogue login did not return a session cookie")]
    TokensUnavailable,
    #[error("Catalogue login failed: {0}")]
    Transport(String),
}

impl From<AuthError> for ToolError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::MissingCredentials => ToolError::denied(message)
                .with_hint("Set GEONETWORK_USERNAME and GEONETWORK_PASSWORD and restart the server."),
            AuthError::LoginRejected { status, body } => ToolError::denied(message)
                .with_status(status)
                .with_body(body)
                .with_hint("Check the configured username and password."),
            AuthError::TokensUnavailable => ToolError::denied(message).with_hint(
                "The sign-in endpoint answered without a JSESSIONID cookie; check GEONETWORK_SIGNIN_URL.",
            ),
            AuthError::Transport(_) => ToolError::retryable(message),
        }
    }
}
