use crate::config::{Credentials, GatewayConfig};
use crate::constants::session::{INFO_PATH, PRIMARY_COOKIE, SECONDARY_COOKIE};
use crate::errors::AuthError;
use crate::services::logger::Logger;
use crate::services::transport::{HttpTransport, OutboundRequest};
use crate::utils::cookies::{extract_cookie, join_cookies};
use crate::utils::text::truncate_utf8_prefix;
use std::fmt;
use std::sync::Arc;

/// Credential material for exactly one privileged tool call.
///
/// Deliberately not `Clone`: the dispatcher owns it for the duration of the
/// call and drops it afterwards.
pub struct Session {
    primary: String,
    secondary: Option<String>,
}

impl Session {
    pub fn primary_token(&self) -> &str {
        &self.primary
    }

    pub fn secondary_token(&self) -> Option<&str> {
        self.secondary.as_deref()
    }

    /// `JSESSIONID=..; SESSION=..`, skipping whichever token is absent.
    pub fn cookie_header(&self) -> Option<String> {
        join_cookies(&[Some(self.primary.as_str()), self.secondary.as_deref()])
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("primary", &"[redacted]")
            .field("secondary", &self.secondary.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

pub struct SessionManager {
    logger: Logger,
    transport: Arc<dyn HttpTransport>,
    signin_url: String,
    info_url: String,
}

impl SessionManager {
    pub fn new(logger: Logger, transport: Arc<dyn HttpTransport>, config: &GatewayConfig) -> Self {
        Self {
            logger: logger.child("session"),
            transport,
            signin_url: config.signin_url().to_string(),
            info_url: config.api_url(INFO_PATH),
        }
    }

    /// Two-step login: form sign-in, then an info probe when the sign-in
    /// response did not already carry the secondary cookie.
    pub async fn acquire_session(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if !credentials.is_configured() {
            return Err(AuthError::MissingCredentials);
        }

        let signin = OutboundRequest::post(self.signin_url.as_str()).with_form(vec![
            ("username".to_string(), credentials.username.clone()),
            ("password".to_string(), credentials.password.clone()),
        ]);
        let response = self
            .transport
            .send(signin)
            .await
            .map_err(|err| AuthError::Transport(err.message))?;
        if response.status >= 400 && !response.is_redirect() {
            self.logger.warn(
                "login rejected",
                Some(&serde_json::json!({ "status": response.status })),
            );
            return Err(AuthError::LoginRejected {
                status: response.status,
                body: truncate_utf8_prefix(&response.body, 1024),
            });
        }

        let Some(primary) = extract_cookie(&response.set_cookies, PRIMARY_COOKIE) else {
            self.logger.warn(
                "sign-in response carried no session cookie",
                Some(&serde_json::json!({ "status": response.status })),
            );
            return Err(AuthError::TokensUnavailable);
        };
        let mut secondary = extract_cookie(&response.set_cookies, SECONDARY_COOKIE);

        if secondary.is_none() {
            let probe = OutboundRequest::get(self.info_url.as_str())
                .with_accept("application/json")
                .with_cookie(Some(primary.clone()));
            match self.transport.send(probe).await {
                Ok(info) => {
                    secondary = extract_cookie(&info.set_cookies, SECONDARY_COOKIE);
                    if !info.is_success() {
                        self.logger.debug(
                            "session probe returned non-success status",
                            Some(&serde_json::json!({ "status": info.status })),
                        );
                    }
                }
                Err(err) => {
                    self.logger.warn(
                        "session probe failed; continuing with primary token only",
                        Some(&serde_json::json!({ "error": err.message })),
                    );
                }
            }
        }

        let session = Session {
            primary,
            secondary,
        };
        self.logger.debug(
            "session acquired",
            Some(&serde_json::json!({
                "secondary_token": session.secondary.is_some(),
            })),
        );
        Ok(session)
    }
}
