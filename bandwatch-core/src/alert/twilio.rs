//! Twilio Messages API dispatcher (WhatsApp or SMS).

use std::time::Duration;
use tracing::debug;

use super::{AlertDispatcher, AlertError};

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// Account credentials, read from the environment by the caller.
#[derive(Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
}

impl TwilioCredentials {
    pub const SID_VAR: &'static str = "TWILIO_ACCOUNT_SID";
    pub const TOKEN_VAR: &'static str = "TWILIO_AUTH_TOKEN";

    /// Read `TWILIO_ACCOUNT_SID` / `TWILIO_AUTH_TOKEN`.
    pub fn from_env() -> Result<Self, AlertError> {
        let read = |var: &str| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AlertError::MissingCredential(var.to_string()))
        };
        Ok(Self {
            account_sid: read(Self::SID_VAR)?,
            auth_token: read(Self::TOKEN_VAR)?,
        })
    }
}

impl std::fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

pub struct TwilioDispatcher {
    client: reqwest::blocking::Client,
    api_base: String,
    credentials: TwilioCredentials,
    from: String,
    to: String,
}

impl TwilioDispatcher {
    /// `from` / `to` are Twilio addresses, e.g. `whatsapp:+14155238886`.
    pub fn new(
        credentials: TwilioCredentials,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<Self, AlertError> {
        Self::with_api_base(DEFAULT_API_BASE, credentials, from, to)
    }

    pub fn with_api_base(
        api_base: impl Into<String>,
        credentials: TwilioCredentials,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<Self, AlertError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
            from: from.into(),
            to: to.into(),
        })
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.credentials.account_sid
        )
    }
}

impl AlertDispatcher for TwilioDispatcher {
    fn name(&self) -> &str {
        "twilio"
    }

    fn send(&self, message: &str) -> Result<(), AlertError> {
        let form = [
            ("From", self.from.as_str()),
            ("To", self.to.as_str()),
            ("Body", message),
        ];
        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .form(&form)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AlertError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!(to = %self.to, %status, "twilio accepted message");
        Ok(())
    }
}
