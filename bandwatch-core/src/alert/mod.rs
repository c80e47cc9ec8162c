//! Outbound alert delivery.
//!
//! The monitor only produces text; an `AlertDispatcher` decides where it goes.

pub mod twilio;

pub use twilio::{TwilioCredentials, TwilioDispatcher};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("alert rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("missing credential: {0}")]
    MissingCredential(String),
}

/// Receives formatted alert text.
pub trait AlertDispatcher: Send + Sync {
    fn name(&self) -> &str;

    fn send(&self, message: &str) -> Result<(), AlertError>;
}

/// Writes alerts to stdout and the log. Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

impl AlertDispatcher for LogDispatcher {
    fn name(&self) -> &str {
        "log"
    }

    fn send(&self, message: &str) -> Result<(), AlertError> {
        info!(target: "bandwatch::alert", "{message}");
        println!("{message}");
        Ok(())
    }
}
