use thiserror::Error;

/// Errors raised while talking to the monitoring backend or probing the host
#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error("Transport failure during {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Remote service rejected {operation} (HTTP {status}): {body}")]
    RemoteService {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {operation} response: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },

    #[error("Local environment error: {reason}")]
    LocalEnvironment { reason: String },

    #[error("Failed to set up monitoring client: {reason}")]
    ClientSetup { reason: String },
}

impl MonitoringError {
    /// Remote "already exists" rejection (HTTP 409).
    pub fn is_already_exists(&self) -> bool {
        matches!(self, MonitoringError::RemoteService { status: 409, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MonitoringError::RemoteService { status: 404, .. })
    }
}

pub type MonitoringResult<T> = Result<T, MonitoringError>;
