use serde::{Deserialize, Serialize};

/// Why one endpoint call did not yield a collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchFailure {
    /// No response was obtained at all.
    #[error("{message}")]
    Transport { message: String },
    #[error("request failed with status {code}")]
    Status { code: u16 },
    /// The response arrived but its body was not the expected JSON shape.
    #[error("unexpected response from server: {message}")]
    Decode { message: String },
}

impl FetchFailure {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchFailure::Status { code } => Some(*code),
            _ => None,
        }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, FetchFailure::Decode { .. })
    }

    /// Text safe to put in front of an end user. Decode details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            FetchFailure::Transport { message } => message.clone(),
            FetchFailure::Status { code } => format!("request failed with status {code}"),
            FetchFailure::Decode { .. } => "unexpected response from server".into(),
        }
    }
}

/// A transport could not produce any HTTP response.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportFault(pub String);

impl From<TransportFault> for FetchFailure {
    fn from(fault: TransportFault) -> Self {
        FetchFailure::Transport { message: fault.0 }
    }
}
