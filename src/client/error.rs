use thiserror::Error;

use super::transport::TransportError;

/// Broad category of a client failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Outgoing rule group could not be serialized.
    Encoding,
    /// Transport failure or non-success status.
    Request,
    /// Response body was not the expected YAML shape.
    Decode,
}

/// Errors returned by [`RuleClient`](super::RuleClient) operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("unable to marshal rule group: {source}")]
    Encoding {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("request failed: {0}")]
    Request(#[from] TransportError),

    #[error("{message}")]
    Decode {
        message: String,
        #[source]
        source: Option<serde_yaml::Error>,
    },
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Encoding { .. } => ErrorKind::Encoding,
            ClientError::Request(_) => ErrorKind::Request,
            ClientError::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// HTTP status that caused a request error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request(e) => e.status(),
            _ => None,
        }
    }

    pub(crate) fn decode(message: impl Into<String>, source: serde_yaml::Error) -> Self {
        ClientError::Decode {
            message: format!("{}: {}", message.into(), source),
            source: Some(source),
        }
    }
}
