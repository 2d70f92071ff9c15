//! Error types for the catalog store and service.

use thiserror::Error;

/// Failures reported by a [`LaptopStore`](crate::storage::LaptopStore).
///
/// A store never judges whether client input is well formed; that is the
/// service's job.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("cannot copy laptop data: {0}")]
    Copy(String),

    #[error("search receiver disconnected")]
    Disconnected,
}

/// External status taxonomy. Discriminants follow the gRPC code numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusCode {
    InvalidArgument = 3,
    AlreadyExists = 6,
    Internal = 13,
}

impl StatusCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            3 => Some(StatusCode::InvalidArgument),
            6 => Some(StatusCode::AlreadyExists),
            13 => Some(StatusCode::Internal),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCode::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            StatusCode::AlreadyExists => write!(f, "ALREADY_EXISTS"),
            StatusCode::Internal => write!(f, "INTERNAL"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid laptop {id:?}: {reason}")]
    InvalidArgument { id: String, reason: String },

    #[error("cannot save laptop {id} to the store: {source}")]
    AlreadyExists {
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("{op}: {source}")]
    Internal {
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ServiceError {
    pub fn code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidArgument { .. } => StatusCode::InvalidArgument,
            ServiceError::AlreadyExists { .. } => StatusCode::AlreadyExists,
            ServiceError::Internal { .. } => StatusCode::Internal,
        }
    }
}
