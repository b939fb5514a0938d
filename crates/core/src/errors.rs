use thiserror::Error;

use crate::dataset::loader::LoaderError;
use crate::dataset::DatasetKind;

/// Problems with what the client sent. Raised before any analysis starts and
/// never retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("brand name is required")]
    MissingBrandName,
    #[error("at least one of the gender or age datasets is required")]
    MissingAudienceData,
    #[error("{kind} dataset is malformed: {reason}")]
    MalformedDataset { kind: DatasetKind, reason: String },
    #[error("{kind} dataset is missing required columns: {}", missing.join(", "))]
    MissingColumns { kind: DatasetKind, missing: Vec<String> },
    #[error("upload could not be read: {0}")]
    MalformedUpload(String),
    #[error("upload exceeds the size limit: {0}")]
    UploadTooLarge(String),
}

impl InputError {
    pub fn from_loader(kind: DatasetKind, error: LoaderError) -> Self {
        match error {
            LoaderError::MissingColumns { missing } => Self::MissingColumns { kind, missing },
            other => Self::MalformedDataset { kind, reason: other.to_string() },
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("upload storage failure: {0}")]
    Storage(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("payload too large: {message}")]
    PayloadTooLarge { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::PayloadTooLarge { .. } => "The upload is larger than the server accepts.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::PayloadTooLarge { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::PayloadTooLarge { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::PayloadTooLarge { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Input(error @ InputError::UploadTooLarge(_)) => {
                Self::PayloadTooLarge {
                    message: error.to_string(),
                    correlation_id: "unassigned".to_owned(),
                }
            }
            ApplicationError::Input(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Storage(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Internal(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
