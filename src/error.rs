use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use log::{error, warn};
use rocket::{
    http::{Status, StatusClass},
    response::{self, status::Custom, Responder},
    serde::json::{json, Json},
    Request,
};
use thiserror::Error;

use crate::crypto::{CryptoError, SignatureError};
use crate::model::{notifier::NotifyError, otp::OtpError, store::StoreError};

pub type Result<T> = std::result::Result<T, Error>;

/// Message returned to the client in place of any server-side failure.
const GENERIC_SERVER_ERROR: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Expired: {0}")]
    Expired(String),
    #[error("Invalid code: {0}")]
    Invalid(String),
    #[error("Duplicate vote: {0}")]
    DuplicateVote(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
}

impl Error {
    /// The HTTP status this error maps onto.
    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::Expired(_) => Status::Gone,
            Self::Invalid(_) | Self::Unauthorized(_) | Self::Jwt(_) => Status::Unauthorized,
            Self::DuplicateVote(_) => Status::Conflict,
            Self::Notify(_) => Status::BadGateway,
            Self::Crypto(_) | Self::Storage(_) | Self::Argon2(_) => Status::InternalServerError,
        }
    }
}

impl From<OtpError> for Error {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::NotFound => Self::NotFound(err.to_string()),
            OtpError::Expired => Self::Expired(err.to_string()),
            OtpError::Invalid => Self::Invalid(err.to_string()),
        }
    }
}

impl From<SignatureError> for Error {
    fn from(err: SignatureError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        // Server-side failures are logged in full but never described to the client.
        let message = if status.class() == StatusClass::ServerError {
            error!("{} {}: {self}", req.method(), req.uri());
            GENERIC_SERVER_ERROR.to_string()
        } else {
            warn!("{} {}: {self}", req.method(), req.uri());
            self.to_string()
        };
        Custom(status, Json(json!({ "error": message }))).respond_to(req)
    }
}
