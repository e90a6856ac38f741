//! Status classification of completed exchanges.

use crate::error::OutcomeError;
use crate::http::RawResponse;

/// The classifier's judgment of a completed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    NotFound,
    InternalServerError,
    UnknownError(u16),
    InvalidResponse,
}

impl Verdict {
    /// `Ok(())` for a successful verdict, otherwise the matching terminal error.
    pub fn into_result(self) -> Result<(), OutcomeError> {
        match self {
            Verdict::Ok => Ok(()),
            Verdict::NotFound => Err(OutcomeError::NotFound),
            Verdict::InternalServerError => Err(OutcomeError::InternalServerError),
            Verdict::UnknownError(status_code) => Err(OutcomeError::UnknownError { status_code }),
            Verdict::InvalidResponse => Err(OutcomeError::InvalidResponse),
        }
    }
}

/// Map a response onto a verdict. Pure; never retried.
pub fn classify(response: &RawResponse) -> Verdict {
    match response.status {
        None => Verdict::InvalidResponse,
        Some(status) => classify_status(status),
    }
}

pub fn classify_status(status: u16) -> Verdict {
    match status {
        200..=299 => Verdict::Ok,
        404 => Verdict::NotFound,
        500 => Verdict::InternalServerError,
        other => Verdict::UnknownError(other),
    }
}
