use axum::http::StatusCode;
use axum_derive_error::ErrorResponse;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, ErrorResponse)]
pub enum ApiError {
    #[error("{0}")]
    #[status(StatusCode::NOT_FOUND)]
    NotFound(String),

    #[error("This chat is still processing a previous message.")]
    #[status(StatusCode::CONFLICT)]
    Busy,

    #[error("{0}")]
    #[status(StatusCode::UNSUPPORTED_MEDIA_TYPE)]
    UnsupportedFormat(String),

    #[error("{0}")]
    #[status(StatusCode::BAD_REQUEST)]
    ClientError(String),

    #[error(transparent)]
    ServerError(#[from] anyhow::Error),
}

impl From<docuchat::Error> for ApiError {
    fn from(err: docuchat::Error) -> Self {
        match err {
            e @ (docuchat::Error::AssetNotFound(_) | docuchat::Error::ThreadNotFound(_)) => {
                Self::NotFound(e.to_string())
            }
            docuchat::Error::Busy => Self::Busy,
            e @ docuchat::Error::UnsupportedFormat(_) => Self::UnsupportedFormat(e.to_string()),
            e => Self::ServerError(e.into()),
        }
    }
}

impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string() && self.status_code() == other.status_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_the_right_status_codes() {
        let cases = [
            (
                docuchat::Error::AssetNotFound("a1".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                docuchat::Error::ThreadNotFound("t1".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (docuchat::Error::Busy, StatusCode::CONFLICT),
            (
                docuchat::Error::UnsupportedFormat("exe".to_string()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                docuchat::Error::Processing(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn error_bodies_carry_the_message_verbatim() {
        let err = ApiError::from(docuchat::Error::AssetNotFound("a1".to_string()));

        assert_eq!(err.to_string(), "Asset a1 not found.");
    }
}
