use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::IndexError;

/// API错误类型
pub enum AppError {
    /// 请求未通过鉴权
    Unauthorized,
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "invalid token").into_response(),
            Self::Internal(err) => match err.downcast_ref::<IndexError>() {
                Some(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
                None => (StatusCode::INTERNAL_SERVER_ERROR, format!("Something went wrong: {}", err))
                    .into_response(),
            },
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
