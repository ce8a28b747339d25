use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Business-rule outcome that refuses an issue or verification request.
///
/// Infrastructure failures are never mapped onto one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("order status does not permit this handoff")]
    InvalidState,
    #[error("no active handoff code")]
    NoActiveCode,
    #[error("handoff code already used")]
    CodeAlreadyUsed,
    #[error("handoff code expired")]
    CodeExpired,
    #[error("malformed qr payload")]
    MalformedPayload,
    #[error("otp must be exactly 6 digits")]
    InvalidFormat,
    #[error("code belongs to a different handoff type")]
    TypeMismatch,
    #[error("code belongs to a different order")]
    OrderMismatch,
    #[error("code does not match")]
    CodeMismatch,
    #[error("order already advanced past this handoff")]
    AlreadyAdvanced,
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidState => "INVALID_STATE",
            Self::NoActiveCode => "NO_ACTIVE_CODE",
            Self::CodeAlreadyUsed => "CODE_ALREADY_USED",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::MalformedPayload => "MALFORMED_PAYLOAD",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::OrderMismatch => "ORDER_MISMATCH",
            Self::CodeMismatch => "CODE_MISMATCH",
            Self::AlreadyAdvanced => "ALREADY_ADVANCED",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidState | Self::AlreadyAdvanced | Self::CodeAlreadyUsed => {
                StatusCode::CONFLICT
            }
            Self::NoActiveCode => StatusCode::NOT_FOUND,
            Self::CodeExpired => StatusCode::GONE,
            Self::MalformedPayload | Self::InvalidFormat => StatusCode::BAD_REQUEST,
            Self::TypeMismatch | Self::OrderMismatch | Self::CodeMismatch => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }
}

/// Handoff service error variants.
#[derive(Debug, thiserror::Error)]
pub enum HandoffServiceError {
    #[error("order not found")]
    OrderNotFound,
    #[error("forbidden")]
    Forbidden,
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl HandoffServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Rejected(rejection) => rejection.kind(),
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// The business rejection carried by this error, if any.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }
}

impl IntoResponse for HandoffServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Rejected(rejection) => rejection.status(),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %format!("{e:#}"), kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
