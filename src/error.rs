use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Store-adapter failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Pool construction or connection acquisition failed.
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    /// A statement failed while performing the named action.
    #[error("Failed to {action}: {source}")]
    Query {
        /// What the adapter was doing, e.g. `"fetch image"`.
        action: &'static str,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },
}

/// Request-level error taxonomy for the HTTP surface.
///
/// Every variant renders as a JSON body with a single `message` field;
/// server-side variants are logged before rendering.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A path identifier failed to parse as an integer.
    #[error("Invalid {what} ID")]
    InvalidId {
        /// Which identifier, e.g. `"image"` or `"menu item"`.
        what: &'static str,
    },

    /// A required parameter was absent.
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// Name of the missing parameter.
        name: &'static str,
    },

    /// The multipart request carried no image field.
    #[error("No image file provided")]
    MissingFile,

    /// The declared MIME type is not an image type.
    #[error("Only image files are allowed")]
    UnsupportedMediaType {
        /// The offending declared type.
        mime: String,
    },

    /// The upload exceeded the size ceiling.
    #[error("Image exceeds the {max_bytes}-byte upload limit")]
    PayloadTooLarge {
        /// The configured ceiling in bytes.
        max_bytes: u64,
    },

    /// No matching row.
    #[error("{what} not found")]
    NotFound {
        /// The missing entity, e.g. `"Image"` or `"Menu item"`.
        what: &'static str,
    },

    /// An update request carried no updatable field.
    #[error("No fields to update")]
    EmptyUpdate,

    /// The multipart stream could not be read.
    #[error("Malformed multipart request: {0}")]
    Multipart(String),

    /// The webhook request had no signature header.
    #[error("Missing Stripe signature")]
    MissingSignature,

    /// The webhook signature did not verify against the configured secret.
    #[error("Invalid Stripe signature")]
    InvalidSignature,

    /// The webhook payload could not be decoded.
    #[error("Invalid webhook payload: {0}")]
    InvalidWebhookPayload(String),

    /// The payment amount was absent, non-numeric, or non-positive.
    #[error("Invalid amount provided")]
    InvalidAmount,

    /// The payment processor call failed.
    #[error("{0}")]
    Payment(String),

    /// Staging the uploaded file to disk failed.
    #[error("File staging error: {0}")]
    Staging(#[from] std::io::Error),

    /// The store adapter failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// HTTP status this error renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidId { .. }
            | Self::MissingParameter { .. }
            | Self::MissingFile
            | Self::EmptyUpdate
            | Self::Multipart(_)
            | Self::MissingSignature
            | Self::InvalidSignature
            | Self::InvalidWebhookPayload(_)
            | Self::InvalidAmount => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Payment(_) | Self::Staging(_) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
