#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid host for socket: {0}")]
    AddressError(#[from] std::net::AddrParseError),
    #[error("Error while creating the server: {0}")]
    ServerError(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    #[error("Failed to parse struct: {0}")]
    StructParseFailure(&'static str),
    #[error("Failed to serialize to {0} format")]
    EncodeError(&'static str),
}

/// Maps a domain-level [`domain_types::errors::ApiError`] onto the
/// `{error_kind, message}` envelope and HTTP status from spec §7.
#[derive(Debug)]
pub struct ApiErrorResponse(pub domain_types::errors::ApiError);

impl From<domain_types::errors::ApiError> for ApiErrorResponse {
    fn from(error: domain_types::errors::ApiError) -> Self {
        Self(error)
    }
}

impl axum::response::IntoResponse for ApiErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.0.kind.http_status()).unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = domain_types::api::ErrorEnvelope {
            error_kind: self.0.kind,
            message: self.0.message,
        };
        (status, axum::Json(body)).into_response()
    }
}
