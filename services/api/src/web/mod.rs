pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::require_session;
pub use rest::ApiDoc;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Decodes a urlencoded form body. An empty body is fine as long as the
/// target type's fields are optional, which keeps "POST with no form at
/// all" working for endpoints whose fields are all optional.
pub(crate) fn parse_form<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid form body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct OptionalText {
        text: Option<String>,
    }

    #[test]
    fn empty_body_parses_to_absent_fields() {
        let parsed: OptionalText = parse_form(&Bytes::new()).unwrap();
        assert!(parsed.text.is_none());
    }

    #[test]
    fn present_fields_are_decoded() {
        let parsed: OptionalText = parse_form(&Bytes::from_static(b"text=The+cat+sat")).unwrap();
        assert_eq!(parsed.text.as_deref(), Some("The cat sat"));
    }
}
