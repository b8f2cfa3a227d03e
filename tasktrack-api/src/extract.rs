/// Request extractors with API-shaped rejections
///
/// `axum::Json` rejects bad bodies with plain-text responses; [`ApiJson`]
/// routes the same rejections through [`ApiError`] so clients always get a
/// JSON `{ "error": ... }` body.

use axum::extract::FromRequest;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// JSON body extractor whose rejection is an [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Parses a path id, reporting malformed values as the resource's 404
pub fn parse_id(raw: &str, not_found: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(not_found.to_string()))
}

/// `value` without surrounding whitespace, reusing the allocation when possible
pub(crate) fn trimmed(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}

/// Trims and lower-cases an email address
pub(crate) fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Task not found").unwrap(), id);

        match parse_id("42", "Task not found") {
            Err(ApiError::NotFound(msg)) => assert_eq!(msg, "Task not found"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_trimmed_and_normalize_email() {
        assert_eq!(trimmed("  hi ".to_string()), "hi");
        assert_eq!(trimmed("hi".to_string()), "hi");
        assert_eq!(normalize_email(" A@X.Com "), "a@x.com");
    }
}
