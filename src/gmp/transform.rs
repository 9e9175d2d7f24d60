// ABOUTME: Strategies applied to every raw response before it reaches the caller.
// ABOUTME: RawTransform passes responses through; CheckCommandTransform rejects non-2xx.

use super::error::GmpError;
use super::response::Response;

/// Turns raw response text into the value handed back to the caller.
pub trait Transform: Send + Sync {
    fn transform(&self, raw: String) -> Result<Response, GmpError>;
}

/// Wraps the response without checking its status.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawTransform;

impl Transform for RawTransform {
    fn transform(&self, raw: String) -> Result<Response, GmpError> {
        Response::parse(raw.clone()).ok_or(GmpError::InvalidResponse(raw))
    }
}

/// Fails the command when the root `status` is not `2xx`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CheckCommandTransform;

impl Transform for CheckCommandTransform {
    fn transform(&self, raw: String) -> Result<Response, GmpError> {
        let response = RawTransform.transform(raw)?;
        if response.is_ok() {
            return Ok(response);
        }
        Err(GmpError::Response {
            status: response.status().unwrap_or("").to_string(),
            status_text: response.status_text().unwrap_or("").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_transform_keeps_failed_status() {
        let response = RawTransform
            .transform(r#"<x status="404" status_text="Not found"/>"#.to_string())
            .unwrap();
        assert_eq!(response.status(), Some("404"));
    }

    #[test]
    fn check_transform_rejects_failed_status() {
        let err = CheckCommandTransform
            .transform(r#"<x status="400" status_text="Bogus command"/>"#.to_string())
            .unwrap_err();

        match err {
            GmpError::Response {
                status,
                status_text,
            } => {
                assert_eq!(status, "400");
                assert_eq!(status_text, "Bogus command");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn check_transform_rejects_missing_status() {
        let err = CheckCommandTransform
            .transform("<x/>".to_string())
            .unwrap_err();
        assert!(matches!(err, GmpError::Response { .. }));
    }

    #[test]
    fn garbage_is_invalid() {
        let err = RawTransform.transform("garbage".to_string()).unwrap_err();
        assert!(matches!(err, GmpError::InvalidResponse(_)));
    }
}
