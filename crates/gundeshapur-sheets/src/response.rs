//! HTTP response wrapper

use crate::error::{SheetsError, SheetsResult};

/// Buffered HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Turn a non-2xx response into [`SheetsError::Remote`]
    pub fn error_for_status(self) -> SheetsResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SheetsError::from_response_body(self.status_code, &self.body))
        }
    }

    /// Get body as JSON and deserialize to type
    pub fn json_as<T: serde::de::DeserializeOwned>(&self) -> SheetsResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| SheetsError::Json(format!("Failed to deserialize JSON: {}", e)))
    }
}

/// Convert reqwest Response to HttpResponse
pub async fn from_reqwest(response: reqwest::Response) -> SheetsResult<HttpResponse> {
    let status_code = response.status().as_u16();
    let body = response.bytes().await?.to_vec();
    Ok(HttpResponse { status_code, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status_code: u16, body: &[u8]) -> HttpResponse {
        HttpResponse {
            status_code,
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_error_for_status() {
        assert!(response(200, b"{}").error_for_status().is_ok());

        let err = response(403, br#"{"error":{"code":403,"message":"The caller does not have permission"}}"#)
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.upstream_message(), Some("The caller does not have permission"));
    }

    #[test]
    fn test_json_as() {
        #[derive(serde::Deserialize)]
        struct Body {
            range: String,
        }
        let body: Body = response(200, br#"{"range":"Books!A1:M3"}"#).json_as().unwrap();
        assert_eq!(body.range, "Books!A1:M3");

        assert!(matches!(
            response(200, b"not json").json_as::<Body>(),
            Err(SheetsError::Json(_))
        ));
    }
}
