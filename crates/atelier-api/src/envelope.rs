//! The `{ success, data?, error?, message? }` envelope every endpoint wraps
//! its payload in.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    /// The payload, if the backend reported success.
    ///
    /// A successful envelope without `data` yields `Ok(None)`; callers decide
    /// whether that means "empty" or "not found".
    pub fn into_result(self) -> ApiResult<Option<T>> {
        if self.success {
            Ok(self.data)
        } else {
            let reason = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "request failed".to_string());
            Err(ApiError::Api(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_without_data() {
        let env: ApiResponse<Vec<u32>> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), None);
    }

    /// Payload types need not implement `Default`.
    #[derive(Debug, PartialEq, Deserialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn payload_without_default_impl() {
        let env: ApiResponse<Named> =
            serde_json::from_str(r#"{"success":true,"data":{"name":"checkout"}}"#).unwrap();
        assert_eq!(
            env.into_result().unwrap(),
            Some(Named {
                name: "checkout".to_string()
            })
        );

        let env: ApiResponse<Named> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), None);

        let env: ApiResponse<Named> =
            serde_json::from_str(r#"{"success":true,"data":null}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), None);
    }

    #[test]
    fn failure_prefers_error_over_message() {
        let env: ApiResponse<u32> =
            serde_json::from_str(r#"{"success":false,"error":"boom","message":"ignored"}"#).unwrap();
        assert!(matches!(env.into_result(), Err(ApiError::Api(m)) if m == "boom"));

        let env: ApiResponse<u32> =
            serde_json::from_str(r#"{"success":false,"message":"nope"}"#).unwrap();
        assert!(matches!(env.into_result(), Err(ApiError::Api(m)) if m == "nope"));

        let env: ApiResponse<u32> = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(matches!(env.into_result(), Err(ApiError::Api(m)) if m == "request failed"));
    }

    #[test]
    fn ok_serializes_without_empty_fields() {
        let json = serde_json::to_string(&ApiResponse::ok(7)).unwrap();
        assert_eq!(json, r#"{"success":true,"data":7}"#);
    }
}
