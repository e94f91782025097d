//! 厂商响应解析
//!
//! Server酱³ 返回 `{"code": 0, "message": ...}`，Turbo 版和部分 SDK 返回
//! `{"errno": 0, "errmsg": ...}`。两者同时出现时以 `errno` / `errmsg` 为准。

use serde_json::Value;

use super::error::DispatchError;

/// 解析后的厂商响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVendorResponse {
    pub success: bool,
    pub error_message: Option<String>,
}

impl ParsedVendorResponse {
    pub fn parse(body: &str) -> Result<Self, DispatchError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| DispatchError::InvalidResponse(format!("{} - body: {}", e, body)))?;

        let code = ["errno", "code"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_i64))
            .ok_or_else(|| {
                DispatchError::InvalidResponse(format!("missing errno/code - body: {}", body))
            })?;

        let message = ["errmsg", "message"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        if code == 0 {
            Ok(Self {
                success: true,
                error_message: None,
            })
        } else {
            Ok(Self {
                success: false,
                error_message: Some(message.unwrap_or_else(|| format!("vendor code {}", code))),
            })
        }
    }

    pub fn into_result(self) -> Result<(), DispatchError> {
        if self.success {
            Ok(())
        } else {
            Err(DispatchError::Vendor(
                self.error_message.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_success() {
        let parsed = ParsedVendorResponse::parse(r#"{"errno": 0, "errmsg": ""}"#).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.error_message, None);
    }

    #[test]
    fn test_code_failure_uses_message() {
        let parsed = ParsedVendorResponse::parse(r#"{"code": 40001, "message": "bad sendkey"}"#).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error_message.as_deref(), Some("bad sendkey"));
    }

    #[test]
    fn test_errno_preferred_over_code() {
        let parsed =
            ParsedVendorResponse::parse(r#"{"errno": 1, "errmsg": "bad key", "code": 0}"#).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error_message.as_deref(), Some("bad key"));
    }

    #[test]
    fn test_failure_without_message() {
        let err = ParsedVendorResponse::parse(r#"{"code": 20}"#)
            .unwrap()
            .into_result()
            .unwrap_err();
        assert_eq!(err, DispatchError::Vendor("vendor code 20".to_string()));
    }

    #[test]
    fn test_invalid_bodies() {
        assert!(matches!(
            ParsedVendorResponse::parse("<html>"),
            Err(DispatchError::InvalidResponse(_))
        ));
        assert!(matches!(
            ParsedVendorResponse::parse(r#"{"data": {}}"#),
            Err(DispatchError::InvalidResponse(_))
        ));
    }
}
