//! 发送错误分类

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// 缺少 SendKey / API URL，未发起网络请求
    #[error("channel not configured")]
    NotConfigured,

    #[error("invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// 网络或连接错误
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// HTTP 200 但厂商返回码非 0
    #[error("{0}")]
    Vendor(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl DispatchError {
    /// 是否在发起请求前就失败
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured | Self::InvalidEndpoint { .. })
    }
}
