//! 分发器 - 向 ServerChan 发起单次推送
//!
//! 每个分发器持有一把锁，同一实例同一时间最多一个请求在途。

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

use super::credential::ChannelCredential;
use super::error::DispatchError;
use super::mapper::OutboundMessage;
use super::response::ParsedVendorResponse;
use super::transport::{HttpMethod, HttpRequest, Transport, TransportShape};

/// 发送结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub success: bool,
    pub error_message: Option<String>,
}

impl DispatchResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
        }
    }
}

impl From<Result<(), DispatchError>> for DispatchResult {
    fn from(result: Result<(), DispatchError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// 消息 -> 接口参数，空字段不发送
pub fn message_params(message: &OutboundMessage) -> Vec<(String, String)> {
    let fields = [
        ("title", Some(message.title.as_str())),
        ("desp", Some(message.body.as_str())),
        ("tags", message.tags.as_deref()),
        ("short", message.short.as_deref()),
    ];

    fields
        .into_iter()
        .filter_map(|(k, v)| v.filter(|v| !v.is_empty()).map(|v| (k.to_string(), v.to_string())))
        .collect()
}

/// 按发送方式构建请求
pub fn build_request(
    shape: TransportShape,
    endpoint: &str,
    message: &OutboundMessage,
) -> Result<HttpRequest, DispatchError> {
    let mut url = reqwest::Url::parse(endpoint).map_err(|e| DispatchError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    let params = message_params(message);

    let request = match shape {
        TransportShape::UrlGet => {
            if !params.is_empty() {
                url.query_pairs_mut().extend_pairs(params.iter());
            }
            HttpRequest {
                method: HttpMethod::Get,
                url: url.to_string(),
                params: Vec::new(),
            }
        }
        TransportShape::UrlPost => HttpRequest {
            method: HttpMethod::PostForm,
            url: url.to_string(),
            params,
        },
        TransportShape::KeyPost => HttpRequest {
            method: HttpMethod::PostJson,
            url: url.to_string(),
            params,
        },
    };

    Ok(request)
}

/// ServerChan 分发器
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    shape: TransportShape,
    lock: Mutex<()>,
}

impl Dispatcher {
    /// 创建分发器，使用给定的传输层和发送方式
    pub fn new(transport: Arc<dyn Transport>, shape: TransportShape) -> Self {
        Self {
            transport,
            shape,
            lock: Mutex::new(()),
        }
    }

    /// 当前发送方式
    pub fn shape(&self) -> TransportShape {
        self.shape
    }

    /// 发送消息；所有错误都转换为失败结果
    pub fn deliver(&self, credential: &ChannelCredential, message: &OutboundMessage) -> DispatchResult {
        let result = self.try_deliver(credential, message);

        match &result {
            Ok(()) => info!(
                channel = "serverchan",
                shape = ?self.shape,
                title = %message.title,
                "ServerChan message sent"
            ),
            Err(e) if e.is_configuration() => warn!(
                channel = "serverchan",
                error = %e,
                "ServerChan channel unusable, message skipped"
            ),
            Err(e) => error!(
                channel = "serverchan",
                shape = ?self.shape,
                error = %e,
                "ServerChan message failed"
            ),
        }

        result.into()
    }

    fn try_deliver(
        &self,
        credential: &ChannelCredential,
        message: &OutboundMessage,
    ) -> Result<(), DispatchError> {
        let endpoint = credential
            .endpoint(self.shape)
            .ok_or(DispatchError::NotConfigured)?;
        let request = build_request(self.shape, &endpoint, message)?;

        let response = {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.transport
                .execute(&request)
                .map_err(|e| DispatchError::Transport(format!("{:#}", e)))?
        };

        if response.status != 200 {
            return Err(DispatchError::HttpStatus(response.status));
        }

        ParsedVendorResponse::parse(&response.body)?.into_result()
    }
}
