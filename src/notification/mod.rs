//! 通知核心 - 过滤、映射、分发
//!
//! # 数据流
//! 事件 → `TypeFilter` → `map_event` → `Dispatcher` → ServerChan 接口 → `DispatchResult`
//!
//! # 使用示例
//! ```ignore
//! use serverchan_notify::notification::*;
//!
//! let transport = Arc::new(HttpTransport::new(Duration::from_secs(30))?);
//! let dispatcher = Dispatcher::new(transport, TransportShape::UrlGet);
//! let credential = ChannelCredential::new("sctp1234tKEY", None, None);
//!
//! let event = NotificationEvent::notice("Hello", "World");
//! if let Some(message) = map_event(&event, MapperOptions::default()) {
//!     let result = dispatcher.deliver(&credential, &message);
//! }
//! ```

pub mod credential;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod filter;
pub mod mapper;
pub mod response;
pub mod transport;

pub use credential::ChannelCredential;
pub use dispatcher::{DispatchResult, Dispatcher};
pub use error::DispatchError;
pub use event::{EventCatalog, EventType, NotificationEvent, NOTICE_MESSAGE};
pub use filter::{should_deliver, TypeFilter};
pub use mapper::{compose, map_event, MapperOptions, MessageParts, OutboundMessage};
pub use response::ParsedVendorResponse;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, Transport, TransportShape};
