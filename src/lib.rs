//! ServerChan Notify - 将宿主通知事件转发到 Server酱

pub mod config;
pub mod host;
pub mod notification;
pub mod plugin;

pub use config::{ConfigStore, PluginConfig};
pub use host::{CliHost, HostServices};
pub use notification::{
    map_event, should_deliver, ChannelCredential, DispatchError, DispatchResult, Dispatcher,
    EventCatalog, EventType, NotificationEvent, OutboundMessage, Transport, TransportShape,
};
pub use plugin::{Plugin, ServerChanPlugin};
