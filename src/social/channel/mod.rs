//! 实时频道模块
//!
//! 管理私聊 / 战队两路独立订阅的生命周期，并将推送消息合并进
//! 按频道分组的有序消息日志。

pub mod listener;
pub mod log;
pub mod models;
pub mod service;
pub mod transport;

pub use listener::{ChannelListener, EmptyChannelListener};
pub use log::ChannelLog;
pub use models::{ChannelKey, ChatMessage, MessagePayload, SubscriptionStatus};
pub use service::ChannelManager;
pub use transport::PushTransport;
