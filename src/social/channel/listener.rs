//! 频道监听器回调接口

use async_trait::async_trait;

use crate::social::channel::models::SubscriptionStatus;

/// 频道监听器回调接口
#[async_trait]
pub trait ChannelListener: Send + Sync {
    /// 频道收到新消息（已合并进日志），参数为消息 JSON 字符串
    async fn on_message_received(&self, channel_key: String, message_json: String);

    /// 频道订阅状态变更
    async fn on_subscription_status_changed(&self, channel_key: String, status: SubscriptionStatus);

    /// 连接状态变化
    async fn on_connection_status_changed(&self, connected: bool, message: String);

    /// 被踢下线
    async fn on_kicked_offline(&self);
}

/// 空的频道监听器实现（默认实现）
pub struct EmptyChannelListener;

#[async_trait]
impl ChannelListener for EmptyChannelListener {
    async fn on_message_received(&self, _channel_key: String, _message_json: String) {}
    async fn on_subscription_status_changed(
        &self,
        _channel_key: String,
        _status: SubscriptionStatus,
    ) {
    }
    async fn on_connection_status_changed(&self, _connected: bool, _message: String) {}
    async fn on_kicked_offline(&self) {}
}
