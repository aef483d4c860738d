//! 推送注册接口
//!
//! 频道管理器通过该接口向推送通道声明 / 取消对某个频道键的兴趣；
//! WebSocket 实现见 client.rs，测试使用内存实现。

use anyhow::Result;
use async_trait::async_trait;

use crate::social::channel::models::ChannelKey;

/// 推送注册接口（按频道键订阅 / 退订）
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// 向服务端注册对某频道的推送兴趣
    async fn register(&self, key: &ChannelKey) -> Result<()>;

    /// 释放服务端的推送注册
    async fn deregister(&self, key: &ChannelKey) -> Result<()>;
}
