//! 远程命令通道接口
//!
//! 核心层只面向这个与传输无关的抽象；HTTP 实现见 api.rs，测试使用内存实现。
//! 推送事件走独立的推送通道（见 client.rs / channel::transport）。

use async_trait::async_trait;
use serde::Deserialize;

use crate::social::channel::models::{ChatMessage, MessagePayload};
use crate::social::clan::models::{Clan, JoinRequest};
use crate::social::directory::models::{ClanSummary, UserSummary};
use crate::social::errors::SocialResult;
use crate::social::inbox::models::PendingAction;

/// 通知快照（incoming / outgoing 两个列表）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationsSnapshot {
    #[serde(default)]
    pub incoming: Vec<PendingAction>,
    #[serde(default)]
    pub outgoing: Vec<PendingAction>,
}

/// 远程命令通道（请求 / 响应）
///
/// 错误约定：传输失败返回 `Transport`（可重试），服务端业务错误映射到
/// 对应分类；任何返回 Err 的调用都不应产生本地状态变更。
#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// 按用户名或用户 ID 搜索用户
    async fn search_users(&self, query: &str) -> SocialResult<Vec<UserSummary>>;

    /// 按名称或 ID 搜索战队
    async fn search_clans(&self, term: &str) -> SocialResult<Vec<ClanSummary>>;

    /// 获取好友列表
    async fn fetch_friends(&self, user_id: &str) -> SocialResult<Vec<UserSummary>>;

    /// 发送好友申请
    async fn send_friend_request(&self, from_id: &str, to_id: &str) -> SocialResult<()>;

    /// 拉取全部通知（incoming + outgoing）
    async fn fetch_notifications(&self, user_id: &str) -> SocialResult<NotificationsSnapshot>;

    /// 处理好友申请（accept=true 接受，false 拒绝）
    async fn resolve_friend_request(
        &self,
        user_id: &str,
        notification_id: &str,
        accept: bool,
    ) -> SocialResult<()>;

    /// 发起入队申请
    async fn join_clan_request(&self, clan_id: &str, user_id: &str) -> SocialResult<()>;

    /// 队长处理入队申请
    async fn resolve_join_request(
        &self,
        clan_id: &str,
        leader_id: &str,
        requester_id: &str,
        accept: bool,
    ) -> SocialResult<()>;

    /// 被邀请方处理战队邀请（accept=true 接受，false 拒绝）
    async fn resolve_clan_invite(
        &self,
        user_id: &str,
        clan_id: &str,
        notification_id: &str,
        accept: bool,
    ) -> SocialResult<()>;

    /// 拉取战队详情
    async fn fetch_clan(&self, clan_id: &str) -> SocialResult<Clan>;

    /// 拉取入队申请队列（仅队长可见）
    async fn fetch_clan_join_queue(
        &self,
        clan_id: &str,
        leader_id: &str,
    ) -> SocialResult<Vec<JoinRequest>>;

    /// 拉取频道历史消息
    async fn fetch_message_history(&self, channel_key: &str) -> SocialResult<Vec<ChatMessage>>;

    /// 发送消息，返回服务端确认后的消息（服务端分配 id / sentAt）
    async fn send_message(
        &self,
        channel_key: &str,
        sender_id: &str,
        payload: &MessagePayload,
    ) -> SocialResult<ChatMessage>;
}
