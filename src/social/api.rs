//! 远程命令通道的 HTTP 实现
//!
//! 所有端点为 POST JSON，响应统一为 `{errCode, errMsg, data}` 包装；
//! 每个请求携带 operationID 头，token 通过 default_headers 自动添加。

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::social::channel::models::{ChatMessage, MessagePayload};
use crate::social::clan::models::{Clan, JoinRequest};
use crate::social::directory::models::{ClanSummary, UserSummary};
use crate::social::errors::SocialResult;
use crate::social::gateway::{CommandGateway, NotificationsSnapshot};
use crate::social::serialization::generate_operation_id;
use crate::social::types::handle_http_response;

/// 远程命令通道的 HTTP 客户端
pub struct HttpGateway {
    client: reqwest::Client,
    api_base_url: String,
}

impl HttpGateway {
    /// 创建 HTTP 网关
    ///
    /// `client` 应该已经在外部配置好认证拦截器（token 默认头）
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 发送一个 POST JSON 请求并解包 data 字段
    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
        operation_name: &str,
    ) -> SocialResult<T> {
        let operation_id = generate_operation_id();
        let url = format!("{}{}", self.api_base_url, path);

        info!("[HTTP] 📡 {}", operation_name);
        debug!("[HTTP]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&body)
            .send()
            .await
            .context("请求失败")?;

        handle_http_response(response, operation_name).await
    }
}

#[derive(Deserialize)]
struct UserListData {
    #[serde(default)]
    users: Vec<UserSummary>,
}

#[derive(Deserialize)]
struct ClanListData {
    #[serde(default)]
    clans: Vec<ClanSummary>,
}

#[derive(Deserialize)]
struct JoinQueueData {
    #[serde(default)]
    requests: Vec<JoinRequest>,
}

#[derive(Deserialize)]
struct MessageListData {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[async_trait]
impl CommandGateway for HttpGateway {
    async fn search_users(&self, query: &str) -> SocialResult<Vec<UserSummary>> {
        let data: UserListData = self
            .post(
                "/user/search",
                serde_json::json!({ "query": query }),
                "用户搜索",
            )
            .await?;
        Ok(data.users)
    }

    async fn search_clans(&self, term: &str) -> SocialResult<Vec<ClanSummary>> {
        let data: ClanListData = self
            .post(
                "/clan/search",
                serde_json::json!({ "query": term }),
                "战队搜索",
            )
            .await?;
        Ok(data.clans)
    }

    async fn fetch_friends(&self, user_id: &str) -> SocialResult<Vec<UserSummary>> {
        let data: UserListData = self
            .post(
                "/user/get_friends",
                serde_json::json!({ "userID": user_id }),
                "好友列表",
            )
            .await?;
        Ok(data.users)
    }

    async fn send_friend_request(&self, from_id: &str, to_id: &str) -> SocialResult<()> {
        let _: serde_json::Value = self
            .post(
                "/friend/send_request",
                serde_json::json!({ "fromUserID": from_id, "toUserID": to_id }),
                "发送好友申请",
            )
            .await?;
        Ok(())
    }

    async fn fetch_notifications(&self, user_id: &str) -> SocialResult<NotificationsSnapshot> {
        self.post(
            "/notification/get_all",
            serde_json::json!({ "userID": user_id }),
            "通知列表",
        )
        .await
    }

    async fn resolve_friend_request(
        &self,
        user_id: &str,
        notification_id: &str,
        accept: bool,
    ) -> SocialResult<()> {
        let _: serde_json::Value = self
            .post(
                "/notification/resolve_friend",
                serde_json::json!({
                    "userID": user_id,
                    "notificationID": notification_id,
                    "accept": accept,
                }),
                "处理好友申请",
            )
            .await?;
        Ok(())
    }

    async fn join_clan_request(&self, clan_id: &str, user_id: &str) -> SocialResult<()> {
        let _: serde_json::Value = self
            .post(
                "/clan/join_request",
                serde_json::json!({ "clanID": clan_id, "userID": user_id }),
                "发起入队申请",
            )
            .await?;
        Ok(())
    }

    async fn resolve_join_request(
        &self,
        clan_id: &str,
        leader_id: &str,
        requester_id: &str,
        accept: bool,
    ) -> SocialResult<()> {
        let _: serde_json::Value = self
            .post(
                "/clan/resolve_join_request",
                serde_json::json!({
                    "clanID": clan_id,
                    "leaderID": leader_id,
                    "requesterID": requester_id,
                    "accept": accept,
                }),
                "处理入队申请",
            )
            .await?;
        Ok(())
    }

    async fn resolve_clan_invite(
        &self,
        user_id: &str,
        clan_id: &str,
        notification_id: &str,
        accept: bool,
    ) -> SocialResult<()> {
        let _: serde_json::Value = self
            .post(
                "/clan/resolve_invite",
                serde_json::json!({
                    "userID": user_id,
                    "clanID": clan_id,
                    "notificationID": notification_id,
                    "accept": accept,
                }),
                "处理战队邀请",
            )
            .await?;
        Ok(())
    }

    async fn fetch_clan(&self, clan_id: &str) -> SocialResult<Clan> {
        self.post(
            "/clan/get",
            serde_json::json!({ "clanID": clan_id }),
            "战队详情",
        )
        .await
    }

    async fn fetch_clan_join_queue(
        &self,
        clan_id: &str,
        leader_id: &str,
    ) -> SocialResult<Vec<JoinRequest>> {
        let data: JoinQueueData = self
            .post(
                "/clan/get_join_queue",
                serde_json::json!({ "clanID": clan_id, "leaderID": leader_id }),
                "入队申请队列",
            )
            .await?;
        Ok(data.requests)
    }

    async fn fetch_message_history(&self, channel_key: &str) -> SocialResult<Vec<ChatMessage>> {
        let data: MessageListData = self
            .post(
                "/message/get_history",
                serde_json::json!({ "channelKey": channel_key }),
                "历史消息",
            )
            .await?;
        Ok(data.messages)
    }

    async fn send_message(
        &self,
        channel_key: &str,
        sender_id: &str,
        payload: &MessagePayload,
    ) -> SocialResult<ChatMessage> {
        self.post(
            "/message/send",
            serde_json::json!({
                "channelKey": channel_key,
                "senderID": sender_id,
                "payload": payload,
            }),
            "发送消息",
        )
        .await
    }
}
