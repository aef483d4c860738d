//! 社交客户端：网关、各存储、WebSocket 连接与推送分发的组装层
//!
//! 推送帧为二进制消息（可选 gzip），解包成 WsResponse 后按
//! reqIdentifier 分类；WS_PUSH_EVENT 的 data 是 PushEvent JSON，
//! 按事件类型路由到对应存储。同一 operationID 的重复帧丢弃。

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::social::api::HttpGateway;
use crate::social::channel::models::ChannelKey;
use crate::social::channel::transport::PushTransport;
use crate::social::channel::{ChannelListener, ChannelManager};
use crate::social::clan::{ClanListener, ClanStore, ClanStoreConfig};
use crate::social::directory::DirectoryService;
use crate::social::errors::{SocialError, SocialResult};
use crate::social::gateway::CommandGateway;
use crate::social::inbox::models::{ActionDirection, ActionKind, PendingAction};
use crate::social::inbox::{InboxListener, InboxStore};
use crate::social::serialization::{compress_gzip, decompress_gzip, is_gzip};
use crate::social::types::{msg_type, Identity, PushEvent, WsConnectResp, WsRequest, WsResponse};

/// WebSocket 写入端类型别名
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

/// WebSocket 读取端类型别名
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// 用户 ID
    pub user_id: String,
    /// 用户名（展示用）
    pub username: String,
    /// 认证 token
    pub token: String,
    /// 登录时已知的所属战队 ID（没有战队为 None）
    pub clan_id: Option<String>,
    /// WebSocket 服务器 URL
    pub ws_url: String,
    /// HTTP API 基础地址
    pub api_base_url: String,
    /// 压缩方式，例如 "gzip" 或空字符串表示不压缩
    pub compression: String,
    /// 战队人数上限（None 表示不限制）
    pub max_clan_members: Option<usize>,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(user_id: String, username: String, token: String) -> Self {
        Self {
            user_id,
            username,
            token,
            clan_id: None,
            ws_url: "ws://localhost:10001".to_string(),
            api_base_url: "http://localhost:10002".to_string(),
            compression: "gzip".to_string(),
            max_clan_members: None,
        }
    }
}

/// 基于 WebSocket 的推送注册实现
///
/// 订阅 / 退订帧复用请求信封（reqIdentifier 1003 / 1004），
/// data 为 `{"channelKey": ...}` JSON。
struct WsPushTransport {
    writer: Arc<Mutex<Option<WsWriter>>>,
    token: String,
    user_id: String,
    compression: String,
}

impl WsPushTransport {
    async fn send_frame(&self, req_identifier: i32, key: &ChannelKey) -> Result<()> {
        let data = serde_json::to_vec(&serde_json::json!({ "channelKey": key.to_string() }))?;
        let req = WsRequest {
            req_identifier,
            token: self.token.clone(),
            send_id: self.user_id.clone(),
            operation_id: format!("{}", chrono::Utc::now().timestamp_millis()),
            data,
        };
        let json = serde_json::to_vec(&req)?;
        let payload = if self.compression == "gzip" {
            compress_gzip(&json)?
        } else {
            json
        };

        let mut writer = self.writer.lock().await;
        let w = writer.as_mut().ok_or_else(|| anyhow::anyhow!("未连接"))?;
        w.send(WsMessage::Binary(payload)).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PushTransport for WsPushTransport {
    async fn register(&self, key: &ChannelKey) -> Result<()> {
        debug!("[Client] 📡 订阅频道: {}", key);
        self.send_frame(msg_type::WS_SUBSCRIBE_CHANNEL, key).await
    }

    async fn deregister(&self, key: &ChannelKey) -> Result<()> {
        debug!("[Client] 📴 退订频道: {}", key);
        self.send_frame(msg_type::WS_UNSUBSCRIBE_CHANNEL, key).await
    }
}

/// 推送分发器：持有各存储的引用，在读取任务里路由推送事件
struct PushRouter {
    inbox: Arc<InboxStore>,
    clan: Arc<ClanStore>,
    channels: Arc<ChannelManager>,
    /// 已处理的推送帧 operationID（服务端重复投递去重）
    received_op_ids: std::sync::Mutex<HashSet<String>>,
}

impl PushRouter {
    async fn run(&self, mut read: WsReader) {
        while let Some(msg_result) = read.next().await {
            match msg_result {
                Ok(WsMessage::Binary(data)) => {
                    self.handle_binary(data).await;
                }
                Ok(WsMessage::Text(text)) => {
                    debug!("[Client] 文本帧: {}", text);
                }
                Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {}
                Ok(WsMessage::Close(frame)) => {
                    warn!("[Client] 👋 连接关闭: {:?}", frame);
                    self.channels
                        .notify_connection(false, "连接关闭".to_string())
                        .await;
                    break;
                }
                Err(e) => {
                    error!("[Client] WebSocket 错误: {}", e);
                    self.channels
                        .notify_connection(false, format!("连接错误: {}", e))
                        .await;
                    break;
                }
                _ => {}
            }
        }
    }

    async fn handle_binary(&self, data: Vec<u8>) {
        let decompressed = if is_gzip(&data) {
            match decompress_gzip(&data) {
                Ok(d) => d,
                Err(e) => {
                    error!("[Client] 解压失败: {}", e);
                    return;
                }
            }
        } else {
            data
        };

        let resp = match serde_json::from_slice::<WsResponse>(&decompressed) {
            Ok(r) => r,
            Err(e) => {
                error!(
                    "[Client] JSON 解析失败: {}, 原始数据: {:?}",
                    e,
                    String::from_utf8_lossy(&decompressed)
                );
                return;
            }
        };

        if !resp.operation_id.is_empty() && self.is_duplicate_frame(&resp.operation_id) {
            debug!("[Client] 🔇 丢弃重复推送帧: {}", resp.operation_id);
            return;
        }

        match resp.req_identifier {
            msg_type::WS_PUSH_EVENT => {
                if resp.err_code != 0 {
                    error!("[Client] 推送帧携带错误: {:?}", resp);
                    return;
                }
                self.handle_push_event(&resp.data).await;
            }
            msg_type::WS_KICK_ONLINE_MSG => {
                warn!("[Client] ⚠️ 被踢下线");
                self.channels.notify_kicked().await;
            }
            msg_type::WS_SUBSCRIBE_CHANNEL | msg_type::WS_UNSUBSCRIBE_CHANNEL => {
                // 订阅确认帧，无需处理
                debug!("[Client] 订阅确认: reqId={}", resp.req_identifier);
            }
            _ => {
                debug!("[Client] 未知消息类型: {}", resp.req_identifier);
            }
        }
    }

    async fn handle_push_event(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let event = match serde_json::from_slice::<PushEvent>(data) {
            Ok(e) => e,
            Err(e) => {
                error!(
                    "[Client] 推送事件解析失败: {}, 原始数据: {}",
                    e,
                    String::from_utf8_lossy(data)
                );
                return;
            }
        };

        match event {
            PushEvent::NotificationCreated(action) => {
                self.inbox.apply_push(action).await;
            }
            PushEvent::NotificationResolved {
                notification_id,
                status,
            } => {
                self.inbox
                    .apply_resolved_push(&notification_id, status)
                    .await;
            }
            PushEvent::ClanMemberAdded { clan_id, member } => {
                self.clan.apply_member_added_push(&clan_id, member).await;
            }
            PushEvent::MessageReceived {
                channel_key,
                message,
            } => {
                self.channels.apply_message_push(&channel_key, message).await;
            }
        }
    }

    fn is_duplicate_frame(&self, operation_id: &str) -> bool {
        let mut set = self.received_op_ids.lock().unwrap();
        !set.insert(operation_id.to_string())
    }
}

/// 社交客户端
pub struct SocialClient {
    config: ClientConfig,
    identity: Arc<Mutex<Identity>>,
    inbox: Arc<InboxStore>,
    clan: Arc<ClanStore>,
    channels: Arc<ChannelManager>,
    directory: Arc<DirectoryService>,
    writer: Arc<Mutex<Option<WsWriter>>>,
}

impl SocialClient {
    /// 组装客户端：HTTP 网关带认证拦截器（token 通过 default_headers 自动添加）
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::HeaderName::from_static("token"),
                    reqwest::header::HeaderValue::from_str(&config.token)
                        .context("无效的 token")?,
                );
                headers
            })
            .build()
            .context("创建 HTTP 客户端失败")?;
        let gateway: Arc<dyn CommandGateway> = Arc::new(HttpGateway::new(
            http_client,
            config.api_base_url.clone(),
        ));

        let mut identity = Identity::new(config.user_id.clone(), config.username.clone());
        identity.clan_id = config.clan_id.clone();
        let identity = Arc::new(Mutex::new(identity));

        let inbox = Arc::new(InboxStore::new(gateway.clone(), config.user_id.clone()));
        let clan = Arc::new(ClanStore::new(
            gateway.clone(),
            inbox.clone(),
            identity.clone(),
            config.user_id.clone(),
            ClanStoreConfig {
                max_members: config.max_clan_members,
            },
        ));
        let writer: Arc<Mutex<Option<WsWriter>>> = Arc::new(Mutex::new(None));
        let transport = Arc::new(WsPushTransport {
            writer: writer.clone(),
            token: config.token.clone(),
            user_id: config.user_id.clone(),
            compression: config.compression.clone(),
        });
        let channels = Arc::new(ChannelManager::new(
            gateway.clone(),
            transport,
            clan.clone(),
            config.user_id.clone(),
        ));
        let directory = Arc::new(DirectoryService::new(gateway));

        Ok(Self {
            config,
            identity,
            inbox,
            clan,
            channels,
            directory,
            writer,
        })
    }

    pub fn inbox(&self) -> &Arc<InboxStore> {
        &self.inbox
    }

    pub fn clan(&self) -> &Arc<ClanStore> {
        &self.clan
    }

    pub fn channels(&self) -> &Arc<ChannelManager> {
        &self.channels
    }

    pub fn directory(&self) -> &Arc<DirectoryService> {
        &self.directory
    }

    /// 当前会话身份快照
    pub async fn identity(&self) -> Identity {
        self.identity.lock().await.clone()
    }

    /// 注册收件箱监听器
    pub async fn set_inbox_listener(&self, listener: Arc<dyn InboxListener>) {
        self.inbox.set_listener(listener).await;
    }

    /// 注册战队监听器
    pub async fn set_clan_listener(&self, listener: Arc<dyn ClanListener>) {
        self.clan.set_listener(listener).await;
    }

    /// 注册频道监听器
    pub async fn set_channel_listener(&self, listener: Arc<dyn ChannelListener>) {
        self.channels.set_listener(listener).await;
    }

    /// 接受一条待处理通知，按通知类型分发到对应存储
    ///
    /// 入队申请（ClanJoinRequest）是队长侧流程，不能从收件箱接受。
    pub async fn accept_action(&self, action: &PendingAction) -> SocialResult<()> {
        match (action.kind, action.direction) {
            (ActionKind::Friend, _) => {
                self.inbox
                    .resolve_friend(&action.notification_id, true)
                    .await
            }
            (ActionKind::ClanInvite, ActionDirection::Incoming) => {
                self.clan
                    .accept_clan_invite(&action.related_id, &action.notification_id)
                    .await
            }
            (ActionKind::ClanInvite, ActionDirection::Outgoing) => Err(
                SocialError::InvalidActionKind("不能接受自己发出的邀请".to_string()),
            ),
            (ActionKind::ClanJoinRequest, _) => Err(SocialError::InvalidActionKind(
                "入队申请由队长在队列中处理".to_string(),
            )),
        }
    }

    /// 拒绝一条待处理通知，按通知类型分发到对应存储
    pub async fn reject_action(&self, action: &PendingAction) -> SocialResult<()> {
        match (action.kind, action.direction) {
            (ActionKind::Friend, _) => {
                self.inbox
                    .resolve_friend(&action.notification_id, false)
                    .await
            }
            (ActionKind::ClanInvite, ActionDirection::Incoming) => {
                self.clan
                    .decline_clan_invite(&action.related_id, &action.notification_id)
                    .await
            }
            (ActionKind::ClanInvite, ActionDirection::Outgoing) => Err(
                SocialError::InvalidActionKind("不能拒绝自己发出的邀请".to_string()),
            ),
            (ActionKind::ClanJoinRequest, _) => Err(SocialError::InvalidActionKind(
                "入队申请由队长在队列中处理".to_string(),
            )),
        }
    }

    /// 构建 WebSocket 连接 URL
    fn build_url(&self, operation_id: &str) -> String {
        let compression_param = if self.config.compression.is_empty() {
            String::new()
        } else {
            format!("&compression={}", self.config.compression)
        };

        format!(
            "{}/?token={}&sendID={}&operationID={}{}",
            self.config.ws_url, self.config.token, self.config.user_id, operation_id,
            compression_param
        )
    }

    /// 连接到推送服务器并在内部启动心跳和推送分发
    ///
    /// 连接成功后做一次初始同步：通知、好友列表、所属战队（如有）。
    pub async fn connect(&self) -> Result<()> {
        let operation_id = format!("{}", chrono::Utc::now().timestamp_millis());
        let url = self.build_url(&operation_id);

        info!("[Client] 🔗 连接到推送服务器 (user={})", self.config.user_id);

        let (ws_stream, response) = connect_async(&url).await?;
        info!(
            "[Client] ✅ WebSocket 连接成功, 状态: {}",
            response.status()
        );

        let (write, mut read) = ws_stream.split();
        *self.writer.lock().await = Some(write);

        // 等待连接成功响应
        if let Some(Ok(WsMessage::Text(text))) = read.next().await {
            debug!("[Client] 📥 WebSocket 连接响应: {}", text);
            match serde_json::from_str::<WsConnectResp>(&text) {
                Ok(resp) => {
                    if resp.err_code == 0 {
                        info!("[Client] ✅ 服务器连接鉴权成功");
                        self.channels
                            .notify_connection(true, "连接成功".to_string())
                            .await;
                    } else {
                        let error_msg = if !resp.err_dlt.is_empty() {
                            format!("{} (详情: {})", resp.err_msg, resp.err_dlt)
                        } else {
                            resp.err_msg.clone()
                        };
                        error!(
                            "[Client] ❌ WebSocket 连接失败，错误码: {}, 错误信息: {}",
                            resp.err_code, error_msg
                        );
                        return Err(anyhow::anyhow!(
                            "WebSocket 连接失败，错误码: {}, 错误信息: {}",
                            resp.err_code,
                            error_msg
                        ));
                    }
                }
                Err(e) => {
                    error!(
                        "[Client] ❌ WebSocket 响应解析失败: {}, 原始响应: {}",
                        e, text
                    );
                    return Err(anyhow::anyhow!(
                        "WebSocket 响应解析失败: {}, 原始响应: {}",
                        e,
                        text
                    ));
                }
            }
        } else {
            error!("[Client] ❌ 未收到 WebSocket 连接响应");
            return Err(anyhow::anyhow!("未收到 WebSocket 连接响应"));
        }

        // 启动心跳
        info!("[Client] 💓 启动心跳");
        let writer_for_heartbeat = self.writer.clone();
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(25));
            loop {
                ticker.tick().await;
                let mut writer = writer_for_heartbeat.lock().await;
                match writer.as_mut() {
                    Some(w) => {
                        if w.send(WsMessage::Ping(vec![])).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        });

        // 启动推送分发任务
        info!("[Client] 📥 开始监听服务器推送");
        let router = PushRouter {
            inbox: self.inbox.clone(),
            clan: self.clan.clone(),
            channels: self.channels.clone(),
            received_op_ids: std::sync::Mutex::new(HashSet::new()),
        };
        tokio::spawn(async move {
            router.run(read).await;
        });

        // 初始同步：通知、好友、所属战队
        info!("[Client] 🔄 初始同步");
        self.inbox.refresh().await?;
        self.inbox.refresh_friends().await?;
        let clan_id = self.identity.lock().await.clan_id.clone();
        if let Some(clan_id) = clan_id {
            self.clan.load_clan(&clan_id).await?;
        }
        info!("[Client] ✅ 初始同步完成");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::inbox::models::ActionStatus;
    use crate::social::testing::sample_action;

    fn action(kind: ActionKind, direction: ActionDirection) -> PendingAction {
        let mut a = sample_action("n1", kind, 100);
        a.direction = direction;
        a.related_id = "C7".to_string();
        a
    }

    #[tokio::test]
    async fn join_request_cannot_be_accepted_from_inbox() {
        let client = SocialClient::new(ClientConfig::new(
            "u_me".to_string(),
            "玩家".to_string(),
            "t0".to_string(),
        ))
        .unwrap();
        let a = action(ActionKind::ClanJoinRequest, ActionDirection::Incoming);

        let err = client.accept_action(&a).await.unwrap_err();
        assert!(matches!(err, SocialError::InvalidActionKind(_)));
        let err = client.reject_action(&a).await.unwrap_err();
        assert!(matches!(err, SocialError::InvalidActionKind(_)));
    }

    #[tokio::test]
    async fn outgoing_invite_cannot_be_resolved_locally() {
        let client = SocialClient::new(ClientConfig::new(
            "u_me".to_string(),
            "玩家".to_string(),
            "t0".to_string(),
        ))
        .unwrap();
        let a = action(ActionKind::ClanInvite, ActionDirection::Outgoing);

        let err = client.accept_action(&a).await.unwrap_err();
        assert!(matches!(err, SocialError::InvalidActionKind(_)));
    }

    #[test]
    fn push_event_wire_format() {
        let json = r#"{
            "event": "notification.resolved",
            "payload": {"notificationID": "n9", "status": "accepted"}
        }"#;
        match serde_json::from_str::<PushEvent>(json).unwrap() {
            PushEvent::NotificationResolved {
                notification_id,
                status,
            } => {
                assert_eq!(notification_id, "n9");
                assert_eq!(status, ActionStatus::Accepted);
            }
            other => panic!("意外的事件类型: {:?}", other),
        }
    }
}
