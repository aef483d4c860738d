//! 公共类型定义：会话身份、WebSocket 帧结构、推送事件、HTTP 响应包装

use serde::{Deserialize, Serialize};

use crate::social::channel::models::ChatMessage;
use crate::social::directory::models::UserSummary;
use crate::social::errors::{SocialError, SocialResult};
use crate::social::inbox::models::{ActionStatus, PendingAction};

/// WebSocket 消息类型标识符
pub mod msg_type {
    pub const WS_SUBSCRIBE_CHANNEL: i32 = 1003;
    pub const WS_UNSUBSCRIBE_CHANNEL: i32 = 1004;
    pub const WS_PUSH_EVENT: i32 = 2001;
    pub const WS_KICK_ONLINE_MSG: i32 = 2002;
}

/// 服务端业务错误码（非 0 的 errCode 映射到错误分类）
pub mod err_code {
    pub const UNAUTHORIZED: i32 = 1401;
    pub const ALREADY_IN_CLAN: i32 = 1402;
    pub const STALE_ACTION: i32 = 1403;
    pub const INVALID_ACTION_KIND: i32 = 1404;
    pub const ROSTER_FULL: i32 = 1405;
}

/// 当前会话的用户身份
///
/// `clan_id` 为 None 表示未加入任何战队；一个用户同一时刻至多属于一个战队。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub username: String,
    #[serde(rename = "faceURL", default)]
    pub face_url: String,
    #[serde(default)]
    pub rank: i32,
    #[serde(default)]
    pub points: i64,
    #[serde(rename = "clanID", default)]
    pub clan_id: Option<String>,
}

impl Identity {
    pub fn new(user_id: String, username: String) -> Self {
        Self {
            user_id,
            username,
            face_url: String::new(),
            rank: 0,
            points: 0,
            clan_id: None,
        }
    }
}

/// WebSocket 请求帧（客户端 -> 服务端，gzip JSON）
#[derive(Debug, Serialize, Deserialize)]
pub struct WsRequest {
    #[serde(rename = "reqIdentifier")]
    pub req_identifier: i32,
    pub token: String,
    #[serde(rename = "sendID")]
    pub send_id: String,
    #[serde(rename = "operationID")]
    pub operation_id: String,
    #[serde(default)]
    pub data: Vec<u8>,
}

/// WebSocket 响应帧（服务端 -> 客户端，二进制消息）
#[derive(Debug, Deserialize, Serialize)]
pub struct WsResponse {
    #[serde(rename = "reqIdentifier")]
    pub req_identifier: i32,
    #[serde(rename = "operationID")]
    pub operation_id: String,
    #[serde(rename = "errCode")]
    pub err_code: i32,
    #[serde(rename = "errMsg")]
    pub err_msg: String,
    #[serde(
        default,
        deserialize_with = "crate::social::serialization::deserialize_base64"
    )]
    pub data: Vec<u8>,
}

/// WebSocket 连接响应结构（连接成功后的第一条文本消息）
#[derive(Debug, Deserialize)]
pub struct WsConnectResp {
    #[serde(rename = "errCode")]
    pub err_code: i32,
    #[serde(rename = "errMsg")]
    pub err_msg: String,
    #[serde(rename = "errDlt", default)]
    pub err_dlt: String,
}

/// 推送事件（`WsResponse.data` 解码后的 JSON）
///
/// 服务端主动推送的四类事件；未打开的频道收到 `message.received` 时由
/// 频道管理器直接丢弃。
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum PushEvent {
    /// 新通知（好友申请 / 战队邀请 / 入队申请）
    #[serde(rename = "notification.created")]
    NotificationCreated(PendingAction),

    /// 通知被对端处理（本地 Outgoing 条目离开 Pending 状态）
    #[serde(rename = "notification.resolved")]
    NotificationResolved {
        #[serde(rename = "notificationID")]
        notification_id: String,
        status: ActionStatus,
    },

    /// 战队新增成员（自己被接纳时也走这条）
    #[serde(rename = "clan.memberAdded")]
    ClanMemberAdded {
        #[serde(rename = "clanID")]
        clan_id: String,
        member: UserSummary,
    },

    /// 频道新消息
    #[serde(rename = "message.received")]
    MessageReceived {
        #[serde(rename = "channelKey")]
        channel_key: String,
        message: ChatMessage,
    },
}

/// 统一的 API 响应包装结构体（包含 errCode、errMsg、data）
/// data 字段可能为 null 或缺失，因此使用 Option<T>
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(rename = "errCode")]
    pub err_code: i32,
    #[serde(rename = "errMsg")]
    pub err_msg: String,
    pub data: Option<T>,
}

/// 将服务端业务错误码映射到错误分类
pub fn map_server_error(code: i32, msg: &str) -> SocialError {
    match code {
        err_code::UNAUTHORIZED => SocialError::Unauthorized(msg.to_string()),
        err_code::ALREADY_IN_CLAN => SocialError::AlreadyInClan,
        err_code::STALE_ACTION => SocialError::StaleAction(msg.to_string()),
        err_code::INVALID_ACTION_KIND => SocialError::InvalidActionKind(msg.to_string()),
        err_code::ROSTER_FULL => SocialError::RosterFull,
        _ => SocialError::Transport(anyhow::anyhow!("服务器错误 {}: {}", code, msg)),
    }
}

/// 通用 HTTP 响应处理函数：校验 HTTP 状态和业务错误码后反序列化 data
pub async fn handle_http_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> SocialResult<T> {
    use anyhow::Context;
    use tracing::{debug, error};

    let status = response.status();

    let body_bytes = response.bytes().await.context("读取响应 body 失败")?;
    let body_str = String::from_utf8_lossy(&body_bytes);

    if !status.is_success() {
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        return Err(SocialError::Transport(anyhow::anyhow!(
            "HTTP 错误 {}: {}",
            status,
            body_str
        )));
    }
    debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);

    let api_resp: ApiResponse<T> = serde_json::from_slice(&body_bytes).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, body_str
        );
        SocialError::Transport(anyhow::anyhow!("反序列化响应失败: {:?}", e))
    })?;

    if api_resp.err_code != 0 {
        error!(
            "[HTTP] {}服务器错误，错误码: {}, 错误信息: {}",
            operation_name, api_resp.err_code, api_resp.err_msg
        );
        return Err(map_server_error(api_resp.err_code, &api_resp.err_msg));
    }

    api_resp
        .data
        .ok_or_else(|| SocialError::Transport(anyhow::anyhow!("响应中缺少 data 字段")))
}
