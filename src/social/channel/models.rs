//! 频道本地模型定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 频道键：区分一条独立的实时消息流
///
/// 私聊键与双方 ID 的传入顺序无关（构造时按字典序归一），
/// 战队键直接使用聊天室 ID。只做单向渲染（Display）：
/// ID 可能含下划线，渲染结果不保证可以无歧义地解析回来。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    /// 私聊频道，low < high（字典序）
    Direct { low: String, high: String },
    /// 战队频道（聊天室 ID）
    Clan { room_id: String },
}

impl ChannelKey {
    /// 构造私聊频道键，与参数顺序无关
    pub fn direct(a: &str, b: &str) -> Self {
        if a <= b {
            ChannelKey::Direct {
                low: a.to_string(),
                high: b.to_string(),
            }
        } else {
            ChannelKey::Direct {
                low: b.to_string(),
                high: a.to_string(),
            }
        }
    }

    pub fn clan(room_id: &str) -> Self {
        ChannelKey::Clan {
            room_id: room_id.to_string(),
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, ChannelKey::Direct { .. })
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKey::Direct { low, high } => write!(f, "dm_{}_{}", low, high),
            ChannelKey::Clan { room_id } => write!(f, "clan_{}", room_id),
        }
    }
}

/// 订阅状态机：Inactive -> Subscribing -> Active，注册失败进入 Error
///
/// 同一频道键同一时刻至多一个 Active 订阅；对 Active 频道重复订阅为 no-op。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    #[serde(rename = "inactive")]
    Inactive,
    #[serde(rename = "subscribing")]
    Subscribing,
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "error")]
    Error,
}

/// 频道消息（私聊 / 战队共用同一结构）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "messageID")]
    pub message_id: String,
    #[serde(rename = "channelKey")]
    pub channel_key: String,
    #[serde(rename = "senderID")]
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "isSystem", default)]
    pub is_system: bool,
    #[serde(rename = "sentAt")]
    pub sent_at: i64,
}

/// 发送消息的载荷：text 和 image 至少要有一个
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl MessagePayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image_url: None,
        }
    }

    /// 本地校验：空文本（含纯空白）且无图片视为空消息
    pub fn is_empty(&self) -> bool {
        let no_text = self
            .text
            .as_deref()
            .map(|t| t.trim().is_empty())
            .unwrap_or(true);
        let no_image = self
            .image_url
            .as_deref()
            .map(|u| u.is_empty())
            .unwrap_or(true);
        no_text && no_image
    }
}
