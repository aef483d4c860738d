//! 收件箱本地模型定义

use serde::{Deserialize, Serialize};

/// 通知类型
///
/// 三类通知共享同一个信封结构，`related_id` 的含义由类型决定：
/// Friend 为好友关系 ID，ClanInvite / ClanJoinRequest 为战队 ID。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "friend")]
    Friend,
    #[serde(rename = "clanInvite")]
    ClanInvite,
    #[serde(rename = "clanJoinRequest")]
    ClanJoinRequest,
}

/// 通知方向（相对当前用户）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionDirection {
    #[serde(rename = "incoming")]
    Incoming,
    #[serde(rename = "outgoing")]
    Outgoing,
}

/// 通知状态：Pending 是唯一可操作状态，Accepted / Rejected 均为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "accepted")]
    Accepted,
    #[serde(rename = "rejected")]
    Rejected,
}

/// 待处理动作（收件箱条目）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    #[serde(rename = "notificationID")]
    pub notification_id: String,
    pub kind: ActionKind,
    pub direction: ActionDirection,
    pub status: ActionStatus,
    #[serde(rename = "senderID")]
    pub sender_id: String,
    #[serde(rename = "senderName", default)]
    pub sender_name: String,
    /// kind=Friend 时为好友关系 ID，kind=ClanInvite / ClanJoinRequest 时为战队 ID
    #[serde(rename = "relatedID")]
    pub related_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl PendingAction {
    pub fn is_pending(&self) -> bool {
        self.status == ActionStatus::Pending
    }
}
