//! 战队本地模型定义

use serde::{Deserialize, Serialize};

/// 战队成员角色（由成员列表推导，从不单独存储）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClanRole {
    #[serde(rename = "leader")]
    Leader,
    #[serde(rename = "coLeader")]
    CoLeader,
    #[serde(rename = "member")]
    Member,
    #[serde(rename = "unknown")]
    Unknown,
}

/// 战队
///
/// 不变式：leader 在 member_ids 中，co_leader_ids 是 member_ids 的子集，
/// member_ids 内部无重复（按加入顺序排列）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clan {
    #[serde(rename = "clanID")]
    pub clan_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "leaderID")]
    pub leader_id: String,
    #[serde(rename = "coLeaderIDs", default)]
    pub co_leader_ids: Vec<String>,
    #[serde(rename = "memberIDs", default)]
    pub member_ids: Vec<String>,
    #[serde(rename = "chatRoomID")]
    pub chat_room_id: String,
    #[serde(default)]
    pub rank: i32,
    #[serde(default)]
    pub points: i64,
}

impl Clan {
    /// 推导某个用户在本战队中的角色
    ///
    /// 角色完全由 leader_id / co_leader_ids / member_ids 推导，
    /// 避免冗余字段与成员列表脱钩。
    pub fn role_of(&self, user_id: &str) -> ClanRole {
        if self.leader_id == user_id {
            ClanRole::Leader
        } else if self.co_leader_ids.iter().any(|id| id == user_id) {
            ClanRole::CoLeader
        } else if self.member_ids.iter().any(|id| id == user_id) {
            ClanRole::Member
        } else {
            ClanRole::Unknown
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == user_id)
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }
}

/// 入队申请（队长专属队列条目）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(rename = "requesterID")]
    pub requester_id: String,
    #[serde(rename = "requesterName", default)]
    pub requester_name: String,
    #[serde(rename = "requestedAt")]
    pub requested_at: i64,
}
