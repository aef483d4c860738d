//! 目录搜索结果模型

use serde::{Deserialize, Serialize};

/// 用户摘要（搜索结果 / 好友列表条目）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub username: String,
    #[serde(rename = "faceURL", default)]
    pub face_url: String,
    #[serde(default)]
    pub rank: i32,
    #[serde(default)]
    pub points: i64,
}

/// 战队摘要（搜索结果条目）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClanSummary {
    #[serde(rename = "clanID")]
    pub clan_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "leaderID")]
    pub leader_id: String,
    #[serde(rename = "leaderName", default)]
    pub leader_name: String,
    #[serde(rename = "memberCount", default)]
    pub member_count: i32,
    #[serde(default)]
    pub rank: i32,
    #[serde(default)]
    pub points: i64,
}
