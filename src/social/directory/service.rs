//! 目录搜索服务
//!
//! 无状态的远程查询封装；本地只保留最近一次的查询结果，供展示层复读。

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::social::directory::models::{ClanSummary, UserSummary};
use crate::social::errors::SocialResult;
use crate::social::gateway::CommandGateway;

/// 目录搜索服务
pub struct DirectoryService {
    gateway: Arc<dyn CommandGateway>,
    last_users: Mutex<Vec<UserSummary>>,
    last_clans: Mutex<Vec<ClanSummary>>,
}

impl DirectoryService {
    pub fn new(gateway: Arc<dyn CommandGateway>) -> Self {
        Self {
            gateway,
            last_users: Mutex::new(Vec::new()),
            last_clans: Mutex::new(Vec::new()),
        }
    }

    /// 按用户名或用户 ID 搜索用户，返回排序后的结果
    pub async fn search_users(&self, query: &str) -> SocialResult<Vec<UserSummary>> {
        info!("[Directory] 🔍 搜索用户: {}", query);
        let users = self.gateway.search_users(query).await?;
        debug!("[Directory] 搜索到 {} 个用户", users.len());
        *self.last_users.lock().await = users.clone();
        Ok(users)
    }

    /// 按名称或 ID 搜索战队，返回排序后的结果
    pub async fn search_clans(&self, term: &str) -> SocialResult<Vec<ClanSummary>> {
        info!("[Directory] 🔍 搜索战队: {}", term);
        let clans = self.gateway.search_clans(term).await?;
        debug!("[Directory] 搜索到 {} 个战队", clans.len());
        *self.last_clans.lock().await = clans.clone();
        Ok(clans)
    }

    /// 最近一次用户搜索结果
    pub async fn last_found_users(&self) -> Vec<UserSummary> {
        self.last_users.lock().await.clone()
    }

    /// 最近一次战队搜索结果
    pub async fn last_found_clans(&self) -> Vec<ClanSummary> {
        self.last_clans.lock().await.clone()
    }
}
