//! 收件箱存储：统一管理三类待处理通知（好友申请 / 战队邀请 / 入队申请）
//!
//! 所有通知共享同一信封结构，按 `notificationId` 去重；
//! 对同一条通知的并发操作通过 in-flight 占位集串行化，
//! 第二个调用方观察到 `StaleAction`。远程调用失败时回滚占位，
//! 本地状态保持不变（全有或全无）。

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::social::directory::models::UserSummary;
use crate::social::errors::{SocialError, SocialResult};
use crate::social::gateway::CommandGateway;
use crate::social::inbox::listener::{EmptyInboxListener, InboxListener};
use crate::social::inbox::models::{ActionDirection, ActionKind, ActionStatus, PendingAction};
use crate::social::serialization::generate_operation_id;

#[derive(Default)]
struct InboxState {
    /// 全部通知（含已终结条目，pending 视图在读取时过滤）
    actions: Vec<PendingAction>,
    friends: Vec<UserSummary>,
    /// 正在远程处理中的通知 ID（占位，防止重复提交）
    in_flight: HashSet<String>,
}

/// 收件箱存储
pub struct InboxStore {
    gateway: Arc<dyn CommandGateway>,
    user_id: String,
    state: Mutex<InboxState>,
    listener: Mutex<Arc<dyn InboxListener>>,
}

impl InboxStore {
    pub fn new(gateway: Arc<dyn CommandGateway>, user_id: String) -> Self {
        Self {
            gateway,
            user_id,
            state: Mutex::new(InboxState::default()),
            listener: Mutex::new(Arc::new(EmptyInboxListener)),
        }
    }

    /// 设置收件箱监听器
    pub async fn set_listener(&self, listener: Arc<dyn InboxListener>) {
        *self.listener.lock().await = listener;
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// 从服务端重新拉取全部通知并替换本地视图
    pub async fn refresh(&self) -> SocialResult<()> {
        info!("[Inbox] 🔄 刷新通知列表: {}", self.user_id);
        let snapshot = self.gateway.fetch_notifications(&self.user_id).await?;

        {
            let mut state = self.state.lock().await;
            state.actions.clear();
            state.actions.extend(snapshot.incoming);
            state.actions.extend(snapshot.outgoing);
        }
        self.notify_pending_changed().await;
        Ok(())
    }

    /// 从服务端重新拉取好友列表
    pub async fn refresh_friends(&self) -> SocialResult<()> {
        info!("[Inbox] 🔄 刷新好友列表: {}", self.user_id);
        let friends = self.gateway.fetch_friends(&self.user_id).await?;

        let json = {
            let mut state = self.state.lock().await;
            state.friends = friends;
            serde_json::to_string(&state.friends).unwrap_or_default()
        };
        let listener = self.listener.lock().await.clone();
        listener.on_friend_list_changed(json).await;
        Ok(())
    }

    /// 待处理通知（status=Pending），按 createdAt 最新在前
    pub async fn list_pending(&self) -> Vec<PendingAction> {
        let state = self.state.lock().await;
        let mut pending: Vec<PendingAction> = state
            .actions
            .iter()
            .filter(|a| a.is_pending())
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pending
    }

    pub async fn friends(&self) -> Vec<UserSummary> {
        self.state.lock().await.friends.clone()
    }

    /// 发送好友申请，成功后乐观插入一条 Outgoing 条目
    pub async fn send_friend_request(&self, to_user_id: &str) -> SocialResult<PendingAction> {
        info!("[Inbox] 📤 发送好友申请: {} -> {}", self.user_id, to_user_id);
        self.gateway
            .send_friend_request(&self.user_id, to_user_id)
            .await?;
        let action = self
            .insert_outgoing(ActionKind::Friend, to_user_id.to_string())
            .await;
        Ok(action)
    }

    /// 处理好友申请（accept=true 接受，false 拒绝）
    ///
    /// 占位 -> 远程 -> 提交三步；远程失败回滚占位，本地无变更。
    pub async fn resolve_friend(&self, notification_id: &str, accept: bool) -> SocialResult<()> {
        info!(
            "[Inbox] ✍️ 处理好友申请: {} accept={}",
            notification_id, accept
        );
        self.claim(notification_id, ActionKind::Friend).await?;

        let result = self
            .gateway
            .resolve_friend_request(&self.user_id, notification_id, accept)
            .await;

        match result {
            Ok(()) => {
                let status = if accept {
                    ActionStatus::Accepted
                } else {
                    ActionStatus::Rejected
                };
                self.commit(notification_id, status).await;
                if accept {
                    // 好友关系是对称的，接受后双方好友列表都新增对方；
                    // 状态已提交，列表刷新失败只告警，不向调用方报错
                    if let Err(e) = self.refresh_friends().await {
                        warn!("[Inbox] ⚠️ 好友列表刷新失败: {}", e);
                    }
                }
                Ok(())
            }
            Err(e) => {
                self.revert(notification_id).await;
                Err(e)
            }
        }
    }

    /// 占位一条待处理通知，供战队邀请等跨模块流程复用
    ///
    /// 调用方负责在远程调用后调用 `commit` 或 `revert`。
    pub async fn claim(&self, notification_id: &str, expected_kind: ActionKind) -> SocialResult<()> {
        let mut state = self.state.lock().await;
        let action = state
            .actions
            .iter()
            .find(|a| a.notification_id == notification_id)
            .ok_or_else(|| SocialError::StaleAction(notification_id.to_string()))?;
        if action.kind != expected_kind {
            return Err(SocialError::InvalidActionKind(format!("{:?}", action.kind)));
        }
        if !action.is_pending() || state.in_flight.contains(notification_id) {
            return Err(SocialError::StaleAction(notification_id.to_string()));
        }
        state.in_flight.insert(notification_id.to_string());
        Ok(())
    }

    /// 提交占位：写入终态、释放占位并触发回调
    pub async fn commit(&self, notification_id: &str, status: ActionStatus) {
        {
            let mut state = self.state.lock().await;
            state.in_flight.remove(notification_id);
            if let Some(action) = state
                .actions
                .iter_mut()
                .find(|a| a.notification_id == notification_id)
            {
                action.status = status;
            }
        }
        self.notify_pending_changed().await;
    }

    /// 回滚占位：远程调用失败时释放占位，状态保持 Pending
    pub async fn revert(&self, notification_id: &str) {
        let mut state = self.state.lock().await;
        state.in_flight.remove(notification_id);
    }

    /// 乐观插入一条 Outgoing 通知（本地分配临时 ID，等服务端推送覆盖）
    pub async fn insert_outgoing(&self, kind: ActionKind, related_id: String) -> PendingAction {
        let action = PendingAction {
            notification_id: format!("local_{}", generate_operation_id()),
            kind,
            direction: ActionDirection::Outgoing,
            status: ActionStatus::Pending,
            sender_id: self.user_id.clone(),
            sender_name: String::new(),
            related_id,
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        {
            let mut state = self.state.lock().await;
            state.actions.push(action.clone());
        }
        self.notify_pending_changed().await;
        action
    }

    /// 应用 notification.created 推送
    ///
    /// 按 notificationId 去重；已终结条目的重复推送静默丢弃。
    /// 与本地乐观条目在 (kind, direction, senderId, relatedId) 上匹配时
    /// 以服务端条目替换，收编服务端分配的 ID。
    pub async fn apply_push(&self, action: PendingAction) {
        let changed = {
            let mut state = self.state.lock().await;
            if let Some(existing) = state
                .actions
                .iter()
                .find(|a| a.notification_id == action.notification_id)
            {
                if !existing.is_pending() {
                    debug!(
                        "[Inbox] 🔇 丢弃已终结通知的重复推送: {}",
                        action.notification_id
                    );
                } else {
                    debug!("[Inbox] 🔇 丢弃重复通知推送: {}", action.notification_id);
                }
                false
            } else if let Some(local) = state.actions.iter_mut().find(|a| {
                a.notification_id.starts_with("local_")
                    && a.kind == action.kind
                    && a.direction == action.direction
                    && a.sender_id == action.sender_id
                    && a.related_id == action.related_id
            }) {
                debug!(
                    "[Inbox] 🔁 本地乐观条目收编服务端 ID: {} -> {}",
                    local.notification_id, action.notification_id
                );
                *local = action;
                true
            } else {
                info!("[Inbox] 📥 收到新通知推送: {}", action.notification_id);
                state.actions.push(action);
                true
            }
        };
        if changed {
            self.notify_pending_changed().await;
        }
    }

    /// 应用 notification.resolved 推送（对方已处理我们的 Outgoing 申请等）
    pub async fn apply_resolved_push(&self, notification_id: &str, status: ActionStatus) {
        let changed = {
            let mut state = self.state.lock().await;
            match state
                .actions
                .iter_mut()
                .find(|a| a.notification_id == notification_id)
            {
                Some(action) if action.is_pending() => {
                    info!(
                        "[Inbox] 📥 通知已被处理: {} -> {:?}",
                        notification_id, status
                    );
                    action.status = status;
                    true
                }
                Some(_) => {
                    debug!("[Inbox] 🔇 丢弃已终结通知的重复推送: {}", notification_id);
                    false
                }
                None => {
                    warn!("[Inbox] ⚠️ 收到未知通知的处理推送: {}", notification_id);
                    false
                }
            }
        };
        if changed {
            self.notify_pending_changed().await;
        }
    }

    async fn notify_pending_changed(&self) {
        let pending = self.list_pending().await;
        let json = serde_json::to_string(&pending).unwrap_or_default();
        let listener = self.listener.lock().await.clone();
        listener.on_pending_actions_changed(json).await;
    }
}
