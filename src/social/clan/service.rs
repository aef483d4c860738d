//! 战队存储：当前用户所属的唯一战队 + 队长专属入队申请队列
//!
//! 角色永远从成员列表推导（见 models::Clan::role_of），授权检查
//! 在本地先行，通不过的调用不会发起远程请求、不会产生任何状态变更。
//! Identity.clan_id 与 Clan.member_ids 由本模块保持双向一致。

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

use crate::social::directory::models::UserSummary;
use crate::social::errors::{SocialError, SocialResult};
use crate::social::gateway::CommandGateway;
use crate::social::clan::listener::{ClanListener, EmptyClanListener};
use crate::social::clan::models::{Clan, ClanRole, JoinRequest};
use crate::social::inbox::models::{ActionKind, ActionStatus};
use crate::social::inbox::InboxStore;
use crate::social::types::Identity;

/// 战队存储配置
#[derive(Debug, Clone, Default)]
pub struct ClanStoreConfig {
    /// 战队人数上限（None 表示不限制）
    pub max_members: Option<usize>,
}

#[derive(Default)]
struct ClanState {
    clan: Option<Clan>,
    join_queue: Vec<JoinRequest>,
    /// 正在远程处理中的入队申请人 ID
    in_flight: HashSet<String>,
    /// 队列刷新是否在途（重入的刷新调用折叠进同一个请求）
    queue_refresh_in_flight: bool,
}

/// 战队存储
pub struct ClanStore {
    gateway: Arc<dyn CommandGateway>,
    inbox: Arc<InboxStore>,
    identity: Arc<Mutex<Identity>>,
    user_id: String,
    config: ClanStoreConfig,
    state: Mutex<ClanState>,
    queue_refreshed: Notify,
    listener: Mutex<Arc<dyn ClanListener>>,
}

impl ClanStore {
    pub fn new(
        gateway: Arc<dyn CommandGateway>,
        inbox: Arc<InboxStore>,
        identity: Arc<Mutex<Identity>>,
        user_id: String,
        config: ClanStoreConfig,
    ) -> Self {
        Self {
            gateway,
            inbox,
            identity,
            user_id,
            config,
            state: Mutex::new(ClanState::default()),
            queue_refreshed: Notify::new(),
            listener: Mutex::new(Arc::new(EmptyClanListener)),
        }
    }

    /// 设置战队监听器
    pub async fn set_listener(&self, listener: Arc<dyn ClanListener>) {
        *self.listener.lock().await = listener;
    }

    /// 当前所属战队（未加入时为 None）
    pub async fn current_clan(&self) -> Option<Clan> {
        self.state.lock().await.clan.clone()
    }

    /// 当前用户在所属战队中的角色
    pub async fn current_role(&self) -> ClanRole {
        match &self.state.lock().await.clan {
            Some(clan) => clan.role_of(&self.user_id),
            None => ClanRole::Unknown,
        }
    }

    /// 从服务端加载战队详情并替换本地视图
    ///
    /// 若当前用户是队长，顺带刷新入队申请队列（刷新策略：队长视图
    /// 在战队加载时必须带上队列）。
    pub async fn load_clan(&self, clan_id: &str) -> SocialResult<Clan> {
        info!("[Clan] 🔄 加载战队: {}", clan_id);
        let clan = self.gateway.fetch_clan(clan_id).await?;

        let is_leader = clan.role_of(&self.user_id) == ClanRole::Leader;
        {
            let mut state = self.state.lock().await;
            state.clan = Some(clan.clone());
        }
        self.notify_clan_changed().await;

        if is_leader {
            if let Err(e) = self.fetch_join_requests(clan_id, &self.user_id).await {
                warn!("[Clan] ⚠️ 入队申请队列加载失败: {}", e);
            }
        }
        Ok(clan)
    }

    /// 发起入队申请
    ///
    /// 成功后在收件箱乐观插入一条 Outgoing ClanJoinRequest。
    pub async fn request_join(&self, clan_id: &str) -> SocialResult<()> {
        if self.identity.lock().await.clan_id.is_some() {
            return Err(SocialError::AlreadyInClan);
        }
        info!("[Clan] 📤 发起入队申请: {} -> {}", self.user_id, clan_id);
        self.gateway
            .join_clan_request(clan_id, &self.user_id)
            .await?;
        self.inbox
            .insert_outgoing(ActionKind::ClanJoinRequest, clan_id.to_string())
            .await;
        Ok(())
    }

    /// 拉取入队申请队列（仅队长，授权按当前战队状态重新推导）
    ///
    /// 在途的刷新不会重复发起：重入调用等待同一个请求完成后
    /// 返回刷新后的队列快照。
    pub async fn fetch_join_requests(
        &self,
        clan_id: &str,
        leader_id: &str,
    ) -> SocialResult<Vec<JoinRequest>> {
        self.ensure_leader(clan_id, leader_id).await?;

        let wait = {
            let mut state = self.state.lock().await;
            if state.queue_refresh_in_flight {
                debug!("[Clan] ⏳ 队列刷新在途，折叠重入调用: {}", clan_id);
                Some(self.queue_refreshed.notified())
            } else {
                state.queue_refresh_in_flight = true;
                None
            }
        };
        if let Some(notified) = wait {
            notified.await;
            return Ok(self.state.lock().await.join_queue.clone());
        }

        let result = self.gateway.fetch_clan_join_queue(clan_id, leader_id).await;
        let outcome = {
            let mut state = self.state.lock().await;
            state.queue_refresh_in_flight = false;
            match result {
                Ok(queue) => {
                    state.join_queue = queue.clone();
                    Ok(queue)
                }
                Err(e) => Err(e),
            }
        };
        self.queue_refreshed.notify_waiters();
        if outcome.is_ok() {
            self.notify_queue_changed().await;
        }
        outcome
    }

    /// 队长接受一条入队申请
    ///
    /// 成功后：申请人进入成员列表末尾，队列条目移除，服务端向申请人
    /// 发出通知推送。人数达到上限时返回 RosterFull，队列保持不变。
    pub async fn accept_join_request(
        &self,
        clan_id: &str,
        leader_id: &str,
        requester_id: &str,
    ) -> SocialResult<()> {
        self.claim_join_request(clan_id, leader_id, requester_id, true)
            .await?;

        let result = self
            .gateway
            .resolve_join_request(clan_id, leader_id, requester_id, true)
            .await;

        let mut state = self.state.lock().await;
        state.in_flight.remove(requester_id);
        match result {
            Ok(()) => {
                if let Some(clan) = state.clan.as_mut() {
                    if !clan.is_member(requester_id) {
                        clan.member_ids.push(requester_id.to_string());
                    }
                }
                state.join_queue.retain(|r| r.requester_id != requester_id);
                drop(state);
                info!("[Clan] ✅ 已接受入队申请: {}", requester_id);
                self.notify_clan_changed().await;
                self.notify_queue_changed().await;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// 队长拒绝一条入队申请：仅移除队列条目，成员列表不变
    pub async fn reject_join_request(
        &self,
        clan_id: &str,
        leader_id: &str,
        requester_id: &str,
    ) -> SocialResult<()> {
        self.claim_join_request(clan_id, leader_id, requester_id, false)
            .await?;

        let result = self
            .gateway
            .resolve_join_request(clan_id, leader_id, requester_id, false)
            .await;

        let mut state = self.state.lock().await;
        state.in_flight.remove(requester_id);
        match result {
            Ok(()) => {
                state.join_queue.retain(|r| r.requester_id != requester_id);
                drop(state);
                info!("[Clan] ✅ 已拒绝入队申请: {}", requester_id);
                self.notify_queue_changed().await;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// 被邀请方接受战队邀请
    ///
    /// 通知条目走收件箱的占位 / 提交流程；成功后设置 Identity.clan_id
    /// 并加载战队视图。
    pub async fn accept_clan_invite(
        &self,
        clan_id: &str,
        notification_id: &str,
    ) -> SocialResult<()> {
        if self.identity.lock().await.clan_id.is_some() {
            return Err(SocialError::AlreadyInClan);
        }
        self.inbox
            .claim(notification_id, ActionKind::ClanInvite)
            .await?;

        let result = self
            .gateway
            .resolve_clan_invite(&self.user_id, clan_id, notification_id, true)
            .await;

        match result {
            Ok(()) => {
                self.inbox.commit(notification_id, ActionStatus::Accepted).await;
                self.identity.lock().await.clan_id = Some(clan_id.to_string());
                info!("[Clan] ✅ 已接受战队邀请: {}", clan_id);
                // 状态已提交，视图加载失败只告警，之后可重新 load_clan
                if let Err(e) = self.load_clan(clan_id).await {
                    warn!("[Clan] ⚠️ 战队视图加载失败: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                self.inbox.revert(notification_id).await;
                Err(e)
            }
        }
    }

    /// 被邀请方拒绝战队邀请：仅通知条目进入 Rejected，无成员变更
    pub async fn decline_clan_invite(
        &self,
        clan_id: &str,
        notification_id: &str,
    ) -> SocialResult<()> {
        self.inbox
            .claim(notification_id, ActionKind::ClanInvite)
            .await?;

        let result = self
            .gateway
            .resolve_clan_invite(&self.user_id, clan_id, notification_id, false)
            .await;

        match result {
            Ok(()) => {
                self.inbox.commit(notification_id, ActionStatus::Rejected).await;
                info!("[Clan] ✅ 已拒绝战队邀请: {}", clan_id);
                Ok(())
            }
            Err(e) => {
                self.inbox.revert(notification_id).await;
                Err(e)
            }
        }
    }

    /// 应用 clan.memberAdded 推送
    ///
    /// 新成员是自己时，说明本人的入队申请 / 邀请已生效：设置
    /// Identity.clan_id 并拉取战队视图；否则只更新当前战队的
    /// 成员列表和队列。
    pub async fn apply_member_added_push(&self, clan_id: &str, member: UserSummary) {
        if member.user_id == self.user_id {
            info!("[Clan] 📥 本人已加入战队: {}", clan_id);
            self.identity.lock().await.clan_id = Some(clan_id.to_string());
            if let Err(e) = self.load_clan(clan_id).await {
                warn!("[Clan] ⚠️ 战队视图加载失败: {}", e);
            }
            return;
        }

        let relevant = {
            let mut state = self.state.lock().await;
            match state.clan.as_mut() {
                Some(clan) if clan.clan_id == clan_id => {
                    if !clan.is_member(&member.user_id) {
                        clan.member_ids.push(member.user_id.clone());
                    }
                    state
                        .join_queue
                        .retain(|r| r.requester_id != member.user_id);
                    true
                }
                _ => {
                    debug!("[Clan] 🔇 丢弃与当前战队无关的成员推送: {}", clan_id);
                    false
                }
            }
        };
        if relevant {
            info!("[Clan] 📥 新成员加入: {}", member.user_id);
            self.notify_clan_changed().await;
            self.notify_queue_changed().await;
        }
    }

    /// 队长操作的本地预检：授权 + 队列存在性 + 人数上限 + 并发占位
    async fn claim_join_request(
        &self,
        clan_id: &str,
        leader_id: &str,
        requester_id: &str,
        accepting: bool,
    ) -> SocialResult<()> {
        let mut state = self.state.lock().await;
        let clan = match state.clan.as_ref() {
            Some(clan) if clan.clan_id == clan_id => clan,
            _ => return Err(SocialError::Unauthorized(leader_id.to_string())),
        };
        if clan.role_of(leader_id) != ClanRole::Leader {
            return Err(SocialError::Unauthorized(leader_id.to_string()));
        }
        if accepting {
            if let Some(max) = self.config.max_members {
                if clan.member_count() >= max {
                    return Err(SocialError::RosterFull);
                }
            }
        }
        if !state
            .join_queue
            .iter()
            .any(|r| r.requester_id == requester_id)
            || state.in_flight.contains(requester_id)
        {
            return Err(SocialError::StaleAction(requester_id.to_string()));
        }
        state.in_flight.insert(requester_id.to_string());
        Ok(())
    }

    /// 授权检查：按当前战队状态重新推导，不信任调用方声明的角色
    async fn ensure_leader(&self, clan_id: &str, leader_id: &str) -> SocialResult<()> {
        let state = self.state.lock().await;
        match state.clan.as_ref() {
            Some(clan) if clan.clan_id == clan_id && clan.role_of(leader_id) == ClanRole::Leader => {
                Ok(())
            }
            _ => Err(SocialError::Unauthorized(leader_id.to_string())),
        }
    }

    async fn notify_clan_changed(&self) {
        let json = match &self.state.lock().await.clan {
            Some(clan) => serde_json::to_string(clan).unwrap_or_default(),
            None => String::new(),
        };
        let listener = self.listener.lock().await.clone();
        listener.on_clan_changed(json).await;
    }

    async fn notify_queue_changed(&self) {
        let json = {
            let state = self.state.lock().await;
            serde_json::to_string(&state.join_queue).unwrap_or_default()
        };
        let listener = self.listener.lock().await.clone();
        listener.on_join_queue_changed(json).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::testing::MemoryGateway;

    fn sample_clan(member_ids: &[&str]) -> Clan {
        Clan {
            clan_id: "C7".to_string(),
            name: "夜枭".to_string(),
            description: String::new(),
            leader_id: "u_leader".to_string(),
            co_leader_ids: vec![],
            member_ids: member_ids.iter().map(|s| s.to_string()).collect(),
            chat_room_id: "room_7".to_string(),
            rank: 3,
            points: 920,
        }
    }

    fn join_request(requester_id: &str) -> JoinRequest {
        JoinRequest {
            requester_id: requester_id.to_string(),
            requester_name: format!("玩家{}", requester_id),
            requested_at: 100,
        }
    }

    struct Fixture {
        gateway: Arc<MemoryGateway>,
        store: ClanStore,
        identity: Arc<Mutex<Identity>>,
    }

    fn fixture(user_id: &str, config: ClanStoreConfig) -> Fixture {
        let gateway = Arc::new(MemoryGateway::new());
        let inbox = Arc::new(InboxStore::new(gateway.clone(), user_id.to_string()));
        let identity = Arc::new(Mutex::new(Identity::new(
            user_id.to_string(),
            format!("玩家{}", user_id),
        )));
        let store = ClanStore::new(
            gateway.clone(),
            inbox,
            identity.clone(),
            user_id.to_string(),
            config,
        );
        Fixture {
            gateway,
            store,
            identity,
        }
    }

    async fn load_leader_fixture(f: &Fixture, members: &[&str], queue: Vec<JoinRequest>) {
        {
            let mut state = f.gateway.state.lock().unwrap();
            state
                .clan_details
                .insert("C7".to_string(), sample_clan(members));
            state.join_queues.insert("C7".to_string(), queue);
        }
        f.store.load_clan("C7").await.unwrap();
    }

    #[tokio::test]
    async fn accept_adds_member_and_drains_queue() {
        let f = fixture("u_leader", ClanStoreConfig::default());
        load_leader_fixture(&f, &["u_leader"], vec![join_request("u_a")]).await;

        f.store
            .accept_join_request("C7", "u_leader", "u_a")
            .await
            .unwrap();

        let clan = f.store.current_clan().await.unwrap();
        assert!(clan.is_member("u_a"));
        let queue = f
            .store
            .fetch_join_requests("C7", "u_leader")
            .await
            .unwrap();
        assert!(queue.iter().all(|r| r.requester_id != "u_a"));
    }

    #[tokio::test]
    async fn reject_leaves_roster_unchanged() {
        let f = fixture("u_leader", ClanStoreConfig::default());
        load_leader_fixture(&f, &["u_leader"], vec![join_request("u_a")]).await;

        f.store
            .reject_join_request("C7", "u_leader", "u_a")
            .await
            .unwrap();

        let clan = f.store.current_clan().await.unwrap();
        assert!(!clan.is_member("u_a"));
        assert_eq!(clan.member_count(), 1);
    }

    #[tokio::test]
    async fn non_leader_is_unauthorized_without_mutation() {
        let f = fixture("u_member", ClanStoreConfig::default());
        load_leader_fixture(&f, &["u_leader", "u_member"], vec![join_request("u_a")]).await;
        let calls_before = f.gateway.calls().len();

        let err = f
            .store
            .fetch_join_requests("C7", "u_member")
            .await
            .unwrap_err();
        assert!(matches!(err, SocialError::Unauthorized(_)));

        let err = f
            .store
            .accept_join_request("C7", "u_member", "u_a")
            .await
            .unwrap_err();
        assert!(matches!(err, SocialError::Unauthorized(_)));

        // 本地预检通不过：没有发起任何远程调用，成员列表不变
        assert_eq!(f.gateway.calls().len(), calls_before);
        assert_eq!(f.store.current_clan().await.unwrap().member_count(), 2);
    }

    #[tokio::test]
    async fn roster_ceiling_rejects_with_queue_intact() {
        let f = fixture(
            "u_leader",
            ClanStoreConfig {
                max_members: Some(2),
            },
        );
        load_leader_fixture(&f, &["u_leader", "u_b"], vec![join_request("u_a")]).await;

        let err = f
            .store
            .accept_join_request("C7", "u_leader", "u_a")
            .await
            .unwrap_err();
        assert!(matches!(err, SocialError::RosterFull));

        let clan = f.store.current_clan().await.unwrap();
        assert_eq!(clan.member_count(), 2);
        let queue = f
            .store
            .fetch_join_requests("C7", "u_leader")
            .await
            .unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].requester_id, "u_a");
    }

    #[tokio::test]
    async fn second_accept_on_same_requester_is_stale() {
        let f = fixture("u_leader", ClanStoreConfig::default());
        load_leader_fixture(&f, &["u_leader"], vec![join_request("u_a")]).await;

        f.store
            .accept_join_request("C7", "u_leader", "u_a")
            .await
            .unwrap();
        let err = f
            .store
            .accept_join_request("C7", "u_leader", "u_a")
            .await
            .unwrap_err();
        assert!(matches!(err, SocialError::StaleAction(_)));

        // 成员只进入一次
        let clan = f.store.current_clan().await.unwrap();
        let count = clan.member_ids.iter().filter(|id| *id == "u_a").count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn request_join_inserts_outgoing_action() {
        let f = fixture("u_a", ClanStoreConfig::default());
        f.store.request_join("C7").await.unwrap();

        let pending = f.store.inbox.list_pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, ActionKind::ClanJoinRequest);
        assert_eq!(pending[0].related_id, "C7");
        assert_eq!(
            pending[0].direction,
            crate::social::inbox::models::ActionDirection::Outgoing
        );
    }

    #[tokio::test]
    async fn request_join_while_in_clan_is_rejected() {
        let f = fixture("u_a", ClanStoreConfig::default());
        f.identity.lock().await.clan_id = Some("C1".to_string());

        let err = f.store.request_join("C7").await.unwrap_err();
        assert!(matches!(err, SocialError::AlreadyInClan));
        assert!(f.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn reentrant_queue_refresh_collapses_into_one_request() {
        let f = fixture("u_leader", ClanStoreConfig::default());
        load_leader_fixture(&f, &["u_leader"], vec![join_request("u_a")]).await;
        let fetches_before = f
            .gateway
            .calls()
            .iter()
            .filter(|c| c.starts_with("fetch_clan_join_queue"))
            .count();

        f.gateway.set_delay(std::time::Duration::from_millis(20));
        let store = Arc::new(f.store);
        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_join_requests("C7", "u_leader").await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_join_requests("C7", "u_leader").await })
        };
        let qa = a.await.unwrap().unwrap();
        let qb = b.await.unwrap().unwrap();
        assert_eq!(qa.len(), 1);
        assert_eq!(qb.len(), 1);

        let fetches_after = f
            .gateway
            .calls()
            .iter()
            .filter(|c| c.starts_with("fetch_clan_join_queue"))
            .count();
        assert_eq!(fetches_after - fetches_before, 1);
    }

    #[tokio::test]
    async fn accept_invite_sets_identity_and_loads_clan() {
        let f = fixture("u_a", ClanStoreConfig::default());
        {
            let mut state = f.gateway.state.lock().unwrap();
            state
                .clan_details
                .insert("C7".to_string(), sample_clan(&["u_leader", "u_a"]));
            state.notifications.incoming = vec![crate::social::testing::sample_action(
                "n_inv",
                ActionKind::ClanInvite,
                100,
            )];
        }
        f.store.inbox.refresh().await.unwrap();

        f.store.accept_clan_invite("C7", "n_inv").await.unwrap();

        assert_eq!(
            f.identity.lock().await.clan_id.as_deref(),
            Some("C7")
        );
        assert_eq!(f.store.current_clan().await.unwrap().clan_id, "C7");
        assert!(f.store.inbox.list_pending().await.is_empty());
    }

    #[tokio::test]
    async fn invite_accept_survives_failed_view_load() {
        let f = fixture("u_a", ClanStoreConfig::default());
        {
            let mut state = f.gateway.state.lock().unwrap();
            state
                .clan_details
                .insert("C7".to_string(), sample_clan(&["u_leader", "u_a"]));
            state.notifications.incoming = vec![crate::social::testing::sample_action(
                "n_inv",
                ActionKind::ClanInvite,
                100,
            )];
        }
        f.store.inbox.refresh().await.unwrap();

        // 仅让提交后的战队视图加载失败：邀请已生效，调用仍应成功
        f.gateway.fail_on(
            "fetch_clan:",
            SocialError::Transport(anyhow::anyhow!("网络错误")),
        );
        f.store.accept_clan_invite("C7", "n_inv").await.unwrap();

        assert_eq!(f.identity.lock().await.clan_id.as_deref(), Some("C7"));
        assert!(f.store.inbox.list_pending().await.is_empty());

        // 视图随后可以重新加载
        f.store.load_clan("C7").await.unwrap();
        assert_eq!(f.store.current_clan().await.unwrap().clan_id, "C7");
    }

    #[tokio::test]
    async fn requester_side_join_flow_end_to_end() {
        use crate::social::inbox::models::{ActionDirection, ActionStatus, PendingAction};

        // A 发起申请 -> 服务端推送正式通知 -> 队长接受 -> A 收到
        // notification.resolved 和 clan.memberAdded 两条推送
        let f = fixture("u_a", ClanStoreConfig::default());
        f.gateway.state.lock().unwrap().clan_details.insert(
            "C7".to_string(),
            sample_clan(&["u_leader", "u_a"]),
        );

        f.store.request_join("C7").await.unwrap();
        let pending = f.store.inbox.list_pending().await;
        let local = pending[0].clone();
        assert_eq!(local.related_id, "C7");

        let server_copy = PendingAction {
            notification_id: "n_srv".to_string(),
            kind: ActionKind::ClanJoinRequest,
            direction: ActionDirection::Outgoing,
            status: ActionStatus::Pending,
            sender_id: "u_a".to_string(),
            sender_name: String::new(),
            related_id: "C7".to_string(),
            created_at: local.created_at,
        };
        f.store.inbox.apply_push(server_copy).await;

        f.store
            .inbox
            .apply_resolved_push("n_srv", ActionStatus::Accepted)
            .await;
        let me = UserSummary {
            user_id: "u_a".to_string(),
            username: "玩家A".to_string(),
            face_url: String::new(),
            rank: 1,
            points: 10,
        };
        f.store.apply_member_added_push("C7", me).await;

        assert!(f.store.inbox.list_pending().await.is_empty());
        assert_eq!(f.identity.lock().await.clan_id.as_deref(), Some("C7"));
        let clan = f.store.current_clan().await.unwrap();
        assert_eq!(clan.clan_id, "C7");
        assert!(clan.is_member("u_a"));
    }

    fn member_summary(user_id: &str) -> UserSummary {
        UserSummary {
            user_id: user_id.to_string(),
            username: format!("玩家{}", user_id),
            face_url: String::new(),
            rank: 1,
            points: 10,
        }
    }

    #[tokio::test]
    async fn member_added_push_for_other_updates_roster_and_queue() {
        #[derive(Default)]
        struct QueueTap {
            queues: std::sync::Mutex<Vec<String>>,
        }
        #[async_trait::async_trait]
        impl ClanListener for QueueTap {
            async fn on_clan_changed(&self, _clan_json: String) {}
            async fn on_join_queue_changed(&self, queue_json: String) {
                self.queues.lock().unwrap().push(queue_json);
            }
        }

        let f = fixture("u_leader", ClanStoreConfig::default());
        load_leader_fixture(&f, &["u_leader"], vec![join_request("u_a")]).await;
        let tap = Arc::new(QueueTap::default());
        f.store.set_listener(tap.clone()).await;

        // 队长侧收到申请人被接纳的推送：进入成员列表，移出本地队列
        f.store
            .apply_member_added_push("C7", member_summary("u_a"))
            .await;
        let clan = f.store.current_clan().await.unwrap();
        assert!(clan.is_member("u_a"));
        let last_queue: Vec<JoinRequest> =
            serde_json::from_str(tap.queues.lock().unwrap().last().unwrap()).unwrap();
        assert!(last_queue.is_empty());

        // 重复投递不会把同一成员加入两次
        f.store
            .apply_member_added_push("C7", member_summary("u_a"))
            .await;
        let clan = f.store.current_clan().await.unwrap();
        let count = clan.member_ids.iter().filter(|id| *id == "u_a").count();
        assert_eq!(count, 1);

        // 与当前战队无关的推送丢弃
        f.store
            .apply_member_added_push("C9", member_summary("u_z"))
            .await;
        let clan = f.store.current_clan().await.unwrap();
        assert!(!clan.is_member("u_z"));
        assert_eq!(clan.clan_id, "C7");
    }

    #[tokio::test]
    async fn member_added_push_for_self_adopts_clan() {
        let f = fixture("u_a", ClanStoreConfig::default());
        f.gateway
            .state
            .lock()
            .unwrap()
            .clan_details
            .insert("C7".to_string(), sample_clan(&["u_leader", "u_a"]));

        let me = UserSummary {
            user_id: "u_a".to_string(),
            username: "玩家A".to_string(),
            face_url: String::new(),
            rank: 1,
            points: 10,
        };
        f.store.apply_member_added_push("C7", me).await;

        assert_eq!(f.identity.lock().await.clan_id.as_deref(), Some("C7"));
        assert_eq!(f.store.current_clan().await.unwrap().clan_id, "C7");
    }
}
