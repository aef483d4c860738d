//! 测试用的内存实现（仅编译进测试）

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::social::channel::models::{ChannelKey, ChatMessage, MessagePayload};
use crate::social::channel::transport::PushTransport;
use crate::social::clan::models::{Clan, JoinRequest};
use crate::social::directory::models::{ClanSummary, UserSummary};
use crate::social::errors::{SocialError, SocialResult};
use crate::social::gateway::{CommandGateway, NotificationsSnapshot};

/// 内存命令通道：数据由测试预置，调用记录可断言
#[derive(Default)]
pub struct MemoryGateway {
    pub state: Mutex<MemoryState>,
}

#[derive(Default)]
pub struct MemoryState {
    pub users: Vec<UserSummary>,
    pub clans: Vec<ClanSummary>,
    pub friends: Vec<UserSummary>,
    pub notifications: NotificationsSnapshot,
    pub clan_details: HashMap<String, Clan>,
    pub join_queues: HashMap<String, Vec<JoinRequest>>,
    pub history: HashMap<String, Vec<ChatMessage>>,
    /// 下一次调用返回该错误（取出后清空）
    pub fail_next: Option<SocialError>,
    /// 下一次匹配到该调用名前缀的调用返回该错误（取出后清空）
    pub fail_on: Option<(String, SocialError)>,
    /// 每次调用前等待（用于构造并发交错）
    pub delay: Option<Duration>,
    pub calls: Vec<String>,
    next_message_seq: i64,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn fail_next(&self, err: SocialError) {
        self.state.lock().unwrap().fail_next = Some(err);
    }

    pub fn fail_on(&self, call_prefix: &str, err: SocialError) {
        self.state.lock().unwrap().fail_on = Some((call_prefix.to_string(), err));
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    /// 记录调用并弹出注入错误；锁在 await 之前释放
    async fn enter(&self, call: String) -> SocialResult<()> {
        let (delay, injected) = {
            let mut state = self.state.lock().unwrap();
            let targeted = match state.fail_on.take() {
                Some((prefix, err)) if call.starts_with(&prefix) => Some(err),
                Some(other) => {
                    state.fail_on = Some(other);
                    None
                }
                None => None,
            };
            state.calls.push(call);
            let injected = targeted.or_else(|| state.fail_next.take());
            (state.delay, injected)
        };
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        match injected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CommandGateway for MemoryGateway {
    async fn search_users(&self, query: &str) -> SocialResult<Vec<UserSummary>> {
        self.enter(format!("search_users:{}", query)).await?;
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|u| u.user_id.contains(query) || u.username.contains(query))
            .cloned()
            .collect())
    }

    async fn search_clans(&self, term: &str) -> SocialResult<Vec<ClanSummary>> {
        self.enter(format!("search_clans:{}", term)).await?;
        let state = self.state.lock().unwrap();
        Ok(state
            .clans
            .iter()
            .filter(|c| c.clan_id.contains(term) || c.name.contains(term))
            .cloned()
            .collect())
    }

    async fn fetch_friends(&self, user_id: &str) -> SocialResult<Vec<UserSummary>> {
        self.enter(format!("fetch_friends:{}", user_id)).await?;
        Ok(self.state.lock().unwrap().friends.clone())
    }

    async fn send_friend_request(&self, from_id: &str, to_id: &str) -> SocialResult<()> {
        self.enter(format!("send_friend_request:{}->{}", from_id, to_id))
            .await
    }

    async fn fetch_notifications(&self, user_id: &str) -> SocialResult<NotificationsSnapshot> {
        self.enter(format!("fetch_notifications:{}", user_id)).await?;
        let state = self.state.lock().unwrap();
        Ok(NotificationsSnapshot {
            incoming: state.notifications.incoming.clone(),
            outgoing: state.notifications.outgoing.clone(),
        })
    }

    async fn resolve_friend_request(
        &self,
        _user_id: &str,
        notification_id: &str,
        accept: bool,
    ) -> SocialResult<()> {
        self.enter(format!(
            "resolve_friend_request:{}:{}",
            notification_id, accept
        ))
        .await
    }

    async fn join_clan_request(&self, clan_id: &str, user_id: &str) -> SocialResult<()> {
        self.enter(format!("join_clan_request:{}:{}", clan_id, user_id))
            .await
    }

    async fn resolve_join_request(
        &self,
        clan_id: &str,
        _leader_id: &str,
        requester_id: &str,
        accept: bool,
    ) -> SocialResult<()> {
        self.enter(format!(
            "resolve_join_request:{}:{}:{}",
            clan_id, requester_id, accept
        ))
        .await?;
        let mut state = self.state.lock().unwrap();
        if let Some(queue) = state.join_queues.get_mut(clan_id) {
            queue.retain(|r| r.requester_id != requester_id);
        }
        Ok(())
    }

    async fn resolve_clan_invite(
        &self,
        _user_id: &str,
        clan_id: &str,
        notification_id: &str,
        accept: bool,
    ) -> SocialResult<()> {
        self.enter(format!(
            "resolve_clan_invite:{}:{}:{}",
            clan_id, notification_id, accept
        ))
        .await
    }

    async fn fetch_clan(&self, clan_id: &str) -> SocialResult<Clan> {
        self.enter(format!("fetch_clan:{}", clan_id)).await?;
        let state = self.state.lock().unwrap();
        state
            .clan_details
            .get(clan_id)
            .cloned()
            .ok_or_else(|| SocialError::StaleAction(format!("战队不存在: {}", clan_id)))
    }

    async fn fetch_clan_join_queue(
        &self,
        clan_id: &str,
        _leader_id: &str,
    ) -> SocialResult<Vec<JoinRequest>> {
        self.enter(format!("fetch_clan_join_queue:{}", clan_id))
            .await?;
        let state = self.state.lock().unwrap();
        Ok(state.join_queues.get(clan_id).cloned().unwrap_or_default())
    }

    async fn fetch_message_history(&self, channel_key: &str) -> SocialResult<Vec<ChatMessage>> {
        self.enter(format!("fetch_message_history:{}", channel_key))
            .await?;
        let state = self.state.lock().unwrap();
        Ok(state.history.get(channel_key).cloned().unwrap_or_default())
    }

    async fn send_message(
        &self,
        channel_key: &str,
        sender_id: &str,
        payload: &MessagePayload,
    ) -> SocialResult<ChatMessage> {
        self.enter(format!("send_message:{}", channel_key)).await?;
        let mut state = self.state.lock().unwrap();
        state.next_message_seq += 1;
        let seq = state.next_message_seq;
        let message = ChatMessage {
            message_id: format!("srv_{}", seq),
            channel_key: channel_key.to_string(),
            sender_id: sender_id.to_string(),
            text: payload.text.clone(),
            image_url: payload.image_url.clone(),
            is_system: false,
            sent_at: 1_000_000 + seq,
        };
        state
            .history
            .entry(channel_key.to_string())
            .or_default()
            .push(message.clone());
        Ok(message)
    }
}

/// 记录订阅注册 / 注销调用的推送通道
#[derive(Default)]
pub struct RecordingTransport {
    pub registered: Mutex<Vec<String>>,
    pub deregistered: Mutex<Vec<String>>,
    pub fail_register: Mutex<bool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered_keys(&self) -> Vec<String> {
        self.registered.lock().unwrap().clone()
    }

    pub fn deregistered_keys(&self) -> Vec<String> {
        self.deregistered.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn register(&self, key: &ChannelKey) -> anyhow::Result<()> {
        if *self.fail_register.lock().unwrap() {
            anyhow::bail!("订阅注册失败（测试注入）");
        }
        self.registered.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn deregister(&self, key: &ChannelKey) -> anyhow::Result<()> {
        self.deregistered.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// 构造一个最小的待处理通知
pub fn sample_action(
    id: &str,
    kind: crate::social::inbox::models::ActionKind,
    created_at: i64,
) -> crate::social::inbox::models::PendingAction {
    use crate::social::inbox::models::{ActionDirection, ActionStatus, PendingAction};
    PendingAction {
        notification_id: id.to_string(),
        kind,
        direction: ActionDirection::Incoming,
        status: ActionStatus::Pending,
        sender_id: format!("sender_{}", id),
        sender_name: format!("发送者{}", id),
        related_id: String::new(),
        created_at,
    }
}
