//! 频道管理器：私聊 / 战队两路订阅的生命周期与消息合并
//!
//! 每个频道持有一份独立的有序日志（见 log.rs）和一个纪元计数；
//! 关闭频道使纪元 +1，在途的历史拉取回来后发现纪元不匹配即丢弃结果,
//! 不会写进已关闭频道的日志。推送给未打开（或已关闭）频道的消息
//! 一律丢弃。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::social::channel::listener::{ChannelListener, EmptyChannelListener};
use crate::social::channel::log::ChannelLog;
use crate::social::channel::models::{ChannelKey, ChatMessage, MessagePayload, SubscriptionStatus};
use crate::social::channel::transport::PushTransport;
use crate::social::clan::ClanStore;
use crate::social::errors::{SocialError, SocialResult};
use crate::social::gateway::CommandGateway;

struct ChannelState {
    key: ChannelKey,
    status: SubscriptionStatus,
    /// 关闭时 +1，用于作废在途的历史拉取
    epoch: u64,
    log: ChannelLog,
}

#[derive(Default)]
struct ManagerState {
    channels: HashMap<String, ChannelState>,
}

/// 频道管理器
pub struct ChannelManager {
    gateway: Arc<dyn CommandGateway>,
    transport: Arc<dyn PushTransport>,
    clan_store: Arc<ClanStore>,
    user_id: String,
    state: Mutex<ManagerState>,
    listener: Mutex<Arc<dyn ChannelListener>>,
}

impl ChannelManager {
    pub fn new(
        gateway: Arc<dyn CommandGateway>,
        transport: Arc<dyn PushTransport>,
        clan_store: Arc<ClanStore>,
        user_id: String,
    ) -> Self {
        Self {
            gateway,
            transport,
            clan_store,
            user_id,
            state: Mutex::new(ManagerState::default()),
            listener: Mutex::new(Arc::new(EmptyChannelListener)),
        }
    }

    /// 设置频道监听器
    pub async fn set_listener(&self, listener: Arc<dyn ChannelListener>) {
        *self.listener.lock().await = listener;
    }

    /// 打开与某个用户的私聊频道
    ///
    /// 频道键与双方 ID 顺序无关。同一用户同一时刻至多一路私聊订阅：
    /// 切换对象时先停掉旧的私聊订阅再打开新的。
    pub async fn open_direct(&self, counterpart_id: &str) -> SocialResult<()> {
        let key = ChannelKey::direct(&self.user_id, counterpart_id);

        // 先停掉其它在用的私聊订阅
        let stale: Vec<ChannelKey> = {
            let state = self.state.lock().await;
            state
                .channels
                .values()
                .filter(|c| {
                    c.key.is_direct()
                        && c.key != key
                        && matches!(
                            c.status,
                            SubscriptionStatus::Active | SubscriptionStatus::Subscribing
                        )
                })
                .map(|c| c.key.clone())
                .collect()
        };
        for old in stale {
            info!("[Channel] 🔄 切换私聊对象，停用旧频道: {}", old);
            self.close(&old).await?;
        }

        self.open_channel(key).await
    }

    /// 打开战队频道
    ///
    /// 仅当 Identity.clan_id 指向的战队确实拥有该聊天室时有效。
    pub async fn open_clan(&self, chat_room_id: &str) -> SocialResult<()> {
        let owns_room = match self.clan_store.current_clan().await {
            Some(clan) => clan.chat_room_id == chat_room_id && clan.is_member(&self.user_id),
            None => false,
        };
        if !owns_room {
            return Err(SocialError::Unauthorized(format!(
                "当前用户不在聊天室 {} 所属的战队中",
                chat_room_id
            )));
        }
        self.open_channel(ChannelKey::clan(chat_room_id)).await
    }

    /// 发送消息
    ///
    /// 空消息在本地拒绝，不发起远程调用。日志里的权威条目是服务端
    /// 确认的那条；推送回来的同一条消息按 message_id 去重。
    pub async fn send(&self, key: &ChannelKey, payload: MessagePayload) -> SocialResult<ChatMessage> {
        if payload.is_empty() {
            return Err(SocialError::EmptyMessage);
        }
        let key_str = key.to_string();
        let epoch = {
            let state = self.state.lock().await;
            match state.channels.get(&key_str) {
                Some(c) if c.status == SubscriptionStatus::Active => c.epoch,
                _ => return Err(SocialError::StaleAction(key_str)),
            }
        };

        info!("[Channel] 📤 发送消息: {}", key_str);
        let ack = self
            .gateway
            .send_message(&key_str, &self.user_id, &payload)
            .await?;

        let inserted = {
            let mut state = self.state.lock().await;
            match state.channels.get_mut(&key_str) {
                Some(c) if c.epoch == epoch => c.log.insert(ack.clone()),
                _ => {
                    debug!("[Channel] 🔇 频道在发送期间已关闭，丢弃确认: {}", key_str);
                    false
                }
            }
        };
        if inserted {
            self.notify_message(&key_str, &ack).await;
        }
        Ok(ack)
    }

    /// 应用 message.received 推送
    ///
    /// 未打开（或已关闭）频道的消息一律丢弃；重复 message_id 去重。
    pub async fn apply_message_push(&self, channel_key: &str, message: ChatMessage) {
        let inserted = {
            let mut state = self.state.lock().await;
            match state.channels.get_mut(channel_key) {
                Some(c) if c.status == SubscriptionStatus::Active => c.log.insert(message.clone()),
                Some(_) => {
                    debug!("[Channel] 🔇 丢弃非激活频道的消息推送: {}", channel_key);
                    false
                }
                None => {
                    debug!("[Channel] 🔇 丢弃未打开频道的消息推送: {}", channel_key);
                    false
                }
            }
        };
        if inserted {
            self.notify_message(channel_key, &message).await;
        }
    }

    /// 关闭频道：Active/Subscribing -> Inactive，并释放推送注册
    ///
    /// 关闭 Inactive 或不存在的频道是 no-op，不是错误。
    pub async fn close(&self, key: &ChannelKey) -> SocialResult<()> {
        let key_str = key.to_string();
        let was_open = {
            let mut state = self.state.lock().await;
            match state.channels.get_mut(&key_str) {
                Some(c) if c.status != SubscriptionStatus::Inactive => {
                    c.status = SubscriptionStatus::Inactive;
                    c.epoch += 1;
                    true
                }
                _ => false,
            }
        };
        if !was_open {
            debug!("[Channel] 🔇 关闭未打开的频道（no-op）: {}", key_str);
            return Ok(());
        }

        info!("[Channel] 📴 关闭频道: {}", key_str);
        if let Err(e) = self.transport.deregister(key).await {
            warn!("[Channel] ⚠️ 推送注册释放失败: {}", e);
        }
        self.notify_status(&key_str, SubscriptionStatus::Inactive)
            .await;
        Ok(())
    }

    /// 频道当前订阅状态（未打开过返回 Inactive）
    pub async fn status(&self, key: &ChannelKey) -> SubscriptionStatus {
        let state = self.state.lock().await;
        state
            .channels
            .get(&key.to_string())
            .map(|c| c.status)
            .unwrap_or(SubscriptionStatus::Inactive)
    }

    /// 频道日志快照（按时间顺序）
    pub async fn messages(&self, key: &ChannelKey) -> Vec<ChatMessage> {
        let state = self.state.lock().await;
        state
            .channels
            .get(&key.to_string())
            .map(|c| c.log.messages().to_vec())
            .unwrap_or_default()
    }

    /// 订阅 + 历史加载的共用流程
    ///
    /// 注册失败进入 Error，由调用方显式重试（不做自动重试）；
    /// 历史回来时纪元已变说明频道被并发关闭，丢弃结果。
    async fn open_channel(&self, key: ChannelKey) -> SocialResult<()> {
        let key_str = key.to_string();
        let epoch = {
            let mut state = self.state.lock().await;
            let entry = state
                .channels
                .entry(key_str.clone())
                .or_insert_with(|| ChannelState {
                    key: key.clone(),
                    status: SubscriptionStatus::Inactive,
                    epoch: 0,
                    log: ChannelLog::new(),
                });
            if entry.status == SubscriptionStatus::Active {
                debug!("[Channel] 🔇 频道已激活，重复订阅为 no-op: {}", key_str);
                return Ok(());
            }
            entry.status = SubscriptionStatus::Subscribing;
            entry.epoch
        };
        info!("[Channel] 📡 打开频道: {}", key_str);
        self.notify_status(&key_str, SubscriptionStatus::Subscribing)
            .await;

        if let Err(e) = self.transport.register(&key).await {
            self.mark_error(&key_str, epoch).await;
            return Err(SocialError::Transport(e));
        }

        let history = match self.gateway.fetch_message_history(&key_str).await {
            Ok(history) => history,
            Err(e) => {
                self.mark_error(&key_str, epoch).await;
                return Err(e);
            }
        };

        let activated = {
            let mut state = self.state.lock().await;
            match state.channels.get_mut(&key_str) {
                Some(c) if c.epoch == epoch => {
                    let loaded = c.log.insert_all(history);
                    c.status = SubscriptionStatus::Active;
                    debug!("[Channel]   历史消息 {} 条: {}", loaded, key_str);
                    true
                }
                _ => {
                    info!("[Channel] 🔇 频道在订阅期间被关闭，丢弃历史: {}", key_str);
                    false
                }
            }
        };
        if activated {
            info!("[Channel] ✅ 频道已激活: {}", key_str);
            self.notify_status(&key_str, SubscriptionStatus::Active)
                .await;
        }
        Ok(())
    }

    async fn mark_error(&self, key_str: &str, epoch: u64) {
        let marked = {
            let mut state = self.state.lock().await;
            match state.channels.get_mut(key_str) {
                Some(c) if c.epoch == epoch => {
                    c.status = SubscriptionStatus::Error;
                    true
                }
                _ => false,
            }
        };
        if marked {
            warn!("[Channel] ❌ 频道订阅失败: {}", key_str);
            self.notify_status(key_str, SubscriptionStatus::Error).await;
        }
    }

    /// 连接状态变化（由连接层调用，转发给频道监听器）
    pub async fn notify_connection(&self, connected: bool, message: String) {
        let listener = self.listener.lock().await.clone();
        listener.on_connection_status_changed(connected, message).await;
    }

    /// 被踢下线（由连接层调用，转发给频道监听器）
    pub async fn notify_kicked(&self) {
        let listener = self.listener.lock().await.clone();
        listener.on_kicked_offline().await;
    }

    async fn notify_status(&self, key_str: &str, status: SubscriptionStatus) {
        let listener = self.listener.lock().await.clone();
        listener
            .on_subscription_status_changed(key_str.to_string(), status)
            .await;
    }

    async fn notify_message(&self, key_str: &str, message: &ChatMessage) {
        let json = serde_json::to_string(message).unwrap_or_default();
        let listener = self.listener.lock().await.clone();
        listener.on_message_received(key_str.to_string(), json).await;
    }
}
