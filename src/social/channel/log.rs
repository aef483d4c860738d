//! 按频道分组的有序消息日志
//!
//! 私聊与战队频道共用同一套插入 / 去重算法：消息按 `sent_at` 排序插入，
//! 时间相同或缺失时按到达顺序排列；按 message_id 去重（本地乐观副本与
//! 服务端推送副本只保留一份）。日志只做定点插入，从不整体重建。

use std::collections::HashSet;

use crate::social::channel::models::ChatMessage;

/// 单个频道的有序消息日志
#[derive(Debug, Default)]
pub struct ChannelLog {
    entries: Vec<ChatMessage>,
    seen_ids: HashSet<String>,
}

impl ChannelLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一条消息，返回是否实际插入（重复 message_id 返回 false）
    ///
    /// 插入位置：从尾部向前找到第一个 `sent_at <= msg.sent_at` 的条目之后，
    /// 相同时间戳保持到达顺序。
    pub fn insert(&mut self, msg: ChatMessage) -> bool {
        if !self.seen_ids.insert(msg.message_id.clone()) {
            return false;
        }

        let mut idx = self.entries.len();
        while idx > 0 && self.entries[idx - 1].sent_at > msg.sent_at {
            idx -= 1;
        }
        self.entries.insert(idx, msg);
        true
    }

    /// 批量插入（历史加载），返回实际插入条数
    pub fn insert_all(&mut self, msgs: Vec<ChatMessage>) -> usize {
        msgs.into_iter()
            .fold(0, |acc, m| if self.insert(m) { acc + 1 } else { acc })
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.seen_ids.contains(message_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按时间顺序返回全部消息
    pub fn messages(&self) -> &[ChatMessage] {
        &self.entries
    }
}
