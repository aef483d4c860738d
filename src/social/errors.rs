//! 错误类型定义
//!
//! 社交核心的错误分类：本地校验错误在发起远程请求前返回；
//! 授权 / 过期类错误优先用本地状态预判，减少无谓的远程调用。

use thiserror::Error;

/// 社交核心统一错误类型
#[derive(Debug, Error)]
pub enum SocialError {
    /// 角色校验失败（仅队长可操作入队申请）
    #[error("无权限操作: {0}")]
    Unauthorized(String),

    /// 已加入战队，不能重复加入或再次申请
    #[error("已在战队中，不能重复加入")]
    AlreadyInClan,

    /// 操作对象已不在待处理状态（重复 accept/reject 等）
    #[error("该请求已被处理: {0}")]
    StaleAction(String),

    /// 该通知类型不支持此操作（如对入队申请调用 accept）
    #[error("该通知类型不支持此操作: {0}")]
    InvalidActionKind(String),

    /// 消息内容为空（text 和 image 至少要有一个）
    #[error("消息内容为空")]
    EmptyMessage,

    /// 战队人数已达配置上限
    #[error("战队人数已达上限")]
    RosterFull,

    /// 传输层错误（HTTP / WebSocket 不可达等），调用方可重试
    #[error("传输错误: {0}")]
    Transport(#[from] anyhow::Error),
}

/// 社交核心统一 Result 类型别名
pub type SocialResult<T> = Result<T, SocialError>;

impl SocialError {
    /// 是否为可重试的传输层错误
    pub fn is_transport(&self) -> bool {
        matches!(self, SocialError::Transport(_))
    }
}
