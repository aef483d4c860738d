//! 通知收件箱模块
//!
//! 将好友申请、战队邀请、入队申请归一为同一种「待处理动作」集合，
//! 提供 accept / reject 与推送合并。

pub mod listener;
pub mod models;
pub mod service;

pub use listener::{EmptyInboxListener, InboxListener};
pub use models::{ActionDirection, ActionKind, ActionStatus, PendingAction};
pub use service::InboxStore;
