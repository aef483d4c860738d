//! 战队成员关系模块
//!
//! 维护当前用户所属的唯一战队、成员 / 角色视图以及队长专属的入队申请队列。

pub mod listener;
pub mod models;
pub mod service;

pub use listener::{ClanListener, EmptyClanListener};
pub use models::{Clan, ClanRole, JoinRequest};
pub use service::{ClanStore, ClanStoreConfig};
