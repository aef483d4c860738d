//! 目录搜索模块
//!
//! 用户 / 战队的远程查询，仅缓存最近一次查询结果

pub mod models;
pub mod service;

pub use models::{ClanSummary, UserSummary};
pub use service::DirectoryService;
