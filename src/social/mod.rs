//! 社交核心：通知收件箱、战队成员关系、实时频道订阅、目录搜索

pub mod api;
pub mod auth;
pub mod channel;
pub mod clan;
pub mod client;
pub mod directory;
pub mod errors;
pub mod gateway;
pub mod inbox;
pub mod serialization;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use auth::login_async;
pub use client::{ClientConfig, SocialClient};
pub use errors::{SocialError, SocialResult};
