pub mod social;

// 重新导出常用类型和函数，方便外部使用
pub use social::{
    channel::{ChannelKey, ChannelManager, ChatMessage, MessagePayload},
    clan::{Clan, ClanRole, ClanStore},
    client::{ClientConfig, SocialClient},
    directory::DirectoryService,
    inbox::{InboxStore, PendingAction},
    login_async, SocialError, SocialResult,
};
