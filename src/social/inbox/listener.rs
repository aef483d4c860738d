//! 收件箱监听器回调接口

use async_trait::async_trait;

/// 收件箱监听器回调接口
#[async_trait]
pub trait InboxListener: Send + Sync {
    /// 待处理通知列表发生变更，参数为 JSON 数组字符串
    async fn on_pending_actions_changed(&self, actions_json: String);

    /// 好友列表发生变更（好友申请被接受后），参数为 JSON 数组字符串
    async fn on_friend_list_changed(&self, friends_json: String);
}

/// 默认空实现（无操作）
pub struct EmptyInboxListener;

#[async_trait]
impl InboxListener for EmptyInboxListener {
    async fn on_pending_actions_changed(&self, _actions_json: String) {
        // 默认不做任何处理
    }

    async fn on_friend_list_changed(&self, _friends_json: String) {
        // 默认不做任何处理
    }
}
