//! 战队监听器回调接口

use async_trait::async_trait;

/// 战队监听器回调接口
#[async_trait]
pub trait ClanListener: Send + Sync {
    /// 当前战队（成员 / 角色视图）发生变更，参数为战队 JSON 字符串，
    /// 退出 / 失效时为空字符串
    async fn on_clan_changed(&self, clan_json: String);

    /// 队长入队申请队列发生变更，参数为 JSON 数组字符串
    async fn on_join_queue_changed(&self, queue_json: String);
}

/// 默认空实现（无操作）
pub struct EmptyClanListener;

#[async_trait]
impl ClanListener for EmptyClanListener {
    async fn on_clan_changed(&self, _clan_json: String) {
        // 默认不做任何处理
    }

    async fn on_join_queue_changed(&self, _queue_json: String) {
        // 默认不做任何处理
    }
}
