//! Rival CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试和展示社交功能
//! 启动时通过命令行参数指定用户，自动登录连接，只展示接收到的信息

use anyhow::Result;
use clap::Parser;
use rival_sdk_core_rust::social::channel::listener::ChannelListener;
use rival_sdk_core_rust::social::channel::models::SubscriptionStatus;
use rival_sdk_core_rust::social::clan::ClanListener;
use rival_sdk_core_rust::social::client::{ClientConfig, SocialClient};
use rival_sdk_core_rust::social::inbox::InboxListener;
use rival_sdk_core_rust::social::login_async;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Rival CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "rival-cli")]
#[command(about = "Rival CLI 客户端 - 用于测试和展示社交功能", long_about = None)]
struct Args {
    /// 用户名
    #[arg(short, long, default_value = "tester01")]
    username: String,

    /// 密码
    #[arg(short, long, default_value = "123456")]
    password: String,

    /// HTTP API 基础地址
    #[arg(long, default_value = "http://localhost:10002")]
    api_url: String,

    /// WebSocket 服务器地址
    #[arg(long, default_value = "ws://localhost:10001")]
    ws_url: String,

    /// 运行时长（秒），0 表示持续运行
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// 日志级别（默认: info,rival_sdk_core_rust=debug）
    #[arg(long, default_value = "info,rival_sdk_core_rust=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 创建日志文件（追加模式）
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("无法创建日志文件 debug.log");

    // 输出到 stdout（控制台），保留 ANSI 颜色代码用于终端显示
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码（文件不需要颜色）
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
}

/// 设置监听器（输出所有接收到的信息）
async fn setup_listeners(client: &SocialClient) {
    // 收件箱监听器
    struct CliInboxListener;
    #[async_trait::async_trait]
    impl InboxListener for CliInboxListener {
        async fn on_pending_actions_changed(&self, actions_json: String) {
            info!("[CLI/Inbox] 📝 待处理通知变更: {}", actions_json);
        }

        async fn on_friend_list_changed(&self, friends_json: String) {
            info!("[CLI/Inbox] 👥 好友列表变更: {}", friends_json);
        }
    }
    client.set_inbox_listener(Arc::new(CliInboxListener)).await;

    // 战队监听器
    struct CliClanListener;
    #[async_trait::async_trait]
    impl ClanListener for CliClanListener {
        async fn on_clan_changed(&self, clan_json: String) {
            if clan_json.is_empty() {
                info!("[CLI/Clan] 🏳️ 已离开战队");
            } else {
                info!("[CLI/Clan] 🛡️ 战队变更: {}", clan_json);
            }
        }

        async fn on_join_queue_changed(&self, queue_json: String) {
            info!("[CLI/Clan] 📋 入队申请队列变更: {}", queue_json);
        }
    }
    client.set_clan_listener(Arc::new(CliClanListener)).await;

    // 频道监听器
    struct CliChannelListener;
    #[async_trait::async_trait]
    impl ChannelListener for CliChannelListener {
        async fn on_message_received(&self, channel_key: String, message_json: String) {
            info!("[CLI/Channel] 📨 [{}] 收到新消息: {}", channel_key, message_json);
        }

        async fn on_subscription_status_changed(
            &self,
            channel_key: String,
            status: SubscriptionStatus,
        ) {
            info!("[CLI/Channel] 📡 [{}] 订阅状态: {:?}", channel_key, status);
        }

        async fn on_connection_status_changed(&self, connected: bool, message: String) {
            if connected {
                info!("[CLI/Channel] 🔗 已连接: {}", message);
            } else {
                error!("[CLI/Channel] 🔗 断开连接: {}", message);
            }
        }

        async fn on_kicked_offline(&self) {
            error!("[CLI/Channel] ⚠️ 被踢下线");
        }
    }
    client
        .set_channel_listener(Arc::new(CliChannelListener))
        .await;
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    init_logger(&args.log_level);

    info!("[CLI] 🚀 Rival CLI 客户端（测试模式）");
    info!("[CLI] 👤 用户名: {}", args.username);
    info!("[CLI] ⏱️  运行时长: {} 秒（0=持续运行）", args.duration);

    // 登录
    info!("[CLI] 🔐 正在登录...");
    let login_resp = login_async(&args.api_url, args.username.clone(), args.password.clone())
        .await
        .map_err(|e| anyhow::anyhow!("登录失败: {}", e))?;

    let data = login_resp
        .data
        .ok_or_else(|| anyhow::anyhow!("登录失败：服务器返回数据为空"))?;
    info!("[CLI] ✅ 登录成功！用户ID: {}", data.user_id);

    // 创建客户端
    let mut config = ClientConfig::new(data.user_id.clone(), args.username.clone(), data.token);
    config.clan_id = data.clan_id;
    config.api_base_url = args.api_url.clone();
    config.ws_url = args.ws_url.clone();
    let client = SocialClient::new(config)?;

    // 设置监听器
    setup_listeners(&client).await;

    // 连接（内部完成初始同步）
    info!("[CLI] 🔗 正在连接服务器...");
    client
        .connect()
        .await
        .map_err(|e| anyhow::anyhow!("连接失败: {}", e))?;
    info!("[CLI] ✅ 连接成功！");

    // 显示初始信息
    {
        let pending = client.inbox().list_pending().await;
        info!("[CLI] 📝 待处理通知（共 {} 条）:", pending.len());
        for action in pending.iter().take(5) {
            info!(
                "[CLI]   - {} | {:?} | {:?} | 来自: {}",
                action.notification_id, action.kind, action.direction, action.sender_name
            );
        }

        let friends = client.inbox().friends().await;
        info!("[CLI] 👥 好友列表（共 {} 个）", friends.len());

        match client.clan().current_clan().await {
            Some(clan) => info!(
                "[CLI] 🛡️ 所属战队: {} ({} 人)",
                clan.name,
                clan.member_count()
            ),
            None => info!("[CLI] 🛡️ 暂未加入战队"),
        }
    }

    info!("[CLI] 📥 开始监听推送...");
    info!("[CLI] 💡 提示：程序将持续运行并显示接收到的所有通知和消息");
    if args.duration > 0 {
        info!("[CLI] ⏰ {} 秒后自动退出", args.duration);
        sleep(Duration::from_secs(args.duration)).await;
        info!("[CLI] 👋 程序退出");
    } else {
        info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
        // 持续运行直到被中断
        loop {
            sleep(Duration::from_secs(3600)).await;
        }
    }

    Ok(())
}
