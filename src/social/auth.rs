//! 登录引导：换取会话 token，核心层不感知登录流程

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::social::serialization::generate_operation_id;

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "errCode")]
    pub err_code: i32,
    #[serde(rename = "errMsg")]
    pub err_msg: String,
    pub data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub token: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "clanID", default)]
    pub clan_id: Option<String>,
}

/// 登录并换取会话 token
pub async fn login_async(
    api_base_url: &str,
    username: String,
    password: String,
) -> Result<LoginResponse, String> {
    let client = reqwest::Client::new();
    let operation_id = generate_operation_id();

    let login_req = LoginRequest { username, password };
    let url = format!("{}/account/login", api_base_url);

    info!("🔐 正在登录...");
    debug!("   URL: {}", url);
    debug!("   用户名: {}", login_req.username);
    debug!("   OperationID: {}", operation_id);

    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("operationID", &operation_id)
        .json(&login_req)
        .send()
        .await
        .map_err(|e| format!("请求失败: {}", e))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| format!("读取响应失败: {}", e))?;

    if !status.is_success() {
        return Err(format!("HTTP 错误 {}: {}", status, text));
    }

    debug!("✅ 登录响应: {}", text);

    let login_resp: LoginResponse = serde_json::from_str(&text)
        .map_err(|e| format!("解析响应失败: {}，原始响应: {}", e, text))?;

    Ok(login_resp)
}
