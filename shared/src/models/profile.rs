//! Tenant profile (`profile/account`)

use serde::{Deserialize, Serialize};

/// Which flow the tenant runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemType {
    Counter,
    Table,
}

/// Tenant account profile
///
/// 管理员密码只保存 argon2 哈希
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantProfile {
    pub email: String,
    pub system_type: SystemType,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password_hash: Option<String>,
}
