//! Authentication
//!
//! 认证由外部提供方负责，uid 即租户键。[`AccountService`] 负责注册时写入
//! 租户档案 (`profile/account`)、登录时建立 [`SessionContext`]。
//!
//! [`SessionContext`]: crate::core::SessionContext

mod local;
mod password;

pub use local::LocalAuthProvider;
pub use password::{hash_password, verify_password};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{SystemType, TenantProfile};
use shared::util::now_millis;
use std::sync::Arc;

use crate::core::SessionContext;
use crate::store::{Collection, DocumentStore, DocumentStoreExt, TenantScope};
use crate::utils::validation::{MAX_NAME_LEN, validate_password, validate_required_text};

/// Document id of the tenant profile
pub const PROFILE_DOC: &str = "account";

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

/// External identity provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<AuthUser>;
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthUser>;
}

/// Sign-up request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub system_type: SystemType,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

/// Accounts: sign-up, sign-in, profile
pub struct AccountService {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
}

impl AccountService {
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { auth, store }
    }

    /// Register with the provider and write the tenant profile
    pub async fn sign_up(&self, req: SignUp) -> AppResult<SessionContext> {
        let admin_password_hash = match (&req.admin_username, &req.admin_password) {
            (Some(user), Some(pass)) => {
                validate_required_text(user, "adminUsername", MAX_NAME_LEN)?;
                validate_password(pass)?;
                Some(hash_password(pass)?)
            }
            (None, None) => None,
            _ => {
                return Err(AppError::validation(
                    "adminUsername and adminPassword must be set together",
                ));
            }
        };

        let user = self.auth.sign_up(&req.email, &req.password).await?;
        let profile = TenantProfile {
            email: user.email.clone(),
            system_type: req.system_type,
            created_at: now_millis(),
            admin_username: req.admin_username,
            admin_password_hash,
        };
        let scope = TenantScope::new(&user.uid);
        self.store
            .set_as(&scope, Collection::Profile, PROFILE_DOC, &profile)
            .await
            .inspect_err(|e| tracing::error!(tenant = %scope, error = %e, "Failed to write profile"))?;

        tracing::info!(tenant = %scope, system_type = ?profile.system_type, "Tenant signed up");
        Ok(SessionContext::new(user, Some(profile.system_type)))
    }

    /// Authenticate and open a session
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionContext> {
        let user = self.auth.sign_in(email, password).await?;
        let scope = TenantScope::new(&user.uid);
        let profile = self
            .store
            .get_as::<TenantProfile>(&scope, Collection::Profile, PROFILE_DOC)
            .await?;
        if profile.is_none() {
            tracing::warn!(tenant = %scope, "Signed in without a tenant profile");
        }
        Ok(SessionContext::new(user, profile.map(|p| p.data.system_type)))
    }

    pub async fn profile(&self, session: &SessionContext) -> AppResult<TenantProfile> {
        let scope = session.scope()?;
        self.store
            .get_as::<TenantProfile>(scope, Collection::Profile, PROFILE_DOC)
            .await?
            .map(|r| r.data)
            .ok_or_else(|| AppError::new(ErrorCode::TenantNotFound))
    }

    /// Unlock admin screens for this session
    pub async fn unlock_admin(
        &self,
        session: &SessionContext,
        username: &str,
        password: &str,
    ) -> AppResult<()> {
        let profile = self.profile(session).await?;
        session.unlock_admin(&profile, username, password)
    }
}
