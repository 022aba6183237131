//! Session context
//!
//! 每个登录会话一份：租户、管理员解锁状态、下单进行中标记。
//! 不使用全局状态，登出即清空。

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{SystemType, TenantProfile};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::auth::{AuthUser, verify_password};
use crate::store::TenantScope;

/// Per-session state
#[derive(Debug)]
pub struct SessionContext {
    user: AuthUser,
    scope: TenantScope,
    system_type: Option<SystemType>,
    admin_unlocked: AtomicBool,
    place_in_flight: AtomicBool,
    signed_out: AtomicBool,
}

impl SessionContext {
    pub fn new(user: AuthUser, system_type: Option<SystemType>) -> Self {
        Self {
            scope: TenantScope::new(&user.uid),
            user,
            system_type,
            admin_unlocked: AtomicBool::new(false),
            place_in_flight: AtomicBool::new(false),
            signed_out: AtomicBool::new(false),
        }
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn system_type(&self) -> Option<SystemType> {
        self.system_type
    }

    /// Tenant scope, fails once the session has signed out
    pub fn scope(&self) -> AppResult<&TenantScope> {
        if self.signed_out.load(Ordering::Acquire) {
            return Err(AppError::not_authenticated());
        }
        Ok(&self.scope)
    }

    pub fn is_admin_unlocked(&self) -> bool {
        self.admin_unlocked.load(Ordering::Acquire)
    }

    pub fn require_admin(&self) -> AppResult<()> {
        self.scope()?;
        if !self.is_admin_unlocked() {
            return Err(AppError::new(ErrorCode::AdminRequired));
        }
        Ok(())
    }

    /// Verify admin credentials against the tenant profile
    pub fn unlock_admin(
        &self,
        profile: &TenantProfile,
        username: &str,
        password: &str,
    ) -> AppResult<()> {
        self.scope()?;
        let (Some(expected_user), Some(hash)) =
            (&profile.admin_username, &profile.admin_password_hash)
        else {
            return Err(AppError::new(ErrorCode::AdminNotConfigured));
        };

        if expected_user != username || !verify_password(password, hash)? {
            tracing::warn!(tenant = %self.scope, "Admin unlock rejected");
            return Err(AppError::invalid_credentials());
        }

        self.admin_unlocked.store(true, Ordering::Release);
        tracing::info!(tenant = %self.scope, "Admin unlocked");
        Ok(())
    }

    pub fn lock_admin(&self) {
        self.admin_unlocked.store(false, Ordering::Release);
    }

    /// 登出：清除管理员解锁，后续调用返回 NotAuthenticated
    pub fn sign_out(&self) {
        self.admin_unlocked.store(false, Ordering::Release);
        self.signed_out.store(true, Ordering::Release);
        tracing::info!(tenant = %self.scope, "Signed out");
    }

    /// Claim the single in-flight order placement slot
    pub fn begin_place(&self) -> AppResult<PlaceGuard<'_>> {
        self.scope()?;
        if self
            .place_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AppError::new(ErrorCode::OrderInFlight));
        }
        Ok(PlaceGuard {
            flag: &self.place_in_flight,
        })
    }
}

/// Releases the in-flight slot on drop
#[derive(Debug)]
pub struct PlaceGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for PlaceGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
