//! Local auth provider
//!
//! 开发和测试用：邮箱 → (uid, argon2 哈希)，保存在进程内。

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::util::new_doc_id;

use super::{AuthProvider, AuthUser, hash_password, verify_password};
use crate::utils::validation::{validate_email, validate_password};

struct Credential {
    uid: String,
    password_hash: String,
}

/// In-process [`AuthProvider`]
#[derive(Default)]
pub struct LocalAuthProvider {
    accounts: DashMap<String, Credential>,
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<AuthUser> {
        validate_email(email)?;
        validate_password(password)?;
        let key = normalize(email);
        // 先哈希，避免持有 DashMap 分片锁做 argon2
        let password_hash = hash_password(password)?;

        match self.accounts.entry(key.clone()) {
            Entry::Occupied(_) => Err(AppError::new(ErrorCode::EmailAlreadyRegistered)),
            Entry::Vacant(slot) => {
                let uid = new_doc_id();
                slot.insert(Credential {
                    uid: uid.clone(),
                    password_hash,
                });
                tracing::info!(uid = %uid, "Account registered");
                Ok(AuthUser { uid, email: key })
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthUser> {
        let key = normalize(email);
        let (uid, hash) = match self.accounts.get(&key) {
            Some(cred) => (cred.uid.clone(), cred.password_hash.clone()),
            None => return Err(AppError::invalid_credentials()),
        };
        if !verify_password(password, &hash)? {
            return Err(AppError::invalid_credentials());
        }
        Ok(AuthUser { uid, email: key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let auth = LocalAuthProvider::new();
        let user = auth.sign_up("Owner@Hotel.in", "secret1").await.unwrap();
        let again = auth.sign_in("owner@hotel.in", "secret1").await.unwrap();
        assert_eq!(user.uid, again.uid);

        let err = auth.sign_in("owner@hotel.in", "nope12").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let auth = LocalAuthProvider::new();
        auth.sign_up("a@b.in", "secret1").await.unwrap();
        let err = auth.sign_up("a@b.in", "secret1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailAlreadyRegistered);
    }
}
