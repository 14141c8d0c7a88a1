use std::sync::Arc;

use lazy_static::lazy_static;
use tokio::task;
use tracing::{error, info, warn};

use crate::{
    auth::password::{hash_password, verify_password, PasswordError},
    error::AccountError,
    users::{
        dto::UserResponse,
        repo::{StoreError, UserStore},
        repo_types::{NewUser, UserPatch},
    },
};

lazy_static! {
    // Verified against when the email is unknown so both login failures cost
    // one Argon2 verification.
    static ref DUMMY_HASH: Option<String> = match hash_password("dummy-password-for-timing") {
        Ok(hash) => Some(hash),
        Err(e) => {
            error!(error = %e, "dummy login hash unavailable");
            None
        }
    };
}

/// Already-validated input for account creation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: Option<i32>,
    pub is_active: Option<bool>,
}

/// Orchestrates the user store and the password hasher. Holds no locks; the
/// store is the only authority on email uniqueness.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
}

impl AccountService {
    /// Also computes the dummy login hash up front, so no request pays for it.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        lazy_static::initialize(&DUMMY_HASH);
        Self { store }
    }

    pub async fn create_user(&self, account: NewAccount) -> Result<UserResponse, AccountError> {
        let password_hash = hash_blocking(account.password).await?;
        let new_user = NewUser {
            name: account.name,
            email: account.email,
            password_hash,
            age: account.age,
            is_active: account.is_active.unwrap_or(true),
        };
        let email = new_user.email.clone();

        let user = self.store.insert(new_user).await.map_err(|e| match e {
            StoreError::DuplicateEmail => AccountError::Conflict(email),
            other => AccountError::Storage(other),
        })?;

        info!(user_id = user.id, email = %user.email, "user created");
        Ok(user.into())
    }

    /// Same as [`create_user`](Self::create_user) with the account forced active.
    pub async fn signup(
        &self,
        name: String,
        email: String,
        password: String,
        age: Option<i32>,
    ) -> Result<UserResponse, AccountError> {
        self.create_user(NewAccount {
            name,
            email,
            password,
            age,
            is_active: Some(true),
        })
        .await
    }

    pub async fn login(&self, email: &str, password: String) -> Result<UserResponse, AccountError> {
        let user = match self.store.find_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                let _ = verify_blocking(password, None).await;
                warn!("login for unknown email");
                return Err(AccountError::Authentication);
            }
            Err(other) => return Err(AccountError::Storage(other)),
        };

        if !verify_blocking(password, Some(user.password_hash.clone())).await? {
            warn!(user_id = user.id, "login with invalid password");
            return Err(AccountError::Authentication);
        }

        info!(user_id = user.id, "user logged in");
        Ok(user.into())
    }

    pub async fn get_by_id(&self, id: i32) -> Result<UserResponse, AccountError> {
        let user = self.store.find_by_id(id).await.map_err(|e| not_found_or(e, id))?;
        Ok(user.into())
    }

    pub async fn list_all(&self) -> Result<Vec<UserResponse>, AccountError> {
        let users = self.store.list_all().await.map_err(AccountError::Storage)?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Merges only the fields present in `patch`. Serves both full and
    /// partial update verbs.
    pub async fn update_user(
        &self,
        id: i32,
        patch: UserPatch,
    ) -> Result<UserResponse, AccountError> {
        let existing = self.store.find_by_id(id).await.map_err(|e| not_found_or(e, id))?;

        if let Some(email) = patch.email.as_deref().filter(|e| *e != existing.email) {
            // Early answer only; the write below is still the authority.
            match self.store.find_by_email(email).await {
                Ok(other) if other.id != id => {
                    return Err(AccountError::Conflict(email.to_string()));
                }
                Ok(_) | Err(StoreError::NotFound) => {}
                Err(other) => return Err(AccountError::Storage(other)),
            }
        }

        let user = self.store.update(id, &patch).await.map_err(|e| match e {
            StoreError::DuplicateEmail => {
                AccountError::Conflict(patch.email.clone().unwrap_or_default())
            }
            other => not_found_or(other, id),
        })?;

        info!(user_id = user.id, "user updated");
        Ok(user.into())
    }

    pub async fn delete_user(&self, id: i32) -> Result<(), AccountError> {
        self.store.find_by_id(id).await.map_err(|e| not_found_or(e, id))?;
        self.store.delete(id).await.map_err(|e| not_found_or(e, id))?;
        info!(user_id = id, "user deleted");
        Ok(())
    }
}

fn not_found_or(err: StoreError, id: i32) -> AccountError {
    match err {
        StoreError::NotFound => AccountError::NotFound(id),
        other => AccountError::Storage(other),
    }
}

async fn hash_blocking(plain: String) -> Result<String, AccountError> {
    let hash = task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| PasswordError::Hashing(e.to_string()))??;
    Ok(hash)
}

/// `None` verifies against the dummy hash and always reports a mismatch.
async fn verify_blocking(plain: String, hash: Option<String>) -> Result<bool, AccountError> {
    let ok = task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&plain, &hash),
        None => match DUMMY_HASH.as_deref() {
            Some(dummy) => verify_password(&plain, dummy).map(|_| false),
            None => Ok(false),
        },
    })
    .await
    .map_err(|e| PasswordError::Hashing(e.to_string()))??;
    Ok(ok)
}
