use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::users::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User, UserPatch},
};

#[derive(Default)]
struct Inner {
    next_id: i32,
    rows: Vec<User>,
}

/// Process-local store. The mutex plays the role of the unique index: the
/// email check and the write happen under one lock, so racing writers see
/// exactly one winner.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: Mutex<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Applies present fields to `user` in place. Timestamps are the caller's job.
fn apply_patch(user: &mut User, patch: &UserPatch) {
    if let Some(name) = &patch.name {
        user.name = name.clone();
    }
    if let Some(email) = &patch.email {
        user.email = email.clone();
    }
    if let Some(age) = patch.age {
        user.age = age;
    }
    if let Some(is_active) = patch.is_active {
        user.is_active = is_active;
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.lock()
            .rows
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: i32) -> Result<User, StoreError> {
        self.lock()
            .rows
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if inner.rows.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: inner.next_id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            age: new_user.age,
            is_active: new_user.is_active,
            created_at: now,
            updated_at: now,
        };
        inner.rows.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: i32, patch: &UserPatch) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if let Some(email) = &patch.email {
            if inner.rows.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        let user = inner
            .rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        apply_patch(user, patch);
        user.updated_at = OffsetDateTime::now_utc().max(user.created_at);
        Ok(user.clone())
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let before = inner.rows.len();
        inner.rows.retain(|u| u.id != id);
        if inner.rows.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let mut rows = self.lock().rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Jane".into(),
            email: email.into(),
            password_hash: "hash".into(),
            age: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn patch_only_touches_present_fields() {
        let store = InMemoryUserStore::new();
        let user = store.insert(new_user("a@example.com")).await.unwrap();
        let patch = UserPatch {
            age: Some(Some(31)),
            ..Default::default()
        };
        let updated = store.update(user.id, &patch).await.unwrap();
        assert_eq!(updated.age, Some(31));
        assert_eq!(updated.name, "Jane");
        assert_eq!(updated.email, "a@example.com");
        assert!(updated.is_active);
        assert!(updated.updated_at >= updated.created_at);

        let patch = UserPatch {
            age: Some(None),
            is_active: Some(false),
            ..Default::default()
        };
        let cleared = store.update(user.id, &patch).await.unwrap();
        assert_eq!(cleared.age, None);
        assert!(!cleared.is_active);
        assert_eq!(cleared.name, "Jane");
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("a@example.com")).await.unwrap();
        let err = store.insert(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = InMemoryUserStore::new();
        let first = store.insert(new_user("a@example.com")).await.unwrap();
        store.delete(first.id).await.unwrap();
        let second = store.insert(new_user("a@example.com")).await.unwrap();
        assert!(second.id > first.id);
        assert!(matches!(
            store.delete(first.id).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn update_rejects_email_held_by_other_row() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("a@example.com")).await.unwrap();
        let b = store.insert(new_user("b@example.com")).await.unwrap();
        let patch = UserPatch {
            email: Some("a@example.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update(b.id, &patch).await.unwrap_err(),
            StoreError::DuplicateEmail
        ));

        // Re-setting its own email is not a collision.
        let patch = UserPatch {
            email: Some("b@example.com".into()),
            ..Default::default()
        };
        assert_eq!(store.update(b.id, &patch).await.unwrap().email, "b@example.com");
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemoryUserStore::new();
        let a = store.insert(new_user("a@example.com")).await.unwrap();
        let b = store.insert(new_user("b@example.com")).await.unwrap();
        let ids: Vec<i32> = store.list_all().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }
}
