use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::{Role, UpdateUserRequest, User},
    password::hash_password,
};

/// Password of both seeded demo accounts.
pub const DEMO_PASSWORD: &str = "password123";

/// NewUser
///
/// A validated account about to be stored. Accounts created without a
/// password hash cannot use credentials sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: Option<String>,
}

/// Credentials
///
/// An account together with its stored password hash, as needed by sign-in.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: Option<String>,
}

/// UserRepository
///
/// Persistence contract of the `users` resource, shared as
/// `Arc<dyn UserRepository>`. Emails are unique, compared case-insensitively.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users in insertion order, optionally filtered by a
    /// case-insensitive substring of the name.
    async fn list_users(&self, search: Option<&str>) -> AppResult<Vec<User>>;
    async fn get_user(&self, id: &str) -> AppResult<Option<User>>;
    /// Case-insensitive lookup used by credentials sign-in.
    async fn find_credentials(&self, email: &str) -> AppResult<Option<Credentials>>;
    /// `AppError::Conflict` when the email is already taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    /// Applies the present fields of `changes`; `None` when the user does not exist.
    /// Moving to an email held by another account is a conflict.
    async fn update_user(&self, id: &str, changes: UpdateUserRequest) -> AppResult<Option<User>>;
    /// `true` when a user was removed.
    async fn delete_user(&self, id: &str) -> AppResult<bool>;
}

pub type UserRepositoryState = Arc<dyn UserRepository>;

struct StoredUser {
    user: User,
    password_hash: Option<String>,
}

fn email_taken(users: &[StoredUser], email: &str, except_id: Option<&str>) -> bool {
    users.iter().any(|stored| {
        stored.user.email.eq_ignore_ascii_case(email) && Some(stored.user.id.as_str()) != except_id
    })
}

/// InMemoryUserRepository
///
/// Process-local store. Uniqueness checks and writes happen under one write
/// lock.
pub struct InMemoryUserRepository {
    users: RwLock<Vec<StoredUser>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::seeded()
    }
}

impl InMemoryUserRepository {
    pub fn new(users: Vec<User>) -> Self {
        let users = users
            .into_iter()
            .map(|user| StoredUser {
                user,
                password_hash: None,
            })
            .collect();

        Self {
            users: RwLock::new(users),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// John Doe (user) and Jane Smith (admin), both signing in with
    /// `DEMO_PASSWORD`.
    pub fn seeded() -> Self {
        let repo = Self::seeded_without_passwords();
        let demo_hash = match hash_password(DEMO_PASSWORD) {
            Ok(hash) => Some(hash),
            Err(err) => {
                tracing::error!(error = %err, "demo accounts left without a password");
                None
            }
        };

        let mut users = repo.users.into_inner();
        for stored in &mut users {
            stored.password_hash = demo_hash.clone();
        }

        Self {
            users: RwLock::new(users),
        }
    }

    /// The demo accounts with credentials sign-in disabled.
    pub fn seeded_without_passwords() -> Self {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);

        Self::new(vec![
            User {
                id: "1".to_string(),
                name: "John Doe".to_string(),
                email: "john@example.com".to_string(),
                role: Role::User,
                created_at: created,
                updated_at: created,
            },
            User {
                id: "2".to_string(),
                name: "Jane Smith".to_string(),
                email: "jane@example.com".to_string(),
                role: Role::Admin,
                created_at: created,
                updated_at: created,
            },
        ])
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list_users(&self, search: Option<&str>) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        let needle = search.map(str::to_lowercase);

        Ok(users
            .iter()
            .map(|stored| &stored.user)
            .filter(|user| match &needle {
                Some(needle) => user.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|stored| stored.user.id == id)
            .map(|stored| stored.user.clone()))
    }

    async fn find_credentials(&self, email: &str) -> AppResult<Option<Credentials>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|stored| stored.user.email.eq_ignore_ascii_case(email))
            .map(|stored| Credentials {
                user: stored.user.clone(),
                password_hash: stored.password_hash.clone(),
            }))
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if email_taken(&users, &user.email, None) {
            return Err(AppError::conflict("Email already registered"));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4().to_string(),
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: now,
            updated_at: now,
        };

        users.push(StoredUser {
            user: created.clone(),
            password_hash: user.password_hash,
        });
        Ok(created)
    }

    async fn update_user(&self, id: &str, changes: UpdateUserRequest) -> AppResult<Option<User>> {
        let mut users = self.users.write().await;

        let Some(index) = users.iter().position(|stored| stored.user.id == id) else {
            return Ok(None);
        };
        if let Some(email) = &changes.email
            && email_taken(&users, email, Some(id))
        {
            return Err(AppError::conflict("Email already registered"));
        }

        let user = &mut users[index].user;

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: &str) -> AppResult<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|stored| stored.user.id != id);
        Ok(users.len() < before)
    }
}
