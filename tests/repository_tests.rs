use std::sync::Arc;

use telco_portal::{
    errors::AppError,
    models::{Role, UpdateUserRequest},
    password::verify_password,
    repository::{DEMO_PASSWORD, InMemoryUserRepository, NewUser, UserRepository},
};

fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        role: Role::User,
        password_hash: None,
    }
}

#[tokio::test]
async fn test_seeded_accounts() {
    let repo = InMemoryUserRepository::seeded();
    let users = repo.list_users(None).await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].role, Role::User);
    assert_eq!(users[1].role, Role::Admin);
}

#[tokio::test]
async fn test_create_assigns_unique_ids() {
    let repo = InMemoryUserRepository::empty();
    let a = repo.create_user(new_user("A", "a@example.com")).await.unwrap();
    let b = repo.create_user(new_user("B", "b@example.com")).await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(repo.get_user(&b.id).await.unwrap(), Some(b));
}

#[tokio::test]
async fn test_find_credentials_ignores_case() {
    let repo = InMemoryUserRepository::seeded();
    let found = repo.find_credentials("John@Example.COM").await.unwrap().unwrap();

    assert_eq!(found.user.id, "1");
    let hash = found.password_hash.unwrap();
    assert!(verify_password(DEMO_PASSWORD, &hash).unwrap());
    assert!(!verify_password("secret123", &hash).unwrap());

    assert!(repo.find_credentials("ghost@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_accounts_without_passwords_have_no_hash() {
    let repo = InMemoryUserRepository::seeded_without_passwords();
    let found = repo.find_credentials("jane@example.com").await.unwrap().unwrap();

    assert_eq!(found.user.role, Role::Admin);
    assert!(found.password_hash.is_none());
}

#[tokio::test]
async fn test_create_keeps_password_hash() {
    let repo = InMemoryUserRepository::empty();
    let mut user = new_user("A", "a@example.com");
    user.password_hash = Some("$argon2id$stored".to_string());
    repo.create_user(user).await.unwrap();

    let found = repo.find_credentials("a@example.com").await.unwrap().unwrap();
    assert_eq!(found.password_hash.as_deref(), Some("$argon2id$stored"));
}

#[tokio::test]
async fn test_create_rejects_taken_email() {
    let repo = InMemoryUserRepository::seeded();
    let result = repo.create_user(new_user("Copy", "JOHN@example.com")).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(repo.list_users(None).await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_with_one_email_store_one_account() {
    let repo = Arc::new(InMemoryUserRepository::empty());

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                let email = if i % 2 == 0 { "race@example.com" } else { "RACE@example.com" };
                repo.create_user(new_user(&format!("Racer {i}"), email)).await
            })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(repo.list_users(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_to_taken_email_conflicts() {
    let repo = InMemoryUserRepository::seeded();
    let changes = UpdateUserRequest {
        email: Some("jane@example.com".to_string()),
        ..UpdateUserRequest::default()
    };

    let result = repo.update_user("1", changes).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let same_email = UpdateUserRequest {
        email: Some("John@example.com".to_string()),
        ..UpdateUserRequest::default()
    };
    let user = repo.update_user("1", same_email).await.unwrap().unwrap();
    assert_eq!(user.email, "John@example.com");
}

#[tokio::test]
async fn test_search_matches_name_substring() {
    let repo = InMemoryUserRepository::seeded();

    assert_eq!(repo.list_users(Some("doe")).await.unwrap().len(), 1);
    assert_eq!(repo.list_users(Some("smith")).await.unwrap()[0].id, "2");
    assert!(repo.list_users(Some("example")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_and_delete_missing_user() {
    let repo = InMemoryUserRepository::seeded();

    let updated = repo
        .update_user("404", UpdateUserRequest::default())
        .await
        .unwrap();
    assert!(updated.is_none());
    assert!(!repo.delete_user("404").await.unwrap());
}

#[tokio::test]
async fn test_update_promotes_role() {
    let repo = InMemoryUserRepository::seeded();
    let changes = UpdateUserRequest {
        role: Some(Role::Admin),
        ..UpdateUserRequest::default()
    };

    let user = repo.update_user("1", changes).await.unwrap().unwrap();
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.name, "John Doe");
    assert!(user.updated_at > user.created_at);
}
