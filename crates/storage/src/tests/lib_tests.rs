use chrono::Duration;

use super::*;

fn alice<'a>() -> NewUser<'a> {
    NewUser {
        email: "alice@example.com",
        first_name: "Alice",
        last_name: "Liddell",
        password_hash: "hash",
        password_salt: "salt",
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_and_reads_users() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let user_id = storage
        .create_user(&alice())
        .await
        .expect("insert")
        .expect("new user");

    let by_email = storage
        .user_by_email("alice@example.com")
        .await
        .expect("query")
        .expect("user");
    assert_eq!(by_email.user_id, user_id);
    assert_eq!(by_email.first_name, "Alice");
    assert_eq!(by_email.summary().last_name, "Liddell");

    let by_id = storage.user_by_id(user_id).await.expect("query").expect("user");
    assert_eq!(by_id.email, "alice@example.com");

    assert!(storage
        .user_by_email("nobody@example.com")
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn duplicate_email_is_not_inserted() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage.create_user(&alice()).await.expect("insert").is_some());
    assert!(storage.create_user(&alice()).await.expect("insert").is_none());
}

#[tokio::test]
async fn session_lifecycle() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let user_id = storage
        .create_user(&alice())
        .await
        .expect("insert")
        .expect("new user");
    let expires_at = Utc::now() + Duration::hours(1);

    storage
        .create_session("sid-1", user_id, expires_at)
        .await
        .expect("session");
    let session = storage
        .load_session("sid-1")
        .await
        .expect("query")
        .expect("session");
    assert_eq!(session.user_id, user_id);
    assert_eq!(session.expires_at.timestamp(), expires_at.timestamp());

    assert!(storage.delete_session("sid-1").await.expect("delete"));
    assert!(!storage.delete_session("sid-1").await.expect("delete"));
    assert!(storage.load_session("sid-1").await.expect("query").is_none());
}

#[tokio::test]
async fn purges_only_expired_sessions() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let user_id = storage
        .create_user(&alice())
        .await
        .expect("insert")
        .expect("new user");
    let now = Utc::now();
    storage
        .create_session("old", user_id, now - Duration::minutes(5))
        .await
        .expect("session");
    storage
        .create_session("fresh", user_id, now + Duration::minutes(5))
        .await
        .expect("session");

    assert_eq!(
        storage.purge_expired_sessions(now).await.expect("purge"),
        vec!["old".to_string()]
    );
    assert!(storage.load_session("old").await.expect("query").is_none());
    assert!(storage.load_session("fresh").await.expect("query").is_some());
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("hue_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("accounts.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn sqlite_path_skips_memory_and_strips_query() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://db"), None);
    assert_eq!(
        sqlite_path("sqlite://data/app.db?mode=rwc"),
        Some(PathBuf::from("data/app.db"))
    );
}
