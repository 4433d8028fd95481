use chrono::{Duration, Utc};
use finance_tracker::auth::{
    AuthError, AuthService, MemorySessionStore, Session, SessionStore, User, hash_password,
};
use finance_tracker::storage::{JsonFileStore, MemoryStore, Store};
use uuid::Uuid;

fn service(ttl: Duration) -> AuthService {
    AuthService::new(
        MemoryStore::new(Vec::<User>::new()),
        MemorySessionStore::new(),
        ttl,
    )
}

#[test]
fn register_login_logout() {
    let mut auth = service(Duration::hours(1));
    let user = auth.register("alice", "correct horse").unwrap();
    assert_eq!(user.username, "alice");

    let (token, logged_in) = auth.login("alice", "correct horse").unwrap();
    assert_eq!(logged_in.id, user.id);
    assert_eq!(auth.authenticate(&token).unwrap().id, user.id);

    auth.logout(&token).unwrap();
    assert_eq!(auth.authenticate(&token), Err(AuthError::Unauthorized));
    assert_eq!(auth.logout(&token), Err(AuthError::Unauthorized));
}

#[test]
fn wrong_password_and_unknown_user() {
    let mut auth = service(Duration::hours(1));
    auth.register("alice", "correct horse").unwrap();
    assert_eq!(
        auth.login("alice", "wrong horse").unwrap_err(),
        AuthError::InvalidCredentials
    );
    assert_eq!(
        auth.login("bob", "correct horse").unwrap_err(),
        AuthError::InvalidCredentials
    );
}

#[test]
fn usernames_are_unique_ignoring_case() {
    let mut auth = service(Duration::hours(1));
    auth.register("alice", "correct horse").unwrap();
    assert!(matches!(
        auth.register("ALICE", "another pass"),
        Err(AuthError::UserExists(_))
    ));
}

#[test]
fn short_passwords_are_rejected() {
    let mut auth = service(Duration::hours(1));
    assert!(matches!(
        auth.register("alice", "short"),
        Err(AuthError::InvalidInput(_))
    ));
    assert!(matches!(
        auth.register("   ", "long enough"),
        Err(AuthError::InvalidInput(_))
    ));
}

#[test]
fn expired_tokens_are_refused() {
    let mut auth = service(Duration::seconds(-1));
    auth.register("alice", "correct horse").unwrap();
    let (token, _) = auth.login("alice", "correct horse").unwrap();
    assert_eq!(auth.authenticate(&token), Err(AuthError::Unauthorized));
}

#[test]
fn purge_drops_only_expired_sessions() {
    let now = Utc::now();
    let mut sessions = MemorySessionStore::new();
    let user_id = Uuid::new_v4();
    sessions.save_session(
        "stale",
        Session {
            user_id,
            expires_at: now - Duration::minutes(5),
        },
    );
    sessions.save_session(
        "fresh",
        Session {
            user_id,
            expires_at: now + Duration::minutes(5),
        },
    );
    assert_eq!(sessions.purge_expired(now), 1);
    assert!(sessions.get_session("stale").is_none());
    assert!(sessions.get_session("fresh").is_some());
    assert_eq!(sessions.purge_expired(now), 0);
}

#[test]
fn tokens_resolve_to_their_own_user() {
    let mut auth = service(Duration::hours(1));
    let alice = auth.register("alice", "correct horse").unwrap();
    let bob = auth.register("bob", "battery staple").unwrap();
    let (alice_token, _) = auth.login("alice", "correct horse").unwrap();
    let (bob_token, _) = auth.login("bob", "battery staple").unwrap();
    assert_ne!(alice_token, bob_token);
    assert_eq!(auth.authenticate(&alice_token).unwrap().id, alice.id);
    assert_eq!(auth.authenticate(&bob_token).unwrap().id, bob.id);
    assert!(auth.authenticate("not-a-token").is_err());
}

#[test]
fn stored_users_hold_salted_hashes() {
    let path = std::env::temp_dir().join(format!("users_{}.json", Uuid::new_v4()));
    {
        let mut auth = AuthService::new(
            JsonFileStore::new(&path),
            MemorySessionStore::new(),
            Duration::hours(1),
        );
        auth.register("alice", "correct horse").unwrap();
        auth.register("bob", "correct horse").unwrap();
    }
    let users = JsonFileStore::<Vec<User>>::new(&path).load().unwrap();
    assert_eq!(users.len(), 2);
    assert_ne!(users[0].salt, users[1].salt);
    assert_ne!(users[0].password_hash, users[1].password_hash);
    assert_eq!(
        users[0].password_hash,
        hash_password("correct horse", &users[0].salt)
    );
    assert!(!users[0].password_hash.contains("correct"));
    let _ = std::fs::remove_file(path);
}
