//! Full app lifecycle against an on-disk database.

use std::time::Duration;

use murmur_api::ApiError;
use murmur_app::{App, AppConfig, PollerState};
use murmur_db::migrations;
use murmur_types::api::{LoginRequest, RegisterRequest};
use murmur_types::events::SyncEvent;
use murmur_types::models::REACTION_PALETTE;
use tempfile::TempDir;

fn start_app() -> (TempDir, App) {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        db_path: dir.path().join("auth.db"),
        poll_interval: Duration::from_millis(25),
    };
    (dir, App::start(config).unwrap())
}

async fn signed_in(app: &App, username: &str) -> murmur_app::Session {
    let mut session = app.session();
    session
        .register(RegisterRequest::new(
            username,
            format!("{username}@example.com"),
            "secret1",
        ))
        .await
        .unwrap();
    session
        .login(LoginRequest::new(username, "secret1"))
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn logged_out_session_is_rejected() {
    let (_dir, app) = start_app();
    let session = app.session();

    assert!(session.current_user().is_none());
    assert_eq!(session.chat_list().await.unwrap_err(), ApiError::Unauthenticated);
    assert_eq!(session.send(1, "hi").await.unwrap_err(), ApiError::Unauthenticated);
    assert!(session.open_chat(1).is_err());
}

#[tokio::test]
async fn chat_between_two_sessions() {
    let (_dir, app) = start_app();
    let alice = signed_in(&app, "alice").await;
    let bob = signed_in(&app, "bob").await;
    let alice_id = alice.current_user().unwrap().id;
    let bob_id = bob.current_user().unwrap().id;

    alice.send(bob_id, "hey bob").await.unwrap();
    alice.send(bob_id, "you there?").await.unwrap();

    let list = bob.chat_list().await.unwrap();
    assert_eq!(list.unread_count, 2);
    assert_eq!(list.users.len(), 1);
    assert_eq!(list.users[0].username, "alice");

    // Opening the chat marks alice's messages read on the first tick
    let mut poller = bob.open_chat(alice_id).unwrap();
    assert_eq!(poller.peer_id(), alice_id);
    let mut rx = poller.start().unwrap();
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    match &event {
        SyncEvent::Conversation { messages, .. } => {
            assert_eq!(messages.len(), 2);
            assert!(messages.iter().all(|m| m.is_read));
        }
        SyncEvent::FetchFailed { reason, .. } => panic!("poll failed: {reason}"),
    }
    assert_eq!(event.pair(), (bob_id, alice_id));
    poller.stop().await;
    assert_eq!(poller.state(), PollerState::Stopped);

    assert_eq!(bob.chat_list().await.unwrap().unread_count, 0);

    let heart = REACTION_PALETTE[1];
    let first = bob.conversation(alice_id).await.unwrap()[0].id;
    assert_eq!(bob.react(first, heart).await.unwrap().reaction.as_deref(), Some(heart));
    let seen_by_alice = alice.conversation(bob_id).await.unwrap();
    assert_eq!(seen_by_alice[0].reaction.as_deref(), Some(heart));
    assert_eq!(bob.react(first, heart).await.unwrap().reaction, None);
}

#[tokio::test]
async fn delete_account_logs_out_and_cascades() {
    let (_dir, app) = start_app();
    let mut alice = signed_in(&app, "alice").await;
    let bob = signed_in(&app, "bob").await;
    let alice_id = alice.current_user().unwrap().id;
    let bob_id = bob.current_user().unwrap().id;

    alice.send(bob_id, "bye").await.unwrap();
    bob.send(alice_id, "wait").await.unwrap();

    let deleted = alice.delete_account().await.unwrap();
    assert_eq!(deleted.messages_deleted, 2);
    assert!(alice.current_user().is_none());

    assert!(bob.conversation(alice_id).await.unwrap().is_empty());
    let list = bob.chat_list().await.unwrap();
    assert!(list.users.is_empty());
    assert_eq!(list.unread_count, 0);
}

#[tokio::test]
async fn data_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        db_path: dir.path().join("auth.db"),
        poll_interval: Duration::from_millis(25),
    };

    {
        let app = App::start(config.clone()).unwrap();
        let session = app.session();
        session
            .register(RegisterRequest::new("alice", "a@x.com", "secret1"))
            .await
            .unwrap();
        app.shutdown();
    }

    let app = App::start(config.clone()).unwrap();
    assert_eq!(app.config().db_path, config.db_path);
    assert_eq!(app.config().poll_interval, config.poll_interval);

    let db = &app.state().db;
    let version = db.with_conn(migrations::current_version).unwrap();
    assert_eq!(version, migrations::latest_version());
    let stored = db.get_user_by_username("alice").unwrap();
    assert_eq!(stored.map(|row| row.email).as_deref(), Some("a@x.com"));

    let mut session = app.session();
    let user = session
        .login(LoginRequest::new("alice", "secret1"))
        .await
        .unwrap();
    assert_eq!(user.email, "a@x.com");

    assert_eq!(session.logout().unwrap().username, "alice");
    assert!(session.current_user().is_none());
}
