//! Connection lifecycle against the loopback service, on a paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quickchat_client::{
    ChatClient, ChatView, ClientConfig, ConnectionManager, ConnectionStatus, SharedView,
};
use quickchat_net::{
    ConnectParams, Connected, LoopbackService, NetError, SessionHandle, Transport,
};
use quickchat_shared::{Identity, Message, Timestamp};
use quickchat_store::{Database, MemoryTokenStore, TokenStore};
use tokio::time::Instant;

/// Its first session is already closed when the client receives it; later
/// connects go straight to the wrapped service.
#[derive(Clone)]
struct DeadFirstSession {
    inner: LoopbackService,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Transport for DeadFirstSession {
    async fn connect(&mut self, params: &ConnectParams) -> Result<Connected, NetError> {
        let mut connected = self.inner.connect(params).await?;
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            let (closed, commands) = SessionHandle::channel();
            drop(commands);
            // Dropping the live handle ends the session on the service side.
            connected.handle = closed;
        }
        Ok(connected)
    }
}

fn config() -> ClientConfig {
    ClientConfig {
        uri: "loopback".into(),
        ..ClientConfig::default()
    }
}

async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

fn is_connected(view: &SharedView) -> bool {
    view.snapshot().status() == &ConnectionStatus::Connected
}

#[tokio::test(start_paused = true)]
async fn reconnect_presents_stored_token_after_delay() {
    let service = LoopbackService::new();
    let tokens = MemoryTokenStore::new();
    let view = SharedView::new();

    let client = ChatClient::new(tokens.clone(), view.clone());
    let (manager, handle) = ConnectionManager::new(config(), service.clone(), client);
    let task = manager.spawn();

    wait_until("first connect", || is_connected(&view)).await;
    let token = tokens.load_token().unwrap().expect("token persisted");
    assert_eq!(service.connect_attempts(), vec![None]);

    let dropped_at = Instant::now();
    service.disconnect_all("network down");

    wait_until("disconnect handled", || view.snapshot().placeholder().is_some()).await;
    assert_eq!(
        view.snapshot().status(),
        &ConnectionStatus::Reconnecting { attempt: 1 }
    );

    wait_until("reconnect", || service.connect_attempts().len() == 2).await;
    assert!(dropped_at.elapsed() >= Duration::from_secs(5));
    assert_eq!(service.connect_attempts()[1].as_deref(), Some(token.as_str()));

    wait_until("snapshot reapplied", || {
        is_connected(&view) && view.snapshot().placeholder().is_none()
    })
    .await;

    handle.shutdown();
    let client = task.await.unwrap();
    assert_eq!(client.session().token(), Some(token.as_str()));
    assert_eq!(service.users().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_connect_is_not_retried() {
    let service = LoopbackService::new();
    service.refuse_connections(Some("maintenance"));
    let view = SharedView::new();

    let client = ChatClient::new(MemoryTokenStore::new(), view.clone());
    let (manager, handle) = ConnectionManager::new(config(), service.clone(), client);
    let task = manager.spawn();

    wait_until("connect error", || {
        matches!(view.snapshot().status(), ConnectionStatus::Error { .. })
    })
    .await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(service.connect_attempts().len(), 1);
    assert_eq!(
        view.snapshot().errors(),
        vec!["Connection error: Network error: Connection refused: maintenance"]
    );

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_reconnect_stops_retrying() {
    let service = LoopbackService::new();
    let view = SharedView::new();

    let client = ChatClient::new(MemoryTokenStore::new(), view.clone());
    let (manager, handle) = ConnectionManager::new(config(), service.clone(), client);
    let task = manager.spawn();

    wait_until("first connect", || is_connected(&view)).await;
    service.refuse_connections(Some("gone"));
    service.disconnect_all("server restart");

    wait_until("reconnect attempt", || service.connect_attempts().len() == 2).await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(service.connect_attempts().len(), 2);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn every_disconnect_schedules_one_reconnect() {
    let service = LoopbackService::new();
    let view = SharedView::new();

    let client = ChatClient::new(MemoryTokenStore::new(), view.clone());
    let (manager, handle) = ConnectionManager::new(config(), service.clone(), client);
    let task = manager.spawn();

    for round in 1..=3 {
        wait_until("connected", || is_connected(&view)).await;
        service.disconnect_all("flaky link");
        wait_until("reconnect", || service.connect_attempts().len() == round + 1).await;
    }
    wait_until("connected", || is_connected(&view)).await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(service.connect_attempts().len(), 4);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reconnect_limit_caps_attempts() {
    let service = LoopbackService::new();
    let view = SharedView::new();
    let config = ClientConfig {
        reconnect_limit: Some(1),
        ..config()
    };

    let client = ChatClient::new(MemoryTokenStore::new(), view.clone());
    let (manager, handle) = ConnectionManager::new(config, service.clone(), client);
    let task = manager.spawn();

    wait_until("connected", || is_connected(&view)).await;
    service.disconnect_all("one");
    wait_until("reconnect", || service.connect_attempts().len() == 2).await;
    wait_until("connected again", || is_connected(&view)).await;

    service.disconnect_all("two");
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(service.connect_attempts().len(), 2);

    let snapshot = view.snapshot();
    assert_eq!(snapshot.status(), &ConnectionStatus::Disconnected);
    assert_eq!(
        snapshot.placeholder(),
        Some("Disconnected. Reconnect limit reached.")
    );
    assert_eq!(
        snapshot.errors(),
        vec!["Reconnect limit (1) reached, staying disconnected"]
    );

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn resubscription_rebuilds_without_duplicates() {
    let service = LoopbackService::new();
    let author = Identity::from_bytes([7; 32]);
    for (sent, text) in [(5, "five"), (1, "one"), (3, "three")] {
        service.seed_message(Message {
            sender: author,
            sent: Timestamp::from_micros(sent),
            text: text.into(),
        });
    }
    let view = SharedView::new();

    let client = ChatClient::new(MemoryTokenStore::new(), view.clone());
    let (manager, handle) = ConnectionManager::new(config(), service.clone(), client);
    let task = manager.spawn();

    wait_until("snapshot rendered", || view.snapshot().messages().len() == 3).await;
    assert_eq!(view.snapshot().message_texts(), vec!["one", "three", "five"]);

    service.disconnect_all("blip");
    wait_until("placeholder", || view.snapshot().placeholder().is_some()).await;
    wait_until("snapshot re-rendered", || view.snapshot().messages().len() == 3).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(view.snapshot().message_texts(), vec!["one", "three", "five"]);
    assert!(view.snapshot().is_scrolled_to_bottom());

    handle.shutdown();
    let client = task.await.unwrap();
    assert_eq!(client.mirror().messages().len(), 3);
    assert!(client.presenter().snapshot().messages().iter().all(|m| m.sender_name == "unknown"));
}

#[tokio::test(start_paused = true)]
async fn token_survives_restart_in_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.db");
    let service = LoopbackService::new();

    let first_identity = {
        let view = SharedView::new();
        let client = ChatClient::new(Database::open_at(&path).unwrap(), view.clone());
        let (manager, handle) = ConnectionManager::new(config(), service.clone(), client);
        let task = manager.spawn();
        wait_until("connected", || is_connected(&view)).await;
        handle.shutdown();
        let client = task.await.unwrap();
        client.session().local_identity()
    };
    assert!(first_identity.is_some());

    let view = SharedView::new();
    let client = ChatClient::new(Database::open_at(&path).unwrap(), view.clone());
    let (manager, handle) = ConnectionManager::new(config(), service.clone(), client);
    let task = manager.spawn();
    wait_until("connected", || is_connected(&view)).await;

    let attempts = service.connect_attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0], None);
    let token = attempts[1].clone().expect("stored token presented");
    assert_eq!(service.identity_for(&token), first_identity);

    handle.shutdown();
    let client = task.await.unwrap();
    assert_eq!(client.session().local_identity(), first_identity);
}

#[tokio::test(start_paused = true)]
async fn session_lost_before_subscribe_is_reconnected() {
    let service = LoopbackService::new();
    let transport = DeadFirstSession {
        inner: service.clone(),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let calls = transport.calls.clone();
    let tokens = MemoryTokenStore::new();
    let view = SharedView::new();

    let client = ChatClient::new(tokens.clone(), view.clone());
    let (manager, handle) = ConnectionManager::new(config(), transport, client);
    let task = manager.spawn();

    wait_until("placeholder", || view.snapshot().placeholder().is_some()).await;
    assert_eq!(
        view.snapshot().status(),
        &ConnectionStatus::Reconnecting { attempt: 1 }
    );
    assert!(view.snapshot().errors().is_empty());

    wait_until("reconnected", || {
        is_connected(&view) && view.snapshot().placeholder().is_none()
    })
    .await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let token = tokens.load_token().unwrap().expect("token persisted");
    assert_eq!(service.connect_attempts(), vec![None, Some(token)]);

    handle.shutdown();
    task.await.unwrap();
}

#[test]
fn chat_view_default_is_disconnected() {
    assert_eq!(ChatView::new().status(), &ConnectionStatus::Disconnected);
}
