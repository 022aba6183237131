//! Live views: snapshot diffs, highlights, arrival notices

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use shared::models::SystemType;
use thali_core::auth::AuthUser;
use thali_core::store::{Collection, Document, DocumentStore, MemoryStore, Query, Snapshot, Subscription, TenantScope};
use thali_core::table::{OrderLine, TableOrder};
use thali_core::view::{HighlightSet, SnapshotTracker, run_view};
use thali_core::{Config, CoreState, SessionContext};
use tokio_util::sync::CancellationToken;

fn snapshot(sequence: u64, ids: &[&str]) -> Snapshot {
    Snapshot {
        sequence,
        docs: ids
            .iter()
            .map(|id| Document {
                id: id.to_string(),
                data: json!({"table": *id}),
            })
            .collect(),
    }
}

#[test]
fn documents_absent_before_count_as_new() {
    let tracker = SnapshotTracker::new();
    // 首次加载与空集合比较
    let initial = tracker.process(snapshot(1, &["A", "B"])).unwrap();
    assert!(initial.initial);
    assert_eq!(initial.added, vec!["A".to_string(), "B".to_string()]);

    let grown = tracker.process(snapshot(2, &["A", "B", "C"])).unwrap();
    assert_eq!(grown.added, vec!["C".to_string()]);

    let shrunk = tracker.process(snapshot(3, &["A"])).unwrap();
    assert!(shrunk.added.is_empty());
    assert_eq!(shrunk.removed, vec!["B".to_string(), "C".to_string()]);

    // 旧序号的快照丢弃
    assert!(tracker.process(snapshot(2, &["A", "B", "C"])).is_none());
}

#[tokio::test]
async fn view_loop_highlights_arrivals_and_stops_on_cancel() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let scope = TenantScope::new("uid-view");
    store
        .set(&scope, Collection::Orders, "A", json!({"table": "1", "createdAt": 1}))
        .await
        .unwrap();

    let highlights = Arc::new(HighlightSet::new(Duration::from_millis(150)));
    let tracker = SnapshotTracker::new();
    tracker.observe(highlights.clone());
    let cancel = CancellationToken::new();
    let subscription = Subscription::new(store.clone(), scope.clone(), Collection::Orders, Query::all());
    let handle = tokio::spawn(run_view(subscription, tracker, cancel.clone(), |s| s));

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(highlights.ids(), vec!["A".to_string()]);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(highlights.is_empty());

    store
        .set(&scope, Collection::Orders, "B", json!({"table": "2", "createdAt": 2}))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(highlights.ids(), vec!["B".to_string()]);

    // 高亮到期自动清除
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(highlights.is_empty());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();

    store
        .set(&scope, Collection::Orders, "C", json!({"table": "3", "createdAt": 3}))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(highlights.is_empty());
}

#[tokio::test]
async fn table_session_reports_ready_tables() {
    let mut config = Config::with_overrides("/tmp/thali-unused", chrono_tz::Asia::Kolkata);
    config.kot_highlight_ms = 500;
    let state = CoreState::in_memory(config);
    let session = SessionContext::new(
        AuthUser {
            uid: "uid-kitchen".into(),
            email: "kitchen@hotel.in".into(),
        },
        Some(SystemType::Table),
    );
    let scope = session.scope().unwrap().clone();

    let mut views = state.start_session(&session).await.unwrap();
    assert!(views.cleanup.is_none());
    tokio::time::sleep(Duration::from_millis(50)).await;

    state
        .tables
        .place_order(
            &scope,
            TableOrder {
                table: 9,
                split: None,
                items: vec![OrderLine {
                    name: "Dosa".into(),
                    name_local: None,
                    price: 60.0,
                    quantity: 1,
                }],
            },
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let ticket_id = state.kitchen.active(&scope).await.unwrap()[0].id.clone();
    assert!(views.highlights.is_highlighted(&ticket_id));

    state.kitchen.mark_prepared(&scope, &ticket_id).await.unwrap();
    let ready = tokio::time::timeout(Duration::from_secs(2), views.arrivals.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ready, "9");

    // 做好的单离开看板，高亮同时撤掉
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!views.highlights.is_highlighted(&ticket_id));

    views.stop().await;
}

#[tokio::test]
async fn board_highlights_existing_tickets_on_first_load() {
    let mut config = Config::with_overrides("/tmp/thali-unused", chrono_tz::Asia::Kolkata);
    config.kot_highlight_ms = 500;
    let state = CoreState::in_memory(config);
    let session = SessionContext::new(
        AuthUser {
            uid: "uid-reload".into(),
            email: "reload@hotel.in".into(),
        },
        Some(SystemType::Table),
    );
    let scope = session.scope().unwrap().clone();

    for table in [3, 4] {
        state
            .tables
            .place_order(
                &scope,
                TableOrder {
                    table,
                    split: None,
                    items: vec![OrderLine {
                        name: "Idli".into(),
                        name_local: None,
                        price: 40.0,
                        quantity: 1,
                    }],
                },
            )
            .await
            .unwrap();
    }
    let tickets = state.kitchen.active(&scope).await.unwrap();
    state.kitchen.mark_prepared(&scope, &tickets[0].id).await.unwrap();
    let waiting = tickets[1].id.clone();

    let mut views = state.start_session(&session).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(views.highlights.ids(), vec![waiting]);
    // 已经做好的单不再提示
    assert!(views.arrivals.try_recv().is_err());

    views.stop().await;
}
