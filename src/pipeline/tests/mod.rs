use super::test_helpers::{FakeFetcher, create_test_pipeline, test_config};
use super::*;
use tokio::sync::broadcast::Receiver;


/// Listing used throughout the pipeline tests
pub(super) const RED_COAT: &str = "https://www.vinted.it/items/4242-red-coat";
pub(super) const BLUE_SCARF: &str = "https://www.vinted.it/items/5151-blue-scarf";
pub(super) const GREEN_HAT: &str = "https://www.vinted.it/items/6262-green-hat";

/// Everything currently buffered on a receiver
pub(super) fn drain(rx: &mut Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn new_pipeline_starts_with_empty_stores() {
    let (pipeline, _temp_dir) = create_test_pipeline(Arc::new(FakeFetcher::new())).await;

    assert_eq!(pipeline.queue().count().await, 0);
    assert_eq!(pipeline.ledger().get_global_stats().await.total_articles, 0);
    assert_eq!(
        pipeline.organizer().config().closet_dir,
        Some(pipeline.config().closet_dir())
    );
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(temp_dir.path());
    config.organizer.photo_extensions.clear();

    let result = Pipeline::with_fetcher(config, Arc::new(FakeFetcher::new())).await;
    assert!(matches!(result, Err(crate::Error::Config { .. })));
}

#[tokio::test]
async fn enqueue_emits_queued_once() {
    let (pipeline, _temp_dir) = create_test_pipeline(Arc::new(FakeFetcher::new())).await;
    let mut rx = pipeline.subscribe();

    let first = pipeline.enqueue(RED_COAT).await.unwrap();
    let second = pipeline.enqueue(RED_COAT).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.status, QueueStatus::Pending);
    assert_eq!(pipeline.queue().count().await, 1);

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], Event::Queued { url } if url == RED_COAT));
}

#[tokio::test]
async fn remove_emits_only_when_something_was_removed() {
    let (pipeline, _temp_dir) = create_test_pipeline(Arc::new(FakeFetcher::new())).await;
    pipeline.enqueue(RED_COAT).await.unwrap();
    let mut rx = pipeline.subscribe();

    assert!(pipeline.remove(RED_COAT).await.unwrap());
    assert!(!pipeline.remove(RED_COAT).await.unwrap());

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], Event::Removed { url } if url == RED_COAT));
}

#[tokio::test]
async fn clear_queue_empties_store_and_notifies() {
    let (pipeline, _temp_dir) = create_test_pipeline(Arc::new(FakeFetcher::new())).await;
    pipeline.enqueue(RED_COAT).await.unwrap();
    pipeline.enqueue(BLUE_SCARF).await.unwrap();
    let mut rx = pipeline.subscribe();

    pipeline.clear_queue().await.unwrap();

    assert_eq!(pipeline.queue().count().await, 0);
    assert!(matches!(drain(&mut rx).as_slice(), [Event::QueueCleared]));
}

#[tokio::test]
async fn clones_share_state() {
    let (pipeline, _temp_dir) = create_test_pipeline(Arc::new(FakeFetcher::new())).await;
    let front_end = pipeline.clone();

    front_end.enqueue(RED_COAT).await.unwrap();

    assert!(pipeline.queue().get(RED_COAT).await.is_some());
}

#[tokio::test]
async fn set_status_on_unknown_url_still_emits() {
    let (pipeline, _temp_dir) = create_test_pipeline(Arc::new(FakeFetcher::new())).await;
    let mut rx = pipeline.subscribe();

    pipeline.set_status(RED_COAT, QueueStatus::Failed).await;

    assert!(pipeline.queue().get(RED_COAT).await.is_none());
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [Event::StatusChanged { status: QueueStatus::Failed, .. }]
    ));
}

#[tokio::test]
async fn racing_enqueues_emit_queued_once() {
    let (pipeline, _temp_dir) = create_test_pipeline(Arc::new(FakeFetcher::new())).await;
    let mut rx = pipeline.subscribe();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let clone = pipeline.clone();
        handles.push(tokio::spawn(async move { clone.enqueue(RED_COAT).await.unwrap() }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(pipeline.queue().count().await, 1);
    let queued = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, Event::Queued { .. }))
        .count();
    assert_eq!(queued, 1);
}
