// crates/shared-kernel/src/application/workers/outbox_dispatcher_test.rs

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::application::workers::{OutboxConfig, OutboxDispatcher};
    use crate::domain::outbox::OutboxEvent;
    use crate::utils::outbox_stubs::{MetricsCollectorStub, OutboxPublisherStub, OutboxStoreStub};

    fn fast_config() -> OutboxConfig {
        OutboxConfig {
            max_batch_size: 100,
            interval: Duration::from_millis(20),
            batch_size: 50,
            max_retries: 2,
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
            concurrency: 3,
        }
    }

    fn pending_event(id: i64, retry_count: i32) -> OutboxEvent {
        let mut event = OutboxEvent::pending(
            "PRODUCT_CREATED",
            json!({"type": "PRODUCT_CREATED", "product_id": id, "timestamp": "2024-05-01T10:00:00Z"}),
            Some(format!("key-{id}")),
        );
        event.id = id;
        event.retry_count = retry_count;
        event
    }

    #[tokio::test]
    async fn test_publishes_pending_events_and_marks_them() {
        let store = Arc::new(OutboxStoreStub::with_pending(vec![
            pending_event(1, 0),
            pending_event(2, 0),
            pending_event(3, 0),
        ]));
        let publisher = Arc::new(OutboxPublisherStub::default());
        let metrics = Arc::new(MetricsCollectorStub::default());

        let mut dispatcher = OutboxDispatcher::new(
            Arc::clone(&store),
            Arc::clone(&publisher),
            fast_config(),
            Some(metrics.clone()),
        );

        let ctx = CancellationToken::new();
        dispatcher.start(ctx.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;
        dispatcher.stop().await;

        let mut published = publisher.published.lock().unwrap().clone();
        published.sort_unstable();
        assert_eq!(published, vec![1, 2, 3]);

        let mut marked = store.published.lock().unwrap().clone();
        marked.sort_unstable();
        assert_eq!(marked, vec![1, 2, 3]);

        assert!(store.failed.lock().unwrap().is_empty());
        assert!(store.dlq.lock().unwrap().is_empty());

        let outcomes = metrics.outcomes.lock().unwrap();
        assert_eq!(
            outcomes
                .iter()
                .filter(|(_, outcome)| outcome == "published")
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn test_publish_failure_below_bound_marks_failed() {
        let store = Arc::new(OutboxStoreStub::with_pending(vec![pending_event(7, 0)]));
        let publisher = Arc::new(OutboxPublisherStub::always_failing());

        let mut dispatcher = OutboxDispatcher::new(
            Arc::clone(&store),
            Arc::clone(&publisher),
            fast_config(),
            None,
        );

        let ctx = CancellationToken::new();
        dispatcher.start(ctx.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;
        dispatcher.stop().await;

        // retry_count passe de 0 à 1 : encore sous le plafond, pas de DLQ
        assert_eq!(store.failed.lock().unwrap().clone(), vec![(7, 1)]);
        assert!(store.dlq.lock().unwrap().is_empty());
        assert!(store.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_event_moves_to_dlq_with_reason() {
        // retry_count déjà au plafond : le prochain échec déclasse
        let store = Arc::new(OutboxStoreStub::with_pending(vec![pending_event(9, 2)]));
        let publisher = Arc::new(OutboxPublisherStub::always_failing());
        let metrics = Arc::new(MetricsCollectorStub::default());

        let mut dispatcher = OutboxDispatcher::new(
            Arc::clone(&store),
            Arc::clone(&publisher),
            fast_config(),
            Some(metrics.clone()),
        );

        let ctx = CancellationToken::new();
        dispatcher.start(ctx.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;
        dispatcher.stop().await;

        let dlq = store.dlq.lock().unwrap().clone();
        assert_eq!(dlq.len(), 1);
        let (event_id, reason) = &dlq[0];
        assert_eq!(*event_id, 9);
        assert!(reason.contains("Failed after 3 retry attempts"));
        assert!(reason.contains("bus unreachable"));

        assert!(store.failed.lock().unwrap().is_empty());

        let outcomes = metrics.outcomes.lock().unwrap();
        assert!(outcomes.iter().any(|(_, outcome)| outcome == "dlq"));
    }

    #[tokio::test]
    async fn test_dlq_write_failure_falls_back_to_mark_failed() {
        let mut store = OutboxStoreStub::with_pending(vec![pending_event(4, 2)]);
        store.fail_dlq = true;
        let store = Arc::new(store);
        let publisher = Arc::new(OutboxPublisherStub::always_failing());

        let mut dispatcher = OutboxDispatcher::new(
            Arc::clone(&store),
            Arc::clone(&publisher),
            fast_config(),
            None,
        );

        let ctx = CancellationToken::new();
        dispatcher.start(ctx.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;
        dispatcher.stop().await;

        assert!(store.dlq.lock().unwrap().is_empty());
        assert_eq!(store.failed.lock().unwrap().clone(), vec![(4, 3)]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded_by_semaphore() {
        let events: Vec<_> = (1..=6).map(|id| pending_event(id, 0)).collect();
        let store = Arc::new(OutboxStoreStub::with_pending(events));
        let publisher = Arc::new(OutboxPublisherStub::with_delay(Duration::from_millis(30)));

        let config = OutboxConfig {
            concurrency: 2,
            ..fast_config()
        };
        let mut dispatcher =
            OutboxDispatcher::new(Arc::clone(&store), Arc::clone(&publisher), config, None);

        let ctx = CancellationToken::new();
        dispatcher.start(ctx.clone());
        tokio::time::sleep(Duration::from_millis(400)).await;
        dispatcher.stop().await;

        assert_eq!(publisher.published.lock().unwrap().len(), 6);
        assert!(publisher.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_wake_signal_triggers_processing_before_tick() {
        let store = Arc::new(OutboxStoreStub::with_pending(vec![pending_event(5, 0)]));
        let publisher = Arc::new(OutboxPublisherStub::default());

        // Intervalle volontairement énorme : seul le réveil peut déclencher
        let config = OutboxConfig {
            interval: Duration::from_secs(3600),
            ..fast_config()
        };

        let (wake_tx, wake_rx) = mpsc::channel(1);
        let mut dispatcher =
            OutboxDispatcher::new(Arc::clone(&store), Arc::clone(&publisher), config, None)
                .with_wake_signal(wake_rx);

        let ctx = CancellationToken::new();
        dispatcher.start(ctx.clone());

        wake_tx.send(()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        dispatcher.stop().await;

        assert_eq!(store.published.lock().unwrap().clone(), vec![5]);
    }

    #[tokio::test]
    async fn test_cancellation_stops_new_work() {
        let events: Vec<_> = (1..=10).map(|id| pending_event(id, 0)).collect();
        let store = Arc::new(OutboxStoreStub::with_pending(events));
        let publisher = Arc::new(OutboxPublisherStub::default());

        let mut dispatcher = OutboxDispatcher::new(
            Arc::clone(&store),
            Arc::clone(&publisher),
            fast_config(),
            None,
        );

        let ctx = CancellationToken::new();
        ctx.cancel();
        dispatcher.start(ctx);
        // La boucle doit sortir sans traiter quoi que ce soit
        dispatcher.stop().await;

        assert!(store.published.lock().unwrap().is_empty());
        assert_eq!(store.pending.lock().unwrap().len(), 10);
    }
}
