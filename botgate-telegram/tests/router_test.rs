//! Integration tests for [`botgate_telegram::UpdateRouter`] and
//! [`botgate_telegram::ConsumerRegistry`].
//!
//! Covers: unconditional global delivery, chat-scoped delivery with multiple
//! subscribers, exactly-once pending fulfillment, duplicate pending rejection,
//! and consumer-failure isolation across routing legs.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use botgate_core::{BotError, Result, Update};
use botgate_telegram::{ConsumerRegistry, UpdateRouter};
use common::{callback_update, message_update};
use update_chain::{ChainOutcome, UpdateAction, UpdateFilter};

fn setup() -> (Arc<ConsumerRegistry>, UpdateRouter) {
    let registry = Arc::new(ConsumerRegistry::new());
    let router = UpdateRouter::new(Arc::clone(&registry));
    (registry, router)
}

struct CountingAction {
    count: Arc<AtomicUsize>,
}

#[async_trait]
impl UpdateAction for CountingAction {
    async fn run(&self, _update: &Update) -> Result<ChainOutcome> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(ChainOutcome::Continue)
    }
}

struct FailingAction;

#[async_trait]
impl UpdateAction for FailingAction {
    async fn run(&self, _update: &Update) -> Result<ChainOutcome> {
        Err(BotError::Action("handler blew up".to_string()))
    }
}

/// **Test: one update reaches the global queue, the chat feed, and every
/// subscriber of its chat — including a second subscriber added later.**
#[tokio::test]
async fn test_update_reaches_all_queues() {
    let (registry, router) = setup();

    let mut global = registry.subscribe_global().await.1;
    let mut feed = registry.subscribe_chat_feed().await.1;
    let (_id_a, mut chat_a) = registry.subscribe_chat(5).await;
    let (_id_b, mut chat_b) = registry.subscribe_chat(5).await;

    router.route(message_update(10, 5, "hi")).await.unwrap();

    assert_eq!(global.recv().await.unwrap().id, 10);
    let (chat, update) = feed.recv().await.unwrap();
    assert_eq!((chat, update.id), (5, 10));
    assert_eq!(chat_a.recv().await.unwrap().id, 10);
    assert_eq!(chat_b.recv().await.unwrap().id, 10);
}

/// **Test: an update without a chat identity still reaches the global queue
/// but is never offered to chat queues or pendings.**
#[tokio::test]
async fn test_chatless_update_goes_global_only() {
    let (registry, router) = setup();

    let mut global = registry.subscribe_global().await.1;
    let (_id, mut chat_q) = registry.subscribe_chat(5).await;
    let mut rx = registry
        .register_pending(5, 1, UpdateFilter::Any)
        .await
        .unwrap();

    let chatless = Update {
        id: 20,
        kind: botgate_core::UpdateKind::Unknown,
    };
    router.route(chatless).await.unwrap();

    assert_eq!(global.recv().await.unwrap().id, 20);
    assert!(chat_q.try_recv().is_err());
    assert!(rx.try_recv().is_err());
    assert_eq!(registry.pending_len().await, 1);
}

/// **Test: a pending request is fulfilled by the first accepted update,
/// exactly once, and is then absent from the registry.**
///
/// **Setup:** Pending (chat=5, IsMessage); route a message, then another.
/// **Expected:** The waiter resolves with the first update's id; the entry is
/// gone before the second update routes; re-registering the same key succeeds.
#[tokio::test]
async fn test_pending_fulfilled_exactly_once() {
    let (registry, router) = setup();

    let rx = registry
        .register_pending(5, 7, UpdateFilter::IsMessage)
        .await
        .unwrap();

    router.route(message_update(10, 5, "first")).await.unwrap();
    assert_eq!(rx.await.unwrap().id, 10);
    assert_eq!(registry.pending_len().await, 0);

    router.route(message_update(11, 5, "second")).await.unwrap();
    assert_eq!(registry.pending_len().await, 0);

    // The key is free again once the first entry resolved.
    let rx2 = registry
        .register_pending(5, 7, UpdateFilter::IsMessage)
        .await
        .unwrap();
    router.route(message_update(12, 5, "third")).await.unwrap();
    assert_eq!(rx2.await.unwrap().id, 12);
}

/// **Test: a pending entry only sees updates for its own chat, and its
/// predicate gates fulfillment.**
#[tokio::test]
async fn test_pending_scoped_by_chat_and_predicate() {
    let (registry, router) = setup();

    let rx = registry
        .register_pending(5, 1, UpdateFilter::IsCallbackQuery)
        .await
        .unwrap();

    // Wrong chat, then right chat but wrong kind: both leave the entry pending.
    router.route(callback_update(10, 6, "x")).await.unwrap();
    router.route(message_update(11, 5, "hello")).await.unwrap();
    assert_eq!(registry.pending_len().await, 1);

    router.route(callback_update(12, 5, "pick")).await.unwrap();
    assert_eq!(rx.await.unwrap().id, 12);
    assert_eq!(registry.pending_len().await, 0);
}

/// **Test: two pendings on the same chat with different predicates are
/// independently fulfilled by the same update when both accept it.**
#[tokio::test]
async fn test_multiple_pendings_same_chat() {
    let (registry, router) = setup();

    let rx_any = registry
        .register_pending(5, 1, UpdateFilter::Any)
        .await
        .unwrap();
    let rx_msg = registry
        .register_pending(5, 2, UpdateFilter::IsMessage)
        .await
        .unwrap();

    router.route(message_update(10, 5, "hi")).await.unwrap();

    assert_eq!(rx_any.await.unwrap().id, 10);
    assert_eq!(rx_msg.await.unwrap().id, 10);
    assert_eq!(registry.pending_len().await, 0);
}

/// **Test: registering the same (chat, request id) twice yields
/// DuplicateRequest and leaves the first entry in place.**
#[tokio::test]
async fn test_duplicate_pending_rejected() {
    let (registry, router) = setup();

    let rx = registry
        .register_pending(5, 42, UpdateFilter::Any)
        .await
        .unwrap();
    let second = registry.register_pending(5, 42, UpdateFilter::Any).await;

    match second {
        Err(BotError::DuplicateRequest {
            chat_id,
            request_id,
        }) => {
            assert_eq!((chat_id, request_id), (5, 42));
        }
        other => panic!("expected DuplicateRequest, got {:?}", other.map(|_| ())),
    }
    assert_eq!(registry.pending_len().await, 1);

    // The retained entry is the first one and still fires.
    router.route(message_update(10, 5, "hi")).await.unwrap();
    assert_eq!(rx.await.unwrap().id, 10);
}

/// **Test: cancel removes a pending without invoking its handle.**
#[tokio::test]
async fn test_cancel_pending_never_fires() {
    let (registry, router) = setup();

    let rx = registry
        .register_pending(5, 1, UpdateFilter::Any)
        .await
        .unwrap();
    assert!(registry.cancel_pending(5, 1).await);
    assert!(!registry.cancel_pending(5, 1).await);

    router.route(message_update(10, 5, "hi")).await.unwrap();
    assert!(rx.await.is_err());
}

/// **Test: a failing chain action does not prevent delivery to the global
/// queue, the chat queue, a pending waiter, or a later chain entry.**
#[tokio::test]
async fn test_action_failure_is_isolated_from_other_consumers() {
    let (registry, router) = setup();

    let mut global = registry.subscribe_global().await.1;
    let (_id, mut chat_q) = registry.subscribe_chat(5).await;
    let rx = registry
        .register_pending(5, 1, UpdateFilter::IsMessage)
        .await
        .unwrap();

    let later_count = Arc::new(AtomicUsize::new(0));
    registry
        .register_handler(UpdateFilter::Any, Arc::new(FailingAction))
        .await;
    registry
        .register_handler(
            UpdateFilter::Any,
            Arc::new(CountingAction {
                count: later_count.clone(),
            }),
        )
        .await;

    router.route(message_update(10, 5, "hi")).await.unwrap();

    assert_eq!(global.recv().await.unwrap().id, 10);
    assert_eq!(chat_q.recv().await.unwrap().id, 10);
    assert_eq!(rx.await.unwrap().id, 10);
    assert_eq!(later_count.load(Ordering::SeqCst), 1);
}

/// **Test: the two-update scenario — ids 10 and 11 on chat 5, a pending
/// IsMessage waiter registered beforehand.**
///
/// **Expected:** Both updates appear in the global and chat-5 queues; the
/// waiter resolves with id 10 and is removed before id 11 routes, so id 11 is
/// never offered to it.
#[tokio::test]
async fn test_two_update_scenario() {
    let (registry, router) = setup();

    let mut global = registry.subscribe_global().await.1;
    let (_id, mut chat_q) = registry.subscribe_chat(5).await;
    let rx = registry
        .register_pending(5, 1, UpdateFilter::IsMessage)
        .await
        .unwrap();

    router.route(message_update(10, 5, "hello")).await.unwrap();
    router.route(callback_update(11, 5, "pick")).await.unwrap();

    assert_eq!(rx.await.unwrap().id, 10);
    assert_eq!(registry.pending_len().await, 0);

    assert_eq!(global.recv().await.unwrap().id, 10);
    assert_eq!(global.recv().await.unwrap().id, 11);
    assert_eq!(chat_q.recv().await.unwrap().id, 10);
    assert_eq!(chat_q.recv().await.unwrap().id, 11);
}

/// **Test: an unregistered handler no longer runs for later updates.**
#[tokio::test]
async fn test_unregister_handler() {
    let (registry, router) = setup();

    let count = Arc::new(AtomicUsize::new(0));
    let id = registry
        .register_handler(
            UpdateFilter::Any,
            Arc::new(CountingAction {
                count: count.clone(),
            }),
        )
        .await;

    router.route(message_update(10, 5, "hi")).await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    assert!(registry.unregister_handler(id).await);
    assert!(!registry.unregister_handler(id).await);

    router.route(message_update(11, 5, "hi")).await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
