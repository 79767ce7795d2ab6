use std::time::Duration;

use super::*;

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[test]
fn variant_defaults() {
    assert_eq!(ToastVariant::Success.default_duration(), Duration::from_millis(5000));
    assert_eq!(ToastVariant::Info.default_duration(), Duration::from_millis(5000));
    assert_eq!(ToastVariant::Error.default_duration(), Duration::from_millis(7000));
    assert_eq!(ToastVariant::Warning.default_duration(), Duration::from_millis(7000));
}

#[test]
fn queue_works_without_a_runtime() {
    let queue = ToastQueue::new(2);
    let id = queue.info("sem timers", None, None);
    assert_eq!(queue.get(&id).unwrap().phase, ToastPhase::Entering);
    assert!(queue.dismiss(&id));
    assert!(queue.is_empty());
}

#[test]
fn zero_cap_keeps_one() {
    assert_eq!(ToastQueue::new(0).max_toasts(), 1);
}

#[tokio::test(start_paused = true)]
async fn newest_first_and_oldest_evicted() {
    let queue = ToastQueue::new(3);
    let ids: Vec<String> = (0..5).map(|i| queue.success(format!("msg {i}"), None, None)).collect();

    let messages: Vec<String> = queue.toasts().into_iter().map(|t| t.message).collect();
    assert_eq!(messages, vec!["msg 4", "msg 3", "msg 2"]);
    assert!(queue.get(&ids[0]).is_none());
    assert!(ids.iter().all(|id| id.starts_with("toast-")));
}

#[tokio::test(start_paused = true)]
async fn lifecycle_enters_exits_and_removes() {
    let queue = ToastQueue::default();
    let id = queue.error("falhou", Some("Erro"), None);
    assert_eq!(queue.get(&id).unwrap().title.as_deref(), Some("Erro"));

    advance(11).await;
    assert_eq!(queue.get(&id).unwrap().phase, ToastPhase::Visible);

    advance(6995).await;
    assert_eq!(queue.get(&id).unwrap().phase, ToastPhase::Exiting);

    advance(285).await;
    assert!(queue.get(&id).is_some());
    advance(20).await;
    assert!(queue.get(&id).is_none());
}

#[tokio::test(start_paused = true)]
async fn zero_duration_never_auto_dismisses() {
    let queue = ToastQueue::default();
    let id = queue.warning("fixo", None, Some(Duration::ZERO));

    advance(60_000).await;

    assert_eq!(queue.get(&id).unwrap().phase, ToastPhase::Visible);
}

#[tokio::test(start_paused = true)]
async fn dismiss_waits_for_exit_animation() {
    let queue = ToastQueue::default();
    let id = queue.add_toast(ToastConfig::new(ToastVariant::Info, "olá").with_duration(Duration::ZERO));
    advance(20).await;

    assert!(queue.dismiss(&id));
    assert!(!queue.dismiss(&id));
    assert_eq!(queue.get(&id).unwrap().phase, ToastPhase::Exiting);

    advance(310).await;
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn remove_is_immediate_and_cancels_timer() {
    let queue = ToastQueue::default();
    let first = queue.success("a", None, None);
    let second = queue.success("b", None, None);

    assert!(queue.remove(&first));
    assert!(!queue.remove(&first));
    assert_eq!(queue.len(), 1);

    advance(5400).await;
    assert!(queue.get(&second).is_none());
}
