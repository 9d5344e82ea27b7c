mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use chat_qa_runner::services::{PollerSettings, ResponsePoller};
use common::{FakeSession, INPUT, LAUNCHER};
use tokio::time::Instant;

fn poller() -> ResponsePoller {
    ResponsePoller::new(PollerSettings::default())
}

#[tokio::test(start_paused = true)]
async fn silent_bot_exhausts_full_budget() {
    let session = FakeSession::silent();
    let started = Instant::now();

    let outcome = poller().poll(&session, "1").await;

    let elapsed = started.elapsed();
    assert!(outcome.no_response);
    assert!(!outcome.chat_closed);
    assert!(elapsed >= Duration::from_secs(75), "返回过早: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(76), "超出预算: {:?}", elapsed);
    // 每次尝试读取主选择器和 5 个备用选择器
    assert_eq!(session.text_reads.load(Ordering::SeqCst), 15 * 6);
}

#[tokio::test(start_paused = true)]
async fn candidate_stops_polling_immediately() {
    let session = FakeSession::silent().with_messages(&["RC Hola", "RC El impuesto vence en marzo"]);
    let started = Instant::now();

    let outcome = poller().poll(&session, "2").await;

    assert!(!outcome.no_response && !outcome.chat_closed);
    assert_eq!(outcome.response_text, "El impuesto vence en marzo");
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(5_500) && elapsed < Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn fallback_selector_supplies_the_candidate() {
    let session = FakeSession::silent()
        .with_messages_at(".bot-message", &["RC Hola", "RC El impuesto vence en marzo"]);
    let started = Instant::now();

    let outcome = poller().poll(&session, "6").await;

    assert!(!outcome.no_response && !outcome.chat_closed);
    assert_eq!(outcome.response_text, "El impuesto vence en marzo");
    // 主选择器为空，不等待渲染，第一次尝试就由第一个备用选择器命中
    assert!(started.elapsed() < Duration::from_secs(6));
    assert_eq!(session.text_reads.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn later_fallback_selector_is_reached() {
    let session = FakeSession::silent().with_messages_at(".response", &["La cuota se paga en el banco"]);

    let outcome = poller().poll(&session, "7").await;

    assert_eq!(outcome.response_text, "La cuota se paga en el banco");
    assert_eq!(session.text_reads.load(Ordering::SeqCst), 6);
}

#[tokio::test(start_paused = true)]
async fn trivial_reply_is_not_a_candidate() {
    let session = FakeSession::silent().with_messages(&["RC ok"]);
    let settings = PollerSettings {
        attempts: 3,
        ..PollerSettings::default()
    };

    let outcome = ResponsePoller::new(settings).poll(&session, "3").await;

    assert!(outcome.no_response);
}

#[tokio::test(start_paused = true)]
async fn browser_errors_mean_chat_closed() {
    let session = FakeSession::silent();
    session.break_session();
    let started = Instant::now();

    let outcome = poller().poll(&session, "4").await;

    assert!(outcome.chat_closed);
    assert!(!outcome.no_response);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn hidden_chat_surface_means_chat_closed() {
    let session = FakeSession::silent();
    session.hide(LAUNCHER);
    session.hide(INPUT);

    let outcome = poller().poll(&session, "5").await;

    assert!(outcome.chat_closed);
}
