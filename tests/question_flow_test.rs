mod common;

use chat_qa_runner::models::result::{
    CHAT_BLOCKED_ERROR, CHAT_CLOSED_RESPONSE, EXECUTION_ERROR_RESPONSE, NO_RESPONSE_RESPONSE,
};
use chat_qa_runner::models::Classification;
use chat_qa_runner::services::{ChatSurface, ChatSurfaceSettings, PollerSettings, ResponsePoller};
use chat_qa_runner::workflow::{QuestionCtx, QuestionFlow, QuestionProcessor};
use common::{fixture, labels, FakeSession};

fn flow() -> QuestionFlow {
    QuestionFlow::new(
        ChatSurface::new(ChatSurfaceSettings::new("https://preprod.example.test/bot-web")),
        ResponsePoller::new(PollerSettings::default()),
        labels(),
    )
}

fn ctx(id: &str) -> QuestionCtx {
    QuestionCtx::new(1, 1, 1, id)
}

#[tokio::test(start_paused = true)]
async fn answered_question_is_classified() {
    let session = FakeSession::answering("RC El impuesto inmobiliario vence en marzo.");
    let question = fixture("10", "¿Cuándo vence el impuesto?", &["vence", "marzo", "abril"]);

    let result = flow().process(&question, &session, &ctx("10")).await;

    assert_eq!(result.classification, Classification::Pass);
    assert_eq!(result.matched_keywords, vec!["vence", "marzo"]);
    assert_eq!(result.response_text, "El impuesto inmobiliario vence en marzo.");
    assert_eq!(result.error_message, None);
    assert_eq!(result.batch_label, labels().batch_label);
    assert_eq!(*session.submitted.lock().unwrap(), vec!["¿Cuándo vence el impuesto?"]);
    // 从发送问题到拿到回复：一个轮询间隔加上稳定等待
    assert!((result.elapsed_seconds - 5.5).abs() < 0.01);
}

#[tokio::test(start_paused = true)]
async fn missing_launcher_is_an_execution_error_with_screenshot() {
    let session = FakeSession::without_launcher().with_markup(false, true);
    let question = fixture("11", "¿Dónde pago?", &["pago"]);

    let result = flow().process(&question, &session, &ctx("11")).await;

    assert_eq!(result.classification, Classification::Fail);
    assert_eq!(result.response_text, EXECUTION_ERROR_RESPONSE);
    assert_eq!(
        result.error_message.as_deref(),
        Some(
            "No se pudo encontrar el botón del chat. HTML contiene 'chat-fab': false, \
             'mat-fab': true. URL: https://preprod.example.test/bot-web"
        )
    );
    assert!(result.elapsed_seconds >= 0.01);
    assert!(session.submitted.lock().unwrap().is_empty());

    let screenshots = session.screenshots.lock().unwrap();
    assert_eq!(screenshots.len(), 1);
    assert!(screenshots[0].ends_with("error-chat-button-11.png"));
}

#[tokio::test(start_paused = true)]
async fn closed_chat_and_silence_map_to_sentinels() {
    let question = fixture("12", "¿Hay descuentos?", &["descuento"]);

    let closed = flow()
        .process(&question, &FakeSession::closing_after_submit(), &ctx("12"))
        .await;
    assert_eq!(closed.response_text, CHAT_CLOSED_RESPONSE);
    assert_eq!(closed.classification, Classification::Fail);

    let silent = flow().process(&question, &FakeSession::silent(), &ctx("12")).await;
    assert_eq!(silent.response_text, NO_RESPONSE_RESPONSE);
    assert_eq!(silent.classification, Classification::Fail);
    assert!((silent.elapsed_seconds - 75.0).abs() < 0.01);
}

#[tokio::test(start_paused = true)]
async fn blocked_chat_is_annotated_but_still_classified() {
    let session = FakeSession::answering("Lo siento, no puedo procesar tu mensaje en este momento.");
    let question = fixture("13", "¿Qué es la tasa vial?", &["tasa"]);

    let result = flow().process(&question, &session, &ctx("13")).await;

    assert_eq!(result.classification, Classification::Fail);
    assert_eq!(result.error_message.as_deref(), Some(CHAT_BLOCKED_ERROR));
    assert!(result.response_text.starts_with("Lo siento"));
}
