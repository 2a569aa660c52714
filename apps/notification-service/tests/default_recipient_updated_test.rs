//! デフォルト受信者変更通知の統合テスト
//!
//! ルーターにモック構成の NotificationService を組み込み、`oneshot` で HTTP リクエストを送る。

use aliasrelay_domain::{notification::SigningError, recipient::Fingerprint};
use aliasrelay_infra::mock::{MockNotificationSender, MockSignerFactory};
use aliasrelay_notification_service::{
    handler,
    test_utils::{NotificationTestBuilder, NotificationTestSetup},
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

fn create_test_app(setup: &NotificationTestSetup) -> Router {
    handler::router(setup.sut.clone())
}

fn notify_request(user_id: &impl std::fmt::Display, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!(
            "/internal/users/{user_id}/notifications/default-recipient-updated"
        ))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_body() -> Value {
    json!({
        "previous_default_recipient": "old@example.com",
        "default_recipient_email": "new@example.com",
    })
}

#[tokio::test]
async fn test_有効な鍵なら署名付きで送信され受信者は変更されない() {
    // Arrange
    let builder = NotificationTestBuilder::new();
    let recipient = builder.recipient(true, Some("ABC123"));
    let user_id = builder.user_id().clone();
    let setup = builder.with_recipient(recipient.clone()).build();
    let app = create_test_app(&setup);

    // Act
    let response = app
        .oneshot(notify_request(&user_id, valid_body()))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let sent = setup.sender.sent_mails();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].is_signed());
    assert_eq!(setup.factory.call_count(), 1);
    assert_eq!(setup.recipients.recipient(recipient.id()), Some(recipient));
    assert!(setup.alert.alerted().is_empty());
}

#[tokio::test]
async fn test_鍵が見つからなければ署名なしで送信され暗号化が無効になりアラートが1通送られる() {
    // Arrange
    let builder = NotificationTestBuilder::new();
    let recipient = builder.recipient(true, Some("ABC123"));
    let user_id = builder.user_id().clone();
    let setup = builder
        .with_recipient(recipient.clone())
        .with_signer_factory(MockSignerFactory::failing_on_recipient(
            SigningError::KeyNotFound {
                fingerprint: Fingerprint::new("ABC123").unwrap(),
            },
        ))
        .build();
    let app = create_test_app(&setup);

    // Act
    let response = app
        .oneshot(notify_request(&user_id, valid_body()))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let sent = setup.sender.sent_mails();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].is_signed());
    let stored = setup.recipients.recipient(recipient.id()).unwrap();
    assert!(!stored.preference().should_encrypt());
    assert_eq!(setup.alert.alerted(), vec![recipient.email().clone()]);
}

#[tokio::test]
async fn test_封緘に失敗しても署名なしで送信され暗号化が無効になる() {
    // Arrange
    let builder = NotificationTestBuilder::new();
    let recipient = builder.recipient(true, Some("ABC123"));
    let user_id = builder.user_id().clone();
    let setup = builder
        .with_recipient(recipient.clone())
        .with_signer_factory(MockSignerFactory::failing_on_seal())
        .build();
    let app = create_test_app(&setup);

    // Act
    let response = app
        .oneshot(notify_request(&user_id, valid_body()))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let sent = setup.sender.sent_mails();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].is_signed());
    let stored = setup.recipients.recipient(recipient.id()).unwrap();
    assert!(!stored.preference().should_encrypt());
    assert_eq!(setup.alert.alerted(), vec![recipient.email().clone()]);
}

#[tokio::test]
async fn test_should_encryptがfalseならツールキットを呼ばずに署名なしで送信される() {
    // Arrange
    let builder = NotificationTestBuilder::new();
    let recipient = builder.recipient(false, Some("ABC123"));
    let user_id = builder.user_id().clone();
    let setup = builder.with_recipient(recipient).build();
    let app = create_test_app(&setup);

    // Act
    let response = app
        .oneshot(notify_request(&user_id, valid_body()))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let sent = setup.sender.sent_mails();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].is_signed());
    assert_eq!(setup.factory.call_count(), 0);
    assert_eq!(setup.recipients.disable_count(), 0);
}

#[tokio::test]
async fn test_件名とfeedback_idが設定される() {
    let builder = NotificationTestBuilder::new();
    let user_id = builder.user_id().clone();
    let setup = builder.build();
    let app = create_test_app(&setup);

    app.oneshot(notify_request(&user_id, valid_body()))
        .await
        .unwrap();

    let sent = setup.sender.sent_mails();
    assert_eq!(
        sent[0].email.subject,
        "Your default recipient has just been updated"
    );
    assert_eq!(sent[0].email.feedback_id.as_deref(), Some("DRU:aliasrelay"));
    assert_eq!(sent[0].email.to, "new@example.com");
    assert!(sent[0].email.text_body.contains("old@example.com"));
}

#[tokio::test]
async fn test_送信に失敗しても202を返す() {
    let builder = NotificationTestBuilder::new();
    let user_id = builder.user_id().clone();
    let setup = builder
        .with_sender(MockNotificationSender::failing())
        .build();
    let app = create_test_app(&setup);

    let response = app
        .oneshot(notify_request(&user_id, valid_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_メールアドレスが不正なら400のproblem_detailsを返す() {
    let builder = NotificationTestBuilder::new();
    let user_id = builder.user_id().clone();
    let setup = builder.build();
    let app = create_test_app(&setup);

    let response = app
        .oneshot(notify_request(
            &user_id,
            json!({
                "previous_default_recipient": "old@example.com",
                "default_recipient_email": "not-an-email",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json["type"],
        "https://aliasrelay.example.com/errors/validation-error"
    );
    assert_eq!(json["status"], 400);
    assert!(setup.sender.sent_mails().is_empty());
}

#[tokio::test]
async fn test_ヘルスチェックはhealthyを返す() {
    let setup = NotificationTestBuilder::new().build();
    let app = create_test_app(&setup);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}
