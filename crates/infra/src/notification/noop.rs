//! Noop 通知送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! テスト環境や通知無効化時に使用する。

use aliasrelay_domain::notification::NotificationError;
use async_trait::async_trait;

use super::{NotificationSender, OutgoingMail};

/// Noop 通知送信（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn send_email(&self, mail: &OutgoingMail) -> Result<(), NotificationError> {
        tracing::info!(
            to = %mail.email.to,
            subject = %mail.email.subject,
            signed = mail.is_signed(),
            "Noop: メール送信をスキップ"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use aliasrelay_domain::notification::EmailMessage;

    use super::*;

    #[tokio::test]
    async fn send_emailがエラーを返さない() {
        let sender = NoopNotificationSender;
        let mail = OutgoingMail::unsigned(EmailMessage {
            to:          "test@example.com".to_string(),
            subject:     "テスト件名".to_string(),
            html_body:   "<p>テスト</p>".to_string(),
            text_body:   "テスト".to_string(),
            feedback_id: None,
        });

        let result = sender.send_email(&mail).await;
        assert!(result.is_ok());
    }
}
