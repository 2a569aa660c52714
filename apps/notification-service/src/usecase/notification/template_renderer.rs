//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで通知メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **件名は固定**: 通知種別ごとに 1 つ。本文のみをテンプレートで組み立てる
//! - **HTML は自動エスケープ**: `.html` で終わるテンプレート名は tera が自動エスケープする

use aliasrelay_domain::notification::{AccountNotification, EmailMessage, NotificationError};
use tera::{Context, Tera};

/// デフォルト受信者変更通知の件名
pub const DEFAULT_RECIPIENT_UPDATED_SUBJECT: &str = "Your default recipient has just been updated";

/// GPG 鍵期限切れアラートの件名
pub const GPG_KEY_EXPIRED_SUBJECT: &str = "Your GPG key has expired";

/// テンプレートレンダラー
///
/// tera テンプレートエンジンをラップし、`AccountNotification` から
/// `EmailMessage` を生成する。`Feedback-ID` は付与しない（[`super::compose`] の責務）。
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new() -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    "default_recipient_updated.html",
                    include_str!("../../../templates/notifications/default_recipient_updated.html"),
                ),
                (
                    "default_recipient_updated.txt",
                    include_str!("../../../templates/notifications/default_recipient_updated.txt"),
                ),
                (
                    "gpg_key_expired.html",
                    include_str!("../../../templates/notifications/gpg_key_expired.html"),
                ),
                (
                    "gpg_key_expired.txt",
                    include_str!("../../../templates/notifications/gpg_key_expired.txt"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self { engine })
    }

    /// 通知イベントからメールメッセージを生成する
    pub fn render(
        &self,
        notification: &AccountNotification,
    ) -> Result<EmailMessage, NotificationError> {
        let (template_name, subject, context) = build_template_params(notification);

        let html_body = self
            .engine
            .render(&format!("{template_name}.html"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        let text_body = self
            .engine
            .render(&format!("{template_name}.txt"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(EmailMessage {
            to: notification.recipient_email().to_string(),
            subject: subject.to_string(),
            html_body,
            text_body,
            feedback_id: None,
        })
    }
}

/// テンプレート名、件名、コンテキストを構築する
fn build_template_params(
    notification: &AccountNotification,
) -> (&'static str, &'static str, Context) {
    let mut context = Context::new();

    match notification {
        AccountNotification::DefaultRecipientUpdated { context: ctx } => {
            context.insert(
                "previous_default_recipient",
                ctx.previous_default_recipient_label(),
            );
            context.insert("default_recipient", ctx.current_recipient_email().as_str());
            (
                "default_recipient_updated",
                DEFAULT_RECIPIENT_UPDATED_SUBJECT,
                context,
            )
        }
        AccountNotification::GpgKeyExpired { recipient_email } => {
            context.insert("recipient", recipient_email.as_str());
            ("gpg_key_expired", GPG_KEY_EXPIRED_SUBJECT, context)
        }
    }
}

#[cfg(test)]
mod tests {
    use aliasrelay_domain::{notification::NotificationContext, user::Email};
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_updated(previous: &str) -> AccountNotification {
        AccountNotification::DefaultRecipientUpdated {
            context: NotificationContext::new(previous, Email::new("new@example.com").unwrap()),
        }
    }

    #[test]
    fn newが正常に初期化される() {
        let renderer = TemplateRenderer::new();
        assert!(renderer.is_ok());
    }

    #[test]
    fn default_recipient_updatedのレンダリングが正しい() {
        let renderer = TemplateRenderer::new().unwrap();

        let email = renderer.render(&make_updated("old@example.com")).unwrap();

        assert_eq!(email.to, "new@example.com");
        assert_eq!(email.subject, "Your default recipient has just been updated");
        assert!(email.html_body.contains("old@example.com"));
        assert!(email.html_body.contains("new@example.com"));
        assert!(email.text_body.contains("Previous default recipient: old@example.com"));
        assert!(email.text_body.contains("New default recipient: new@example.com"));
        assert_eq!(email.feedback_id, None);
    }

    #[test]
    fn html本文ではラベルがエスケープされる() {
        let renderer = TemplateRenderer::new().unwrap();

        let email = renderer
            .render(&make_updated("<script>alert(1)</script>"))
            .unwrap();

        assert!(!email.html_body.contains("<script>"));
        assert!(email.html_body.contains("&lt;script&gt;"));
        assert!(email.text_body.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn gpg_key_expiredのレンダリングが正しい() {
        let renderer = TemplateRenderer::new().unwrap();
        let notification = AccountNotification::GpgKeyExpired {
            recipient_email: Email::new("inbox@example.com").unwrap(),
        };

        let email = renderer.render(&notification).unwrap();

        assert_eq!(email.to, "inbox@example.com");
        assert_eq!(email.subject, "Your GPG key has expired");
        assert!(email.html_body.contains("inbox@example.com"));
        assert!(email.text_body.contains("Encryption has been turned off"));
        assert!(email.text_body.contains("upload a new public key"));
    }
}
