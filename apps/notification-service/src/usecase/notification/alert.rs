//! # 署名鍵の期限切れアラート
//!
//! [`KeyExpiryAlert`] のメール実装。`GpgKeyExpired` 通知をレンダリングし、
//! 本通知と同じ [`NotificationSender`] で署名なしのまま送る。

use std::sync::Arc;

use aliasrelay_domain::{
    notification::{AccountNotification, NotificationError},
    user::Email,
};
use aliasrelay_infra::notification::{KeyExpiryAlert, NotificationSender};
use async_trait::async_trait;

use super::{TemplateRenderer, compose};

/// メールで送る期限切れアラート
pub struct MailKeyExpiryAlert {
    sender:      Arc<dyn NotificationSender>,
    renderer:    Arc<TemplateRenderer>,
    product_tag: String,
}

impl MailKeyExpiryAlert {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        renderer: Arc<TemplateRenderer>,
        product_tag: String,
    ) -> Self {
        Self {
            sender,
            renderer,
            product_tag,
        }
    }
}

#[async_trait]
impl KeyExpiryAlert for MailKeyExpiryAlert {
    async fn alert_key_expired(&self, recipient_email: &Email) -> Result<(), NotificationError> {
        let notification = AccountNotification::GpgKeyExpired {
            recipient_email: recipient_email.clone(),
        };

        // 鍵が使えないことを知らせるアラートなので、常に署名なし
        let mail = compose(&self.renderer, &notification, &self.product_tag)?;
        self.sender.send_email(&mail).await
    }
}
