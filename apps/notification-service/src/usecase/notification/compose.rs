//! # メール組み立て
//!
//! 通知イベントをレンダリングし、`Feedback-ID` を付けて送信用メールにする。
//! I/O は行わない。封緘は [`super::NotificationService`] が送信前に行う。

use aliasrelay_domain::notification::{AccountNotification, NotificationError};
use aliasrelay_infra::notification::OutgoingMail;

use super::TemplateRenderer;

/// 送信用メールを組み立てる
///
/// - 件名・本文: [`TemplateRenderer`] の出力
/// - `Feedback-ID`: `<キャンペーンコード>:<product_tag>`（例: `DRU:aliasrelay`）
pub fn compose(
    renderer: &TemplateRenderer,
    notification: &AccountNotification,
    product_tag: &str,
) -> Result<OutgoingMail, NotificationError> {
    let mut email = renderer.render(notification)?;
    email.feedback_id = Some(notification.feedback_id(product_tag));

    Ok(OutgoingMail::unsigned(email))
}
