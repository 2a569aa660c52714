//! MIME メッセージの組み立て
//!
//! - 署名なし: `multipart/alternative`（text + html）
//! - 署名あり: `multipart/encrypted; protocol="application/pgp-encrypted"`（RFC 3156）。
//!   `multipart/alternative` 部分全体を [`seal_body`] で封緘し、2 番目のパートに格納する
//!
//! 封緘は送信前にユースケース層で行う。[`build_message`] は I/O を行わない。

use aliasrelay_domain::notification::{EmailMessage, NotificationError, SigningError};
use lettre::{
    Message,
    message::{
        Mailbox,
        MultiPart,
        SinglePart,
        header::{ContentType, Header, HeaderName, HeaderValue},
    },
};

use super::OutgoingMail;
use crate::signing::MailSigner;

/// `Feedback-ID` ヘッダー
///
/// 配信レポートをキャンペーン単位で集計するためのヘッダー（例: `DRU:aliasrelay`）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackId(String);

impl FeedbackId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl Header for FeedbackId {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Feedback-ID")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.trim().to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// `multipart/alternative`（text + html）を組み立てる
fn alternative_part(email: &EmailMessage) -> MultiPart {
    MultiPart::alternative()
        .singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(email.text_body.clone()),
        )
        .singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_HTML)
                .body(email.html_body.clone()),
        )
}

/// 本文の `multipart/alternative` を署名・暗号化し、ASCII armor 形式で返す
///
/// ツールキットの失敗は [`SigningError`] のまま返す。
pub async fn seal_body(
    signer: &dyn MailSigner,
    email: &EmailMessage,
) -> Result<String, SigningError> {
    let armored = signer.seal(&alternative_part(email).formatted()).await?;
    String::from_utf8(armored)
        .map_err(|e| SigningError::SealFailed(format!("封緘結果が ASCII armor ではありません: {e}")))
}

/// 送信用メールから lettre の `Message` を組み立てる
pub fn build_message(from_address: &str, mail: &OutgoingMail) -> Result<Message, NotificationError> {
    let email = &mail.email;

    let from: Mailbox = from_address
        .parse()
        .map_err(|e| NotificationError::CompositionFailed(format!("送信元アドレス不正: {e}")))?;
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| NotificationError::CompositionFailed(format!("宛先アドレス不正: {e}")))?;

    let mut builder = Message::builder().from(from).to(to).subject(&email.subject);
    if let Some(feedback_id) = &email.feedback_id {
        builder = builder.header(FeedbackId::new(feedback_id));
    }

    let body = match &mail.sealed_body {
        None => alternative_part(email),
        Some(armored) => encrypted_part(armored)?,
    };

    builder
        .multipart(body)
        .map_err(|e| NotificationError::CompositionFailed(format!("メッセージ構築失敗: {e}")))
}

/// 封緘済みの本文を `multipart/encrypted` に包む
fn encrypted_part(armored: &str) -> Result<MultiPart, NotificationError> {
    let control_type = content_type("application/pgp-encrypted")?;
    let payload_type = content_type("application/octet-stream; name=\"encrypted.asc\"")?;

    Ok(MultiPart::encrypted("application/pgp-encrypted".to_string())
        .singlepart(
            SinglePart::builder()
                .header(control_type)
                .body(String::from("Version: 1\r\n")),
        )
        .singlepart(
            SinglePart::builder()
                .header(payload_type)
                .body(armored.to_string()),
        ))
}

fn content_type(value: &str) -> Result<ContentType, NotificationError> {
    ContentType::parse(value)
        .map_err(|e| NotificationError::CompositionFailed(format!("Content-Type 不正: {e}")))
}
