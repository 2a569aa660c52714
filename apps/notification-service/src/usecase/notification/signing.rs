//! # 署名判定と署名ハンドルの取得
//!
//! 受信者の暗号化設定から署名を試みるかを決め、試みる場合は署名ツールキットから
//! 署名ハンドルを取得する。
//!
//! 失敗時の後始末（暗号化の無効化・アラート送信）はここでは行わない。
//! [`SigningOutcome::Failed`] として呼び出し元に返し、[`super::NotificationService`] が処理する。

use std::sync::Arc;

use aliasrelay_domain::{
    notification::SigningError,
    recipient::{Fingerprint, RecipientPreference},
};
use aliasrelay_infra::signing::{MailSigner, SignerFactory};

use crate::config::SigningConfig;

/// 署名の試行結果
///
/// メール組み立ての間だけ存在する。永続化しない。
#[derive(Debug)]
pub enum SigningOutcome {
    /// 署名ハンドルを取得できた
    Signed(Arc<dyn MailSigner>),
    /// 署名を試みなかった
    Unsigned,
    /// 署名を試みたが失敗した
    Failed(SigningError),
}

/// 組織の署名鍵で署名ハンドルを生成し、受信者の鍵を登録する
///
/// 1. 組織の署名鍵が未設定なら [`SigningError::NotConfigured`]
/// 2. [`SignerFactory::new_signer`] で組織の秘密鍵を確認
/// 3. [`MailSigner::add_recipient`] で受信者の公開鍵を確認・登録
pub async fn acquire_signer(
    factory: &dyn SignerFactory,
    config: &SigningConfig,
    recipient_fingerprint: &Fingerprint,
) -> Result<Arc<dyn MailSigner>, SigningError> {
    let signing_key = config
        .signing_key
        .as_ref()
        .ok_or(SigningError::NotConfigured)?;

    let mut signer = factory
        .new_signer(signing_key, &config.keyring_path)
        .await?;
    signer.add_recipient(recipient_fingerprint).await?;

    Ok(Arc::from(signer))
}

/// 暗号化設定に従って署名を試みる
///
/// `should_encrypt` が false、またはフィンガープリントが未登録の場合は
/// ツールキットを一切呼び出さずに [`SigningOutcome::Unsigned`] を返す。
pub async fn decide_signing(
    factory: &dyn SignerFactory,
    config: &SigningConfig,
    preference: &RecipientPreference,
) -> SigningOutcome {
    let Some(fingerprint) = preference.signing_fingerprint() else {
        return SigningOutcome::Unsigned;
    };

    match acquire_signer(factory, config, fingerprint).await {
        Ok(signer) => SigningOutcome::Signed(signer),
        Err(e) => SigningOutcome::Failed(e),
    }
}
