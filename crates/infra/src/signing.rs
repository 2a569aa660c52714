//! # 署名ツールキット
//!
//! 送信メールを OpenPGP で署名・暗号化する外部ツールキットを抽象化する。
//!
//! ## 設計方針
//!
//! - **2 段階の取得**: [`SignerFactory::new_signer`] で組織の署名鍵を確認し、
//!   [`MailSigner::add_recipient`] で受信者の公開鍵を登録する
//! - **失敗は `SigningError`**: 鍵不在・失効・ツールキット不在はすべて同じ型で返す。
//!   呼び出し側は区別せず「署名不可」として扱う
//! - **実装**: gpg バイナリを呼び出す [`GpgSignerFactory`]

mod gpg;

use std::{fmt, path::Path};

use aliasrelay_domain::{notification::SigningError, recipient::Fingerprint};
use async_trait::async_trait;
pub use gpg::{GpgSigner, GpgSignerFactory};

/// 署名ハンドル
///
/// 組織の署名鍵と、1 つ以上の受信者の公開鍵に束縛された署名コンテキスト。
/// 送信メールに添付され、送信時に本文を封緘する。
#[async_trait]
pub trait MailSigner: fmt::Debug + Send + Sync {
    /// 署名に使用する組織の鍵
    fn signing_key(&self) -> &Fingerprint;

    /// 暗号化の宛先として登録済みの鍵
    fn recipients(&self) -> &[Fingerprint];

    /// 暗号化の宛先に受信者の公開鍵を登録する
    async fn add_recipient(&mut self, fingerprint: &Fingerprint) -> Result<(), SigningError>;

    /// 本文を署名・暗号化し、ASCII armor 形式で返す
    async fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, SigningError>;
}

/// 署名ハンドルの生成
#[async_trait]
pub trait SignerFactory: Send + Sync {
    /// 組織の署名鍵で署名ハンドルを生成する
    ///
    /// - `signing_key`: 組織の署名鍵のフィンガープリント
    /// - `keyring`: キーリングのディレクトリ
    async fn new_signer(
        &self,
        signing_key: &Fingerprint,
        keyring: &Path,
    ) -> Result<Box<dyn MailSigner>, SigningError>;
}
