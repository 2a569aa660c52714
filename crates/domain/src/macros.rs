/// UUID をラップした識別子型を定義する
///
/// 生成される型は `Copy` ではない値オブジェクトで、比較・ハッシュ・シリアライズ・表示ができる。
/// 新規発行は UUID v7（時刻順）、DB から読み込む場合は `From<Uuid>` / `from_uuid` を使う。
///
/// ```rust
/// use aliasrelay_domain::recipient::RecipientId;
///
/// let issued = RecipientId::new();
/// let loaded = RecipientId::from(*issued.as_uuid());
/// assert_eq!(issued, loaded);
/// ```
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display, derive_more::From,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            /// UUID v7 で新しい識別子を発行する
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}
