//! RecipientRepository 統合テスト
//!
//! データベースを使用したテスト。sqlx::test マクロを使用して、
//! テストごとに新しいデータベースを作成しマイグレーションを適用する。
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p aliasrelay-infra --test recipient_repository_test -- --ignored
//! ```

use aliasrelay_domain::{recipient::RecipientId, user::UserId};
use aliasrelay_infra::repository::{PostgresRecipientRepository, RecipientRepository};
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use uuid::Uuid;

/// ユーザーとデフォルト受信者を作成する
async fn insert_user_with_default(
    pool: &PgPool,
    should_encrypt: bool,
    fingerprint: Option<&str>,
) -> (UserId, RecipientId) {
    let user_id = Uuid::now_v7();
    let recipient_id = Uuid::now_v7();

    sqlx::query("INSERT INTO users (id, email) VALUES ($1, 'owner@example.com')")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("ユーザー作成に失敗");

    sqlx::query(
        r#"
        INSERT INTO recipients (id, user_id, email, should_encrypt, fingerprint)
        VALUES ($1, $2, 'inbox@example.com', $3, $4)
        "#,
    )
    .bind(recipient_id)
    .bind(user_id)
    .bind(should_encrypt)
    .bind(fingerprint)
    .execute(pool)
    .await
    .expect("受信者作成に失敗");

    sqlx::query("UPDATE users SET default_recipient_id = $1 WHERE id = $2")
        .bind(recipient_id)
        .bind(user_id)
        .execute(pool)
        .await
        .expect("デフォルト受信者の設定に失敗");

    (
        UserId::from_uuid(user_id),
        RecipientId::from_uuid(recipient_id),
    )
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn デフォルト受信者を暗号化設定付きで取得できる(pool: PgPool) {
    let (user_id, recipient_id) =
        insert_user_with_default(&pool, true, Some("abc1 23de")).await;
    let repo = PostgresRecipientRepository::new(pool);

    let recipient = repo
        .find_default_by_user(&user_id)
        .await
        .unwrap()
        .expect("デフォルト受信者が見つからない");

    assert_eq!(recipient.id(), &recipient_id);
    assert_eq!(recipient.email().as_str(), "inbox@example.com");
    assert!(recipient.preference().should_encrypt());
    assert_eq!(
        recipient
            .preference()
            .signing_fingerprint()
            .map(|f| f.as_str().to_string()),
        Some("ABC123DE".to_string())
    );
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn デフォルト受信者が未設定ならnoneを返す(pool: PgPool) {
    let user_id = Uuid::now_v7();
    sqlx::query("INSERT INTO users (id, email) VALUES ($1, 'owner@example.com')")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();
    let repo = PostgresRecipientRepository::new(pool);

    let result = repo
        .find_default_by_user(&UserId::from_uuid(user_id))
        .await
        .unwrap();

    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn 暗号化有効でフィンガープリントが空なら署名なしの受信者として取得できる(pool: PgPool) {
    let (user_id, _) = insert_user_with_default(&pool, true, Some("")).await;
    let repo = PostgresRecipientRepository::new(pool);

    let recipient = repo.find_default_by_user(&user_id).await.unwrap().unwrap();

    assert!(recipient.preference().should_encrypt());
    assert!(recipient.preference().signing_fingerprint().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn 暗号化無効の受信者は壊れたフィンガープリントでも取得できる(pool: PgPool) {
    let (user_id, _) = insert_user_with_default(&pool, false, Some("not-hex")).await;
    let repo = PostgresRecipientRepository::new(pool);

    let recipient = repo.find_default_by_user(&user_id).await.unwrap().unwrap();

    assert!(!recipient.preference().should_encrypt());
    assert!(recipient.preference().signing_fingerprint().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn disable_encryptionは冪等に暗号化を無効にする(pool: PgPool) {
    let (user_id, recipient_id) = insert_user_with_default(&pool, true, Some("ABC123")).await;
    let repo = PostgresRecipientRepository::new(pool);

    repo.disable_encryption(&recipient_id).await.unwrap();
    repo.disable_encryption(&recipient_id).await.unwrap();

    let recipient = repo.find_default_by_user(&user_id).await.unwrap().unwrap();
    assert!(!recipient.preference().should_encrypt());
}
