//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するシードデータ作成ヘルパー。
//! Rust の統合テスト規約に従い `tests/common/mod.rs` に配置。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use atis_domain::{institution::InstitutionId, role::RoleId, user::UserId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// テスト用の固定日時（2025-09-18 14:30:00 UTC）
pub fn test_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_758_205_800, 0).unwrap()
}

/// ロールを作成する
pub async fn insert_role(pool: &PgPool, name: &str) -> RoleId {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO roles (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("ロール作成に失敗");
    RoleId::new(id)
}

/// 教育機関を作成する
pub async fn insert_institution(pool: &PgPool, name: &str) -> InstitutionId {
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO institutions (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .expect("教育機関作成に失敗");
    InstitutionId::new(id)
}

/// テスト用ユーザーの初期値
pub struct TestUser<'a> {
    pub username:       &'a str,
    pub is_active:      bool,
    pub role_id:        Option<RoleId>,
    pub institution_id: Option<InstitutionId>,
    pub created_at:     DateTime<Utc>,
}

impl<'a> TestUser<'a> {
    pub fn active(username: &'a str) -> Self {
        Self {
            username,
            is_active: true,
            role_id: None,
            institution_id: None,
            created_at: test_now(),
        }
    }
}

/// ユーザーを作成する
pub async fn insert_user(pool: &PgPool, user: TestUser<'_>) -> UserId {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (username, email, is_active, role_id, institution_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING id
        "#,
    )
    .bind(user.username)
    .bind(format!("{}@example.az", user.username))
    .bind(user.is_active)
    .bind(user.role_id.map(|id| id.as_i64()))
    .bind(user.institution_id.map(|id| id.as_i64()))
    .bind(user.created_at)
    .fetch_one(pool)
    .await
    .expect("ユーザー作成に失敗");
    UserId::new(id)
}

/// ユーザーの付随データ（プロフィールとアクセストークン）を作成する
pub async fn insert_user_dependents(pool: &PgPool, user_id: &UserId) {
    sqlx::query("INSERT INTO user_profiles (user_id, first_name) VALUES ($1, 'Rəşad')")
        .bind(user_id.as_i64())
        .execute(pool)
        .await
        .expect("プロフィール作成に失敗");
    sqlx::query("INSERT INTO personal_access_tokens (user_id, token) VALUES ($1, $2)")
        .bind(user_id.as_i64())
        .bind(format!("token-{user_id}"))
        .execute(pool)
        .await
        .expect("トークン作成に失敗");
}

/// テーブルの行数を数える
pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*)::bigint FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("件数取得に失敗");
    count
}
