//! # UserRepository
//!
//! ユーザー情報の永続化と、統計用の集計を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **読み取りはプール、書き込みは TxContext**: 一括操作の項目ごとに
//!   トランザクションを分けるため、書き込みと行ロック付き読み取りは
//!   [`TxContext`] を受け取る
//! - **物理削除**: 削除時はプロフィールとアクセストークンも同じトランザクションで削除する
//! - **トークン失効**: 無効化したユーザーのアクセストークンは [`UserRepository::revoke_tokens`]
//!   で同じトランザクション内に削除する

use async_trait::async_trait;
use atis_domain::{
   institution::InstitutionId,
   role::RoleId,
   user::{Email, User, UserId, UserRecord, UserStatus},
   value_objects::Username,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{db::TxContext, error::InfraError};

/// ステータス別のユーザー数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserStatusCounts {
   pub total:  i64,
   pub active: i64,
}

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
   /// 複数の ID でユーザーを一括取得する
   ///
   /// 存在しない ID は結果に含まれない。順序は保証しない。
   async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, InfraError>;

   /// トランザクション内で行ロックを取得してユーザーを取得する
   async fn find_by_id_for_update(
      &self,
      tx: &mut TxContext,
      id: &UserId,
   ) -> Result<Option<User>, InfraError>;

   /// ユーザーの状態（有効/無効、ロール、教育機関）を更新する
   ///
   /// 対象行が存在しない場合は Conflict を返す。
   async fn update(&self, tx: &mut TxContext, user: &User) -> Result<(), InfraError>;

   /// ユーザーのアクセストークンをすべて削除し、削除した件数を返す
   async fn revoke_tokens(&self, tx: &mut TxContext, id: &UserId) -> Result<u64, InfraError>;

   /// ユーザーと付随するプロフィール・アクセストークンを削除する
   async fn delete(&self, tx: &mut TxContext, id: &UserId) -> Result<(), InfraError>;

   /// 全体・アクティブのユーザー数
   async fn count_by_status(&self) -> Result<UserStatusCounts, InfraError>;

   /// ロール別のユーザー数（ロール未割り当ては含まない）
   async fn count_by_role(&self) -> Result<Vec<(RoleId, i64)>, InfraError>;

   /// 所属ユーザーが多い順に教育機関別のユーザー数を取得する
   async fn count_by_institution(&self, limit: i64)
   -> Result<Vec<(InstitutionId, i64)>, InfraError>;

   /// 指定日時以降に作成されたユーザー数
   async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64, InfraError>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
   id:             i64,
   username:       String,
   email:          String,
   is_active:      bool,
   role_id:        Option<i64>,
   institution_id: Option<i64>,
   locked_until:   Option<DateTime<Utc>>,
   created_at:     DateTime<Utc>,
   updated_at:     DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
   type Error = InfraError;

   fn try_from(row: UserRow) -> Result<Self, Self::Error> {
      Ok(User::from_db(UserRecord {
         id:             UserId::new(row.id),
         username:       Username::new(row.username)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
         email:          Email::new(row.email).map_err(|e| InfraError::unexpected(e.to_string()))?,
         status:         UserStatus::from_is_active(row.is_active),
         role_id:        row.role_id.map(RoleId::new),
         institution_id: row.institution_id.map(InstitutionId::new),
         locked_until:   row.locked_until,
         created_at:     row.created_at,
         updated_at:     row.updated_at,
      }))
   }
}

const USER_COLUMNS: &str = "id, username, email, is_active, role_id, institution_id, \
                            locked_until, created_at, updated_at";

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
   pool: PgPool,
}

impl PostgresUserRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(count = ids.len()))]
   async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, InfraError> {
      if ids.is_empty() {
         return Ok(Vec::new());
      }

      let ids: Vec<i64> = ids.iter().map(UserId::as_i64).collect();
      let rows: Vec<UserRow> =
         sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

      rows.into_iter().map(User::try_from).collect()
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn find_by_id_for_update(
      &self,
      tx: &mut TxContext,
      id: &UserId,
   ) -> Result<Option<User>, InfraError> {
      let row: Option<UserRow> = sqlx::query_as(&format!(
         "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
      ))
      .bind(id.as_i64())
      .fetch_optional(tx.conn()?)
      .await?;

      row.map(User::try_from).transpose()
   }

   #[tracing::instrument(skip_all, level = "debug", fields(id = %user.id()))]
   async fn update(&self, tx: &mut TxContext, user: &User) -> Result<(), InfraError> {
      let result = sqlx::query(
         r#"
            UPDATE users
            SET is_active = $2,
                locked_until = $3,
                role_id = $4,
                institution_id = $5,
                updated_at = $6
            WHERE id = $1
            "#,
      )
      .bind(user.id().as_i64())
      .bind(user.is_active())
      .bind(user.locked_until())
      .bind(user.role_id().map(RoleId::as_i64))
      .bind(user.institution_id().map(InstitutionId::as_i64))
      .bind(user.updated_at())
      .execute(tx.conn()?)
      .await?;

      if result.rows_affected() == 0 {
         return Err(InfraError::conflict("User", user.id().to_string()));
      }

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn revoke_tokens(&self, tx: &mut TxContext, id: &UserId) -> Result<u64, InfraError> {
      let result = sqlx::query("DELETE FROM personal_access_tokens WHERE user_id = $1")
         .bind(id.as_i64())
         .execute(tx.conn()?)
         .await?;

      Ok(result.rows_affected())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn delete(&self, tx: &mut TxContext, id: &UserId) -> Result<(), InfraError> {
      sqlx::query("DELETE FROM user_profiles WHERE user_id = $1")
         .bind(id.as_i64())
         .execute(tx.conn()?)
         .await?;

      self.revoke_tokens(tx, id).await?;

      let result = sqlx::query("DELETE FROM users WHERE id = $1")
         .bind(id.as_i64())
         .execute(tx.conn()?)
         .await?;

      if result.rows_affected() == 0 {
         return Err(InfraError::conflict("User", id.to_string()));
      }

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug")]
   async fn count_by_status(&self) -> Result<UserStatusCounts, InfraError> {
      let (total, active): (i64, i64) = sqlx::query_as(
         r#"
            SELECT
                COUNT(*)::bigint,
                COUNT(*) FILTER (WHERE is_active)::bigint
            FROM users
            "#,
      )
      .fetch_one(&self.pool)
      .await?;

      Ok(UserStatusCounts { total, active })
   }

   #[tracing::instrument(skip_all, level = "debug")]
   async fn count_by_role(&self) -> Result<Vec<(RoleId, i64)>, InfraError> {
      let rows: Vec<(i64, i64)> = sqlx::query_as(
         r#"
            SELECT role_id, COUNT(*)::bigint
            FROM users
            WHERE role_id IS NOT NULL
            GROUP BY role_id
            ORDER BY role_id
            "#,
      )
      .fetch_all(&self.pool)
      .await?;

      Ok(rows
         .into_iter()
         .map(|(role_id, count)| (RoleId::new(role_id), count))
         .collect())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(limit = limit))]
   async fn count_by_institution(
      &self,
      limit: i64,
   ) -> Result<Vec<(InstitutionId, i64)>, InfraError> {
      let rows: Vec<(i64, i64)> = sqlx::query_as(
         r#"
            SELECT institution_id, COUNT(*)::bigint AS user_count
            FROM users
            WHERE institution_id IS NOT NULL
            GROUP BY institution_id
            ORDER BY user_count DESC, institution_id ASC
            LIMIT $1
            "#,
      )
      .bind(limit)
      .fetch_all(&self.pool)
      .await?;

      Ok(rows
         .into_iter()
         .map(|(institution_id, count)| (InstitutionId::new(institution_id), count))
         .collect())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%since))]
   async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64, InfraError> {
      let (count,): (i64,) =
         sqlx::query_as("SELECT COUNT(*)::bigint FROM users WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

      Ok(count)
   }
}
