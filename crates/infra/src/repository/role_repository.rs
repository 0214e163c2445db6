//! # RoleRepository
//!
//! ロール情報の読み取りを担当するリポジトリ。
//!
//! ロールの作成・更新は権限管理サービスの責務で、ここでは一括割り当ての
//! 存在確認と、プレビュー・統計での名前解決のみを扱う。

use async_trait::async_trait;
use atis_domain::role::{Role, RoleId};
use sqlx::PgPool;

use crate::error::InfraError;

/// ロールリポジトリトレイト
#[async_trait]
pub trait RoleRepository: Send + Sync {
   /// ID でロールを検索する
   async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, InfraError>;

   /// 複数の ID でロールを一括取得する
   async fn find_by_ids(&self, ids: &[RoleId]) -> Result<Vec<Role>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct RoleRow {
   id:   i64,
   name: String,
}

impl From<RoleRow> for Role {
   fn from(row: RoleRow) -> Self {
      Role::new(RoleId::new(row.id), row.name)
   }
}

/// PostgreSQL 実装の RoleRepository
#[derive(Debug, Clone)]
pub struct PostgresRoleRepository {
   pool: PgPool,
}

impl PostgresRoleRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, InfraError> {
      let row: Option<RoleRow> = sqlx::query_as("SELECT id, name FROM roles WHERE id = $1")
         .bind(id.as_i64())
         .fetch_optional(&self.pool)
         .await?;

      Ok(row.map(Role::from))
   }

   #[tracing::instrument(skip_all, level = "debug", fields(count = ids.len()))]
   async fn find_by_ids(&self, ids: &[RoleId]) -> Result<Vec<Role>, InfraError> {
      if ids.is_empty() {
         return Ok(Vec::new());
      }

      let ids: Vec<i64> = ids.iter().map(RoleId::as_i64).collect();
      let rows: Vec<RoleRow> = sqlx::query_as("SELECT id, name FROM roles WHERE id = ANY($1)")
         .bind(ids)
         .fetch_all(&self.pool)
         .await?;

      Ok(rows.into_iter().map(Role::from).collect())
   }
}
