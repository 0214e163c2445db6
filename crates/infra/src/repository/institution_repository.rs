//! # InstitutionRepository
//!
//! 教育機関の読み取りを担当するリポジトリ。

use async_trait::async_trait;
use atis_domain::institution::{Institution, InstitutionId};
use sqlx::PgPool;

use crate::error::InfraError;

/// 教育機関リポジトリトレイト
#[async_trait]
pub trait InstitutionRepository: Send + Sync {
   async fn find_by_id(&self, id: &InstitutionId) -> Result<Option<Institution>, InfraError>;

   async fn find_by_ids(&self, ids: &[InstitutionId]) -> Result<Vec<Institution>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct InstitutionRow {
   id:   i64,
   name: String,
}

impl From<InstitutionRow> for Institution {
   fn from(row: InstitutionRow) -> Self {
      Institution::new(InstitutionId::new(row.id), row.name)
   }
}

/// PostgreSQL 実装の InstitutionRepository
#[derive(Debug, Clone)]
pub struct PostgresInstitutionRepository {
   pool: PgPool,
}

impl PostgresInstitutionRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl InstitutionRepository for PostgresInstitutionRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn find_by_id(&self, id: &InstitutionId) -> Result<Option<Institution>, InfraError> {
      let row: Option<InstitutionRow> =
         sqlx::query_as("SELECT id, name FROM institutions WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

      Ok(row.map(Institution::from))
   }

   #[tracing::instrument(skip_all, level = "debug", fields(count = ids.len()))]
   async fn find_by_ids(&self, ids: &[InstitutionId]) -> Result<Vec<Institution>, InfraError> {
      if ids.is_empty() {
         return Ok(Vec::new());
      }

      let ids: Vec<i64> = ids.iter().map(InstitutionId::as_i64).collect();
      let rows: Vec<InstitutionRow> =
         sqlx::query_as("SELECT id, name FROM institutions WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

      Ok(rows.into_iter().map(Institution::from).collect())
   }
}
