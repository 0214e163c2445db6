//! # AuditLogRepository
//!
//! セキュリティイベントと一括操作の活動ログの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **セキュリティイベント**: ユーザーの変更と同じ [`TxContext`] で書き込む。
//!   変更がロールバックされればイベントも残らない
//! - **活動ログ**: 実行全体の結果が確定した後にプールから直接書き込む
//! - **統計**: 活動ログを操作種別ごとに集計する

use async_trait::async_trait;
use atis_domain::{
   audit_log::{BulkActivityLog, BulkOperationStats, SecurityEvent},
   bulk::BulkOperation,
};
use sqlx::PgPool;

use crate::{db::TxContext, error::InfraError};

/// 監査ログリポジトリトレイト
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
   /// セキュリティイベントを記録する
   async fn insert_security_event(
      &self,
      tx: &mut TxContext,
      event: &SecurityEvent,
   ) -> Result<(), InfraError>;

   /// 一括操作の活動ログを記録する
   async fn insert_activity_log(&self, log: &BulkActivityLog) -> Result<(), InfraError>;

   /// 活動ログを操作種別ごとに集計する
   async fn aggregate_operation_stats(&self) -> Result<Vec<BulkOperationStats>, InfraError>;
}

/// PostgreSQL 実装の AuditLogRepository
#[derive(Debug, Clone)]
pub struct PostgresAuditLogRepository {
   pool: PgPool,
}

impl PostgresAuditLogRepository {
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(event_type = %event.event_type))]
   async fn insert_security_event(
      &self,
      tx: &mut TxContext,
      event: &SecurityEvent,
   ) -> Result<(), InfraError> {
      sqlx::query(
         r#"
            INSERT INTO security_events
                (id, event_type, severity, user_id, target_user_id, description, event_data, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
      )
      .bind(event.id)
      .bind(event.event_type.to_string())
      .bind(event.severity.to_string())
      .bind(event.actor_id.as_i64())
      .bind(event.target_user_id.as_i64())
      .bind(&event.description)
      .bind(&event.event_data)
      .bind(event.created_at)
      .execute(tx.conn()?)
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(operation = %log.operation))]
   async fn insert_activity_log(&self, log: &BulkActivityLog) -> Result<(), InfraError> {
      sqlx::query(
         r#"
            INSERT INTO bulk_activity_logs
                (id, activity_type, user_id, description, success_count, failure_count,
                 skipped_count, total_requested, success_rate, event_data, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
      )
      .bind(log.id)
      .bind(log.operation.activity_type())
      .bind(log.actor_id.as_i64())
      .bind(&log.description)
      .bind(log.success_count)
      .bind(log.failure_count)
      .bind(log.skipped_count)
      .bind(log.total_requested)
      .bind(log.success_rate)
      .bind(&log.event_data)
      .bind(log.created_at)
      .execute(&self.pool)
      .await?;

      Ok(())
   }

   #[tracing::instrument(skip_all, level = "debug")]
   async fn aggregate_operation_stats(&self) -> Result<Vec<BulkOperationStats>, InfraError> {
      let rows: Vec<(String, i64, i64, i64, i64)> = sqlx::query_as(
         r#"
            SELECT
                activity_type,
                COUNT(*)::bigint,
                COALESCE(SUM(success_count), 0)::bigint,
                COALESCE(SUM(failure_count), 0)::bigint,
                COALESCE(SUM(skipped_count), 0)::bigint
            FROM bulk_activity_logs
            GROUP BY activity_type
            ORDER BY activity_type
            "#,
      )
      .fetch_all(&self.pool)
      .await?;

      Ok(rows
         .into_iter()
         .filter_map(
            |(activity_type, executions, success_count, failure_count, skipped_count)| {
               let operation = BulkOperation::from_activity_type(&activity_type)?;
               Some(BulkOperationStats {
                  operation,
                  executions,
                  success_count,
                  failure_count,
                  skipped_count,
               })
            },
         )
         .collect())
   }
}
