//! # 監査ログ
//!
//! 一括操作の監査証跡を記録するドメインモデル。
//!
//! ## 設計方針
//!
//! - **不変性**: 監査ログは一度作成されたら変更されない
//! - **2 階層**: 変更されたユーザーごとのセキュリティイベントと、実行ごとの活動ログ
//! - **同一トランザクション**: セキュリティイベントは変更と同じトランザクションで書き込む
//!
//! ## イベント種別
//!
//! | 操作 | セキュリティイベント | 重要度 |
//! |------|-------------------|--------|
//! | `activate` | `bulk_user_activated` | `info` |
//! | `deactivate` | `bulk_user_deactivated` | `warning` |
//! | `assign_role` | `bulk_role_assigned` | `info` |
//! | `assign_institution` | `bulk_institution_assigned` | `info` |
//! | `delete` | `bulk_user_deleted` | `critical` |

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
   bulk::{BulkAction, BulkOperation, ExecutionResult, UserState},
   user::{User, UserId},
};

/// セキュリティイベントの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventType {
   BulkUserActivated,
   BulkUserDeactivated,
   BulkRoleAssigned,
   BulkInstitutionAssigned,
   BulkUserDeleted,
}

impl SecurityEventType {
   pub fn for_operation(operation: BulkOperation) -> Self {
      match operation {
         BulkOperation::Activate => Self::BulkUserActivated,
         BulkOperation::Deactivate => Self::BulkUserDeactivated,
         BulkOperation::AssignRole => Self::BulkRoleAssigned,
         BulkOperation::AssignInstitution => Self::BulkInstitutionAssigned,
         BulkOperation::Delete => Self::BulkUserDeleted,
      }
   }

   pub fn severity(self) -> Severity {
      match self {
         Self::BulkUserDeactivated => Severity::Warning,
         Self::BulkUserDeleted => Severity::Critical,
         Self::BulkUserActivated | Self::BulkRoleAssigned | Self::BulkInstitutionAssigned => {
            Severity::Info
         }
      }
   }

   fn description(self) -> &'static str {
      match self {
         Self::BulkUserActivated => "User activated via bulk operation",
         Self::BulkUserDeactivated => "User deactivated via bulk operation",
         Self::BulkRoleAssigned => "User role changed via bulk operation",
         Self::BulkInstitutionAssigned => "User institution changed via bulk operation",
         Self::BulkUserDeleted => "User permanently deleted via bulk operation",
      }
   }
}

impl fmt::Display for SecurityEventType {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let s = match self {
         Self::BulkUserActivated => "bulk_user_activated",
         Self::BulkUserDeactivated => "bulk_user_deactivated",
         Self::BulkRoleAssigned => "bulk_role_assigned",
         Self::BulkInstitutionAssigned => "bulk_institution_assigned",
         Self::BulkUserDeleted => "bulk_user_deleted",
      };
      write!(f, "{s}")
   }
}

/// イベントの重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
   Info,
   Warning,
   Critical,
}

impl fmt::Display for Severity {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         Self::Info => write!(f, "info"),
         Self::Warning => write!(f, "warning"),
         Self::Critical => write!(f, "critical"),
      }
   }
}

/// ユーザー単位のセキュリティイベント
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityEvent {
   pub id:             Uuid,
   pub event_type:     SecurityEventType,
   pub severity:       Severity,
   pub actor_id:       UserId,
   pub target_user_id: UserId,
   pub description:    String,
   pub event_data:     serde_json::Value,
   pub created_at:     DateTime<Utc>,
}

impl SecurityEvent {
   /// 一括操作で変更されたユーザー 1 件分のイベントを作成する
   ///
   /// `previous` は変更前の状態。ロールや教育機関の変更では新旧の名前を記録する。
   pub fn for_bulk_item(
      action: &BulkAction,
      actor_id: UserId,
      target: &User,
      previous: &UserState,
      now: DateTime<Utc>,
   ) -> Self {
      let event_type = SecurityEventType::for_operation(action.operation());

      let mut event_data = json!({
         "target_username": target.username().as_str(),
         "bulk_operation": true,
      });
      let detail = match action {
         BulkAction::AssignRole(role) => json!({
            "old_role": previous.role_name,
            "new_role": role.name(),
         }),
         BulkAction::AssignInstitution(institution) => json!({
            "old_institution": previous.institution_name,
            "new_institution": institution.name(),
         }),
         BulkAction::Delete => json!({ "target_email": target.email().as_str() }),
         BulkAction::Activate | BulkAction::Deactivate => json!({}),
      };
      if let (Some(data), serde_json::Value::Object(extra)) = (event_data.as_object_mut(), detail)
      {
         data.extend(extra);
      }

      Self {
         id: Uuid::now_v7(),
         event_type,
         severity: event_type.severity(),
         actor_id,
         target_user_id: *target.id(),
         description: event_type.description().to_string(),
         event_data,
         created_at: now,
      }
   }
}

/// 一括操作の実行ごとの活動ログ
#[derive(Debug, Clone, PartialEq)]
pub struct BulkActivityLog {
   pub id:              Uuid,
   pub operation:       BulkOperation,
   pub actor_id:        UserId,
   pub description:     String,
   pub success_count:   i64,
   pub failure_count:   i64,
   pub skipped_count:   i64,
   pub total_requested: i64,
   /// 成功率（%）
   pub success_rate:    f64,
   pub event_data:      serde_json::Value,
   pub created_at:      DateTime<Utc>,
}

impl BulkActivityLog {
   /// 実行結果から活動ログを作成する
   pub fn from_execution(
      actor_id: UserId,
      result: &ExecutionResult,
      auxiliary_target: Option<i64>,
      now: DateTime<Utc>,
   ) -> Self {
      let activity_type = result.operation.activity_type();
      let user_ids: Vec<i64> = result.items.iter().map(|item| item.id.as_i64()).collect();

      let mut event_data = json!({ "user_ids": user_ids });
      if let (Some(field), Some(target), Some(data)) = (
         result.operation.auxiliary_field(),
         auxiliary_target,
         event_data.as_object_mut(),
      ) {
         data.insert(field.to_string(), json!(target));
      }

      Self {
         id: Uuid::now_v7(),
         operation: result.operation,
         actor_id,
         description: format!(
            "Bulk operation: {activity_type} - {}/{} users affected",
            result.success_count, result.total_requested
         ),
         success_count: result.success_count as i64,
         failure_count: result.failure_count as i64,
         skipped_count: result.skipped_count as i64,
         total_requested: result.total_requested as i64,
         success_rate: result.success_rate(),
         event_data,
         created_at: now,
      }
   }
}

/// 活動ログから集計した操作ごとの実績
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOperationStats {
   pub operation:     BulkOperation,
   pub executions:    i64,
   pub success_count: i64,
   pub failure_count: i64,
   pub skipped_count: i64,
}
