//! # ユーザー一括操作
//!
//! 複数ユーザーに同じ変更を適用する一括操作のポリシー、計画、結果を定義する。
//!
//! ## 処理の流れ
//!
//! ```text
//! BulkRequest ──check_policy──▶ 存在確認（ユースケース層）──▶ BulkAction
//!                                                              │
//!                                   ┌──────────────────────────┤
//!                                   ▼                          ▼
//!                            plan_item（プレビュー）   plan_item + 適用（実行）
//!                                   │                          │
//!                                   ▼                          ▼
//!                             PreviewResult             ExecutionResult
//! ```
//!
//! ## ポリシー
//!
//! | 操作 | 最大件数 | 補助対象 | 確認 |
//! |------|---------|---------|------|
//! | `activate` | 100 | - | - |
//! | `deactivate` | 100 | - | - |
//! | `assign_role` | 100 | `role_id` | - |
//! | `assign_institution` | 100 | `institution_id` | - |
//! | `delete` | 50 | - | 必須 |
//!
//! ## 実行方針
//!
//! 実行はベストエフォート: 項目ごとに独立して成否を記録し、1 件の失敗で
//! バッチ全体を中断しない。ポリシー違反と存在しない ID は、変更前に
//! リクエスト全体を拒否する。

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
   institution::{Institution, InstitutionId},
   role::{Role, RoleId, is_superadmin_role_name},
   user::{UserId, UserStatus},
};

/// プレビューで一度に指定できる最大件数
pub const PREVIEW_MAX_BATCH_SIZE: usize = 100;

// =========================================================================
// BulkOperation / OperationPolicy
// =========================================================================

/// 一括操作の種類
#[derive(
   Debug,
   Clone,
   Copy,
   PartialEq,
   Eq,
   Hash,
   Serialize,
   Deserialize,
   strum::Display,
   strum::EnumString,
   strum::IntoStaticStr,
   strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BulkOperation {
   Activate,
   Deactivate,
   AssignRole,
   AssignInstitution,
   Delete,
}

/// 操作ごとの制約
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationPolicy {
   /// 一度に指定できる最大件数
   pub max_batch_size:            usize,
   /// ロール ID / 教育機関 ID の指定が必要か
   pub requires_auxiliary_target: bool,
   /// 明示的な確認（`confirm: true`）が必要か
   pub requires_confirmation:     bool,
}

impl BulkOperation {
   /// 操作のポリシーを返す
   ///
   /// 破壊的な操作（削除）は件数上限を小さくし、確認を必須とする。
   pub const fn policy(self) -> OperationPolicy {
      match self {
         Self::Delete => OperationPolicy {
            max_batch_size:            50,
            requires_auxiliary_target: false,
            requires_confirmation:     true,
         },
         Self::AssignRole | Self::AssignInstitution => OperationPolicy {
            max_batch_size:            100,
            requires_auxiliary_target: true,
            requires_confirmation:     false,
         },
         Self::Activate | Self::Deactivate => OperationPolicy {
            max_batch_size:            100,
            requires_auxiliary_target: false,
            requires_confirmation:     false,
         },
      }
   }

   /// 補助対象のリクエストフィールド名
   pub const fn auxiliary_field(self) -> Option<&'static str> {
      match self {
         Self::AssignRole => Some("role_id"),
         Self::AssignInstitution => Some("institution_id"),
         Self::Activate | Self::Deactivate | Self::Delete => None,
      }
   }

   /// 活動ログに記録する種別
   pub const fn activity_type(self) -> &'static str {
      match self {
         Self::Activate => "bulk_user_activate",
         Self::Deactivate => "bulk_user_deactivate",
         Self::AssignRole => "bulk_role_assign",
         Self::AssignInstitution => "bulk_institution_assign",
         Self::Delete => "bulk_user_delete",
      }
   }

   /// 活動ログの種別から操作を復元する
   pub fn from_activity_type(activity_type: &str) -> Option<Self> {
      use strum::IntoEnumIterator;

      Self::iter().find(|op| op.activity_type() == activity_type)
   }
}

// =========================================================================
// BulkRequest / BulkPolicyError
// =========================================================================

/// 一括操作のポリシー違反
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkPolicyError {
   #[error("一括操作の対象ユーザーが選択されていません")]
   EmptyTargets,

   #[error("一括 {operation} 操作は一度に {max} 件までです（指定: {actual} 件）")]
   BatchTooLarge {
      operation: BulkOperation,
      max:       usize,
      actual:    usize,
   },

   #[error("一括 {operation} 操作には {field} の指定が必要です")]
   MissingAuxiliaryTarget {
      operation: BulkOperation,
      field:     &'static str,
   },

   /// UI が確認ダイアログを出せるよう、他の検証エラーと区別する
   #[error("一括 {operation} 操作には明示的な確認が必要です")]
   ConfirmationRequired { operation: BulkOperation },
}

/// 一括操作リクエスト
///
/// 操作者（`actor_id`）は暗黙のセッションからではなく、明示的に渡す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRequest {
   pub actor_id:         UserId,
   pub operation:        BulkOperation,
   pub target_ids:       Vec<UserId>,
   /// ロール ID または教育機関 ID（操作による）
   pub auxiliary_target: Option<i64>,
   pub confirmed:        bool,
}

impl BulkRequest {
   /// 実行前のポリシーチェック
   ///
   /// 空、件数上限、補助対象、確認の順に検査する。DB には触れない。
   pub fn check_policy(&self) -> Result<(), BulkPolicyError> {
      let policy = self.operation.policy();
      self.check_shape(policy.max_batch_size)?;

      if let Some(field) = self.operation.auxiliary_field()
         && self.auxiliary_target.is_none()
      {
         return Err(BulkPolicyError::MissingAuxiliaryTarget {
            operation: self.operation,
            field,
         });
      }

      if policy.requires_confirmation && !self.confirmed {
         return Err(BulkPolicyError::ConfirmationRequired {
            operation: self.operation,
         });
      }

      Ok(())
   }

   /// プレビュー用のポリシーチェック
   ///
   /// 件数上限は操作によらず [`PREVIEW_MAX_BATCH_SIZE`]。確認と補助対象は不要で、
   /// 補助対象が未指定の項目は [`BlockReason::TargetUnspecified`] として返す。
   pub fn check_preview_policy(&self) -> Result<(), BulkPolicyError> {
      self.check_shape(PREVIEW_MAX_BATCH_SIZE)
   }

   fn check_shape(&self, max: usize) -> Result<(), BulkPolicyError> {
      if self.target_ids.is_empty() {
         return Err(BulkPolicyError::EmptyTargets);
      }

      if self.target_ids.len() > max {
         return Err(BulkPolicyError::BatchTooLarge {
            operation: self.operation,
            max,
            actual: self.target_ids.len(),
         });
      }

      Ok(())
   }

   /// 重複を除いた対象 ID（初出順）
   pub fn distinct_target_ids(&self) -> Vec<UserId> {
      let mut seen = std::collections::HashSet::new();
      self.target_ids
         .iter()
         .filter(|id| seen.insert(**id))
         .copied()
         .collect()
   }
}

// =========================================================================
// BulkAction / 計画
// =========================================================================

/// 補助対象の解決まで済んだ一括操作
///
/// ロールや教育機関の存在はこの型を作る時点で確認済み。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkAction {
   Activate,
   Deactivate,
   AssignRole(Role),
   AssignInstitution(Institution),
   Delete,
}

impl BulkAction {
   pub fn operation(&self) -> BulkOperation {
      match self {
         Self::Activate => BulkOperation::Activate,
         Self::Deactivate => BulkOperation::Deactivate,
         Self::AssignRole(_) => BulkOperation::AssignRole,
         Self::AssignInstitution(_) => BulkOperation::AssignInstitution,
         Self::Delete => BulkOperation::Delete,
      }
   }
}

/// ユーザーの現在（または変更後）の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserState {
   pub status:           UserStatus,
   pub role_id:          Option<RoleId>,
   pub role_name:        Option<String>,
   pub institution_id:   Option<InstitutionId>,
   pub institution_name: Option<String>,
}

impl UserState {
   pub fn is_superadmin(&self) -> bool {
      self.role_name.as_deref().is_some_and(is_superadmin_role_name)
   }
}

/// 項目が変更対象にならない理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
   AlreadyActive,
   AlreadyInactive,
   RoleAlreadyAssigned,
   InstitutionAlreadyAssigned,
   OwnAccount,
   SuperAdmin,
   Duplicate,
   /// プレビューでロール / 教育機関が指定されていない
   TargetUnspecified,
}

impl fmt::Display for BlockReason {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let s = match self {
         Self::AlreadyActive => "既にアクティブです",
         Self::AlreadyInactive => "既に非アクティブです",
         Self::RoleAlreadyAssigned => "既にこのロールが割り当てられています",
         Self::InstitutionAlreadyAssigned => "既にこの教育機関に所属しています",
         Self::OwnAccount => "自分自身のアカウントは対象にできません",
         Self::SuperAdmin => "スーパー管理者のアカウントは削除できません",
         Self::Duplicate => "重複した ID です（最初の指定のみ処理されます）",
         Self::TargetUnspecified => "割り当て先が指定されていません",
      };
      write!(f, "{s}")
   }
}

/// 1 件分の計画
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemPlan {
   /// 変更する。`next` が None の場合は削除
   Change { next: Option<UserState> },
   /// 変更しない
   Blocked(BlockReason),
}

/// 1 ユーザーに対する操作の計画を立てる
///
/// プレビューと実行の両方がこの関数を使うため、プレビューで `blocked` と
/// 表示された項目は実行時に `skipped` になる。
pub fn plan_item(
   user_id: &UserId,
   current: &UserState,
   action: &BulkAction,
   actor_id: &UserId,
) -> ItemPlan {
   match action {
      BulkAction::Activate => {
         if current.status.is_active() {
            return ItemPlan::Blocked(BlockReason::AlreadyActive);
         }
         ItemPlan::Change {
            next: Some(UserState {
               status: UserStatus::Active,
               ..current.clone()
            }),
         }
      }
      BulkAction::Deactivate => {
         if user_id == actor_id {
            return ItemPlan::Blocked(BlockReason::OwnAccount);
         }
         if !current.status.is_active() {
            return ItemPlan::Blocked(BlockReason::AlreadyInactive);
         }
         ItemPlan::Change {
            next: Some(UserState {
               status: UserStatus::Inactive,
               ..current.clone()
            }),
         }
      }
      BulkAction::AssignRole(role) => {
         if current.role_id.as_ref() == Some(role.id()) {
            return ItemPlan::Blocked(BlockReason::RoleAlreadyAssigned);
         }
         ItemPlan::Change {
            next: Some(UserState {
               role_id: Some(*role.id()),
               role_name: Some(role.name().to_string()),
               ..current.clone()
            }),
         }
      }
      BulkAction::AssignInstitution(institution) => {
         if current.institution_id.as_ref() == Some(institution.id()) {
            return ItemPlan::Blocked(BlockReason::InstitutionAlreadyAssigned);
         }
         ItemPlan::Change {
            next: Some(UserState {
               institution_id: Some(*institution.id()),
               institution_name: Some(institution.name().to_string()),
               ..current.clone()
            }),
         }
      }
      BulkAction::Delete => {
         if user_id == actor_id {
            return ItemPlan::Blocked(BlockReason::OwnAccount);
         }
         if current.is_superadmin() {
            return ItemPlan::Blocked(BlockReason::SuperAdmin);
         }
         ItemPlan::Change { next: None }
      }
   }
}

// =========================================================================
// PreviewResult
// =========================================================================

/// プレビューの 1 項目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewItem {
   pub id:              UserId,
   pub current_state:   UserState,
   /// 変更後の状態。ブロックされた項目は現在の状態と同じ、削除は None
   pub would_change_to: Option<UserState>,
   pub blocked:         bool,
   pub block_reason:    Option<BlockReason>,
}

impl PreviewItem {
   /// 計画からプレビュー項目を作る
   pub fn from_plan(id: UserId, current_state: UserState, plan: ItemPlan) -> Self {
      match plan {
         ItemPlan::Change { next } => Self {
            id,
            current_state,
            would_change_to: next,
            blocked: false,
            block_reason: None,
         },
         ItemPlan::Blocked(reason) => Self {
            id,
            would_change_to: Some(current_state.clone()),
            current_state,
            blocked: true,
            block_reason: Some(reason),
         },
      }
   }
}

/// プレビュー結果（副作用なし）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewResult {
   pub operation:       BulkOperation,
   pub total_requested: usize,
   /// ブロックされていない項目数
   pub affected_count:  usize,
   /// 入力順
   pub items:           Vec<PreviewItem>,
}

impl PreviewResult {
   pub fn from_items(operation: BulkOperation, items: Vec<PreviewItem>) -> Self {
      Self {
         operation,
         total_requested: items.len(),
         affected_count: items.iter().filter(|item| !item.blocked).count(),
         items,
      }
   }
}

// =========================================================================
// ExecutionResult
// =========================================================================

/// 1 項目の実行結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemOutcome {
   Success,
   /// 変更不要または保護対象のため処理しなかった
   Skipped,
   /// 処理中にエラーが発生した
   Failed,
}

/// 1 項目の実行結果と理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
   pub id:      UserId,
   pub outcome: ItemOutcome,
   pub reason:  Option<String>,
}

impl ItemResult {
   pub fn success(id: UserId) -> Self {
      Self {
         id,
         outcome: ItemOutcome::Success,
         reason: None,
      }
   }

   pub fn skipped(id: UserId, reason: BlockReason) -> Self {
      Self {
         id,
         outcome: ItemOutcome::Skipped,
         reason: Some(reason.to_string()),
      }
   }

   pub fn failed(id: UserId, reason: impl Into<String>) -> Self {
      Self {
         id,
         outcome: ItemOutcome::Failed,
         reason: Some(reason.into()),
      }
   }
}

/// 一括実行の結果
///
/// 一部の項目が失敗しても、リクエスト自体は成功として返す（部分失敗）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
   pub operation:       BulkOperation,
   pub total_requested: usize,
   pub success_count:   usize,
   pub failure_count:   usize,
   pub skipped_count:   usize,
   /// 入力順、入力 ID ごとに 1 件
   pub items:           Vec<ItemResult>,
}

impl ExecutionResult {
   pub fn from_items(operation: BulkOperation, items: Vec<ItemResult>) -> Self {
      let count = |outcome: ItemOutcome| items.iter().filter(|i| i.outcome == outcome).count();

      Self {
         operation,
         total_requested: items.len(),
         success_count: count(ItemOutcome::Success),
         failure_count: count(ItemOutcome::Failed),
         skipped_count: count(ItemOutcome::Skipped),
         items,
      }
   }

   /// 成功率（%、小数第 2 位で丸め）
   pub fn success_rate(&self) -> f64 {
      if self.total_requested == 0 {
         return 0.0;
      }
      let rate = self.success_count as f64 / self.total_requested as f64 * 100.0;
      (rate * 100.0).round() / 100.0
   }

   /// 一部の項目が失敗したか
   pub fn is_partial_failure(&self) -> bool {
      self.failure_count > 0
   }

   /// 成功した項目の ID
   pub fn succeeded_ids(&self) -> Vec<UserId> {
      self.items
         .iter()
         .filter(|i| i.outcome == ItemOutcome::Success)
         .map(|i| i.id)
         .collect()
   }
}
