//! # ユーザー一括操作ユースケース
//!
//! 検証、プレビュー、実行、統計の 4 つの操作を提供する。
//!
//! ## 処理の流れ
//!
//! 1. ポリシーチェック（DB に触れない）
//! 2. 対象ユーザーと補助対象（ロール / 教育機関）の存在確認
//! 3. プレビュー: 項目ごとに計画を立てて返す（変更なし）
//! 4. 実行: 項目ごとにトランザクションを開き、行ロック付きで再取得してから適用する
//!
//! 検証で失敗した場合は 1 件も変更しない。実行中の 1 項目の失敗は
//! その項目を `failed` として記録し、残りの項目の処理を続ける。

use std::{
   collections::{BTreeMap, HashMap, HashSet},
   sync::Arc,
};

use atis_domain::{
   audit_log::{BulkActivityLog, BulkOperationStats, SecurityEvent},
   bulk::{
      BlockReason,
      BulkAction,
      BulkOperation,
      BulkPolicyError,
      BulkRequest,
      ExecutionResult,
      ItemPlan,
      ItemResult,
      PreviewItem,
      PreviewResult,
      UserState,
      plan_item,
   },
   clock::Clock,
   institution::{Institution, InstitutionId},
   role::{Role, RoleId},
   user::{User, UserId},
};
use atis_infra::{
   InfraError,
   db::TransactionManager,
   repository::{AuditLogRepository, InstitutionRepository, RoleRepository, UserRepository},
};
use atis_shared::{
   event_log::{
      error::{category, kind},
      event,
   },
   log_business_event,
};
use itertools::Itertools;

use crate::error::CoreError;

/// 統計で返す教育機関の上位件数
const TOP_INSTITUTIONS: i64 = 10;

const REASON_CONCURRENTLY_DELETED: &str = "検証後に別の操作で削除されました";
const REASON_ITEM_ERROR: &str = "処理中にエラーが発生しました";

/// 直近のユーザー作成数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentActivity {
   pub today:      i64,
   pub this_week:  i64,
   pub this_month: i64,
}

/// 一括操作の統計情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkStatistics {
   pub total_users:     i64,
   pub active_users:    i64,
   pub inactive_users:  i64,
   /// ロール名 → ユーザー数
   pub by_role:         BTreeMap<String, i64>,
   /// 教育機関名とユーザー数（多い順、上位 10 件）
   pub by_institution:  Vec<(String, i64)>,
   pub recent_activity: RecentActivity,
   pub operations:      Vec<BulkOperationStats>,
}

/// 検証済みの一括操作
#[derive(Debug)]
pub struct ValidatedBulk {
   pub action: BulkAction,
   /// 対象ユーザー（重複除去済み）
   pub users:  HashMap<UserId, User>,
}

/// ユーザー一括操作ユースケース実装
pub struct UserBulkUseCaseImpl {
   user_repo:        Arc<dyn UserRepository>,
   role_repo:        Arc<dyn RoleRepository>,
   institution_repo: Arc<dyn InstitutionRepository>,
   audit_log_repo:   Arc<dyn AuditLogRepository>,
   tx_manager:       Arc<dyn TransactionManager>,
   clock:            Arc<dyn Clock>,
}

impl UserBulkUseCaseImpl {
   pub fn new(
      user_repo: Arc<dyn UserRepository>,
      role_repo: Arc<dyn RoleRepository>,
      institution_repo: Arc<dyn InstitutionRepository>,
      audit_log_repo: Arc<dyn AuditLogRepository>,
      tx_manager: Arc<dyn TransactionManager>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         user_repo,
         role_repo,
         institution_repo,
         audit_log_repo,
         tx_manager,
         clock,
      }
   }

   /// 一括操作を検証する（読み取りのみ）
   ///
   /// ポリシー違反、存在しないユーザー、存在しない補助対象のいずれかで失敗する。
   #[tracing::instrument(skip_all, fields(operation = %request.operation, count = request.target_ids.len()))]
   pub async fn validate(&self, request: &BulkRequest) -> Result<ValidatedBulk, CoreError> {
      request.check_policy()?;

      let users = self.load_targets(request).await?;
      let action = self.resolve_action(request).await?;

      Ok(ValidatedBulk { action, users })
   }

   /// 一括操作のプレビューを返す（変更なし）
   ///
   /// 確認は不要。件数上限は操作によらず 100 件。
   /// 存在しないユーザーや補助対象は入力エラーになる。補助対象が未指定の
   /// 割り当て操作は、各項目を [`BlockReason::TargetUnspecified`] として返す。
   #[tracing::instrument(skip_all, fields(operation = %request.operation, count = request.target_ids.len()))]
   pub async fn preview(&self, request: &BulkRequest) -> Result<PreviewResult, CoreError> {
      request.check_preview_policy()?;

      let users = self
         .load_targets(request)
         .await
         .map_err(not_found_as_validation)?;
      let action = match request.auxiliary_target {
         None if request.operation.auxiliary_field().is_some() => None,
         _ => Some(
            self.resolve_action(request)
               .await
               .map_err(not_found_as_validation)?,
         ),
      };
      let states = self.describe_all(&users).await?;

      let mut seen = HashSet::new();
      let items = request
         .target_ids
         .iter()
         .map(|id| {
            let current = states
               .get(id)
               .cloned()
               .ok_or_else(|| CoreError::Internal(format!("ユーザーの状態が未解決です: {id}")))?;
            let plan = if !seen.insert(*id) {
               ItemPlan::Blocked(BlockReason::Duplicate)
            } else if let Some(action) = &action {
               plan_item(id, &current, action, &request.actor_id)
            } else {
               ItemPlan::Blocked(BlockReason::TargetUnspecified)
            };
            Ok(PreviewItem::from_plan(*id, current, plan))
         })
         .collect::<Result<Vec<_>, CoreError>>()?;

      Ok(PreviewResult::from_items(request.operation, items))
   }

   /// 一括操作を実行する
   ///
   /// 1. 検証（確認を含む。失敗時は変更なし）
   /// 2. 入力順に項目ごとのトランザクションで適用
   /// 3. 活動ログの記録（失敗してもリクエストは成功扱い）
   #[tracing::instrument(skip_all, fields(operation = %request.operation, actor_id = %request.actor_id))]
   pub async fn execute(&self, request: &BulkRequest) -> Result<ExecutionResult, CoreError> {
      let validated = self.validate(request).await?;

      let mut seen = HashSet::new();
      let mut items = Vec::with_capacity(request.target_ids.len());
      for id in &request.target_ids {
         if !seen.insert(*id) {
            items.push(ItemResult::skipped(*id, BlockReason::Duplicate));
            continue;
         }

         let item = match self
            .execute_item(id, &validated.action, request.actor_id)
            .await
         {
            Ok(item) => item,
            Err(e) if e.as_conflict().is_some() => {
               ItemResult::failed(*id, REASON_CONCURRENTLY_DELETED)
            }
            Err(e) => {
               tracing::warn!(
                  error.category = category::INFRASTRUCTURE,
                  error.kind = kind::BULK_ITEM,
                  user_id = %id,
                  "一括操作の項目が失敗しました: {}",
                  e
               );
               ItemResult::failed(*id, REASON_ITEM_ERROR)
            }
         };
         items.push(item);
      }

      let result = ExecutionResult::from_items(request.operation, items);

      let activity_log = BulkActivityLog::from_execution(
         request.actor_id,
         &result,
         request.auxiliary_target,
         self.clock.now(),
      );
      if let Err(e) = self.audit_log_repo.insert_activity_log(&activity_log).await {
         tracing::error!(
            error.category = category::INFRASTRUCTURE,
            error.kind = kind::ACTIVITY_LOG,
            "活動ログの記録に失敗しました: {}",
            e
         );
      }

      let outcome = if result.is_partial_failure() {
         event::result::PARTIAL_FAILURE
      } else {
         event::result::SUCCESS
      };
      log_business_event!(
         event.category = event::category::USER_BULK,
         event.action = business_action(request.operation),
         event.entity_type = event::entity_type::USER,
         event.actor_id = %request.actor_id,
         event.total_requested = result.total_requested,
         event.success_count = result.success_count,
         event.failure_count = result.failure_count,
         event.skipped_count = result.skipped_count,
         event.result = outcome,
         "一括操作を実行しました"
      );

      Ok(result)
   }

   /// 統計情報を取得する
   #[tracing::instrument(skip_all)]
   pub async fn statistics(&self) -> Result<BulkStatistics, CoreError> {
      let counts = self.user_repo.count_by_status().await?;

      let by_role_ids = self.user_repo.count_by_role().await?;
      let role_ids: Vec<RoleId> = by_role_ids.iter().map(|(id, _)| *id).collect();
      let role_names = self.role_names(&role_ids).await?;
      let by_role = by_role_ids
         .into_iter()
         .map(|(id, count)| (display_name(&role_names, &id), count))
         .collect();

      let by_institution_ids = self.user_repo.count_by_institution(TOP_INSTITUTIONS).await?;
      let institution_ids: Vec<InstitutionId> =
         by_institution_ids.iter().map(|(id, _)| *id).collect();
      let institution_names = self.institution_names(&institution_ids).await?;
      let by_institution = by_institution_ids
         .into_iter()
         .map(|(id, count)| (display_name(&institution_names, &id), count))
         .collect();

      let recent_activity = RecentActivity {
         today:      self
            .user_repo
            .count_created_since(self.clock.start_of_day())
            .await?,
         this_week:  self
            .user_repo
            .count_created_since(self.clock.start_of_week())
            .await?,
         this_month: self
            .user_repo
            .count_created_since(self.clock.start_of_month())
            .await?,
      };

      let operations = self.audit_log_repo.aggregate_operation_stats().await?;

      Ok(BulkStatistics {
         total_users: counts.total,
         active_users: counts.active,
         inactive_users: counts.total - counts.active,
         by_role,
         by_institution,
         recent_activity,
         operations,
      })
   }

   // ===== 内部処理 =====

   /// 対象ユーザーを取得し、存在しない ID があれば昇順で列挙して失敗する
   async fn load_targets(&self, request: &BulkRequest) -> Result<HashMap<UserId, User>, CoreError> {
      let ids = request.distinct_target_ids();
      let users: HashMap<UserId, User> = self
         .user_repo
         .find_by_ids(&ids)
         .await?
         .into_iter()
         .map(|user| (*user.id(), user))
         .collect();

      let missing = ids
         .iter()
         .filter(|id| !users.contains_key(*id))
         .sorted()
         .join(", ");
      if !missing.is_empty() {
         return Err(CoreError::NotFound(format!(
            "ユーザーが見つかりません: {missing}"
         )));
      }

      Ok(users)
   }

   /// 補助対象を解決して BulkAction を組み立てる
   async fn resolve_action(&self, request: &BulkRequest) -> Result<BulkAction, CoreError> {
      let operation = request.operation;
      let target = || {
         request
            .auxiliary_target
            .ok_or_else(|| BulkPolicyError::MissingAuxiliaryTarget {
               operation,
               field: operation.auxiliary_field().unwrap_or("target_id"),
            })
      };

      let action = match operation {
         BulkOperation::Activate => BulkAction::Activate,
         BulkOperation::Deactivate => BulkAction::Deactivate,
         BulkOperation::Delete => BulkAction::Delete,
         BulkOperation::AssignRole => {
            let role_id = RoleId::new(target()?);
            let role = self
               .role_repo
               .find_by_id(&role_id)
               .await?
               .ok_or_else(|| CoreError::NotFound(format!("ロールが見つかりません: {role_id}")))?;
            BulkAction::AssignRole(role)
         }
         BulkOperation::AssignInstitution => {
            let institution_id = InstitutionId::new(target()?);
            let institution = self
               .institution_repo
               .find_by_id(&institution_id)
               .await?
               .ok_or_else(|| {
                  CoreError::NotFound(format!("教育機関が見つかりません: {institution_id}"))
               })?;
            BulkAction::AssignInstitution(institution)
         }
      };

      Ok(action)
   }

   /// 1 項目を独立したトランザクションで処理する
   async fn execute_item(
      &self,
      id: &UserId,
      action: &BulkAction,
      actor_id: UserId,
   ) -> Result<ItemResult, InfraError> {
      let mut tx = self.tx_manager.begin().await?;

      let Some(user) = self.user_repo.find_by_id_for_update(&mut tx, id).await? else {
         return Ok(ItemResult::failed(*id, REASON_CONCURRENTLY_DELETED));
      };

      let current = self.describe(&user).await?;
      if let ItemPlan::Blocked(reason) = plan_item(id, &current, action, &actor_id) {
         return Ok(ItemResult::skipped(*id, reason));
      }

      let now = self.clock.now();
      let security_event = SecurityEvent::for_bulk_item(action, actor_id, &user, &current, now);

      match action {
         BulkAction::Activate => self.user_repo.update(&mut tx, &user.activated(now)).await?,
         BulkAction::Deactivate => {
            self.user_repo
               .update(&mut tx, &user.deactivated(now))
               .await?;
            let revoked = self.user_repo.revoke_tokens(&mut tx, id).await?;
            tracing::debug!(user_id = %id, revoked, "アクセストークンを失効させました");
         }
         BulkAction::AssignRole(role) => {
            self.user_repo
               .update(&mut tx, &user.with_role(*role.id(), now))
               .await?
         }
         BulkAction::AssignInstitution(institution) => {
            self.user_repo
               .update(&mut tx, &user.with_institution(*institution.id(), now))
               .await?
         }
         BulkAction::Delete => self.user_repo.delete(&mut tx, id).await?,
      }
      self.audit_log_repo
         .insert_security_event(&mut tx, &security_event)
         .await?;

      tx.commit().await?;
      Ok(ItemResult::success(*id))
   }

   /// ユーザー 1 件の状態をロール名・教育機関名付きで組み立てる
   async fn describe(&self, user: &User) -> Result<UserState, InfraError> {
      let role = match user.role_id() {
         Some(id) => self.role_repo.find_by_id(id).await?,
         None => None,
      };
      let institution = match user.institution_id() {
         Some(id) => self.institution_repo.find_by_id(id).await?,
         None => None,
      };

      Ok(user_state(
         user,
         role.as_ref().map(Role::name),
         institution.as_ref().map(Institution::name),
      ))
   }

   /// 複数ユーザーの状態をまとめて組み立てる
   async fn describe_all(
      &self,
      users: &HashMap<UserId, User>,
   ) -> Result<HashMap<UserId, UserState>, CoreError> {
      let role_ids: Vec<RoleId> = users
         .values()
         .filter_map(|u| u.role_id().copied())
         .unique()
         .collect();
      let institution_ids: Vec<InstitutionId> = users
         .values()
         .filter_map(|u| u.institution_id().copied())
         .unique()
         .collect();

      let role_names = self.role_names(&role_ids).await?;
      let institution_names = self.institution_names(&institution_ids).await?;

      Ok(users
         .values()
         .map(|user| {
            let role_name = user
               .role_id()
               .and_then(|id| role_names.get(id))
               .map(String::as_str);
            let institution_name = user
               .institution_id()
               .and_then(|id| institution_names.get(id))
               .map(String::as_str);
            (*user.id(), user_state(user, role_name, institution_name))
         })
         .collect())
   }

   async fn role_names(&self, ids: &[RoleId]) -> Result<HashMap<RoleId, String>, CoreError> {
      Ok(self
         .role_repo
         .find_by_ids(ids)
         .await?
         .into_iter()
         .map(|role| (*role.id(), role.name().to_string()))
         .collect())
   }

   async fn institution_names(
      &self,
      ids: &[InstitutionId],
   ) -> Result<HashMap<InstitutionId, String>, CoreError> {
      Ok(self
         .institution_repo
         .find_by_ids(ids)
         .await?
         .into_iter()
         .map(|institution| (*institution.id(), institution.name().to_string()))
         .collect())
   }
}

/// プレビューでは存在しない ID を入力エラーとして扱う
fn not_found_as_validation(err: CoreError) -> CoreError {
   match err {
      CoreError::NotFound(msg) => CoreError::Validation(msg),
      other => other,
   }
}

fn user_state(user: &User, role_name: Option<&str>, institution_name: Option<&str>) -> UserState {
   UserState {
      status:           user.status(),
      role_id:          user.role_id().copied(),
      role_name:        role_name.map(str::to_string),
      institution_id:   user.institution_id().copied(),
      institution_name: institution_name.map(str::to_string),
   }
}

/// 名前が解決できない場合は ID を表示名にする
fn display_name<K: std::hash::Hash + Eq + std::fmt::Display>(
   names: &HashMap<K, String>,
   id: &K,
) -> String {
   names.get(id).cloned().unwrap_or_else(|| id.to_string())
}

fn business_action(operation: BulkOperation) -> &'static str {
   match operation {
      BulkOperation::Activate => event::action::BULK_ACTIVATED,
      BulkOperation::Deactivate => event::action::BULK_DEACTIVATED,
      BulkOperation::AssignRole => event::action::BULK_ROLE_ASSIGNED,
      BulkOperation::AssignInstitution => event::action::BULK_INSTITUTION_ASSIGNED,
      BulkOperation::Delete => event::action::BULK_DELETED,
   }
}
