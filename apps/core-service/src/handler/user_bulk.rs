//! # ユーザー一括操作 API ハンドラ
//!
//! 一括有効化・無効化・ロール割り当て・教育機関割り当て・削除と、
//! プレビュー、統計のエンドポイントを実装する。
//!
//! 操作者は認証済みの呼び出し元（BFF）がリクエストボディの `actor_id` で渡す。

use std::{collections::BTreeMap, str::FromStr, sync::Arc};

use atis_domain::{
   audit_log::BulkOperationStats,
   bulk::{
      BulkOperation,
      BulkRequest,
      ExecutionResult,
      ItemOutcome,
      ItemResult,
      PreviewItem,
      PreviewResult,
      UserState,
   },
   user::{UserId, UserStatus},
};
use atis_shared::ApiResponse;
use axum::{
   Json,
   extract::State,
   http::StatusCode,
   response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
   error::CoreError,
   handler::ApiJson,
   usecase::{BulkStatistics, UserBulkUseCaseImpl},
};

/// 一括操作ハンドラーの State
pub struct UserBulkState {
   pub usecase: UserBulkUseCaseImpl,
}

// ===== リクエスト =====

/// 有効化・無効化リクエスト
#[derive(Debug, Deserialize)]
pub struct BulkUsersRequest {
   /// 操作者のユーザー ID
   pub actor_id: i64,
   #[serde(default)]
   pub user_ids: Vec<i64>,
}

/// ロール割り当てリクエスト
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
   pub actor_id: i64,
   #[serde(default)]
   pub user_ids: Vec<i64>,
   /// 未指定の場合は入力エラーになる
   pub role_id:  Option<i64>,
}

/// 教育機関割り当てリクエスト
#[derive(Debug, Deserialize)]
pub struct AssignInstitutionRequest {
   pub actor_id:       i64,
   #[serde(default)]
   pub user_ids:       Vec<i64>,
   pub institution_id: Option<i64>,
}

/// 削除リクエスト
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
   pub actor_id: i64,
   #[serde(default)]
   pub user_ids: Vec<i64>,
   /// 明示的な確認（`true` でなければ削除しない）
   #[serde(default)]
   pub confirm:  bool,
}

/// プレビューリクエスト
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
   pub actor_id:  i64,
   #[serde(default)]
   pub user_ids:  Vec<i64>,
   /// 操作名（`activate`, `assign_role` など）
   pub operation: String,
   /// ロール ID または教育機関 ID
   pub target_id: Option<i64>,
}

fn bulk_request(
   actor_id: i64,
   operation: BulkOperation,
   user_ids: Vec<i64>,
   auxiliary_target: Option<i64>,
   confirmed: bool,
) -> BulkRequest {
   BulkRequest {
      actor_id: UserId::new(actor_id),
      operation,
      target_ids: user_ids.into_iter().map(UserId::new).collect(),
      auxiliary_target,
      confirmed,
   }
}

// ===== レスポンス =====

/// 項目ごとの実行結果 DTO
#[derive(Debug, Serialize)]
pub struct ItemResultDto {
   pub id:      i64,
   pub outcome: ItemOutcome,
   pub reason:  Option<String>,
}

impl From<ItemResult> for ItemResultDto {
   fn from(item: ItemResult) -> Self {
      Self {
         id:      item.id.as_i64(),
         outcome: item.outcome,
         reason:  item.reason,
      }
   }
}

/// 操作ごとの成功件数フィールド
///
/// `{"activated": 3}` のように操作に応じたキー名で出力される。
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectedCount {
   Activated(usize),
   Deactivated(usize),
   Assigned(usize),
   Deleted(usize),
}

impl AffectedCount {
   fn of(result: &ExecutionResult) -> Self {
      let count = result.success_count;
      match result.operation {
         BulkOperation::Activate => Self::Activated(count),
         BulkOperation::Deactivate => Self::Deactivated(count),
         BulkOperation::AssignRole | BulkOperation::AssignInstitution => Self::Assigned(count),
         BulkOperation::Delete => Self::Deleted(count),
      }
   }
}

/// 実行結果 DTO
#[derive(Debug, Serialize)]
pub struct ExecutionResultDto {
   pub operation:       BulkOperation,
   pub total_requested: usize,
   pub success_count:   usize,
   pub failure_count:   usize,
   pub skipped_count:   usize,
   pub success_rate:    f64,
   pub items:           Vec<ItemResultDto>,
   #[serde(flatten)]
   pub affected:        AffectedCount,
}

impl From<ExecutionResult> for ExecutionResultDto {
   fn from(result: ExecutionResult) -> Self {
      let affected = AffectedCount::of(&result);
      let success_rate = result.success_rate();
      Self {
         operation: result.operation,
         total_requested: result.total_requested,
         success_count: result.success_count,
         failure_count: result.failure_count,
         skipped_count: result.skipped_count,
         success_rate,
         items: result.items.into_iter().map(ItemResultDto::from).collect(),
         affected,
      }
   }
}

/// ユーザー状態 DTO
#[derive(Debug, Serialize)]
pub struct UserStateDto {
   pub status:           UserStatus,
   pub role_id:          Option<i64>,
   pub role_name:        Option<String>,
   pub institution_id:   Option<i64>,
   pub institution_name: Option<String>,
}

impl From<UserState> for UserStateDto {
   fn from(state: UserState) -> Self {
      Self {
         status:           state.status,
         role_id:          state.role_id.map(|id| id.as_i64()),
         role_name:        state.role_name,
         institution_id:   state.institution_id.map(|id| id.as_i64()),
         institution_name: state.institution_name,
      }
   }
}

/// プレビュー項目 DTO
///
/// `would_change_to` が `null` の場合は削除を表す。
#[derive(Debug, Serialize)]
pub struct PreviewItemDto {
   pub id:              i64,
   pub current_state:   UserStateDto,
   pub would_change_to: Option<UserStateDto>,
   pub blocked:         bool,
   pub block_reason:    Option<String>,
}

impl From<PreviewItem> for PreviewItemDto {
   fn from(item: PreviewItem) -> Self {
      Self {
         id:              item.id.as_i64(),
         current_state:   item.current_state.into(),
         would_change_to: item.would_change_to.map(UserStateDto::from),
         blocked:         item.blocked,
         block_reason:    item.block_reason.map(|r| r.to_string()),
      }
   }
}

/// プレビュー結果 DTO
#[derive(Debug, Serialize)]
pub struct PreviewResultDto {
   pub operation:       BulkOperation,
   pub total_requested: usize,
   pub affected_count:  usize,
   pub items:           Vec<PreviewItemDto>,
}

impl From<PreviewResult> for PreviewResultDto {
   fn from(preview: PreviewResult) -> Self {
      Self {
         operation:       preview.operation,
         total_requested: preview.total_requested,
         affected_count:  preview.affected_count,
         items:           preview.items.into_iter().map(PreviewItemDto::from).collect(),
      }
   }
}

#[derive(Debug, Serialize)]
pub struct InstitutionCountDto {
   pub name:  String,
   pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct RecentActivityDto {
   pub today:      i64,
   pub this_week:  i64,
   pub this_month: i64,
}

#[derive(Debug, Serialize)]
pub struct OperationStatsDto {
   pub operation:     BulkOperation,
   pub executions:    i64,
   pub success_count: i64,
   pub failure_count: i64,
   pub skipped_count: i64,
}

impl From<BulkOperationStats> for OperationStatsDto {
   fn from(stats: BulkOperationStats) -> Self {
      Self {
         operation:     stats.operation,
         executions:    stats.executions,
         success_count: stats.success_count,
         failure_count: stats.failure_count,
         skipped_count: stats.skipped_count,
      }
   }
}

/// 統計情報 DTO
#[derive(Debug, Serialize)]
pub struct StatisticsDto {
   pub total_users:     i64,
   pub active_users:    i64,
   pub inactive_users:  i64,
   pub by_role:         BTreeMap<String, i64>,
   pub by_institution:  Vec<InstitutionCountDto>,
   pub recent_activity: RecentActivityDto,
   pub operations:      Vec<OperationStatsDto>,
}

impl From<BulkStatistics> for StatisticsDto {
   fn from(stats: BulkStatistics) -> Self {
      Self {
         total_users:     stats.total_users,
         active_users:    stats.active_users,
         inactive_users:  stats.inactive_users,
         by_role:         stats.by_role,
         by_institution:  stats
            .by_institution
            .into_iter()
            .map(|(name, count)| InstitutionCountDto { name, count })
            .collect(),
         recent_activity: RecentActivityDto {
            today:      stats.recent_activity.today,
            this_week:  stats.recent_activity.this_week,
            this_month: stats.recent_activity.this_month,
         },
         operations:      stats
            .operations
            .into_iter()
            .map(OperationStatsDto::from)
            .collect(),
      }
   }
}

// ===== ハンドラ =====

async fn execute(state: &UserBulkState, request: BulkRequest) -> Result<Response, CoreError> {
   let result = state.usecase.execute(&request).await?;
   let response = ApiResponse::new(ExecutionResultDto::from(result));

   Ok((StatusCode::OK, Json(response)).into_response())
}

/// ユーザーを一括で有効化する
///
/// ## エンドポイント
/// POST /internal/users/bulk/activate
#[tracing::instrument(skip_all)]
pub async fn bulk_activate(
   State(state): State<Arc<UserBulkState>>,
   ApiJson(req): ApiJson<BulkUsersRequest>,
) -> Result<Response, CoreError> {
   let request = bulk_request(
      req.actor_id,
      BulkOperation::Activate,
      req.user_ids,
      None,
      false,
   );
   execute(&state, request).await
}

/// ユーザーを一括で無効化する
///
/// ## エンドポイント
/// POST /internal/users/bulk/deactivate
#[tracing::instrument(skip_all)]
pub async fn bulk_deactivate(
   State(state): State<Arc<UserBulkState>>,
   ApiJson(req): ApiJson<BulkUsersRequest>,
) -> Result<Response, CoreError> {
   let request = bulk_request(
      req.actor_id,
      BulkOperation::Deactivate,
      req.user_ids,
      None,
      false,
   );
   execute(&state, request).await
}

/// ロールを一括で割り当てる
///
/// ## エンドポイント
/// POST /internal/users/bulk/assign-role
#[tracing::instrument(skip_all)]
pub async fn bulk_assign_role(
   State(state): State<Arc<UserBulkState>>,
   ApiJson(req): ApiJson<AssignRoleRequest>,
) -> Result<Response, CoreError> {
   let request = bulk_request(
      req.actor_id,
      BulkOperation::AssignRole,
      req.user_ids,
      req.role_id,
      false,
   );
   execute(&state, request).await
}

/// 教育機関を一括で割り当てる
///
/// ## エンドポイント
/// POST /internal/users/bulk/assign-institution
#[tracing::instrument(skip_all)]
pub async fn bulk_assign_institution(
   State(state): State<Arc<UserBulkState>>,
   ApiJson(req): ApiJson<AssignInstitutionRequest>,
) -> Result<Response, CoreError> {
   let request = bulk_request(
      req.actor_id,
      BulkOperation::AssignInstitution,
      req.user_ids,
      req.institution_id,
      false,
   );
   execute(&state, request).await
}

/// ユーザーを一括で削除する
///
/// ## エンドポイント
/// POST /internal/users/bulk/delete
#[tracing::instrument(skip_all)]
pub async fn bulk_delete(
   State(state): State<Arc<UserBulkState>>,
   ApiJson(req): ApiJson<BulkDeleteRequest>,
) -> Result<Response, CoreError> {
   let request = bulk_request(
      req.actor_id,
      BulkOperation::Delete,
      req.user_ids,
      None,
      req.confirm,
   );
   execute(&state, request).await
}

/// 一括操作の結果をプレビューする
///
/// ## エンドポイント
/// POST /internal/users/bulk/preview
#[tracing::instrument(skip_all)]
pub async fn bulk_preview(
   State(state): State<Arc<UserBulkState>>,
   ApiJson(req): ApiJson<PreviewRequest>,
) -> Result<Response, CoreError> {
   let operation = BulkOperation::from_str(&req.operation)
      .map_err(|_| CoreError::Validation(format!("不明な操作です: {}", req.operation)))?;
   let request = bulk_request(req.actor_id, operation, req.user_ids, req.target_id, false);

   let preview = state.usecase.preview(&request).await?;
   let response = ApiResponse::new(PreviewResultDto::from(preview));

   Ok((StatusCode::OK, Json(response)).into_response())
}

/// 一括操作の統計情報を取得する
///
/// ## エンドポイント
/// GET /internal/users/bulk/statistics
#[tracing::instrument(skip_all)]
pub async fn bulk_statistics(
   State(state): State<Arc<UserBulkState>>,
) -> Result<Response, CoreError> {
   let stats = state.usecase.statistics().await?;
   let response = ApiResponse::new(StatisticsDto::from(stats));

   Ok((StatusCode::OK, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
   use atis_domain::{
      clock::FixedClock,
      institution::{Institution, InstitutionId},
      role::{Role, RoleId},
      user::{Email, User, UserRecord},
      value_objects::Username,
   };
   use atis_infra::mock::{
      MockAuditLogRepository,
      MockInstitutionRepository,
      MockRoleRepository,
      MockTransactionManager,
      MockUserRepository,
   };
   use axum::{Router, body::Body, http::Request};
   use chrono::{DateTime, TimeZone, Utc};
   use pretty_assertions::assert_eq;
   use rstest::rstest;
   use serde_json::{Value, json};
   use tower::ServiceExt;

   use super::*;

   fn fixed_now() -> DateTime<Utc> {
      Utc.with_ymd_and_hms(2025, 9, 18, 9, 0, 0).unwrap()
   }

   fn make_user(id: i64, status: UserStatus, role: Option<i64>) -> User {
      User::from_db(UserRecord {
         id: UserId::new(id),
         username: Username::new(format!("user{id}")).unwrap(),
         email: Email::new(format!("user{id}@example.az")).unwrap(),
         status,
         role_id: role.map(RoleId::new),
         institution_id: Some(InstitutionId::new(20)),
         locked_until: None,
         created_at: fixed_now(),
         updated_at: fixed_now(),
      })
   }

   fn create_test_app(users: &MockUserRepository) -> Router {
      let roles = MockRoleRepository::new();
      roles.add_role(Role::new(RoleId::new(5), "müəllim"));
      let institutions = MockInstitutionRepository::new();
      institutions.add_institution(Institution::new(
         InstitutionId::new(20),
         "Bakı 1 nömrəli məktəb",
      ));

      let usecase = UserBulkUseCaseImpl::new(
         Arc::new(users.clone()),
         Arc::new(roles),
         Arc::new(institutions),
         Arc::new(MockAuditLogRepository::new()),
         Arc::new(MockTransactionManager::new()),
         Arc::new(FixedClock::new(fixed_now())),
      );

      crate::router(Arc::new(UserBulkState { usecase }))
   }

   fn post_json(uri: &str, body: Value) -> Request<Body> {
      Request::builder()
         .method(axum::http::Method::POST)
         .uri(uri)
         .header("content-type", "application/json")
         .body(Body::from(serde_json::to_string(&body).unwrap()))
         .unwrap()
   }

   async fn response_body(response: axum::http::Response<Body>) -> Value {
      let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
         .await
         .unwrap();
      serde_json::from_slice(&bytes).unwrap()
   }

   #[tokio::test]
   async fn test_post_activate正常系_200で件数と項目ごとの結果が返る() {
      // Given
      let users = MockUserRepository::new();
      users.add_user(make_user(2, UserStatus::Inactive, None));
      users.add_user(make_user(3, UserStatus::Active, None));
      let sut = create_test_app(&users);

      // When
      let response = sut
         .oneshot(post_json(
            "/internal/users/bulk/activate",
            json!({ "actor_id": 1, "user_ids": [2, 3] }),
         ))
         .await
         .unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::OK);
      let body = response_body(response).await;
      assert_eq!(
         body,
         json!({
            "data": {
               "operation": "activate",
               "total_requested": 2,
               "success_count": 1,
               "failure_count": 0,
               "skipped_count": 1,
               "success_rate": 50.0,
               "activated": 1,
               "items": [
                  { "id": 2, "outcome": "success", "reason": null },
                  { "id": 3, "outcome": "skipped", "reason": "既にアクティブです" },
               ],
            }
         })
      );
   }

   #[tokio::test]
   async fn test_post_assign_role正常系_assignedキーで件数が返る() {
      let users = MockUserRepository::new();
      users.add_user(make_user(2, UserStatus::Active, None));
      let sut = create_test_app(&users);

      let response = sut
         .oneshot(post_json(
            "/internal/users/bulk/assign-role",
            json!({ "actor_id": 1, "user_ids": [2], "role_id": 5 }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::OK);
      let body = response_body(response).await;
      assert_eq!(body["data"]["assigned"], 1);
      assert_eq!(
         users.find(&UserId::new(2)).unwrap().role_id(),
         Some(&RoleId::new(5))
      );
   }

   #[tokio::test]
   async fn test_post_assign_role_role_idなしで400が返る() {
      let users = MockUserRepository::new();
      users.add_user(make_user(2, UserStatus::Active, None));
      let sut = create_test_app(&users);

      let response = sut
         .oneshot(post_json(
            "/internal/users/bulk/assign-role",
            json!({ "actor_id": 1, "user_ids": [2] }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
      let body = response_body(response).await;
      assert_eq!(body["type"], "https://atis.example.az/errors/validation-error");
   }

   #[tokio::test]
   async fn test_post_activate空のuser_idsで400が返る() {
      let sut = create_test_app(&MockUserRepository::new());

      let response = sut
         .oneshot(post_json(
            "/internal/users/bulk/activate",
            json!({ "actor_id": 1, "user_ids": [] }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
   }

   #[tokio::test]
   async fn test_post_delete確認なしで400_confirmation_requiredが返る() {
      let users = MockUserRepository::new();
      users.add_user(make_user(2, UserStatus::Active, None));
      let sut = create_test_app(&users);

      let response = sut
         .oneshot(post_json(
            "/internal/users/bulk/delete",
            json!({ "actor_id": 1, "user_ids": [2] }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
      let body = response_body(response).await;
      assert_eq!(
         body["type"],
         "https://atis.example.az/errors/confirmation-required"
      );
      assert_eq!(users.len(), 1);
   }

   #[tokio::test]
   async fn test_post_delete確認ありでdeletedキーが返る() {
      let users = MockUserRepository::new();
      users.add_user(make_user(2, UserStatus::Active, Some(5)));
      let sut = create_test_app(&users);

      let response = sut
         .oneshot(post_json(
            "/internal/users/bulk/delete",
            json!({ "actor_id": 1, "user_ids": [2], "confirm": true }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::OK);
      let body = response_body(response).await;
      assert_eq!(body["data"]["deleted"], 1);
      assert!(users.is_empty());
   }

   #[tokio::test]
   async fn test_post_deactivate存在しないユーザーで404が返る() {
      let sut = create_test_app(&MockUserRepository::new());

      let response = sut
         .oneshot(post_json(
            "/internal/users/bulk/deactivate",
            json!({ "actor_id": 1, "user_ids": [9, 3] }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::NOT_FOUND);
      let body = response_body(response).await;
      assert_eq!(body["detail"], "ユーザーが見つかりません: 3, 9");
   }

   #[tokio::test]
   async fn test_post_preview正常系_現在の状態と変更後の状態が返る() {
      let users = MockUserRepository::new();
      users.add_user(make_user(2, UserStatus::Active, Some(5)));
      let sut = create_test_app(&users);

      let response = sut
         .oneshot(post_json(
            "/internal/users/bulk/preview",
            json!({ "actor_id": 1, "user_ids": [2], "operation": "deactivate" }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::OK);
      let body = response_body(response).await;
      assert_eq!(
         body["data"],
         json!({
            "operation": "deactivate",
            "total_requested": 1,
            "affected_count": 1,
            "items": [{
               "id": 2,
               "current_state": {
                  "status": "active",
                  "role_id": 5,
                  "role_name": "müəllim",
                  "institution_id": 20,
                  "institution_name": "Bakı 1 nömrəli məktəb",
               },
               "would_change_to": {
                  "status": "inactive",
                  "role_id": 5,
                  "role_name": "müəllim",
                  "institution_id": 20,
                  "institution_name": "Bakı 1 nömrəli məktəb",
               },
               "blocked": false,
               "block_reason": null,
            }],
         })
      );
      assert!(users.find(&UserId::new(2)).unwrap().is_active());
   }

   #[tokio::test]
   async fn test_post_preview不明な操作で400が返る() {
      let users = MockUserRepository::new();
      users.add_user(make_user(2, UserStatus::Active, None));
      let sut = create_test_app(&users);

      let response = sut
         .oneshot(post_json(
            "/internal/users/bulk/preview",
            json!({ "actor_id": 1, "user_ids": [2], "operation": "archive" }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
   }

   #[tokio::test]
   async fn test_post_preview存在しないユーザーで400が返る() {
      let users = MockUserRepository::new();
      users.add_user(make_user(2, UserStatus::Active, None));
      let sut = create_test_app(&users);

      let response = sut
         .oneshot(post_json(
            "/internal/users/bulk/preview",
            json!({ "actor_id": 1, "user_ids": [2, 99], "operation": "activate" }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
      let body = response_body(response).await;
      assert_eq!(body["type"], "https://atis.example.az/errors/validation-error");
      assert_eq!(body["detail"], "ユーザーが見つかりません: 99");
   }

   #[tokio::test]
   async fn test_post_preview_target_idなしの割り当ては項目がブロックされる() {
      let users = MockUserRepository::new();
      users.add_user(make_user(2, UserStatus::Active, Some(5)));
      let sut = create_test_app(&users);

      let response = sut
         .oneshot(post_json(
            "/internal/users/bulk/preview",
            json!({ "actor_id": 1, "user_ids": [2], "operation": "assign_role" }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::OK);
      let body = response_body(response).await;
      assert_eq!(body["data"]["affected_count"], 0);
      assert_eq!(body["data"]["items"][0]["blocked"], true);
      assert_eq!(
         body["data"]["items"][0]["block_reason"],
         "割り当て先が指定されていません"
      );
      assert_eq!(body["data"]["items"][0]["current_state"]["role_name"], "müəllim");
   }

   #[rstest]
   #[case(json!({ "actor_id": 1, "user_ids": ["a"] }))]
   #[case(json!({ "user_ids": [2] }))]
   #[tokio::test]
   async fn test_post_activate不正なボディで400_validation_errorが返る(#[case] body: Value) {
      let sut = create_test_app(&MockUserRepository::new());

      let response = sut
         .oneshot(post_json("/internal/users/bulk/activate", body))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
      let body = response_body(response).await;
      assert_eq!(body["type"], "https://atis.example.az/errors/validation-error");
      assert_eq!(body["status"], 400);
   }

   #[tokio::test]
   async fn test_get_statistics正常系_200で集計が返る() {
      let users = MockUserRepository::new();
      users.add_user(make_user(2, UserStatus::Active, Some(5)));
      users.add_user(make_user(3, UserStatus::Inactive, Some(5)));
      let sut = create_test_app(&users);

      let request = Request::builder()
         .method(axum::http::Method::GET)
         .uri("/internal/users/bulk/statistics")
         .body(Body::empty())
         .unwrap();
      let response = sut.oneshot(request).await.unwrap();

      assert_eq!(response.status(), StatusCode::OK);
      let body = response_body(response).await;
      assert_eq!(body["data"]["total_users"], 2);
      assert_eq!(body["data"]["inactive_users"], 1);
      assert_eq!(body["data"]["by_role"], json!({ "müəllim": 2 }));
      assert_eq!(
         body["data"]["by_institution"],
         json!([{ "name": "Bakı 1 nömrəli məktəb", "count": 2 }])
      );
      assert_eq!(
         body["data"]["recent_activity"],
         json!({ "today": 2, "this_week": 2, "this_month": 2 })
      );
      assert_eq!(body["data"]["operations"], json!([]));
   }

   #[tokio::test]
   async fn test_get_health_200でバージョンが返る() {
      let sut = create_test_app(&MockUserRepository::new());

      let request = Request::builder()
         .uri("/health")
         .body(Body::empty())
         .unwrap();
      let response = sut.oneshot(request).await.unwrap();

      assert_eq!(response.status(), StatusCode::OK);
      let body = response_body(response).await;
      assert_eq!(body["status"], "healthy");
      assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
   }
}
