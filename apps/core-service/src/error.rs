//! # Core Service エラー定義
//!
//! Core Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! | バリアント | ステータス | type |
//! |-----------|-----------|------|
//! | `Validation` | 400 | `validation-error` |
//! | `ConfirmationRequired` | 400 | `confirmation-required` |
//! | `NotFound` | 404 | `not-found` |
//! | `Database` / `Internal` | 500 | `internal-error` |

use atis_domain::bulk::BulkPolicyError;
use atis_shared::{
   ErrorResponse,
   event_log::error::{category, kind},
};
use axum::{
   Json,
   http::StatusCode,
   response::{IntoResponse, Response},
};
use thiserror::Error;

/// Core Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
   /// 入力がポリシーに違反している
   #[error("入力エラー: {0}")]
   Validation(String),

   /// 破壊的な操作に明示的な確認がない
   #[error("確認が必要です: {0}")]
   ConfirmationRequired(String),

   /// リソースが見つからない
   #[error("リソースが見つかりません: {0}")]
   NotFound(String),

   /// データベースエラー
   #[error("データベースエラー: {0}")]
   Database(#[from] atis_infra::InfraError),

   /// 内部エラー
   #[error("内部エラー: {0}")]
   Internal(String),
}

impl From<BulkPolicyError> for CoreError {
   fn from(err: BulkPolicyError) -> Self {
      match err {
         BulkPolicyError::ConfirmationRequired { .. } => {
            CoreError::ConfirmationRequired(err.to_string())
         }
         BulkPolicyError::EmptyTargets
         | BulkPolicyError::BatchTooLarge { .. }
         | BulkPolicyError::MissingAuxiliaryTarget { .. } => CoreError::Validation(err.to_string()),
      }
   }
}

impl IntoResponse for CoreError {
   fn into_response(self) -> Response {
      let body = match &self {
         CoreError::Validation(msg) => ErrorResponse::validation_error(msg.clone()),
         CoreError::ConfirmationRequired(msg) => ErrorResponse::confirmation_required(msg.clone()),
         CoreError::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
         CoreError::Database(e) => {
            tracing::error!(
               error.category = category::INFRASTRUCTURE,
               error.kind = kind::DATABASE,
               span_trace = %e.span_trace(),
               "データベースエラー: {}",
               e
            );
            ErrorResponse::internal_error()
         }
         CoreError::Internal(msg) => {
            tracing::error!(
               error.category = category::INFRASTRUCTURE,
               error.kind = kind::INTERNAL,
               "内部エラー: {}",
               msg
            );
            ErrorResponse::internal_error()
         }
      };

      let status =
         StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
      (status, Json(body)).into_response()
   }
}

#[cfg(test)]
mod tests {
   use atis_domain::bulk::BulkOperation;
   use rstest::rstest;

   use super::*;

   #[rstest]
   #[case(BulkPolicyError::EmptyTargets, StatusCode::BAD_REQUEST)]
   #[case(
      BulkPolicyError::BatchTooLarge { operation: BulkOperation::Delete, max: 50, actual: 51 },
      StatusCode::BAD_REQUEST
   )]
   #[case(
      BulkPolicyError::ConfirmationRequired { operation: BulkOperation::Delete },
      StatusCode::BAD_REQUEST
   )]
   fn test_ポリシー違反は400になる(#[case] err: BulkPolicyError, #[case] expected: StatusCode) {
      let response = CoreError::from(err).into_response();

      assert_eq!(response.status(), expected);
   }

   #[test]
   fn test_確認要求は専用のバリアントに変換される() {
      let err = CoreError::from(BulkPolicyError::ConfirmationRequired {
         operation: BulkOperation::Delete,
      });

      assert!(matches!(err, CoreError::ConfirmationRequired(_)));
   }

   #[test]
   fn test_内部エラーは500になる() {
      let response = CoreError::Internal("接続断".to_string()).into_response();

      assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
   }

   #[test]
   fn test_not_foundは404になる() {
      let response = CoreError::NotFound("ユーザー".to_string()).into_response();

      assert_eq!(response.status(), StatusCode::NOT_FOUND);
   }
}
