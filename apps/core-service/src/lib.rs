//! # Core Service ライブラリ
//!
//! ユーザー一括操作のユースケース、ハンドラ、ルーターを公開する。
//! バイナリ（`main.rs`）とハンドラのテストが同じルーターを使う。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;

use std::sync::Arc;

use axum::{
   Router,
   routing::{get, post},
};
use handler::{
   UserBulkState,
   bulk_activate,
   bulk_assign_institution,
   bulk_assign_role,
   bulk_deactivate,
   bulk_delete,
   bulk_preview,
   bulk_statistics,
   health_check,
};
use tower_http::trace::TraceLayer;

/// Core Service のルーターを構築する
pub fn router(bulk_state: Arc<UserBulkState>) -> Router {
   Router::new()
      .route("/health", get(health_check))
      .route("/internal/users/bulk/activate", post(bulk_activate))
      .route("/internal/users/bulk/deactivate", post(bulk_deactivate))
      .route("/internal/users/bulk/assign-role", post(bulk_assign_role))
      .route(
         "/internal/users/bulk/assign-institution",
         post(bulk_assign_institution),
      )
      .route("/internal/users/bulk/delete", post(bulk_delete))
      .route("/internal/users/bulk/preview", post(bulk_preview))
      .route("/internal/users/bulk/statistics", get(bulk_statistics))
      .with_state(bulk_state)
      .layer(TraceLayer::new_for_http())
}
