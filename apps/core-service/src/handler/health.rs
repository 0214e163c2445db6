//! # ヘルスチェックハンドラ
//!
//! Core Service の稼働状態を確認するためのエンドポイント。
//!
//! ## エンドポイント
//!
//! ```text
//! GET /health
//! ```
//!
//! ## レスポンス例
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0"
//! }
//! ```

use atis_shared::HealthResponse;
use axum::Json;

/// ヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
   Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}
