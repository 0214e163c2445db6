//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲

pub mod health;
pub mod json;
pub mod user_bulk;

pub use health::health_check;
pub use json::ApiJson;
pub use user_bulk::{
   UserBulkState,
   bulk_activate,
   bulk_assign_institution,
   bulk_assign_role,
   bulk_deactivate,
   bulk_delete,
   bulk_preview,
   bulk_statistics,
};
