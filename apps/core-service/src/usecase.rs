//! # ユースケース層
//!
//! Core Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリと時計を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `user_bulk`: ユーザー一括操作（検証・プレビュー・実行・統計）

pub mod user_bulk;

pub use user_bulk::{BulkStatistics, RecentActivity, UserBulkUseCaseImpl, ValidatedBulk};
