//! # ATİS インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プールとトランザクション管理
//! - **リポジトリ実装**: ユーザー、ロール、教育機関、監査ログの永続化
//!
//! ## 依存関係
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理、[`db::TxContext`]
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリのトレイトと PostgreSQL 実装
//! - `mock` - インメモリモック（`test-utils` feature）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use atis_infra::{db, repository::PostgresUserRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/atis", 10).await?;
//!     let users = PostgresUserRepository::new(pool.clone());
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;

pub use error::InfraError;
