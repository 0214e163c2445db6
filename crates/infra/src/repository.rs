//! # リポジトリ実装
//!
//! 永続化の抽象（トレイト）と PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: ユースケース層はトレイトにのみ依存する
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でモック可能な設計（[`crate::mock`]）

pub mod audit_log_repository;
pub mod institution_repository;
pub mod role_repository;
pub mod user_repository;

pub use audit_log_repository::{AuditLogRepository, PostgresAuditLogRepository};
pub use institution_repository::{InstitutionRepository, PostgresInstitutionRepository};
pub use role_repository::{PostgresRoleRepository, RoleRepository};
pub use user_repository::{PostgresUserRepository, UserRepository, UserStatusCounts};
