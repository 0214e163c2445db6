//! # ATİS ドメイン層
//!
//! 教育機関管理システム（ATİS）のユーザー一括操作を支えるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: User, Role, Institution）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: Email, Username）
//! - **ポリシー**: 一括操作ごとの制約を純粋なテーブルとして表現（[`bulk`]）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! core-service → infra → domain
//!        ↘               ↓
//!          shared ←──────┘
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`bulk`] - 一括操作のポリシー、計画、結果
//! - [`audit_log`] - セキュリティイベントと一括操作の活動ログ
//! - [`user`] / [`role`] / [`institution`] - 操作対象のエンティティ
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層で発生するエラーの定義
//!
//! ## 使用例
//!
//! ```rust
//! use atis_domain::bulk::BulkOperation;
//!
//! let policy = BulkOperation::Delete.policy();
//! assert_eq!(policy.max_batch_size, 50);
//! assert!(policy.requires_confirmation);
//! ```

#[macro_use]
mod macros;

pub mod audit_log;
pub mod bulk;
pub mod clock;
pub mod error;
pub mod institution;
pub mod role;
pub mod user;
pub mod value_objects;

pub use error::DomainError;
