//! # ドメイン層エラー定義
//!
//! 値オブジェクトの生成やエンティティの復元で発生するエラー型。
//!
//! 一括操作のポリシー違反は [`crate::bulk::BulkPolicyError`] で別に表現する。
//! こちらは入力値そのものの検証失敗のみを扱う。
//!
//! ## 使用例
//!
//! ```rust
//! use atis_domain::DomainError;
//!
//! fn validate_name(name: &str) -> Result<(), DomainError> {
//!    if name.is_empty() {
//!       return Err(DomainError::Validation("名前は必須です".to_string()));
//!    }
//!    Ok(())
//! }
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// API 層でこのエラーを受け取り、400 系の HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
   /// バリデーションエラー
   ///
   /// 入力値がビジネスルールに違反している場合に使用する。
   ///
   /// # 例
   ///
   /// - 必須フィールドが未入力
   /// - 文字数制限の超過
   /// - 不正なフォーマット
   #[error("バリデーションエラー: {0}")]
   Validation(String),
}
