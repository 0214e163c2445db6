//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! 全エンドポイントで共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換はサービスの責務（shared に axum 依存を入れない）
//! - よく使うエラー種別は便利コンストラクタで提供し、URI のハードコードを排除

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://atis.example.az/errors";

/// エラーレスポンス（RFC 9457 Problem Details）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
   #[serde(rename = "type")]
   pub error_type: String,
   pub title:      String,
   pub status:     u16,
   pub detail:     String,
}

impl ErrorResponse {
   /// 汎用コンストラクタ
   ///
   /// `error_type_suffix` はベース URI に付加される（例: `"not-found"`）。
   pub fn new(
      error_type_suffix: &str,
      title: impl Into<String>,
      status: u16,
      detail: impl Into<String>,
   ) -> Self {
      Self {
         error_type: format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
         title: title.into(),
         status,
         detail: detail.into(),
      }
   }

   /// 400 Bad Request
   pub fn bad_request(detail: impl Into<String>) -> Self {
      Self::new("bad-request", "Bad Request", 400, detail)
   }

   /// 404 Not Found
   pub fn not_found(detail: impl Into<String>) -> Self {
      Self::new("not-found", "Not Found", 404, detail)
   }

   /// 400 Validation Error
   pub fn validation_error(detail: impl Into<String>) -> Self {
      Self::new("validation-error", "Validation Error", 400, detail)
   }

   /// 400 Confirmation Required
   ///
   /// 破壊的な操作で明示的な確認がない場合。クライアントは確認ダイアログを表示して再送する。
   pub fn confirmation_required(detail: impl Into<String>) -> Self {
      Self::new("confirmation-required", "Confirmation Required", 400, detail)
   }

   /// 500 Internal Server Error
   ///
   /// detail は固定値（内部情報を漏らさないため）。
   pub fn internal_error() -> Self {
      Self::new(
         "internal-error",
         "Internal Server Error",
         500,
         "内部エラーが発生しました",
      )
   }
}
