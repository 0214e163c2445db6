/// DB の連番（BIGSERIAL）をラップする ID 型を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`i64` をラップ）
/// - `derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
///   Display)`
/// - `new()`: 既存の連番から ID を作成
/// - `as_i64()`: 内部の値を取得
///
/// 連番は DB 側で採番されるため、`Default` は生成しない。
///
/// # 使用例
///
/// ```rust
/// use atis_domain::user::UserId;
///
/// let id = UserId::new(42);
/// assert_eq!(id.as_i64(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
macro_rules! define_int_id {
   (
      $(#[$meta:meta])*
      $vis:vis struct $Name:ident;
   ) => {
      $(#[$meta])*
      #[derive(
         Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
         serde::Serialize, serde::Deserialize,
         derive_more::Display,
      )]
      #[display("{_0}")]
      $vis struct $Name(i64);

      impl $Name {
         /// 既存の連番から ID を作成する
         pub fn new(value: i64) -> Self {
            Self(value)
         }

         /// 内部の値を取得する
         pub fn as_i64(&self) -> i64 {
            self.0
         }
      }
   };
}

/// バリデーション付き String Newtype を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`String` をラップ）
/// - `new()`: trim + 空チェック + 最大長チェック
/// - `as_str()`: 文字列参照
/// - `into_string()`: 所有権を持つ文字列に変換
/// - `Display` impl
///
/// # 引数
///
/// - `$label`: エラーメッセージに使うラベル（例: `"ユーザー名"`）
/// - `$max_length`: 最大文字数（`chars().count()` でカウント）
///
/// # 使用例
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use atis_domain::value_objects::Username;
///
/// let name = Username::new("  aliyev.r  ")?;
/// assert_eq!(name.as_str(), "aliyev.r");
/// # Ok(())
/// # }
/// ```
macro_rules! define_validated_string {
   (
      $(#[$meta:meta])*
      $vis:vis struct $Name:ident {
         label: $label:expr,
         max_length: $max_length:expr $(,)?
      }
   ) => {
      $(#[$meta])*
      #[derive(
         Debug, Clone, PartialEq, Eq,
         serde::Serialize, serde::Deserialize,
      )]
      $vis struct $Name(String);

      impl $Name {
         pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
            let value = value.into().trim().to_string();

            if value.is_empty() {
               return Err($crate::DomainError::Validation(format!(
                  "{}は必須です",
                  $label
               )));
            }

            if value.chars().count() > $max_length {
               return Err($crate::DomainError::Validation(format!(
                  "{}は {} 文字以内である必要があります",
                  $label, $max_length
               )));
            }

            Ok(Self(value))
         }

         /// 文字列参照を取得する
         pub fn as_str(&self) -> &str {
            &self.0
         }

         /// 所有権を持つ文字列に変換する
         pub fn into_string(self) -> String {
            self.0
         }
      }

      impl std::fmt::Display for $Name {
         fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
         }
      }
   };
}
