//! # ユーザー
//!
//! ユーザーエンティティとそれに関連する値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: UserId は DB の連番をラップし、型安全性を確保
//! - **不変性**: 状態変更は新しいインスタンスを返すメソッド経由
//! - **時刻の注入**: 更新日時は呼び出し元から渡す（[`crate::clock::Clock`]）
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use atis_domain::{
//!    user::{Email, User, UserId, UserRecord, UserStatus},
//!    value_objects::Username,
//! };
//!
//! let now = chrono::Utc::now();
//! let user = User::from_db(UserRecord {
//!    id: UserId::new(1),
//!    username: Username::new("aliyev.r")?,
//!    email: Email::new("aliyev@example.az")?,
//!    status: UserStatus::Inactive,
//!    role_id: None,
//!    institution_id: None,
//!    locked_until: None,
//!    created_at: now,
//!    updated_at: now,
//! });
//!
//! let user = user.activated(now);
//! assert!(user.is_active());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, institution::InstitutionId, role::RoleId, value_objects::Username};

define_int_id! {
   /// ユーザー ID（一意識別子）
   pub struct UserId;
}

/// 無効化時のロック期間（年）
///
/// 無効化されたユーザーは再有効化されるまで事実上ログインできない。
const DEACTIVATION_LOCK_YEARS: u32 = 10;

/// メールアドレス（値オブジェクト）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
   /// メールアドレスを作成する
   ///
   /// # バリデーション
   ///
   /// - 空文字列ではない
   /// - `local@domain` の形式
   /// - 最大 255 文字
   pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
      let value = value.into();

      if value.is_empty() {
         return Err(DomainError::Validation(
            "メールアドレスは必須です".to_string(),
         ));
      }

      let Some((local, domain)) = value.split_once('@') else {
         return Err(DomainError::Validation(
            "メールアドレスの形式が不正です".to_string(),
         ));
      };

      if local.is_empty() || domain.is_empty() {
         return Err(DomainError::Validation(
            "メールアドレスの形式が不正です".to_string(),
         ));
      }

      if value.len() > 255 {
         return Err(DomainError::Validation(
            "メールアドレスは255文字以内である必要があります".to_string(),
         ));
      }

      Ok(Self(value))
   }

   pub fn as_str(&self) -> &str {
      &self.0
   }
}

impl std::fmt::Display for Email {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      write!(f, "{}", self.0)
   }
}

/// ユーザーステータス
///
/// 削除は物理削除のため、ステータスとしては持たない。
#[derive(
   Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
   /// アクティブ（ログイン可能）
   Active,
   /// 非アクティブ（無効化済み）
   Inactive,
}

impl UserStatus {
   /// DB の `is_active` 列から変換する
   pub fn from_is_active(is_active: bool) -> Self {
      if is_active { Self::Active } else { Self::Inactive }
   }

   pub fn is_active(self) -> bool {
      self == Self::Active
   }
}

/// DB から復元する際の全フィールド
#[derive(Debug, Clone)]
pub struct UserRecord {
   pub id:             UserId,
   pub username:       Username,
   pub email:          Email,
   pub status:         UserStatus,
   pub role_id:        Option<RoleId>,
   pub institution_id: Option<InstitutionId>,
   pub locked_until:   Option<DateTime<Utc>>,
   pub created_at:     DateTime<Utc>,
   pub updated_at:     DateTime<Utc>,
}

/// ユーザーエンティティ
///
/// # 不変条件
///
/// - `status` が `Active` の場合、`locked_until` は None
/// - ロールと教育機関はそれぞれ高々 1 つ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
   id:             UserId,
   username:       Username,
   email:          Email,
   status:         UserStatus,
   role_id:        Option<RoleId>,
   institution_id: Option<InstitutionId>,
   locked_until:   Option<DateTime<Utc>>,
   created_at:     DateTime<Utc>,
   updated_at:     DateTime<Utc>,
}

impl User {
   /// 既存のデータからユーザーを復元する（データベースから取得時）
   pub fn from_db(record: UserRecord) -> Self {
      Self {
         id:             record.id,
         username:       record.username,
         email:          record.email,
         status:         record.status,
         role_id:        record.role_id,
         institution_id: record.institution_id,
         locked_until:   record.locked_until,
         created_at:     record.created_at,
         updated_at:     record.updated_at,
      }
   }

   // Getter メソッド

   pub fn id(&self) -> &UserId {
      &self.id
   }

   pub fn username(&self) -> &Username {
      &self.username
   }

   pub fn email(&self) -> &Email {
      &self.email
   }

   pub fn status(&self) -> UserStatus {
      self.status
   }

   pub fn role_id(&self) -> Option<&RoleId> {
      self.role_id.as_ref()
   }

   pub fn institution_id(&self) -> Option<&InstitutionId> {
      self.institution_id.as_ref()
   }

   pub fn locked_until(&self) -> Option<DateTime<Utc>> {
      self.locked_until
   }

   pub fn created_at(&self) -> DateTime<Utc> {
      self.created_at
   }

   pub fn updated_at(&self) -> DateTime<Utc> {
      self.updated_at
   }

   // ビジネスロジックメソッド

   pub fn is_active(&self) -> bool {
      self.status.is_active()
   }

   /// 有効化した新しいインスタンスを返す
   ///
   /// ロックも同時に解除する。
   pub fn activated(self, now: DateTime<Utc>) -> Self {
      Self {
         status: UserStatus::Active,
         locked_until: None,
         updated_at: now,
         ..self
      }
   }

   /// 無効化した新しいインスタンスを返す
   ///
   /// `locked_until` を暦の上で [`DEACTIVATION_LOCK_YEARS`] 年後に設定する。
   /// 表現できる範囲を超える場合は上限値でロックする。
   pub fn deactivated(self, now: DateTime<Utc>) -> Self {
      let locked_until = now
         .checked_add_months(Months::new(12 * DEACTIVATION_LOCK_YEARS))
         .unwrap_or(DateTime::<Utc>::MAX_UTC);
      Self {
         status: UserStatus::Inactive,
         locked_until: Some(locked_until),
         updated_at: now,
         ..self
      }
   }

   /// ロールを変更した新しいインスタンスを返す
   pub fn with_role(self, role_id: RoleId, now: DateTime<Utc>) -> Self {
      Self {
         role_id: Some(role_id),
         updated_at: now,
         ..self
      }
   }

   /// 所属教育機関を変更した新しいインスタンスを返す
   pub fn with_institution(self, institution_id: InstitutionId, now: DateTime<Utc>) -> Self {
      Self {
         institution_id: Some(institution_id),
         updated_at: now,
         ..self
      }
   }
}
