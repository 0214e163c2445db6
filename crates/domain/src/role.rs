//! # ロール
//!
//! ユーザーに割り当てられるロール。ATİS ではユーザーは 1 つのロールのみを持つ。
//!
//! ロールと権限の管理自体は別サービスの責務であり、ここでは一括操作が
//! 参照する識別子と名前のみを扱う。
//!
//! ## 使用例
//!
//! ```rust
//! use atis_domain::role::{Role, RoleId};
//!
//! let role = Role::new(RoleId::new(1), "superadmin");
//! assert!(role.is_superadmin());
//! ```

define_int_id! {
   /// ロール ID
   pub struct RoleId;
}

/// 一括削除から保護されるロール名
pub const SUPERADMIN_ROLE_NAME: &str = "superadmin";

/// ロールエンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
   id:   RoleId,
   name: String,
}

impl Role {
   pub fn new(id: RoleId, name: impl Into<String>) -> Self {
      Self {
         id,
         name: name.into(),
      }
   }

   pub fn id(&self) -> &RoleId {
      &self.id
   }

   pub fn name(&self) -> &str {
      &self.name
   }

   /// スーパー管理者ロールか判定する
   pub fn is_superadmin(&self) -> bool {
      is_superadmin_role_name(&self.name)
   }
}

/// ロール名がスーパー管理者を表すか判定する
pub fn is_superadmin_role_name(name: &str) -> bool {
   name == SUPERADMIN_ROLE_NAME
}
