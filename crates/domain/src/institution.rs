//! # 教育機関
//!
//! ユーザーが所属する教育機関（学校、地域教育局、セクターなど）。
//! 階層構造やメタデータは別サービスの責務で、ここでは一括割り当てに必要な
//! 識別子と名前のみを扱う。

define_int_id! {
   /// 教育機関 ID
   pub struct InstitutionId;
}

/// 教育機関エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Institution {
   id:   InstitutionId,
   name: String,
}

impl Institution {
   pub fn new(id: InstitutionId, name: impl Into<String>) -> Self {
      Self {
         id,
         name: name.into(),
      }
   }

   pub fn id(&self) -> &InstitutionId {
      &self.id
   }

   pub fn name(&self) -> &str {
      &self.name
   }
}
