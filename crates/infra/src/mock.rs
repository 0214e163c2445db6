//! # テスト用モックリポジトリ
//!
//! ユースケーステストで使用するインメモリモックリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! atis-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! 一括操作の部分失敗を再現するため、ユーザーリポジトリは
//! 「特定ユーザーの更新を失敗させる」「ロック取得時に削除済みにする」
//! といった障害注入をサポートする。

use std::{
   collections::{HashMap, HashSet},
   sync::{Arc, Mutex},
};

use async_trait::async_trait;
use atis_domain::{
   audit_log::{BulkActivityLog, BulkOperationStats, SecurityEvent},
   institution::{Institution, InstitutionId},
   role::{Role, RoleId},
   user::{User, UserId},
};
use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::{
   db::{TransactionManager, TxContext},
   error::InfraError,
   repository::{
      AuditLogRepository,
      InstitutionRepository,
      RoleRepository,
      UserRepository,
      UserStatusCounts,
   },
};

// ===== MockTransactionManager =====

#[derive(Clone, Default)]
pub struct MockTransactionManager {
   begun: Arc<Mutex<usize>>,
}

impl MockTransactionManager {
   pub fn new() -> Self {
      Self::default()
   }

   /// 開始されたトランザクションの数
   pub fn begun_count(&self) -> usize {
      *self.begun.lock().unwrap()
   }
}

#[async_trait]
impl TransactionManager for MockTransactionManager {
   async fn begin(&self) -> Result<TxContext, InfraError> {
      *self.begun.lock().unwrap() += 1;
      Ok(TxContext::mock())
   }
}

// ===== MockUserRepository =====

#[derive(Clone, Default)]
pub struct MockUserRepository {
   users:           Arc<Mutex<Vec<User>>>,
   tokens:          Arc<Mutex<HashMap<UserId, u64>>>,
   failing_updates: Arc<Mutex<HashSet<UserId>>>,
   vanishing:       Arc<Mutex<HashSet<UserId>>>,
}

impl MockUserRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_user(&self, user: User) {
      self.users.lock().unwrap().push(user);
   }

   /// ユーザーにアクセストークンを発行済みとして登録する
   pub fn add_tokens(&self, id: UserId, count: u64) {
      *self.tokens.lock().unwrap().entry(id).or_default() += count;
   }

   /// ユーザーの有効なアクセストークン数
   pub fn token_count(&self, id: &UserId) -> u64 {
      self.tokens.lock().unwrap().get(id).copied().unwrap_or(0)
   }

   /// 指定ユーザーの更新・削除を失敗させる
   pub fn fail_writes_for(&self, id: UserId) {
      self.failing_updates.lock().unwrap().insert(id);
   }

   /// 指定ユーザーを行ロック取得の直前に削除する（同時削除の再現）
   pub fn vanish_before_lock(&self, id: UserId) {
      self.vanishing.lock().unwrap().insert(id);
   }

   pub fn find(&self, id: &UserId) -> Option<User> {
      self.users.lock().unwrap().iter().find(|u| u.id() == id).cloned()
   }

   pub fn len(&self) -> usize {
      self.users.lock().unwrap().len()
   }

   pub fn is_empty(&self) -> bool {
      self.len() == 0
   }

   fn check_writable(&self, id: &UserId) -> Result<(), InfraError> {
      if self.failing_updates.lock().unwrap().contains(id) {
         return Err(InfraError::unexpected(format!("書き込みに失敗しました: {id}")));
      }
      Ok(())
   }
}

#[async_trait]
impl UserRepository for MockUserRepository {
   async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, InfraError> {
      Ok(self
         .users
         .lock()
         .unwrap()
         .iter()
         .filter(|u| ids.contains(u.id()))
         .cloned()
         .collect())
   }

   async fn find_by_id_for_update(
      &self,
      _tx: &mut TxContext,
      id: &UserId,
   ) -> Result<Option<User>, InfraError> {
      if self.vanishing.lock().unwrap().remove(id) {
         self.users.lock().unwrap().retain(|u| u.id() != id);
      }
      Ok(self.find(id))
   }

   async fn update(&self, _tx: &mut TxContext, user: &User) -> Result<(), InfraError> {
      self.check_writable(user.id())?;

      let mut users = self.users.lock().unwrap();
      let Some(pos) = users.iter().position(|u| u.id() == user.id()) else {
         return Err(InfraError::conflict("User", user.id().to_string()));
      };
      users[pos] = user.clone();
      Ok(())
   }

   async fn revoke_tokens(&self, _tx: &mut TxContext, id: &UserId) -> Result<u64, InfraError> {
      Ok(self.tokens.lock().unwrap().remove(id).unwrap_or(0))
   }

   async fn delete(&self, _tx: &mut TxContext, id: &UserId) -> Result<(), InfraError> {
      self.check_writable(id)?;
      self.tokens.lock().unwrap().remove(id);

      let mut users = self.users.lock().unwrap();
      let before = users.len();
      users.retain(|u| u.id() != id);
      if users.len() == before {
         return Err(InfraError::conflict("User", id.to_string()));
      }
      Ok(())
   }

   async fn count_by_status(&self) -> Result<UserStatusCounts, InfraError> {
      let users = self.users.lock().unwrap();
      Ok(UserStatusCounts {
         total:  users.len() as i64,
         active: users.iter().filter(|u| u.is_active()).count() as i64,
      })
   }

   async fn count_by_role(&self) -> Result<Vec<(RoleId, i64)>, InfraError> {
      Ok(self
         .users
         .lock()
         .unwrap()
         .iter()
         .filter_map(|u| u.role_id().copied())
         .counts()
         .into_iter()
         .map(|(id, count)| (id, count as i64))
         .sorted()
         .collect())
   }

   async fn count_by_institution(
      &self,
      limit: i64,
   ) -> Result<Vec<(InstitutionId, i64)>, InfraError> {
      Ok(self
         .users
         .lock()
         .unwrap()
         .iter()
         .filter_map(|u| u.institution_id().copied())
         .counts()
         .into_iter()
         .map(|(id, count)| (id, count as i64))
         .sorted_by(|(a_id, a), (b_id, b)| b.cmp(a).then(a_id.cmp(b_id)))
         .take(usize::try_from(limit).unwrap_or(0))
         .collect())
   }

   async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64, InfraError> {
      Ok(self
         .users
         .lock()
         .unwrap()
         .iter()
         .filter(|u| u.created_at() >= since)
         .count() as i64)
   }
}

// ===== MockRoleRepository =====

#[derive(Clone, Default)]
pub struct MockRoleRepository {
   roles: Arc<Mutex<Vec<Role>>>,
}

impl MockRoleRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_role(&self, role: Role) {
      self.roles.lock().unwrap().push(role);
   }
}

#[async_trait]
impl RoleRepository for MockRoleRepository {
   async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, InfraError> {
      Ok(self.roles.lock().unwrap().iter().find(|r| r.id() == id).cloned())
   }

   async fn find_by_ids(&self, ids: &[RoleId]) -> Result<Vec<Role>, InfraError> {
      Ok(self
         .roles
         .lock()
         .unwrap()
         .iter()
         .filter(|r| ids.contains(r.id()))
         .cloned()
         .collect())
   }
}

// ===== MockInstitutionRepository =====

#[derive(Clone, Default)]
pub struct MockInstitutionRepository {
   institutions: Arc<Mutex<Vec<Institution>>>,
}

impl MockInstitutionRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_institution(&self, institution: Institution) {
      self.institutions.lock().unwrap().push(institution);
   }
}

#[async_trait]
impl InstitutionRepository for MockInstitutionRepository {
   async fn find_by_id(&self, id: &InstitutionId) -> Result<Option<Institution>, InfraError> {
      Ok(self
         .institutions
         .lock()
         .unwrap()
         .iter()
         .find(|i| i.id() == id)
         .cloned())
   }

   async fn find_by_ids(&self, ids: &[InstitutionId]) -> Result<Vec<Institution>, InfraError> {
      Ok(self
         .institutions
         .lock()
         .unwrap()
         .iter()
         .filter(|i| ids.contains(i.id()))
         .cloned()
         .collect())
   }
}

// ===== MockAuditLogRepository =====

#[derive(Clone, Default)]
pub struct MockAuditLogRepository {
   security_events:   Arc<Mutex<Vec<SecurityEvent>>>,
   activity_logs:     Arc<Mutex<Vec<BulkActivityLog>>>,
   fail_activity_log: Arc<Mutex<bool>>,
}

impl MockAuditLogRepository {
   pub fn new() -> Self {
      Self::default()
   }

   /// 活動ログの書き込みを失敗させる
   pub fn fail_activity_log(&self) {
      *self.fail_activity_log.lock().unwrap() = true;
   }

   pub fn security_events(&self) -> Vec<SecurityEvent> {
      self.security_events.lock().unwrap().clone()
   }

   pub fn activity_logs(&self) -> Vec<BulkActivityLog> {
      self.activity_logs.lock().unwrap().clone()
   }
}

#[async_trait]
impl AuditLogRepository for MockAuditLogRepository {
   async fn insert_security_event(
      &self,
      _tx: &mut TxContext,
      event: &SecurityEvent,
   ) -> Result<(), InfraError> {
      self.security_events.lock().unwrap().push(event.clone());
      Ok(())
   }

   async fn insert_activity_log(&self, log: &BulkActivityLog) -> Result<(), InfraError> {
      if *self.fail_activity_log.lock().unwrap() {
         return Err(InfraError::unexpected("活動ログの書き込みに失敗しました"));
      }
      self.activity_logs.lock().unwrap().push(log.clone());
      Ok(())
   }

   async fn aggregate_operation_stats(&self) -> Result<Vec<BulkOperationStats>, InfraError> {
      let logs = self.activity_logs.lock().unwrap();
      let mut stats: HashMap<_, BulkOperationStats> = HashMap::new();

      for log in logs.iter() {
         let entry = stats.entry(log.operation).or_insert(BulkOperationStats {
            operation:     log.operation,
            executions:    0,
            success_count: 0,
            failure_count: 0,
            skipped_count: 0,
         });
         entry.executions += 1;
         entry.success_count += log.success_count;
         entry.failure_count += log.failure_count;
         entry.skipped_count += log.skipped_count;
      }

      Ok(stats
         .into_values()
         .sorted_by_key(|s| s.operation.activity_type())
         .collect())
   }
}
