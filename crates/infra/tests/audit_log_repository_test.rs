//! AuditLogRepository 統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://localhost/atis cargo test -p atis-infra --test audit_log_repository_test
//! ```

mod common;

use atis_domain::{
    audit_log::{BulkActivityLog, BulkOperationStats, SecurityEvent},
    bulk::{BulkAction, BulkOperation, ExecutionResult, ItemResult, UserState},
    user::UserId,
};
use atis_infra::{
    db::{PgTransactionManager, TransactionManager},
    repository::{
        AuditLogRepository,
        PostgresAuditLogRepository,
        PostgresUserRepository,
        UserRepository,
    },
};
use common::{TestUser, count_rows, insert_user, test_now};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

fn execution(operation: BulkOperation, items: Vec<ItemResult>) -> ExecutionResult {
    ExecutionResult::from_items(operation, items)
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_セキュリティイベントはトランザクションのコミットで保存される(pool: PgPool) {
    let user_id = insert_user(&pool, TestUser::active("nesibova.g")).await;
    let user = PostgresUserRepository::new(pool.clone())
        .find_by_ids(&[user_id])
        .await
        .unwrap()
        .remove(0);
    let previous = UserState {
        status:           user.status(),
        role_id:          None,
        role_name:        None,
        institution_id:   None,
        institution_name: None,
    };
    let event = SecurityEvent::for_bulk_item(
        &BulkAction::Deactivate,
        UserId::new(1),
        &user,
        &previous,
        test_now(),
    );
    let sut = PostgresAuditLogRepository::new(pool.clone());
    let tx_manager = PgTransactionManager::new(pool.clone());

    let mut tx = tx_manager.begin().await.unwrap();
    sut.insert_security_event(&mut tx, &event).await.unwrap();
    tx.commit().await.unwrap();

    let (event_type, severity, target_user_id, username): (String, String, i64, String) =
        sqlx::query_as(
            "SELECT event_type, severity, target_user_id, event_data->>'target_username' \
             FROM security_events",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(event_type, "bulk_user_deactivated");
    assert_eq!(severity, "warning");
    assert_eq!(target_user_id, user_id.as_i64());
    assert_eq!(username, "nesibova.g");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_ロールバックされたセキュリティイベントは残らない(pool: PgPool) {
    let user_id = insert_user(&pool, TestUser::active("kerimli.o")).await;
    let user = PostgresUserRepository::new(pool.clone())
        .find_by_ids(&[user_id])
        .await
        .unwrap()
        .remove(0);
    let previous = UserState {
        status:           user.status(),
        role_id:          None,
        role_name:        None,
        institution_id:   None,
        institution_name: None,
    };
    let event = SecurityEvent::for_bulk_item(
        &BulkAction::Delete,
        UserId::new(1),
        &user,
        &previous,
        test_now(),
    );
    let sut = PostgresAuditLogRepository::new(pool.clone());
    let tx_manager = PgTransactionManager::new(pool.clone());

    {
        let mut tx = tx_manager.begin().await.unwrap();
        sut.insert_security_event(&mut tx, &event).await.unwrap();
    }

    assert_eq!(count_rows(&pool, "security_events").await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_活動ログは操作種別ごとに集計される(pool: PgPool) {
    let sut = PostgresAuditLogRepository::new(pool);
    let actor = UserId::new(1);
    let results = [
        execution(
            BulkOperation::Activate,
            vec![ItemResult::success(UserId::new(2)), ItemResult::success(UserId::new(3))],
        ),
        execution(
            BulkOperation::Activate,
            vec![
                ItemResult::success(UserId::new(4)),
                ItemResult::failed(UserId::new(5), "エラー"),
            ],
        ),
        execution(
            BulkOperation::AssignRole,
            vec![ItemResult::success(UserId::new(2))],
        ),
    ];
    for result in &results {
        let auxiliary = (result.operation == BulkOperation::AssignRole).then_some(7);
        let log = BulkActivityLog::from_execution(actor, result, auxiliary, test_now());
        sut.insert_activity_log(&log).await.unwrap();
    }

    let stats = sut.aggregate_operation_stats().await.unwrap();

    assert_eq!(
        stats,
        vec![
            BulkOperationStats {
                operation:     BulkOperation::AssignRole,
                executions:    1,
                success_count: 1,
                failure_count: 0,
                skipped_count: 0,
            },
            BulkOperationStats {
                operation:     BulkOperation::Activate,
                executions:    2,
                success_count: 3,
                failure_count: 1,
                skipped_count: 0,
            },
        ]
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_活動ログに対象ユーザーと補助対象が記録される(pool: PgPool) {
    let sut = PostgresAuditLogRepository::new(pool.clone());
    let result = execution(
        BulkOperation::AssignInstitution,
        vec![ItemResult::success(UserId::new(8)), ItemResult::success(UserId::new(9))],
    );
    let log = BulkActivityLog::from_execution(UserId::new(1), &result, Some(20), test_now());

    sut.insert_activity_log(&log).await.unwrap();

    let (activity_type, event_data, success_rate): (String, serde_json::Value, f64) =
        sqlx::query_as("SELECT activity_type, event_data, success_rate FROM bulk_activity_logs")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(activity_type, "bulk_institution_assign");
    assert_eq!(
        event_data,
        serde_json::json!({ "user_ids": [8, 9], "institution_id": 20 })
    );
    assert_eq!(success_rate, 100.0);
}
