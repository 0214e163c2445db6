//! RoleRepository / InstitutionRepository 統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://localhost/atis cargo test -p atis-infra --test reference_repository_test
//! ```

mod common;

use atis_domain::{institution::InstitutionId, role::RoleId};
use atis_infra::repository::{
    InstitutionRepository,
    PostgresInstitutionRepository,
    PostgresRoleRepository,
    RoleRepository,
};
use common::{insert_institution, insert_role};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn test_ロールをidで取得できる(pool: PgPool) {
    let role_id = insert_role(&pool, "superadmin").await;
    let sut = PostgresRoleRepository::new(pool);

    let role = sut.find_by_id(&role_id).await.unwrap().unwrap();

    assert_eq!(role.id(), &role_id);
    assert_eq!(role.name(), "superadmin");
    assert!(role.is_superadmin());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_存在しないロールはnoneを返す(pool: PgPool) {
    let sut = PostgresRoleRepository::new(pool);

    let role = sut.find_by_id(&RoleId::new(404)).await.unwrap();

    assert!(role.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_複数のロールをまとめて取得できる(pool: PgPool) {
    let instructor = insert_role(&pool, "müəllim").await;
    let admin = insert_role(&pool, "məktəbadmin").await;
    insert_role(&pool, "regionadmin").await;
    let sut = PostgresRoleRepository::new(pool);

    let mut names: Vec<String> = sut
        .find_by_ids(&[instructor, admin, RoleId::new(404)])
        .await
        .unwrap()
        .into_iter()
        .map(|role| role.name().to_string())
        .collect();
    names.sort();

    assert_eq!(names, vec!["məktəbadmin", "müəllim"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_教育機関をidで取得できる(pool: PgPool) {
    let institution_id = insert_institution(&pool, "Bakı 1 nömrəli məktəb").await;
    let sut = PostgresInstitutionRepository::new(pool);

    let institution = sut.find_by_id(&institution_id).await.unwrap().unwrap();

    assert_eq!(institution.name(), "Bakı 1 nömrəli məktəb");
    assert!(
        sut.find_by_id(&InstitutionId::new(404))
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_空のid一覧で教育機関は空を返す(pool: PgPool) {
    let sut = PostgresInstitutionRepository::new(pool);

    let institutions = sut.find_by_ids(&[]).await.unwrap();

    assert!(institutions.is_empty());
}
