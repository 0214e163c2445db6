//! # Core Service サーバー
//!
//! ATİS のユーザー一括操作を実行する内部サービス。
//!
//! ## 役割
//!
//! - **一括操作**: 有効化、無効化、ロール・教育機関の割り当て、削除
//! - **プレビュー**: 変更を加えずに各ユーザーへの影響を返す
//! - **監査**: 成功した項目ごとのセキュリティイベントと、実行ごとの活動ログを記録
//!
//! ## アクセス制御
//!
//! 内部ネットワークからのみアクセス可能とする。認証と認可は呼び出し元が行い、
//! 操作者の ID をリクエストボディの `actor_id` で渡す。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `CORE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `CORE_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `DATABASE_MAX_CONNECTIONS` | No | 接続プールの最大接続数（デフォルト: 10） |
//! | `LOG_FORMAT` | No | `json` または `pretty` |
//! | `RUST_LOG` | No | ログフィルタ（デフォルト: `info,atis=debug`） |
//!
//! ## 起動方法
//!
//! ```bash
//! CORE_PORT=13001 DATABASE_URL=postgres://... cargo run -p atis-core-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use atis_core_service::{
   config::CoreConfig,
   handler::UserBulkState,
   router,
   usecase::UserBulkUseCaseImpl,
};
use atis_domain::clock::SystemClock;
use atis_infra::{
   db::{self, PgTransactionManager},
   repository::{
      PostgresAuditLogRepository,
      PostgresInstitutionRepository,
      PostgresRoleRepository,
      PostgresUserRepository,
   },
};
use atis_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Core Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
   // .env ファイルを読み込む（存在する場合）
   dotenvy::dotenv().ok();

   init_tracing(TracingConfig::from_env("atis-core-service"));

   let config = CoreConfig::from_env().context("設定の読み込みに失敗しました")?;

   tracing::info!(
      "Core Service サーバーを起動します: {}:{}",
      config.host,
      config.port
   );

   let pool = db::create_pool(&config.database_url, config.database_max_connections)
      .await
      .context("データベース接続に失敗しました")?;
   db::run_migrations(&pool)
      .await
      .context("マイグレーションの適用に失敗しました")?;
   tracing::info!("データベースに接続しました");

   let usecase = UserBulkUseCaseImpl::new(
      Arc::new(PostgresUserRepository::new(pool.clone())),
      Arc::new(PostgresRoleRepository::new(pool.clone())),
      Arc::new(PostgresInstitutionRepository::new(pool.clone())),
      Arc::new(PostgresAuditLogRepository::new(pool.clone())),
      Arc::new(PgTransactionManager::new(pool)),
      Arc::new(SystemClock),
   );
   let app = router(Arc::new(UserBulkState { usecase }));

   let addr: SocketAddr = format!("{}:{}", config.host, config.port)
      .parse()
      .context("バインドアドレスが不正です")?;
   let listener = TcpListener::bind(addr)
      .await
      .with_context(|| format!("{addr} にバインドできません"))?;
   tracing::info!("Core Service サーバーが起動しました: {}", addr);

   axum::serve(listener, app).await?;

   Ok(())
}
