//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.actor_id`: 操作者 ID
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 使用例
///
/// ```
/// use atis_shared::{event_log::event, log_business_event};
///
/// log_business_event!(
///     event.category = event::category::USER_BULK,
///     event.action = event::action::BULK_ACTIVATED,
///     event.actor_id = 1,
///     event.success_count = 3,
///     event.result = event::result::SUCCESS,
///     "一括有効化を実行"
/// );
/// ```
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const USER_BULK: &str = "user_bulk";
    }

    /// イベントアクション
    pub mod action {
        pub const BULK_ACTIVATED: &str = "user_bulk.activated";
        pub const BULK_DEACTIVATED: &str = "user_bulk.deactivated";
        pub const BULK_ROLE_ASSIGNED: &str = "user_bulk.role_assigned";
        pub const BULK_INSTITUTION_ASSIGNED: &str = "user_bulk.institution_assigned";
        pub const BULK_DELETED: &str = "user_bulk.deleted";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const USER: &str = "user";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        /// 一部の項目が失敗した
        pub const PARTIAL_FAILURE: &str = "partial_failure";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DB）
        pub const INFRASTRUCTURE: &str = "infrastructure";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const INTERNAL: &str = "internal";
        /// 一括操作の 1 項目の失敗
        pub const BULK_ITEM: &str = "bulk_item";
        /// 活動ログの書き込み失敗
        pub const ACTIVITY_LOG: &str = "activity_log";
    }
}
