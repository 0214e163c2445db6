//! # API レスポンスエンベロープ
//!
//! 成功レスポンスの統一形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 統一レスポンス型
///
/// 一括操作、プレビュー、統計のすべてのエンドポイントが
/// `{ "data": T }` 形式でレスポンスを返す。
///
/// ## 使用例
///
/// ```
/// use atis_shared::ApiResponse;
///
/// let response = ApiResponse::new(3);
/// assert_eq!(response.data, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializeでdataキーに包まれる() {
        let response = ApiResponse::new(serde_json::json!({ "success_count": 2 }));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json, serde_json::json!({ "data": { "success_count": 2 } }));
    }

    #[test]
    fn test_deserializeでjsonからオブジェクトに変換する() {
        let response: ApiResponse<Vec<i64>> = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();

        assert_eq!(response.data, vec![1, 2]);
    }
}
