//! # JSON ボディ抽出
//!
//! axum の `Json` と同じくリクエストボディをデシリアライズするが、
//! 失敗時は RFC 9457 形式の入力エラー（400）を返す。

use axum::{
   Json,
   extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::CoreError;

/// 不正なボディを [`CoreError::Validation`] として拒否する JSON 抽出器
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
   Json<T>: FromRequest<S, Rejection = JsonRejection>,
   S: Send + Sync,
{
   type Rejection = CoreError;

   async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
      let Json(value) = Json::<T>::from_request(req, state)
         .await
         .map_err(|rejection| {
            CoreError::Validation(format!(
               "リクエストボディが不正です: {}",
               rejection.body_text()
            ))
         })?;
      Ok(Self(value))
   }
}
