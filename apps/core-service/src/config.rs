//! # Core Service 設定
//!
//! 環境変数から Core Service サーバーの設定を読み込む。

use std::env;

use thiserror::Error;

/// `DATABASE_MAX_CONNECTIONS` 未設定時の最大接続数
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
   #[error("{0} が設定されていません")]
   Missing(&'static str),

   #[error("{name} の値が不正です: {value}")]
   Invalid { name: &'static str, value: String },
}

/// Core Service サーバーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
   /// バインドアドレス
   pub host:                     String,
   /// ポート番号
   pub port:                     u16,
   /// データベース接続 URL
   pub database_url:             String,
   /// 接続プールの最大接続数
   pub database_max_connections: u32,
}

impl CoreConfig {
   /// 環境変数から設定を読み込む
   pub fn from_env() -> Result<Self, ConfigError> {
      Self::from_lookup(|name| env::var(name).ok())
   }

   /// 任意の参照関数から設定を読み込む
   fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
      let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

      let port = required("CORE_PORT")?;
      let port = port.parse().map_err(|_| ConfigError::Invalid {
         name:  "CORE_PORT",
         value: port,
      })?;

      let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
         Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name: "DATABASE_MAX_CONNECTIONS",
            value,
         })?,
         None => DEFAULT_MAX_CONNECTIONS,
      };

      Ok(Self {
         host: lookup("CORE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
         port,
         database_url: required("DATABASE_URL")?,
         database_max_connections,
      })
   }
}

#[cfg(test)]
mod tests {
   use std::collections::HashMap;

   use pretty_assertions::assert_eq;

   use super::*;

   fn load(vars: &[(&str, &str)]) -> Result<CoreConfig, ConfigError> {
      let vars: HashMap<String, String> = vars
         .iter()
         .map(|(k, v)| (k.to_string(), v.to_string()))
         .collect();
      CoreConfig::from_lookup(|name| vars.get(name).cloned())
   }

   #[test]
   fn test_必須項目のみでデフォルト値が使われる() {
      let config = load(&[
         ("CORE_PORT", "13001"),
         ("DATABASE_URL", "postgres://localhost/atis"),
      ]);

      assert_eq!(
         config,
         Ok(CoreConfig {
            host:                     "0.0.0.0".to_string(),
            port:                     13001,
            database_url:             "postgres://localhost/atis".to_string(),
            database_max_connections: 10,
         })
      );
   }

   #[test]
   fn test_database_urlがないとmissing() {
      let config = load(&[("CORE_PORT", "13001")]);

      assert_eq!(config, Err(ConfigError::Missing("DATABASE_URL")));
   }

   #[test]
   fn test_不正なポート番号はinvalid() {
      let config = load(&[
         ("CORE_PORT", "http"),
         ("DATABASE_URL", "postgres://localhost/atis"),
      ]);

      assert_eq!(
         config,
         Err(ConfigError::Invalid {
            name:  "CORE_PORT",
            value: "http".to_string(),
         })
      );
   }

   #[test]
   fn test_最大接続数を上書きできる() {
      let config = load(&[
         ("CORE_HOST", "127.0.0.1"),
         ("CORE_PORT", "13001"),
         ("DATABASE_URL", "postgres://localhost/atis"),
         ("DATABASE_MAX_CONNECTIONS", "25"),
      ])
      .unwrap();

      assert_eq!(config.host, "127.0.0.1");
      assert_eq!(config.database_max_connections, 25);
   }
}
