//! # 共通値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! ## 含まれる型
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Username`] | `String` | ログイン用ユーザー名 |

define_validated_string! {
   /// ユーザー名（値オブジェクト）
   ///
   /// ログインに使用する一意な名前。前後の空白は除去される。
   pub struct Username {
      label: "ユーザー名",
      max_length: 100,
   }
}
