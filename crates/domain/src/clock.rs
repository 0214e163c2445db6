//! # Clock（時刻プロバイダ）
//!
//! ユースケース層での `Utc::now()` 直接呼び出しを置き換え、
//! テストで固定時刻を注入可能にするための抽象化。
//!
//! 統計の集計期間（今日・今週・今月）の起点もここで算出する。

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};

/// 現在時刻を提供するトレイト
pub trait Clock: Send + Sync {
   fn now(&self) -> DateTime<Utc>;

   /// 今日の 00:00（UTC）
   fn start_of_day(&self) -> DateTime<Utc> {
      Utc.from_utc_datetime(&self.now().date_naive().and_time(NaiveTime::MIN))
   }

   /// 今週の月曜日 00:00（UTC）
   fn start_of_week(&self) -> DateTime<Utc> {
      let today = self.start_of_day();
      let days_from_monday = i64::from(today.weekday().num_days_from_monday());
      today - Duration::days(days_from_monday)
   }

   /// 今月の 1 日 00:00（UTC）
   fn start_of_month(&self) -> DateTime<Utc> {
      let today = self.start_of_day();
      Utc.with_ymd_and_hms(today.year(), today.month(), 1, 0, 0, 0)
         .single()
         .unwrap_or(today)
   }
}

/// 実際のシステム時刻を返す実装
pub struct SystemClock;

impl Clock for SystemClock {
   fn now(&self) -> DateTime<Utc> {
      Utc::now()
   }
}

/// 固定時刻を返すテスト用実装
pub struct FixedClock {
   now: DateTime<Utc>,
}

impl FixedClock {
   pub fn new(now: DateTime<Utc>) -> Self {
      Self { now }
   }
}

impl Clock for FixedClock {
   fn now(&self) -> DateTime<Utc> {
      self.now
   }
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;

   use super::*;

   /// 2025-09-18（木）14:30:00 UTC
   fn thursday_afternoon() -> DateTime<Utc> {
      Utc.with_ymd_and_hms(2025, 9, 18, 14, 30, 0).unwrap()
   }

   #[test]
   fn test_system_clock_は現在時刻を返す() {
      let clock = SystemClock;
      let before = Utc::now();
      let result = clock.now();
      let after = Utc::now();

      assert!(result >= before);
      assert!(result <= after);
   }

   #[test]
   fn test_fixed_clock_はコンストラクタで渡した時刻を返す() {
      let clock = FixedClock::new(thursday_afternoon());

      assert_eq!(clock.now(), thursday_afternoon());
      assert_eq!(clock.now(), clock.now());
   }

   #[test]
   fn test_今日の起点は0時() {
      let clock = FixedClock::new(thursday_afternoon());

      assert_eq!(
         clock.start_of_day(),
         Utc.with_ymd_and_hms(2025, 9, 18, 0, 0, 0).unwrap()
      );
   }

   #[test]
   fn test_今週の起点は月曜日() {
      let clock = FixedClock::new(thursday_afternoon());

      assert_eq!(
         clock.start_of_week(),
         Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap()
      );
   }

   #[test]
   fn test_月曜日の今週の起点は当日() {
      let monday = Utc.with_ymd_and_hms(2025, 9, 15, 8, 0, 0).unwrap();
      let clock = FixedClock::new(monday);

      assert_eq!(clock.start_of_week(), clock.start_of_day());
   }

   #[test]
   fn test_今月の起点は1日() {
      let clock = FixedClock::new(thursday_afternoon());

      assert_eq!(
         clock.start_of_month(),
         Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap()
      );
   }
}
