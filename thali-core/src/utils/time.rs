//! 时间工具函数 - 业务时区转换
//!
//! 存储层只接收 `i64` Unix millis；“今天”按租户业务时区计算，格式 `YYYY-MM-DD`。

use chrono::{Datelike, NaiveDate, TimeZone};
use chrono_tz::Tz;

use super::{AppError, AppResult, ErrorCode};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 格式化为 YYYY-MM-DD
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// 解析 IANA 时区名
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>().map_err(|_| {
        AppError::with_message(ErrorCode::ConfigError, format!("Unknown timezone: {}", name))
    })
}

/// Unix millis → 业务日期
pub fn business_date(millis: i64, tz: Tz) -> NaiveDate {
    match tz.timestamp_millis_opt(millis).earliest() {
        Some(dt) => dt.date_naive(),
        None => chrono::DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.date_naive())
            .unwrap_or_default(),
    }
}

/// 当前业务日期
pub fn today(tz: Tz) -> NaiveDate {
    business_date(shared::util::now_millis(), tz)
}

/// 日期开始 (00:00:00) → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期结束 → 次日 00:00:00 的 Unix millis (业务时区)
///
/// 返回次日零点时间戳，调用方使用 `< end` (不含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start_millis(next_day, tz)
}

/// 指定月份的第一天和下个月第一天
pub fn month_bounds(year: i32, month: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid month: {}-{}", year, month)))?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AppError::validation(format!("Invalid month: {}-{}", year, month)))?;
    Ok((first, next))
}
