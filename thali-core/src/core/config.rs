use chrono_tz::Tz;
use std::time::Duration;

use crate::utils::time::parse_timezone;

/// 核心配置 - 所有配置项都可以通过环境变量覆盖
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | THALI_DATA_DIR | ./data | redb 数据目录 |
/// | THALI_TIMEZONE | Asia/Kolkata | 业务时区（决定“今天”） |
/// | THALI_COUPON_CEILING | 100 | 每日取号上限，超过后回到 1 |
/// | THALI_SETTINGS_DEBOUNCE_MS | 500 | 设置写入防抖窗口 |
/// | THALI_KOT_HIGHLIGHT_MS | 5000 | 厨房看板新单高亮时长 |
/// | THALI_COUNTER_HIGHLIGHT_MS | 8000 | 柜台显示屏新单高亮时长 |
/// | THALI_PRINT_TIMEOUT_MS | 15000 | 原生打印桥等待回执超时 |
/// | THALI_PRINT_FALLBACK_MS | 3000 | 桌面打印对话框兜底超时 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志目录，设置后按天滚动写文件 |
///
/// # 示例
///
/// ```ignore
/// THALI_TIMEZONE=Asia/Kolkata THALI_COUPON_CEILING=100 cargo test
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 数据目录
    pub data_dir: String,
    /// 业务时区
    pub timezone: Tz,
    /// 每日取号上限
    pub coupon_ceiling: u32,
    /// 设置写入防抖 (毫秒)
    pub settings_debounce_ms: u64,
    /// 厨房看板高亮 (毫秒)
    pub kot_highlight_ms: u64,
    /// 柜台显示屏高亮 (毫秒)
    pub counter_highlight_ms: u64,
    /// 原生打印桥超时 (毫秒)
    pub print_timeout_ms: u64,
    /// 桌面打印兜底超时 (毫秒)
    pub print_fallback_ms: u64,
    /// 日志级别
    pub log_level: String,
    /// 日志目录
    pub log_dir: Option<String>,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let timezone = std::env::var("THALI_TIMEZONE")
            .ok()
            .and_then(|name| match parse_timezone(&name) {
                Ok(tz) => Some(tz),
                Err(e) => {
                    tracing::warn!(timezone = %name, error = %e, "Falling back to Asia/Kolkata");
                    None
                }
            })
            .unwrap_or(chrono_tz::Asia::Kolkata);

        Self {
            data_dir: std::env::var("THALI_DATA_DIR").unwrap_or_else(|_| "./data".into()),
            timezone,
            coupon_ceiling: env_parse("THALI_COUPON_CEILING", 100u32).max(1),
            settings_debounce_ms: env_parse("THALI_SETTINGS_DEBOUNCE_MS", 500),
            kot_highlight_ms: env_parse("THALI_KOT_HIGHLIGHT_MS", 5000),
            counter_highlight_ms: env_parse("THALI_COUNTER_HIGHLIGHT_MS", 8000),
            print_timeout_ms: env_parse("THALI_PRINT_TIMEOUT_MS", 15000),
            print_fallback_ms: env_parse("THALI_PRINT_FALLBACK_MS", 3000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(data_dir: impl Into<String>, timezone: Tz) -> Self {
        let mut config = Self::from_env();
        config.data_dir = data_dir.into();
        config.timezone = timezone;
        config
    }

    /// redb 数据库文件路径
    pub fn database_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("thali.redb")
    }

    pub fn settings_debounce(&self) -> Duration {
        Duration::from_millis(self.settings_debounce_ms)
    }

    pub fn kot_highlight(&self) -> Duration {
        Duration::from_millis(self.kot_highlight_ms)
    }

    pub fn counter_highlight(&self) -> Duration {
        Duration::from_millis(self.counter_highlight_ms)
    }

    pub fn print_timeout(&self) -> Duration {
        Duration::from_millis(self.print_timeout_ms)
    }

    pub fn print_fallback(&self) -> Duration {
        Duration::from_millis(self.print_fallback_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
