//! 工具模块 - 通用工具函数
//!
//! - [`logger`] - 日志初始化
//! - [`money`] - 金额计算 (rust_decimal)
//! - [`time`] - 业务时区日期
//! - [`validation`] - 输入校验

pub mod logger;
pub mod money;
pub mod time;
pub mod validation;

pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};
