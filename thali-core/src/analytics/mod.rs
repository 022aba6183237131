//! Analytics
//!
//! 报表只读聚合，结果行均可序列化，CSV / PDF 导出由调用方完成。
//!
//! - [`counter`] - 柜台流水按商品汇总（订单类型 / 支付方式 / 日期范围过滤）
//! - [`hotel`] - 已付账单按日营收
//! - [`kitchen`] - 指定日期的厨房出品汇总

pub mod counter;
pub mod hotel;
pub mod kitchen;

pub use counter::{CounterAnalytics, CounterFilter, CounterReport, ItemSales};
pub use hotel::{DailyRevenue, HotelAnalytics};
pub use kitchen::{KitchenAnalytics, KitchenItemCount};
