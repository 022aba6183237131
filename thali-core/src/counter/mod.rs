//! Counter flow (takeaway / counter service)
//!
//! - [`orders`] - 下单、删项、取消、结单、重打
//! - [`running`] - 进行中取号视图、热门商品汇总
//! - [`catalog`] - 柜台商品维护与编码搜索
//! - [`cleanup`] - 每日清理进行中取号

pub mod catalog;
pub mod cleanup;
pub mod orders;
pub mod running;

pub use catalog::CounterCatalog;
pub use cleanup::{CleanupOutcome, DailyCleanup};
pub use orders::{CancelledCoupon, CartItem, CounterOrders, PlaceOrder, PlacedOrder};
pub use running::{ItemQuantity, RunningCoupons, TopItemSummary};
