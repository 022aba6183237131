//! Data models
//!
//! 文档存储里的 JSON 形状：字段一律 camelCase，金额以 f64 存储（计算走 rust_decimal）。
//! 文档 id 不在 payload 里，由存储层的 `Record<T>` 携带。

pub mod bill;
pub mod counter_item;
pub mod counter_order;
pub mod hotel_info;
pub mod kitchen_order;
pub mod menu_item;
pub mod profile;
pub mod running_table;
pub mod settings;

// Re-exports
pub use bill::*;
pub use counter_item::*;
pub use counter_order::*;
pub use hotel_info::*;
pub use kitchen_order::*;
pub use menu_item::*;
pub use profile::*;
pub use running_table::*;
pub use settings::*;
