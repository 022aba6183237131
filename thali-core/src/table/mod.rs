//! Table flow (dine-in)
//!
//! - [`running`] - 桌台下单：合并进行中桌台与厨房单
//! - [`billing`] - 结台生成账单、打印、标记已付
//! - [`menu`] - 菜单维护
//!
//! 桌台标识为桌号，拼桌时为 `桌号-分组`（分组 1..=4）。

pub mod billing;
pub mod menu;
pub mod running;

pub use billing::Billing;
pub use menu::MenuService;
pub use running::{OrderLine, RunningTables, TableOrder};

use shared::error::{AppError, AppResult, ErrorCode};
use std::fmt;
use std::str::FromStr;

/// Largest split group for one physical table
pub const MAX_SPLIT: u8 = 4;

/// Table identifier: physical number plus optional split group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId {
    pub number: u32,
    pub split: Option<u8>,
}

impl TableId {
    pub fn new(number: u32, split: Option<u8>) -> AppResult<Self> {
        if number == 0 {
            return Err(AppError::with_message(
                ErrorCode::InvalidTableNumber,
                "table number must be positive",
            ));
        }
        if let Some(s) = split
            && !(1..=MAX_SPLIT).contains(&s)
        {
            return Err(AppError::with_message(
                ErrorCode::InvalidTableNumber,
                format!("split must be within 1..={}, got {}", MAX_SPLIT, s),
            ));
        }
        Ok(Self { number, split })
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.split {
            Some(s) => write!(f, "{}-{}", self.number, s),
            None => write!(f, "{}", self.number),
        }
    }
}

impl FromStr for TableId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            AppError::with_message(
                ErrorCode::InvalidTableNumber,
                format!("invalid table identifier: {}", s),
            )
        };
        let s = s.trim();
        let (number, split) = match s.split_once('-') {
            Some((n, g)) => (n, Some(g.parse::<u8>().map_err(|_| invalid())?)),
            None => (s, None),
        };
        let number = number.parse::<u32>().map_err(|_| invalid())?;
        Self::new(number, split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let t: TableId = "5".parse().unwrap();
        assert_eq!(t, TableId { number: 5, split: None });
        let t: TableId = "12-3".parse().unwrap();
        assert_eq!(t.to_string(), "12-3");

        assert!("0".parse::<TableId>().is_err());
        assert!("5-5".parse::<TableId>().is_err());
        assert!("abc".parse::<TableId>().is_err());
        assert_eq!(
            "5-x".parse::<TableId>().unwrap_err().code,
            ErrorCode::InvalidTableNumber
        );
    }
}
