//! Kitchen ticket board
//!
//! 厨房单状态只能前进：进行中（无 `status` 字段）→ `prepared` → `served`。
//! 状态变更是单文档读-改-写，通过 [`DocumentStore::transact`] 完成，
//! 非法转换直接拒绝，不写入。
//!
//! [`DocumentStore::transact`]: crate::store::DocumentStore::transact

mod board;

pub use board::{KitchenBoard, TableTickets, active_snapshot, group_by_table, ready_snapshot};

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::TicketStatus;

/// Validate a status transition, returning the new status
pub fn transition(current: Option<TicketStatus>, target: TicketStatus) -> AppResult<TicketStatus> {
    match (current, target) {
        (None, TicketStatus::Prepared) => Ok(TicketStatus::Prepared),
        (Some(TicketStatus::Prepared), TicketStatus::Served) => Ok(TicketStatus::Served),
        (from, to) => Err(AppError::with_message(
            ErrorCode::TicketInvalidTransition,
            format!("cannot move ticket from {} to {:?}", status_name(from), to),
        )),
    }
}

fn status_name(status: Option<TicketStatus>) -> &'static str {
    match status {
        None => "active",
        Some(TicketStatus::Prepared) => "prepared",
        Some(TicketStatus::Served) => "served",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        assert_eq!(
            transition(None, TicketStatus::Prepared).unwrap(),
            TicketStatus::Prepared
        );
        assert_eq!(
            transition(Some(TicketStatus::Prepared), TicketStatus::Served).unwrap(),
            TicketStatus::Served
        );

        for (from, to) in [
            (None, TicketStatus::Served),
            (Some(TicketStatus::Prepared), TicketStatus::Prepared),
            (Some(TicketStatus::Served), TicketStatus::Prepared),
            (Some(TicketStatus::Served), TicketStatus::Served),
        ] {
            let err = transition(from, to).unwrap_err();
            assert_eq!(err.code, ErrorCode::TicketInvalidTransition);
        }
    }
}
