//! Unified error codes for the Thali POS core
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Tenant errors
//! - 4xxx: Counter order / coupon errors
//! - 5xxx: Billing errors
//! - 6xxx: Catalog (counter items, menu) errors
//! - 7xxx: Table / kitchen errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// 所有错误码都以 u16 序列化，前端 (WebView / React Native) 直接按数字匹配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Session has expired
    SessionExpired = 1005,
    /// Email already registered
    EmailAlreadyRegistered = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin unlock required
    AdminRequired = 2003,
    /// Admin credentials are not configured for this tenant
    AdminNotConfigured = 2004,

    // ==================== 3xxx: Tenant ====================
    /// No tenant selected for this session
    TenantNotSelected = 3001,
    /// Tenant profile not found
    TenantNotFound = 3002,
    /// Operation not available for this system type
    SystemTypeMismatch = 3003,

    // ==================== 4xxx: Counter order ====================
    /// Counter order not found
    OrderNotFound = 4001,
    /// Order item not found
    OrderItemNotFound = 4006,
    /// Order has no items with positive quantity
    OrderEmpty = 4007,
    /// Removing the item would leave the order empty
    OrderLastItem = 4008,
    /// Another order placement is already in flight
    OrderInFlight = 4009,
    /// Coupon number allocation failed
    CouponAllocationFailed = 4010,
    /// Invalid quantity
    InvalidQuantity = 4011,
    /// Ledger entry not found
    LedgerEntryNotFound = 4012,

    // ==================== 5xxx: Billing ====================
    /// Bill not found
    BillNotFound = 5001,
    /// Bill is already paid
    BillAlreadyPaid = 5002,
    /// Invalid tax rate
    InvalidTaxRate = 5003,

    // ==================== 6xxx: Catalog ====================
    /// Counter item or menu item not found
    ProductNotFound = 6001,
    /// Invalid price
    ProductInvalidPrice = 6002,
    /// Item code already used by another counter item
    ProductCodeExists = 6004,

    // ==================== 7xxx: Table / Kitchen ====================
    /// Running table not found
    TableNotFound = 7001,
    /// Table identifier is not a valid number with optional split suffix
    InvalidTableNumber = 7005,
    /// Kitchen ticket not found
    TicketNotFound = 7101,
    /// Ticket status transition not allowed
    TicketInvalidTransition = 7102,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timed out
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Printer not available
    PrinterNotAvailable = 9201,
    /// Print failed
    PrintFailed = 9202,
    /// Concurrent update conflict
    TransactionConflict = 9301,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this represents a successful operation
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::InvalidFormat => "Invalid format",
            Self::RequiredField => "Required field missing",
            Self::ValueOutOfRange => "Value out of range",

            // Auth
            Self::NotAuthenticated => "Authentication required",
            Self::InvalidCredentials => "Invalid username or password",
            Self::SessionExpired => "Session has expired",
            Self::EmailAlreadyRegistered => "Email already registered",

            // Permission
            Self::PermissionDenied => "Permission denied",
            Self::AdminRequired => "Admin unlock required",
            Self::AdminNotConfigured => "Admin credentials not configured",

            // Tenant
            Self::TenantNotSelected => "No tenant selected",
            Self::TenantNotFound => "Tenant not found",
            Self::SystemTypeMismatch => "Not available for this system type",

            // Counter order
            Self::OrderNotFound => "Order not found",
            Self::OrderItemNotFound => "Order item not found",
            Self::OrderEmpty => "Order has no items",
            Self::OrderLastItem => "Cannot remove the last item",
            Self::OrderInFlight => "Order placement already in progress",
            Self::CouponAllocationFailed => "Coupon number allocation failed",
            Self::InvalidQuantity => "Invalid quantity",
            Self::LedgerEntryNotFound => "Ledger entry not found",

            // Billing
            Self::BillNotFound => "Bill not found",
            Self::BillAlreadyPaid => "Bill already paid",
            Self::InvalidTaxRate => "Invalid tax rate",

            // Catalog
            Self::ProductNotFound => "Item not found",
            Self::ProductInvalidPrice => "Invalid item price",
            Self::ProductCodeExists => "Item code already exists",

            // Table / Kitchen
            Self::TableNotFound => "Table not found",
            Self::InvalidTableNumber => "Invalid table number",
            Self::TicketNotFound => "Kitchen ticket not found",
            Self::TicketInvalidTransition => "Ticket status change not allowed",

            // System
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::NetworkError => "Network error",
            Self::TimeoutError => "Operation timed out",
            Self::ConfigError => "Configuration error",
            Self::PrinterNotAvailable => "Printer not available",
            Self::PrintFailed => "Print failed",
            Self::TransactionConflict => "Concurrent update conflict",
        }
    }

    /// 可以原样重试的错误（存储 / 网络 / 超时 / 并发冲突）
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError
                | Self::NetworkError
                | Self::TimeoutError
                | Self::TransactionConflict
        )
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when converting an unknown u16 to [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            6 => Self::InvalidFormat,
            7 => Self::RequiredField,
            8 => Self::ValueOutOfRange,

            1001 => Self::NotAuthenticated,
            1002 => Self::InvalidCredentials,
            1005 => Self::SessionExpired,
            1008 => Self::EmailAlreadyRegistered,

            2001 => Self::PermissionDenied,
            2003 => Self::AdminRequired,
            2004 => Self::AdminNotConfigured,

            3001 => Self::TenantNotSelected,
            3002 => Self::TenantNotFound,
            3003 => Self::SystemTypeMismatch,

            4001 => Self::OrderNotFound,
            4006 => Self::OrderItemNotFound,
            4007 => Self::OrderEmpty,
            4008 => Self::OrderLastItem,
            4009 => Self::OrderInFlight,
            4010 => Self::CouponAllocationFailed,
            4011 => Self::InvalidQuantity,
            4012 => Self::LedgerEntryNotFound,

            5001 => Self::BillNotFound,
            5002 => Self::BillAlreadyPaid,
            5003 => Self::InvalidTaxRate,

            6001 => Self::ProductNotFound,
            6002 => Self::ProductInvalidPrice,
            6004 => Self::ProductCodeExists,

            7001 => Self::TableNotFound,
            7005 => Self::InvalidTableNumber,
            7101 => Self::TicketNotFound,
            7102 => Self::TicketInvalidTransition,

            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::NetworkError,
            9004 => Self::TimeoutError,
            9005 => Self::ConfigError,
            9201 => Self::PrinterNotAvailable,
            9202 => Self::PrintFailed,
            9301 => Self::TransactionConflict,

            _ => return Err(InvalidErrorCode(value)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
