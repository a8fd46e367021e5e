//! API request/response types and error codes
//!
//! All responses use the `ApiResponse` envelope:
//! - code: 0 = success, non-zero = error code
//! - msg: short message description
//! - data: actual data (success) or absent (error)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::AccountId;

// ============================================================================
// Unified API Response Format
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
}

/// Deposit/withdraw request. Amount travels as a string to avoid float
/// precision issues in JSON.
#[derive(Debug, Deserialize)]
pub struct MutationRequest {
    pub account_id: AccountId,
    pub amount: String,
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Terminal result of a deposit/withdraw request.
#[derive(Debug, Serialize)]
pub struct MutationData {
    pub account_id: AccountId,
    /// COMMITTED or DEFERRED; rejections travel as error envelopes.
    pub status: &'static str,
    /// Post-commit balance; absent for deferred withdrawals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub version: &'static str,
    /// "ok" or "unreachable"
    pub store: &'static str,
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_FUNDS: i32 = 1002;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    /// Store down AND the fallback ledger write failed - never masked as an
    /// ordinary internal error.
    pub const FALLBACK_WRITE_FAILED: i32 = 5002;
}
