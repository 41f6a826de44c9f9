//! Payment and price correction models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Lifecycle state of a single payment row. Only completed payments count
/// toward the paid total; refunds are completed payments with a negative
/// amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
}

impl PaymentState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentState::Completed | PaymentState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
        }
    }
}

/// A payment for a registration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub registration_id: i64,
    /// Signed amount, negative = refund
    pub amount: Decimal,
    pub status: PaymentState,
    /// Gateway transaction id; null for manual payments, never empty
    pub gateway_id: Option<String>,
    /// Raw status string reported by the gateway, set iff gateway_id is
    pub gateway_status: String,
    /// Transaction date/time, set when the gateway reports a terminal outcome
    pub timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn is_gateway_payment(&self) -> bool {
        self.gateway_id.is_some()
    }
}

/// Terminal or still-open outcome reported by the payment gateway webhook
/// collaborator. The reconciliation never calls the gateway itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayOutcome {
    Completed { timestamp: DateTime<Utc> },
    Failed { timestamp: DateTime<Utc> },
    StillPending,
}

/// A one-off correction to the price of a single registration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationPriceCorrection {
    pub id: i64,
    pub registration_id: i64,
    pub description: String,
    pub price: Decimal,
    /// If and only if set, this correction applies while the registration is
    /// cancelled; otherwise it applies while it is not.
    pub when_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub registration_id: i64,
    pub amount: Decimal,
    pub gateway_id: Option<String>,
    pub gateway_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePriceCorrectionRequest {
    pub registration_id: i64,
    pub description: String,
    pub price: Decimal,
    pub when_cancelled: bool,
}

/// Derived payment standing of a registration, from the reconciliation
/// decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not in an admitted or cancelled status, nothing is due yet
    NotDue,
    /// No price and no payments ever
    Free,
    /// Payment due, nothing netted yet
    Open,
    /// Payment due, partially netted
    Partial,
    Paid,
    /// More paid than due
    Refundable,
    /// Nothing due and payments netted back out (or price corrected away)
    Refunded,
}

impl PaymentStatus {
    /// No further payment is needed from the user
    pub fn is_sufficient(self) -> bool {
        matches!(
            self,
            PaymentStatus::NotDue
                | PaymentStatus::Free
                | PaymentStatus::Paid
                | PaymentStatus::Refundable
                | PaymentStatus::Refunded
        )
    }

    /// The user still owes money
    pub fn is_payable(self) -> bool {
        matches!(self, PaymentStatus::Open | PaymentStatus::Partial)
    }
}

/// Result of reconciling a registration's price, corrections and payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    /// None means no priced component applies ("no price", distinct from a
    /// zero-cost priced item)
    pub price: Option<Decimal>,
    /// Sum of completed payments; None when no completed payments exist
    pub paid: Option<Decimal>,
    /// Defined only for admitted or cancelled registrations
    pub amount_due: Option<Decimal>,
    pub status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_state_terminality() {
        assert!(!PaymentState::Pending.is_terminal());
        assert!(PaymentState::Completed.is_terminal());
        assert!(PaymentState::Failed.is_terminal());
    }

    #[test]
    fn test_payment_status_groups() {
        assert!(PaymentStatus::Free.is_sufficient());
        assert!(PaymentStatus::Refunded.is_sufficient());
        assert!(!PaymentStatus::Open.is_sufficient());
        assert!(PaymentStatus::Partial.is_payable());
        assert!(!PaymentStatus::Paid.is_payable());
    }
}
