//! Payment reconciliation service
//!
//! Derives a registration's price, paid amount, amount due and payment
//! status from its active priced options, manual price corrections, and
//! payment records. Read-only over persisted rows; the one write path
//! applies gateway-reported outcomes to individual payments and never calls
//! the gateway itself.

use chrono::{DateTime, Duration, DurationRound, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::settings::PaymentsConfig;
use crate::database::repositories::AmountAggregate;
use crate::database::DatabaseService;
use crate::models::payment::{GatewayOutcome, Payment, PaymentState, PaymentStatus, PaymentSummary};
use crate::models::registration::RegistrationStatus;
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::logging;

#[derive(Debug, Clone)]
pub struct PaymentReconciliation {
    db: DatabaseService,
    config: PaymentsConfig,
}

impl PaymentReconciliation {
    /// Create a new PaymentReconciliation instance
    pub fn new(db: DatabaseService, config: PaymentsConfig) -> Self {
        Self { db, config }
    }

    /// Reconcile a registration's price, payments and corrections into a
    /// payment summary. Pure read; safe to recompute at any time.
    pub async fn payment_summary(&self, registration_id: i64) -> Result<PaymentSummary> {
        let registration = self
            .db
            .registrations
            .find_by_id(registration_id)
            .await?
            .ok_or(EventDeskError::RegistrationNotFound { registration_id })?;

        // Cancelled registrations are only charged their cancellation
        // corrections; everything else prices options plus normal
        // corrections.
        let price = if registration.status == RegistrationStatus::Cancelled {
            self.db.payments.corrections_total(registration_id, true).await?
        } else {
            let options = self.db.payments.option_price_total(registration_id).await?;
            let corrections = self.db.payments.corrections_total(registration_id, false).await?;
            combine(options, corrections)
        };

        let paid = self.db.payments.completed_total(registration_id).await?;
        let payment_rows = self.db.payments.count_for_registration(registration_id).await?;

        let summary = reconcile(
            registration.status,
            price,
            paid,
            payment_rows,
            self.config.decimal_places,
        );

        debug!(
            registration_id,
            status = ?summary.status,
            price = ?summary.price,
            paid = ?summary.paid,
            "Payment summary computed"
        );

        Ok(summary)
    }

    /// Apply a gateway-reported outcome to a payment.
    ///
    /// A pending payment may reach a terminal state exactly once, together
    /// with its transaction timestamp. A terminal payment must be reported
    /// unchanged; anything else is corrupt gateway data.
    pub async fn record_gateway_outcome(
        &self,
        payment_id: i64,
        outcome: GatewayOutcome,
        gateway_status: &str,
    ) -> Result<Payment> {
        let payment = self
            .db
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or(EventDeskError::PaymentNotFound { payment_id })?;

        if !payment.is_gateway_payment() {
            return Err(EventDeskError::Integrity(format!(
                "Payment {} is not a gateway payment",
                payment_id
            )));
        }

        let (new_state, new_timestamp) = match outcome {
            GatewayOutcome::Completed { timestamp } => {
                (PaymentState::Completed, Some(truncate_to_stored_precision(timestamp)))
            }
            GatewayOutcome::Failed { timestamp } => {
                (PaymentState::Failed, Some(truncate_to_stored_precision(timestamp)))
            }
            GatewayOutcome::StillPending => (PaymentState::Pending, None),
        };

        if payment.status == PaymentState::Pending {
            let updated = self
                .db
                .payments
                .update_status(payment.id, new_state, new_timestamp, gateway_status)
                .await?;

            if new_state.is_terminal() {
                logging::log_payment_update(
                    payment_id,
                    payment.registration_id,
                    updated.status.as_str(),
                    Some(gateway_status),
                );
            }

            return Ok(updated);
        }

        // Already terminal: the gateway must agree with what we stored
        if payment.status != new_state {
            return Err(EventDeskError::Integrity(format!(
                "Payment {} status changed after a terminal outcome",
                payment_id
            )));
        }
        if payment.timestamp != new_timestamp {
            return Err(EventDeskError::Integrity(format!(
                "Payment {} timestamp changed after a terminal outcome",
                payment_id
            )));
        }

        self.db
            .payments
            .update_status(payment.id, payment.status, payment.timestamp, gateway_status)
            .await
    }
}

/// Timestamps are stored with microsecond precision; comparing a stored
/// value against a fresh one must not trip over sub-microsecond digits
fn truncate_to_stored_precision(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .duration_trunc(Duration::microseconds(1))
        .unwrap_or(timestamp)
}

/// Merge two priced aggregates, keeping "no components" distinct from a
/// zero total
fn combine(a: AmountAggregate, b: AmountAggregate) -> AmountAggregate {
    let rows = a.rows + b.rows;
    let total = match (a.total, b.total) {
        (None, None) => None,
        (x, y) => Some(x.unwrap_or_default() + y.unwrap_or_default()),
    };
    AmountAggregate { total, rows }
}

/// The payment status decision table, first matching rule wins.
///
/// `price.rows == 0` means no priced component applies ("no price"), which
/// is distinct from components summing to zero. `paid` covers completed
/// payments only, while `payment_rows` counts rows of any status so a free
/// registration with aborted payment attempts is not reported as free.
fn reconcile(
    status: RegistrationStatus,
    price: AmountAggregate,
    paid: AmountAggregate,
    payment_rows: i64,
    decimal_places: u32,
) -> PaymentSummary {
    let price_total = (price.rows > 0)
        .then(|| price.total.unwrap_or_default().round_dp(decimal_places));
    let paid_total = (paid.rows > 0)
        .then(|| paid.total.unwrap_or_default().round_dp(decimal_places));

    if !status.is_billable() {
        return PaymentSummary {
            price: price_total,
            paid: paid_total,
            amount_due: None,
            status: PaymentStatus::NotDue,
        };
    }

    let due = price_total.unwrap_or_default() - paid_total.unwrap_or_default();
    let paid_amount = paid_total.unwrap_or_default();

    let payment_status = if due > Decimal::ZERO {
        if paid_amount == Decimal::ZERO {
            PaymentStatus::Open
        } else {
            PaymentStatus::Partial
        }
    } else if due < Decimal::ZERO {
        PaymentStatus::Refundable
    } else if paid_amount > Decimal::ZERO {
        PaymentStatus::Paid
    } else if price_total.is_none() && paid_amount == Decimal::ZERO && payment_rows == 0 {
        PaymentStatus::Free
    } else {
        // Priced components or payment rows exist but everything nets to
        // zero (or below): money has moved and moved back
        PaymentStatus::Refunded
    };

    PaymentSummary {
        price: price_total,
        paid: paid_total,
        amount_due: Some(due),
        status: payment_status,
    }
}
