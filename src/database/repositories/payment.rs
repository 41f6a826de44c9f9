//! Payment and price correction repository implementation

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use crate::models::payment::{
    Payment, PaymentState, RegistrationPriceCorrection,
    CreatePaymentRequest, CreatePriceCorrectionRequest,
};
use crate::utils::errors::EventDeskError;

/// Aggregated sum plus the number of rows that contributed to it. A None
/// total with zero rows distinguishes "nothing there" from "nets to zero".
#[derive(Debug, Clone, Copy)]
pub struct AmountAggregate {
    pub total: Option<Decimal>,
    pub rows: i64,
}

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new payment in pending state
    pub async fn create(&self, request: CreatePaymentRequest) -> Result<Payment, EventDeskError> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (registration_id, amount, status, gateway_id, gateway_status, created_at, updated_at)
            VALUES ($1, $2, 'pending', $3, $4, $5, $6)
            RETURNING id, registration_id, amount, status, gateway_id, gateway_status, "timestamp", created_at, updated_at
            "#
        )
        .bind(request.registration_id)
        .bind(request.amount)
        .bind(request.gateway_id)
        .bind(request.gateway_status.unwrap_or_default())
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Find payment by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Payment>, EventDeskError> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"SELECT id, registration_id, amount, status, gateway_id, gateway_status, "timestamp", created_at, updated_at FROM payments WHERE id = $1"#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Sum of completed payment amounts for a registration. Refunds are
    /// negative completed payments, so the total nets them out.
    pub async fn completed_total(&self, registration_id: i64) -> Result<AmountAggregate, EventDeskError> {
        let row: (Option<Decimal>, i64) = sqlx::query_as(
            "SELECT SUM(amount), COUNT(*) FROM payments WHERE registration_id = $1 AND status = 'completed'"
        )
        .bind(registration_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(AmountAggregate { total: row.0, rows: row.1 })
    }

    /// Number of payment rows of any status for a registration
    pub async fn count_for_registration(&self, registration_id: i64) -> Result<i64, EventDeskError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM payments WHERE registration_id = $1"
        )
        .bind(registration_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Persist a status update reported by the gateway
    pub async fn update_status(
        &self,
        id: i64,
        status: PaymentState,
        timestamp: Option<DateTime<Utc>>,
        gateway_status: &str,
    ) -> Result<Payment, EventDeskError> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = $2, "timestamp" = $3, gateway_status = $4, updated_at = $5
            WHERE id = $1
            RETURNING id, registration_id, amount, status, gateway_id, gateway_status, "timestamp", created_at, updated_at
            "#
        )
        .bind(id)
        .bind(status)
        .bind(timestamp)
        .bind(gateway_status)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Add a one-off price correction to a registration
    pub async fn add_correction(
        &self,
        request: CreatePriceCorrectionRequest,
    ) -> Result<RegistrationPriceCorrection, EventDeskError> {
        let correction = sqlx::query_as::<_, RegistrationPriceCorrection>(
            r#"
            INSERT INTO registration_price_corrections (registration_id, description, price, when_cancelled, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, registration_id, description, price, when_cancelled, created_at, updated_at
            "#
        )
        .bind(request.registration_id)
        .bind(request.description)
        .bind(request.price)
        .bind(request.when_cancelled)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(correction)
    }

    /// Sum of corrections matching the given cancellation flag
    pub async fn corrections_total(
        &self,
        registration_id: i64,
        when_cancelled: bool,
    ) -> Result<AmountAggregate, EventDeskError> {
        let row: (Option<Decimal>, i64) = sqlx::query_as(
            "SELECT SUM(price), COUNT(*) FROM registration_price_corrections WHERE registration_id = $1 AND when_cancelled = $2"
        )
        .bind(registration_id)
        .bind(when_cancelled)
        .fetch_one(&self.pool)
        .await?;

        Ok(AmountAggregate { total: row.0, rows: row.1 })
    }

    /// Sum of the prices of the registration's active priced options
    pub async fn option_price_total(&self, registration_id: i64) -> Result<AmountAggregate, EventDeskError> {
        let row: (Option<Decimal>, i64) = sqlx::query_as(
            r#"
            SELECT SUM(o.price), COUNT(*)
            FROM registration_field_options o
            JOIN registration_field_values v ON v.option_id = o.id
            WHERE v.registration_id = $1 AND v.active AND o.price IS NOT NULL
            "#
        )
        .bind(registration_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(AmountAggregate { total: row.0, rows: row.1 })
    }
}
