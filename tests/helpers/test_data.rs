//! Test data factories
//!
//! Helper functions for creating users with complete profiles, events with
//! form schemas, and registrations in a given lifecycle state.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use EventDesk::models::*;
use EventDesk::DatabaseService;

/// Create a user with a complete profile (address plus one emergency
/// contact), enough to pass preparation validation
pub async fn create_complete_user(db: &DatabaseService, first_name: &str) -> User {
    let user = db
        .users
        .create(CreateUserRequest {
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}-{}@example.com", first_name.to_lowercase(), Uuid::new_v4()),
        })
        .await
        .expect("Failed to create user");

    db.users
        .add_address(CreateAddressRequest {
            user_id: user.id,
            address: "Teststreet 1".to_string(),
            postalcode: "1234 AB".to_string(),
            city: "Testcity".to_string(),
            country: "Testland".to_string(),
        })
        .await
        .expect("Failed to create address");

    db.users
        .add_emergency_contact(CreateEmergencyContactRequest {
            user_id: user.id,
            contact_name: "Contact Person".to_string(),
            relation: "parent".to_string(),
            phone_number: "+31600000000".to_string(),
            remarks: String::new(),
        })
        .await
        .expect("Failed to create emergency contact");

    user
}

/// Create a public event whose registration opened yesterday
pub async fn create_open_event(db: &DatabaseService, slots: Option<i32>) -> Event {
    let now = Utc::now();
    db.events
        .create(CreateEventRequest {
            title: "Test Event".to_string(),
            description: Some("A test event".to_string()),
            start_date: now + Duration::days(7),
            end_date: now + Duration::days(9),
            slots,
            admit_immediately: true,
            registration_opens_at: Some(now - Duration::days(1)),
            registration_closes_at: None,
            public: true,
        })
        .await
        .expect("Failed to create event")
}

/// Update event columns tests need to tweak mid-scenario
pub async fn update_event(pool: &PgPool, event_id: i64, slots: Option<i32>, admit_immediately: bool) {
    sqlx::query("UPDATE events SET slots = $2, admit_immediately = $3, updated_at = NOW() WHERE id = $1")
        .bind(event_id)
        .bind(slots)
        .bind(admit_immediately)
        .execute(pool)
        .await
        .expect("Failed to update event");
}

/// Create a required choice field on an event
pub async fn create_choice_field(db: &DatabaseService, event_id: i64, name: &str) -> RegistrationField {
    create_field(db, event_id, name, FieldType::Choice, true).await
}

pub async fn create_field(
    db: &DatabaseService,
    event_id: i64,
    name: &str,
    field_type: FieldType,
    required: bool,
) -> RegistrationField {
    db.fields
        .create_field(CreateFieldRequest {
            event_id,
            sort_order: 1,
            title: name.to_string(),
            name: name.to_string(),
            field_type,
            depends_id: None,
            invite_only_id: None,
            allow_change_until: None,
            required,
        })
        .await
        .expect("Failed to create field")
}

/// Default option request; tests tweak the fields they care about
pub fn option_request(field_id: i64, title: &str) -> CreateFieldOptionRequest {
    CreateFieldOptionRequest {
        field_id,
        sort_order: 1,
        title: title.to_string(),
        depends_id: None,
        invite_only_id: None,
        slots: None,
        price: None,
        admit_immediately: None,
    }
}

pub async fn create_option(db: &DatabaseService, field_id: i64, title: &str) -> RegistrationFieldOption {
    db.fields
        .create_option(option_request(field_id, title))
        .await
        .expect("Failed to create option")
}

pub async fn create_option_with_slots(
    db: &DatabaseService,
    field_id: i64,
    title: &str,
    slots: i32,
) -> RegistrationFieldOption {
    let mut request = option_request(field_id, title);
    request.slots = Some(slots);
    db.fields
        .create_option(request)
        .await
        .expect("Failed to create option")
}

pub async fn create_priced_option(
    db: &DatabaseService,
    field_id: i64,
    title: &str,
    price: Decimal,
) -> RegistrationFieldOption {
    let mut request = option_request(field_id, title);
    request.price = Some(price);
    db.fields
        .create_option(request)
        .await
        .expect("Failed to create option")
}

/// Create a registration for a fresh user holding the given options, then
/// force it into the requested lifecycle state
pub async fn create_registration_with_options(
    db: &DatabaseService,
    pool: &PgPool,
    event_id: i64,
    options: &[&RegistrationFieldOption],
    status: RegistrationStatus,
) -> Registration {
    let user = create_complete_user(db, "Participant").await;
    create_registration_for_user(db, pool, event_id, user.id, options, status).await
}

pub async fn create_registration_for_user(
    db: &DatabaseService,
    pool: &PgPool,
    event_id: i64,
    user_id: i64,
    options: &[&RegistrationFieldOption],
    status: RegistrationStatus,
) -> Registration {
    let registration = db
        .start_registration(event_id, user_id)
        .await
        .expect("Failed to start registration");

    for option in options {
        db.set_field_value(
            registration.id,
            option.field_id,
            FieldValueContents::option(option.id),
        )
        .await
        .expect("Failed to set field value");
    }

    if status == RegistrationStatus::PreparationInProgress {
        return registration;
    }

    force_status(pool, registration.id, status).await;
    db.registrations
        .find_by_id(registration.id)
        .await
        .expect("Failed to re-read registration")
        .expect("Registration disappeared")
}

/// Insert an inactive (superseded) value row for an option
pub async fn add_inactive_value(pool: &PgPool, registration_id: i64, option: &RegistrationFieldOption) {
    sqlx::query(
        r#"
        INSERT INTO registration_field_values (registration_id, field_id, option_id, active, created_at, updated_at)
        VALUES ($1, $2, $3, FALSE, NOW(), NOW())
        "#,
    )
    .bind(registration_id)
    .bind(option.field_id)
    .bind(option.id)
    .execute(pool)
    .await
    .expect("Failed to insert inactive value");
}

/// Force a registration into a lifecycle state, bypassing the services.
/// Admitted states get a registration timestamp to satisfy the check
/// constraint.
pub async fn force_status(pool: &PgPool, registration_id: i64, status: RegistrationStatus) {
    let registered_at = status.is_admitted().then(Utc::now);
    sqlx::query(
        "UPDATE registrations SET status = $2, registered_at = COALESCE($3, registered_at), updated_at = NOW() WHERE id = $1",
    )
    .bind(registration_id)
    .bind(status)
    .bind(registered_at)
    .execute(pool)
    .await
    .expect("Failed to force registration status");
}

/// Create a completed payment, as it would look after the gateway webhook
pub async fn create_completed_payment(db: &DatabaseService, registration_id: i64, amount: Decimal) -> Payment {
    let payment = db
        .payments
        .create(CreatePaymentRequest {
            registration_id,
            amount,
            gateway_id: Some(format!("tr_{}", &Uuid::new_v4().simple().to_string()[..10])),
            gateway_status: Some("open".to_string()),
        })
        .await
        .expect("Failed to create payment");

    db.payments
        .update_status(payment.id, PaymentState::Completed, Some(Utc::now()), "paid")
        .await
        .expect("Failed to complete payment")
}
