//! Integration tests for the slot allocation transaction
//!
//! Covers capacity limits on events and options, admission immediacy,
//! double-finalization, waiting list ordering, and concurrent finalization.

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;

use helpers::database_helper::TestDatabase;
use helpers::test_data::*;
use EventDesk::models::*;
use EventDesk::services::ServiceFactory;
use EventDesk::{DatabaseService, EventDeskError, Settings};

async fn setup() -> (TestDatabase, DatabaseService, ServiceFactory) {
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db.cleanup().await.expect("Failed to clean test database");

    let db = DatabaseService::new(test_db.pool.clone());
    let services = ServiceFactory::new(&Settings::default(), db.clone());

    (test_db, db, services)
}

#[tokio::test]
#[serial]
async fn test_event_fills_up() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, Some(2)).await;

    let mut statuses = Vec::new();
    for i in 0..3 {
        let user = create_complete_user(&db, &format!("User{}", i)).await;
        let registration = create_registration_for_user(
            &db,
            &test_db.pool,
            event.id,
            user.id,
            &[],
            RegistrationStatus::PreparationComplete,
        )
        .await;

        let finalized = services
            .registrations
            .finalize_registration(registration.id)
            .await
            .expect("Finalization failed");
        statuses.push(finalized.status);
    }

    assert_eq!(
        statuses,
        vec![
            RegistrationStatus::Registered,
            RegistrationStatus::Registered,
            RegistrationStatus::Waitinglist,
        ]
    );

    // The capacity invariant holds: never more registered than slots
    let registered = db
        .registrations
        .count_with_status(event.id, RegistrationStatus::Registered)
        .await
        .unwrap();
    assert_eq!(registered, 2);
}

#[tokio::test]
#[serial]
async fn test_option_fills_up() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, None).await;
    let field = create_choice_field(&db, event.id, "bunk").await;
    let limited = create_option_with_slots(&db, field.id, "Bottom bunk", 2).await;

    for _ in 0..2 {
        let registration = create_registration_with_options(
            &db,
            &test_db.pool,
            event.id,
            &[&limited],
            RegistrationStatus::PreparationComplete,
        )
        .await;
        let finalized = services
            .registrations
            .finalize_registration(registration.id)
            .await
            .unwrap();
        assert_eq!(finalized.status, RegistrationStatus::Registered);
    }

    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[&limited],
        RegistrationStatus::PreparationComplete,
    )
    .await;
    let finalized = services
        .registrations
        .finalize_registration(registration.id)
        .await
        .unwrap();
    assert_eq!(finalized.status, RegistrationStatus::Waitinglist);
}

#[tokio::test]
#[serial]
async fn test_last_slot_sets_full_cache() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, Some(1)).await;
    let field = create_choice_field(&db, event.id, "bunk").await;
    let limited = create_option_with_slots(&db, field.id, "Bottom bunk", 1).await;

    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[&limited],
        RegistrationStatus::PreparationComplete,
    )
    .await;
    services
        .registrations
        .finalize_registration(registration.id)
        .await
        .unwrap();

    let option = db.fields.find_option(limited.id).await.unwrap().unwrap();
    assert!(option.full);
    let event = db.events.find_by_id(event.id).await.unwrap().unwrap();
    assert!(event.full);
}

#[tokio::test]
#[serial]
async fn test_admit_immediately_false_always_pends() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, Some(1)).await;
    update_event(&test_db.pool, event.id, Some(1), false).await;

    // Four finalizations all pend, regardless of the single slot
    for i in 0..4 {
        let user = create_complete_user(&db, &format!("Pending{}", i)).await;
        let registration = create_registration_for_user(
            &db,
            &test_db.pool,
            event.id,
            user.id,
            &[],
            RegistrationStatus::PreparationComplete,
        )
        .await;
        let finalized = services
            .registrations
            .finalize_registration(registration.id)
            .await
            .unwrap();
        assert_eq!(finalized.status, RegistrationStatus::Pending);
    }

    // Slot usage is untouched by pending registrations
    let registered = db
        .registrations
        .count_with_status(event.id, RegistrationStatus::Registered)
        .await
        .unwrap();
    assert_eq!(registered, 0);
    let event = db.events.find_by_id(event.id).await.unwrap().unwrap();
    assert!(!event.full);
}

#[tokio::test]
#[serial]
async fn test_selected_option_admit_immediately_overrides_event() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, Some(3)).await;
    update_event(&test_db.pool, event.id, Some(3), false).await;

    let field = create_choice_field(&db, event.id, "type").await;
    let mut request = option_request(field.id, "Crew");
    request.admit_immediately = Some(true);
    let crew = db.fields.create_option(request).await.unwrap();

    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[&crew],
        RegistrationStatus::PreparationComplete,
    )
    .await;
    let finalized = services
        .registrations
        .finalize_registration(registration.id)
        .await
        .unwrap();
    assert_eq!(finalized.status, RegistrationStatus::Registered);
}

#[tokio::test]
#[serial]
async fn test_unselected_option_admit_immediately_has_no_effect() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, Some(3)).await;
    update_event(&test_db.pool, event.id, Some(3), false).await;

    let field = create_choice_field(&db, event.id, "type").await;
    let mut request = option_request(field.id, "Crew");
    request.admit_immediately = Some(true);
    let _crew = db.fields.create_option(request).await.unwrap();
    let player = create_option(&db, field.id, "Player").await;

    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[&player],
        RegistrationStatus::PreparationComplete,
    )
    .await;
    let finalized = services
        .registrations
        .finalize_registration(registration.id)
        .await
        .unwrap();
    assert_eq!(finalized.status, RegistrationStatus::Pending);
}

#[tokio::test]
#[serial]
async fn test_finalize_twice_fails_and_changes_nothing() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, Some(5)).await;

    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[],
        RegistrationStatus::PreparationComplete,
    )
    .await;

    let finalized = services
        .registrations
        .finalize_registration(registration.id)
        .await
        .unwrap();
    assert_eq!(finalized.status, RegistrationStatus::Registered);

    let result = services.registrations.finalize_registration(registration.id).await;
    assert_matches!(result, Err(EventDeskError::Validation(_)));

    // The stored status and timestamp are unchanged by the failed call
    let unchanged = db.registrations.find_by_id(registration.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, RegistrationStatus::Registered);
    assert_eq!(unchanged.registered_at, finalized.registered_at);
}

#[tokio::test]
#[serial]
async fn test_finalize_requires_completed_preparation() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, None).await;

    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[],
        RegistrationStatus::PreparationInProgress,
    )
    .await;

    let result = services.registrations.finalize_registration(registration.id).await;
    assert_matches!(result, Err(EventDeskError::Validation(_)));
}

#[tokio::test]
#[serial]
async fn test_finalize_requires_open_registration_window() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, None).await;
    // Push the opening time into the future
    sqlx::query("UPDATE events SET registration_opens_at = NOW() + INTERVAL '1 day' WHERE id = $1")
        .bind(event.id)
        .execute(&test_db.pool)
        .await
        .unwrap();

    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[],
        RegistrationStatus::PreparationComplete,
    )
    .await;

    let result = services.registrations.finalize_registration(registration.id).await;
    assert_matches!(result, Err(EventDeskError::Validation(_)));
}

#[tokio::test]
#[serial]
async fn test_inactive_values_do_not_consume_slots() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, None).await;
    let field = create_choice_field(&db, event.id, "bunk").await;
    let limited = create_option_with_slots(&db, field.id, "Bottom bunk", 2).await;

    // Two admitted registrations whose option values were later superseded
    for _ in 0..2 {
        let registration = create_registration_with_options(
            &db,
            &test_db.pool,
            event.id,
            &[&limited],
            RegistrationStatus::Registered,
        )
        .await;
        sqlx::query("UPDATE registration_field_values SET active = FALSE WHERE registration_id = $1")
            .bind(registration.id)
            .execute(&test_db.pool)
            .await
            .unwrap();
    }

    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[&limited],
        RegistrationStatus::PreparationComplete,
    )
    .await;
    let finalized = services
        .registrations
        .finalize_registration(registration.id)
        .await
        .unwrap();
    assert_eq!(finalized.status, RegistrationStatus::Registered);
}

#[tokio::test]
#[serial]
async fn test_own_inactive_value_does_not_block() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, None).await;
    let field = create_choice_field(&db, event.id, "origin").await;
    let full_option = create_option_with_slots(&db, field.id, "NL", 2).await;
    let open_option = create_option_with_slots(&db, field.id, "INTL", 2).await;

    for _ in 0..2 {
        let registration = create_registration_with_options(
            &db,
            &test_db.pool,
            event.id,
            &[&full_option],
            RegistrationStatus::Registered,
        )
        .await;
        assert!(registration.registered_at.is_some());
    }

    // Changed from the full option to the open one; the superseded value
    // remains as an inactive row
    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[&open_option],
        RegistrationStatus::PreparationComplete,
    )
    .await;
    add_inactive_value(&test_db.pool, registration.id, &full_option).await;

    let finalized = services
        .registrations
        .finalize_registration(registration.id)
        .await
        .unwrap();
    assert_eq!(finalized.status, RegistrationStatus::Registered);
}

#[tokio::test]
#[serial]
async fn test_waitinglist_order_follows_admission_order() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, Some(1)).await;

    let mut waitlisted = Vec::new();
    for i in 0..4 {
        let user = create_complete_user(&db, &format!("Waiter{}", i)).await;
        let registration = create_registration_for_user(
            &db,
            &test_db.pool,
            event.id,
            user.id,
            &[],
            RegistrationStatus::PreparationComplete,
        )
        .await;
        let finalized = services
            .registrations
            .finalize_registration(registration.id)
            .await
            .unwrap();
        if finalized.status == RegistrationStatus::Waitinglist {
            waitlisted.push(finalized);
        }
    }

    assert_eq!(waitlisted.len(), 3);
    for (expected_rank, registration) in waitlisted.iter().enumerate() {
        let above = db.registrations.waitinglist_above(registration).await.unwrap();
        assert_eq!(above, expected_rank as i64);
    }
}

#[tokio::test]
#[serial]
async fn test_concurrent_finalization_admits_exactly_one() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, Some(1)).await;

    let user_a = create_complete_user(&db, "Racer-A").await;
    let user_b = create_complete_user(&db, "Racer-B").await;
    let reg_a = create_registration_for_user(
        &db,
        &test_db.pool,
        event.id,
        user_a.id,
        &[],
        RegistrationStatus::PreparationComplete,
    )
    .await;
    let reg_b = create_registration_for_user(
        &db,
        &test_db.pool,
        event.id,
        user_b.id,
        &[],
        RegistrationStatus::PreparationComplete,
    )
    .await;

    let services_a = services.clone();
    let services_b = services.clone();
    let (result_a, result_b) = tokio::join!(
        services_a.registrations.finalize_registration(reg_a.id),
        services_b.registrations.finalize_registration(reg_b.id),
    );

    let status_a = result_a.unwrap().status;
    let status_b = result_b.unwrap().status;

    // Both calls succeed, but the event lock serializes them: exactly one
    // gets the slot
    let mut statuses = [status_a, status_b];
    statuses.sort_by_key(|s| s.as_str());
    assert_eq!(
        statuses,
        [RegistrationStatus::Registered, RegistrationStatus::Waitinglist]
    );

    let registered = db
        .registrations
        .count_with_status(event.id, RegistrationStatus::Registered)
        .await
        .unwrap();
    assert_eq!(registered, 1);
}

#[tokio::test]
#[serial]
async fn test_concurrent_double_submit_admits_once() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, Some(5)).await;

    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[],
        RegistrationStatus::PreparationComplete,
    )
    .await;

    // The same registration submitted twice at once: the user lock plus the
    // post-lock freshness check let exactly one call through
    let services_a = services.clone();
    let services_b = services.clone();
    let (result_a, result_b) = tokio::join!(
        services_a.registrations.finalize_registration(registration.id),
        services_b.registrations.finalize_registration(registration.id),
    );

    let succeeded = [&result_a, &result_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    let failed = if result_a.is_err() { result_a } else { result_b };
    assert_matches!(failed, Err(EventDeskError::Validation(_)));

    let stored = db.registrations.find_by_id(registration.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RegistrationStatus::Registered);
    assert!(stored.registered_at.is_some());
}

#[tokio::test]
#[serial]
async fn test_cancel_registration() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, None).await;

    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[],
        RegistrationStatus::Registered,
    )
    .await;

    let cancelled = services
        .registrations
        .cancel_registration(registration.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, RegistrationStatus::Cancelled);

    // Cancelling twice is an invalid transition
    let result = services.registrations.cancel_registration(registration.id).await;
    assert_matches!(result, Err(EventDeskError::InvalidStateTransition { .. }));

    // A cancelled registration does not block a fresh one for the same user
    let fresh = db
        .start_registration(event.id, registration.user_id)
        .await
        .unwrap();
    assert_ne!(fresh.id, registration.id);
    assert_eq!(fresh.status, RegistrationStatus::PreparationInProgress);
}

#[tokio::test]
#[serial]
async fn test_cancel_requires_non_initial_state() {
    let (test_db, db, services) = setup().await;
    let event = create_open_event(&db, None).await;

    let registration = create_registration_with_options(
        &db,
        &test_db.pool,
        event.id,
        &[],
        RegistrationStatus::PreparationInProgress,
    )
    .await;

    let result = services.registrations.cancel_registration(registration.id).await;
    assert_matches!(result, Err(EventDeskError::InvalidStateTransition { .. }));
}
