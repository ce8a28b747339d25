use chrono::Duration;
use uuid::Uuid;

use souq_domain::id::OrderId;
use souq_domain::order::{HandoffKind, OrderStatus};
use souq_handoff::domain::code::CodePayload;
use souq_handoff::domain::policy::HandoffPolicy;
use souq_handoff::domain::types::OrderChange;
use souq_handoff::error::{HandoffServiceError, Rejection};
use souq_handoff::usecase::generate::{GenerateCodeInput, GenerateCodeUseCase};

use crate::helpers::{FailingNotifier, Harness, seeded_record, t0, test_user};

fn input(h: &Harness, kind: HandoffKind) -> GenerateCodeInput {
    GenerateCodeInput {
        order_id: h.order_id,
        kind,
        issued_by: test_user(),
    }
}

#[tokio::test]
async fn should_issue_pickup_code_for_order_awaiting_pickup() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &["482193"]);

    let record = h
        .generator()
        .execute(input(&h, HandoffKind::Pickup))
        .await
        .unwrap();

    assert_eq!(record.otp.as_str(), "482193");
    assert_eq!(record.kind, HandoffKind::Pickup);
    assert_eq!(record.issued_at, t0());
    assert_eq!(record.expires_at, t0() + Duration::minutes(15));
    assert!(record.consumed_at.is_none(), "new code should not be consumed");

    let payload = CodePayload::decode(&record.code_payload).unwrap();
    assert_eq!(payload.order_id, h.order_id);
    assert_eq!(payload.kind, HandoffKind::Pickup);
    assert_eq!(payload.otp, "482193");
    assert_eq!(payload.issued_at, record.issued_at);

    let stored = h.handoffs.records_handle();
    assert_eq!(stored.lock().unwrap().len(), 1, "expected exactly one record");
}

#[tokio::test]
async fn should_give_delivery_code_the_longer_window() {
    let h = Harness::new(OrderStatus::AwaitingDelivery, &["017745"]);

    let record = h
        .generator()
        .execute(input(&h, HandoffKind::Delivery))
        .await
        .unwrap();

    assert_eq!(record.expires_at, t0() + Duration::minutes(30));
    assert_eq!(record.seconds_remaining(t0()), 30 * 60);
}

#[tokio::test]
async fn should_truncate_issue_time_to_millis() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &[]);
    h.clock.set(t0() + Duration::nanoseconds(1_234_567));

    let record = h
        .generator()
        .execute(input(&h, HandoffKind::Pickup))
        .await
        .unwrap();

    assert_eq!(record.issued_at, t0() + Duration::milliseconds(1));
}

#[tokio::test]
async fn should_reject_issue_when_status_does_not_permit_the_leg() {
    let cases = [
        (OrderStatus::Preparing, HandoffKind::Pickup),
        (OrderStatus::PickedUp, HandoffKind::Pickup),
        (OrderStatus::Delivered, HandoffKind::Pickup),
        (OrderStatus::AwaitingPickup, HandoffKind::Delivery),
        (OrderStatus::Delivered, HandoffKind::Delivery),
        (OrderStatus::Cancelled, HandoffKind::Delivery),
    ];
    for (status, kind) in cases {
        let h = Harness::new(status, &[]);
        let result = h.generator().execute(input(&h, kind)).await;
        assert!(
            matches!(
                result,
                Err(HandoffServiceError::Rejected(Rejection::InvalidState))
            ),
            "expected InvalidState for {kind} in {status}, got {result:?}"
        );
        assert!(h.handoffs.records_handle().lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn should_return_order_not_found_for_unknown_order() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &[]);

    let result = h
        .generator()
        .execute(GenerateCodeInput {
            order_id: OrderId(Uuid::now_v7()),
            kind: HandoffKind::Pickup,
            issued_by: test_user(),
        })
        .await;

    assert!(
        matches!(result, Err(HandoffServiceError::OrderNotFound)),
        "expected OrderNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_supersede_previous_code_on_regenerate() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &["111111", "222222"]);

    let first = h
        .generator()
        .execute(input(&h, HandoffKind::Pickup))
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(2));
    let second = h
        .generator()
        .execute(input(&h, HandoffKind::Pickup))
        .await
        .unwrap();

    let records = h.handoffs.records_handle();
    let records = records.lock().unwrap();
    assert_eq!(records.len(), 2, "regeneration keeps the old row for audit");
    let old = records.iter().find(|r| r.id == first.id).unwrap();
    assert_eq!(old.superseded_at, Some(second.issued_at));
    let active: Vec<_> = records.iter().filter(|r| r.superseded_at.is_none()).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second.id);
}

#[tokio::test]
async fn should_leave_other_leg_untouched() {
    let h = Harness::new(OrderStatus::AwaitingDelivery, &["017745"]);
    let mut pickup = seeded_record(h.order_id, HandoffKind::Pickup, "482193", t0());
    pickup.consumed_at = Some(t0() + Duration::minutes(3));
    let pickup_id = pickup.id;
    h.handoffs.seed(pickup);

    h.generator()
        .execute(input(&h, HandoffKind::Delivery))
        .await
        .unwrap();

    let pickup = h.handoffs.active(h.order_id, HandoffKind::Pickup).unwrap();
    assert_eq!(pickup.id, pickup_id);
    assert!(pickup.superseded_at.is_none());
}

#[tokio::test]
async fn should_reuse_current_code_on_ensure() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &["482193", "999999"]);

    let first = h
        .generator()
        .ensure(input(&h, HandoffKind::Pickup))
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(5));
    let again = h
        .generator()
        .ensure(input(&h, HandoffKind::Pickup))
        .await
        .unwrap();

    assert_eq!(again.id, first.id);
    assert_eq!(again.otp.as_str(), "482193");
    assert_eq!(h.notifier.events().len(), 1, "reuse must not announce a new code");
}

#[tokio::test]
async fn should_hand_concurrent_ensure_callers_the_same_code() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &["111111", "222222"]);
    let vendor_screen = h.generator();
    let admin_screen = h.generator();

    let (a, b) = tokio::join!(
        vendor_screen.ensure(input(&h, HandoffKind::Pickup)),
        admin_screen.ensure(input(&h, HandoffKind::Pickup)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.id, b.id, "a={} b={}", a.otp, b.otp);
    assert_eq!(h.handoffs.records_handle().lock().unwrap().len(), 1);
    assert_eq!(
        h.handoffs.active(h.order_id, HandoffKind::Pickup).map(|r| r.id),
        Some(a.id)
    );
    assert_eq!(h.notifier.events().len(), 1);
}

#[tokio::test]
async fn should_reissue_on_ensure_once_current_code_expired() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &["482193", "555123"]);

    let first = h
        .generator()
        .ensure(input(&h, HandoffKind::Pickup))
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(15) + Duration::seconds(1));
    let fresh = h
        .generator()
        .ensure(input(&h, HandoffKind::Pickup))
        .await
        .unwrap();

    assert_ne!(fresh.id, first.id);
    assert_eq!(fresh.otp.as_str(), "555123");
    let old = h.handoffs.records_handle();
    let old = old.lock().unwrap();
    assert!(old.iter().any(|r| r.id == first.id && r.superseded_at.is_some()));
}

#[tokio::test]
async fn should_announce_new_code_without_secrets() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &["482193"]);

    let record = h
        .generator()
        .execute(input(&h, HandoffKind::Pickup))
        .await
        .unwrap();

    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].order_id, h.order_id);
    assert_eq!(events[0].status, OrderStatus::AwaitingPickup);
    assert_eq!(
        events[0].change,
        OrderChange::CodeIssued {
            kind: HandoffKind::Pickup,
            expires_at: record.expires_at,
        }
    );
    let json = serde_json::to_string(&events[0]).unwrap();
    assert!(!json.contains("482193"), "event leaked the otp: {json}");
}

#[tokio::test]
async fn should_issue_even_when_notifier_fails() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &["482193"]);
    let uc = GenerateCodeUseCase {
        orders: h.orders.clone(),
        handoffs: h.handoffs.clone(),
        notifier: FailingNotifier,
        clock: h.clock.clone(),
        otps: h.otps.clone(),
        policy: HandoffPolicy::default(),
    };

    let record = uc.execute(input(&h, HandoffKind::Pickup)).await.unwrap();

    assert_eq!(
        h.handoffs.active(h.order_id, HandoffKind::Pickup).map(|r| r.id),
        Some(record.id)
    );
}
