use chrono::Duration;
use uuid::Uuid;

use souq_domain::id::OrderId;
use souq_domain::order::{HandoffKind, OrderStatus};
use souq_handoff::domain::types::OrderChange;
use souq_handoff::error::{HandoffServiceError, Rejection};
use souq_handoff::usecase::generate::GenerateCodeInput;
use souq_handoff::usecase::status::{GetOrderStatusUseCase, SyncOrderStatusInput};

use crate::helpers::{Harness, t0, test_user};

fn sync(order_id: OrderId, status: OrderStatus) -> SyncOrderStatusInput {
    SyncOrderStatusInput { order_id, status }
}

#[tokio::test]
async fn should_register_unknown_order_in_preparing() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &[]);
    let new_order = OrderId(Uuid::now_v7());

    let state = h
        .syncer()
        .execute(sync(new_order, OrderStatus::Preparing))
        .await
        .unwrap();

    assert_eq!(state.status, OrderStatus::Preparing);
    assert_eq!(h.orders.status_of(new_order), Some(OrderStatus::Preparing));
    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].change, OrderChange::StatusSynced { from: None });
}

#[tokio::test]
async fn should_refuse_to_register_order_past_pickup() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &[]);
    let new_order = OrderId(Uuid::now_v7());

    let result = h
        .syncer()
        .execute(sync(new_order, OrderStatus::AwaitingDelivery))
        .await;

    assert!(
        matches!(
            result,
            Err(HandoffServiceError::Rejected(Rejection::InvalidState))
        ),
        "expected InvalidState, got {result:?}"
    );
    assert_eq!(h.orders.status_of(new_order), None);
}

#[tokio::test]
async fn should_mark_order_ready_for_pickup_and_allow_code() {
    let h = Harness::new(OrderStatus::Preparing, &["482193"]);
    let issue = || GenerateCodeInput {
        order_id: h.order_id,
        kind: HandoffKind::Pickup,
        issued_by: test_user(),
    };
    assert!(h.generator().execute(issue()).await.is_err());

    h.clock.advance(Duration::minutes(10));
    let state = h
        .syncer()
        .execute(sync(h.order_id, OrderStatus::AwaitingPickup))
        .await
        .unwrap();

    assert_eq!(state.status, OrderStatus::AwaitingPickup);
    assert_eq!(state.updated_at, t0() + Duration::minutes(10));
    let events = h.notifier.events();
    assert_eq!(
        events.last().map(|e| &e.change),
        Some(&OrderChange::StatusSynced {
            from: Some(OrderStatus::Preparing)
        })
    );
    assert!(h.generator().execute(issue()).await.is_ok());
}

#[tokio::test]
async fn should_never_set_handoff_gated_status() {
    for target in [
        OrderStatus::PickedUp,
        OrderStatus::AwaitingDelivery,
        OrderStatus::Delivered,
    ] {
        let h = Harness::new(OrderStatus::AwaitingPickup, &[]);
        let result = h.syncer().execute(sync(h.order_id, target)).await;
        assert!(
            matches!(
                result,
                Err(HandoffServiceError::Rejected(Rejection::InvalidState))
            ),
            "expected InvalidState for {target}, got {result:?}"
        );
        assert_eq!(h.status(), OrderStatus::AwaitingPickup);
    }
}

#[tokio::test]
async fn should_cancel_until_delivered() {
    for from in [
        OrderStatus::Preparing,
        OrderStatus::AwaitingPickup,
        OrderStatus::AwaitingDelivery,
    ] {
        let h = Harness::new(from, &[]);
        let state = h
            .syncer()
            .execute(sync(h.order_id, OrderStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(state.status, OrderStatus::Cancelled, "from {from}");
    }

    let h = Harness::new(OrderStatus::Delivered, &[]);
    let result = h
        .syncer()
        .execute(sync(h.order_id, OrderStatus::Cancelled))
        .await;
    assert!(
        matches!(
            result,
            Err(HandoffServiceError::Rejected(Rejection::InvalidState))
        ),
        "expected InvalidState, got {result:?}"
    );
}

#[tokio::test]
async fn should_treat_repeated_status_as_no_op() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &[]);

    let state = h
        .syncer()
        .execute(sync(h.order_id, OrderStatus::AwaitingPickup))
        .await
        .unwrap();

    assert_eq!(state.status, OrderStatus::AwaitingPickup);
    assert!(h.notifier.events().is_empty());
}

#[tokio::test]
async fn should_read_current_status() {
    let h = Harness::new(OrderStatus::AwaitingDelivery, &[]);
    let uc = GetOrderStatusUseCase {
        orders: h.orders.clone(),
    };

    let state = uc.execute(h.order_id).await.unwrap();
    assert_eq!(state.status, OrderStatus::AwaitingDelivery);

    let missing = uc.execute(OrderId(Uuid::now_v7())).await;
    assert!(
        matches!(missing, Err(HandoffServiceError::OrderNotFound)),
        "expected OrderNotFound, got {missing:?}"
    );
}
