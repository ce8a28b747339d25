use chrono::Duration;
use uuid::Uuid;

use souq_domain::id::OrderId;
use souq_domain::order::{HandoffKind, OrderStatus, VerificationMethod};
use souq_handoff::domain::code::PresentedCode;
use souq_handoff::domain::types::DeliveryProof;
use souq_handoff::error::HandoffServiceError;
use souq_handoff::usecase::complete::CompleteHandoffInput;
use souq_handoff::usecase::generate::GenerateCodeInput;

use crate::helpers::{Harness, seeded_record, t0, test_user};

#[tokio::test]
async fn should_keep_every_issued_code_as_audit_trail() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &["111111", "482193"]);
    let vendor = test_user();
    let driver = test_user();
    let issue = || GenerateCodeInput {
        order_id: h.order_id,
        kind: HandoffKind::Pickup,
        issued_by: vendor,
    };
    h.generator().execute(issue()).await.unwrap();
    h.clock.advance(Duration::minutes(1));
    h.generator().execute(issue()).await.unwrap();
    h.clock.advance(Duration::minutes(1));
    h.completer()
        .execute(CompleteHandoffInput {
            order_id: h.order_id,
            kind: HandoffKind::Pickup,
            presented: PresentedCode::Otp("482193".into()),
            verified_by: driver,
            proof: DeliveryProof::default(),
        })
        .await
        .unwrap();

    let records = h.history().execute(h.order_id).await.unwrap();

    assert_eq!(records.len(), 2);
    assert!(records[0].superseded_at.is_some());
    assert!(records[0].consumed_at.is_none());
    assert!(records[1].superseded_at.is_none());
    assert_eq!(records[1].verified_by, Some(driver));
    assert_eq!(records[1].verified_method, Some(VerificationMethod::Otp));
    assert!(records.iter().all(|r| r.issued_by == vendor));
}

#[tokio::test]
async fn should_return_order_not_found_for_unknown_order_history() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &[]);

    let result = h.history().execute(OrderId(Uuid::now_v7())).await;

    assert!(
        matches!(result, Err(HandoffServiceError::OrderNotFound)),
        "expected OrderNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_record_delivery_proof_with_consumption() {
    let h = Harness::new(OrderStatus::AwaitingDelivery, &[]);
    h.handoffs
        .seed(seeded_record(h.order_id, HandoffKind::Delivery, "017745", t0()));
    let proof = DeliveryProof {
        signature_data: Some("data:image/png;base64,iVBORw0".into()),
        photo_url: Some("https://cdn.souq.test/p/1.jpg".into()),
    };

    let output = h
        .completer()
        .execute(CompleteHandoffInput {
            order_id: h.order_id,
            kind: HandoffKind::Delivery,
            presented: PresentedCode::Otp("017745".into()),
            verified_by: test_user(),
            proof: proof.clone(),
        })
        .await
        .unwrap();

    assert_eq!(output.accepted.record.proof, proof);
    let records = h.history().execute(h.order_id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].proof, proof);
}

#[tokio::test]
async fn should_not_keep_proof_on_pickup() {
    let h = Harness::new(OrderStatus::AwaitingPickup, &[]);
    h.handoffs
        .seed(seeded_record(h.order_id, HandoffKind::Pickup, "482193", t0()));

    h.completer()
        .execute(CompleteHandoffInput {
            order_id: h.order_id,
            kind: HandoffKind::Pickup,
            presented: PresentedCode::Otp("482193".into()),
            verified_by: test_user(),
            proof: DeliveryProof {
                signature_data: Some("scribble".into()),
                photo_url: None,
            },
        })
        .await
        .unwrap();

    let records = h.history().execute(h.order_id).await.unwrap();
    assert!(records[0].consumed_at.is_some());
    assert_eq!(records[0].proof, DeliveryProof::default());
}
