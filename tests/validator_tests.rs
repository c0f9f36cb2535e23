// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in validator behavior.
//!
//! These tests pin down the verdict for every kind of scan:
//! 1. Registered tokens for the right event are accepted
//! 2. Tokens for another event are reported as wrong-event, not denied
//! 3. Registry outages surface as errors, never as "not registered"
//! 4. Garbage payloads and images are malformed verdicts

use chrono::{TimeZone, Utc};
use image::{DynamicImage, GrayImage, Luma};
use uniclubs_checkin::models::{CheckinToken, CheckinVerdict, EventId, UserId};
use uniclubs_checkin::services::validator::{MAX_PAYLOAD_LEN, PAYLOAD_TOO_LONG, UNREADABLE_CODE};
use uniclubs_checkin::services::{
    CheckinError, CheckinTokenCodec, CheckinValidator, InMemoryRegistry, ScanInput,
};

const ISSUED_AT: u64 = 1_716_400_000;

fn payload(user: u64, event: u64) -> String {
    CheckinTokenCodec::default().encode(&CheckinToken::new(UserId(user), EventId(event), ISSUED_AT))
}

/// Registry with user 1 registered for event 5.
fn registry() -> InMemoryRegistry {
    let registry = InMemoryRegistry::new();
    registry.register(
        UserId(1),
        EventId(5),
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
    );
    registry
}

fn validator(registry: InMemoryRegistry) -> CheckinValidator<InMemoryRegistry> {
    CheckinValidator::new(registry, CheckinTokenCodec::default())
}

#[tokio::test]
async fn test_registered_token_is_valid() {
    let validator = validator(registry());

    let verdict = validator
        .validate_payload(&payload(1, 5), EventId(5))
        .await
        .unwrap();

    assert_eq!(
        verdict,
        CheckinVerdict::Valid {
            user_id: UserId(1),
            event_id: EventId(5),
            registered_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()),
        }
    );
}

#[tokio::test]
async fn test_unregistered_token_is_denied() {
    let validator = validator(registry());

    let verdict = validator
        .validate_payload(&payload(2, 5), EventId(5))
        .await
        .unwrap();

    assert_eq!(verdict, CheckinVerdict::NotRegistered { user_id: UserId(2) });
}

#[tokio::test]
async fn test_token_for_other_event_is_wrong_event() {
    let validator = validator(registry());

    let verdict = validator
        .validate_payload(&payload(1, 5), EventId(9))
        .await
        .unwrap();

    assert_eq!(
        verdict,
        CheckinVerdict::WrongEvent {
            user_id: UserId(1),
            token_event_id: EventId(5),
            expected_event_id: EventId(9),
        }
    );
}

#[tokio::test]
async fn test_wrong_event_checked_before_registry() {
    // Even with storage down, the event mismatch is still reported.
    let validator = validator(InMemoryRegistry::unavailable("offline"));

    let verdict = validator
        .validate_payload(&payload(1, 5), EventId(9))
        .await
        .unwrap();

    assert!(matches!(verdict, CheckinVerdict::WrongEvent { .. }));
}

#[tokio::test]
async fn test_registry_outage_propagates() {
    let validator = validator(InMemoryRegistry::unavailable("connection refused"));

    let result = validator.validate_payload(&payload(1, 5), EventId(5)).await;

    assert_eq!(
        result,
        Err(CheckinError::RegistryUnavailable(
            "connection refused".to_string()
        ))
    );
}

#[tokio::test]
async fn test_malformed_payloads() {
    let validator = validator(registry());

    for bad in ["", "1:5", "1:5:T:extra", "one:5:1", "1:5:-3", "0:5:1", "1: 5:1"] {
        let verdict = validator.validate_payload(bad, EventId(5)).await.unwrap();
        assert!(
            matches!(verdict, CheckinVerdict::Malformed { .. }),
            "{:?} gave {:?}",
            bad,
            verdict
        );
    }
}

#[tokio::test]
async fn test_malformed_carries_parser_reason() {
    let validator = validator(registry());

    let verdict = validator.validate_payload("1:5", EventId(5)).await.unwrap();

    assert_eq!(
        verdict,
        CheckinVerdict::malformed("expected 3 colon-separated fields, found 2")
    );
}

#[tokio::test]
async fn test_overlong_payload_is_malformed() {
    let validator = validator(registry());

    // Longest legal token still parses
    let longest = format!("{0}:{0}:{0}", u64::MAX);
    assert_eq!(longest.len(), MAX_PAYLOAD_LEN);
    let verdict = validator.validate_payload(&longest, EventId(5)).await.unwrap();
    assert!(matches!(verdict, CheckinVerdict::WrongEvent { .. }));

    let overlong = format!("1:5:{}", "0".repeat(MAX_PAYLOAD_LEN));
    let verdict = validator.validate_payload(&overlong, EventId(5)).await.unwrap();
    assert_eq!(verdict, CheckinVerdict::malformed(PAYLOAD_TOO_LONG));
}

#[tokio::test]
async fn test_oversized_upload_is_unreadable() {
    let validator = validator(registry());
    let tall = GrayImage::from_pixel(1, 5000, Luma([255]));
    let mut png = Vec::new();
    DynamicImage::ImageLuma8(tall)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let started = std::time::Instant::now();
    let verdict = validator
        .validate(ScanInput::ImageBytes(png), EventId(5))
        .await
        .unwrap();

    assert_eq!(verdict, CheckinVerdict::malformed(UNREADABLE_CODE));
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
}

#[tokio::test]
async fn test_validation_is_idempotent() {
    let validator = validator(registry());
    let scan = payload(1, 5);

    let first = validator.validate_payload(&scan, EventId(5)).await.unwrap();
    let second = validator.validate_payload(&scan, EventId(5)).await.unwrap();

    assert!(first.is_valid());
    assert_eq!(first, second);
    assert_eq!(validator.registry().len(), 1);
}

#[tokio::test]
async fn test_scanned_image_is_valid() {
    let validator = validator(registry());
    let image = validator
        .codec()
        .render_image(&payload(1, 5), 256)
        .unwrap();

    let verdict = validator
        .validate(ScanInput::Image(DynamicImage::ImageLuma8(image)), EventId(5))
        .await
        .unwrap();

    assert!(verdict.is_valid(), "got {:?}", verdict);
}

#[tokio::test]
async fn test_uploaded_png_is_valid() {
    let validator = validator(registry());
    let png = validator.codec().render_png(&payload(1, 5)).unwrap();

    let verdict = validator
        .validate(ScanInput::ImageBytes(png), EventId(5))
        .await
        .unwrap();

    assert!(verdict.is_valid(), "got {:?}", verdict);
}

#[tokio::test]
async fn test_image_without_code_is_unreadable() {
    let validator = validator(registry());
    let blank = GrayImage::from_pixel(128, 128, Luma([255]));

    let verdict = validator
        .validate(ScanInput::Image(DynamicImage::ImageLuma8(blank)), EventId(5))
        .await
        .unwrap();

    assert_eq!(verdict, CheckinVerdict::malformed(UNREADABLE_CODE));
}

#[tokio::test]
async fn test_corrupt_upload_is_unreadable() {
    let validator = validator(registry());

    let verdict = validator
        .validate(ScanInput::ImageBytes(b"not a png".to_vec()), EventId(5))
        .await
        .unwrap();

    assert_eq!(verdict, CheckinVerdict::malformed(UNREADABLE_CODE));
}

#[tokio::test]
async fn test_image_with_foreign_payload_is_malformed() {
    let validator = validator(registry());
    let image = validator
        .codec()
        .render_image("https://example.com/not-a-token", 256)
        .unwrap();

    let verdict = validator
        .validate(ScanInput::Image(DynamicImage::ImageLuma8(image)), EventId(5))
        .await
        .unwrap();

    match verdict {
        CheckinVerdict::Malformed { reason } => assert_ne!(reason, UNREADABLE_CODE),
        other => panic!("expected malformed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_validations_are_independent() {
    let validator = std::sync::Arc::new(validator(registry()));

    let mut handles = vec![];
    for user in 1..=8u64 {
        let validator = validator.clone();
        handles.push(tokio::spawn(async move {
            validator
                .validate_payload(&payload(user, 5), EventId(5))
                .await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let verdict = handle.await.expect("Task join failed").unwrap();
        if i == 0 {
            assert!(verdict.is_valid());
        } else {
            assert!(matches!(verdict, CheckinVerdict::NotRegistered { .. }));
        }
    }
}
