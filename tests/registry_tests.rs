use rate_watch::{
    Alert, AlertEvaluator, AlertKind, BoundedWindow, CollectingSink, DetectorConfig, Reading,
    Registry, Subscriber, SubscriberError, ValidationError,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn alerting_registry() -> (Registry, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let registry =
        Registry::default().with_subscriber(Arc::new(AlertEvaluator::new(sink.clone())));
    (registry, sink)
}

#[test]
fn test_end_to_end_spot_change() {
    let (mut registry, sink) = alerting_registry();

    registry
        .route_record(&json!({"currencyPair": "A", "rate": 0, "timestamp": 0}))
        .unwrap();
    assert!(sink.is_empty());

    registry
        .route_record(&json!({"currencyPair": "A", "rate": 100, "timestamp": 1}))
        .unwrap();

    let window = registry.get("A").unwrap();
    assert_eq!(window.average(), 50.0);
    assert_eq!(
        sink.drain(),
        vec![Alert {
            timestamp: 1.0,
            key: "A".to_string(),
            alert: AlertKind::SpotChange,
        }]
    );
}

#[test]
fn test_first_reading_of_a_positive_series_never_alerts() {
    let (mut registry, sink) = alerting_registry();
    registry.route(Reading::new("CNYAUD", 0.59281, 1554933794.023));
    registry.route(Reading::new("USDAUD", 1.41, 1554933794.023));
    assert!(sink.is_empty());
}

#[test]
fn test_steady_series_stays_quiet_until_a_jump() {
    let (mut registry, sink) = alerting_registry();
    for i in 0..400 {
        registry.route(Reading::new("CNYAUD", 0.59 + (i % 3) as f64 * 0.001, i as f64));
    }
    assert!(sink.is_empty());

    registry.route(Reading::new("CNYAUD", 0.70, 400.0));
    assert_eq!(sink.drain(), vec![Alert::spot_change("CNYAUD", 400.0)]);

    registry.route(Reading::new("CNYAUD", 0.59, 401.0));
    assert!(sink.is_empty());
}

#[test]
fn test_invalid_records_leave_registry_untouched() {
    let (mut registry, sink) = alerting_registry();
    registry.route(Reading::new("A", 1.0, 0.0));

    let invalid = [
        (json!({"rate": 1.0, "timestamp": 1.0}), ValidationError::MissingField("currencyPair")),
        (json!({"currencyPair": "B", "timestamp": 1.0}), ValidationError::MissingField("rate")),
        (json!({"currencyPair": "A", "rate": 9.0}), ValidationError::MissingField("timestamp")),
    ];
    for (record, expected) in invalid {
        assert_eq!(registry.route_record(&record), Err(expected));
    }

    assert_eq!(registry.len(), 1);
    assert!(!registry.contains("B"));
    assert_eq!(registry.get("A").unwrap().inserted_count(), 1);
    assert!(sink.is_empty());
}

#[test]
fn test_keys_are_isolated() {
    let mut registry = Registry::default();
    for i in 0..10 {
        registry.route(Reading::new("A", 1.0 + i as f64, i as f64));
        registry.route(Reading::new("B", 100.0, i as f64));
    }

    let a = registry.get("A").unwrap();
    let b = registry.get("B").unwrap();
    assert_eq!(a.inserted_count(), 10);
    assert_eq!(b.inserted_count(), 10);
    assert_eq!(a.average(), 5.5);
    assert_eq!(b.average(), 100.0);
    assert_eq!(a.latest(), (10.0, 9.0));
}

#[test]
fn test_subscribers_run_in_attachment_order_for_every_window() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let first = calls.clone();
    let second = calls.clone();

    let mut registry = Registry::new(DetectorConfig::default())
        .with_subscriber(Arc::new(move |w: &BoundedWindow| -> Result<(), SubscriberError> {
            first.lock().unwrap().push(format!("first:{}", w.key()));
            Ok(())
        }))
        .with_subscriber(Arc::new(move |w: &BoundedWindow| -> Result<(), SubscriberError> {
            second.lock().unwrap().push(format!("second:{}", w.key()));
            Ok(())
        }));

    registry.route(Reading::new("A", 1.0, 0.0));
    registry.route(Reading::new("B", 1.0, 0.0));

    assert_eq!(
        *calls.lock().unwrap(),
        vec!["first:A", "second:A", "first:B", "second:B"]
    );
}

#[test]
fn test_subscriber_failure_keeps_window_committed() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let failing: Arc<dyn Subscriber> =
        Arc::new(move |_: &BoundedWindow| -> Result<(), SubscriberError> {
            counter.fetch_add(1, Ordering::Relaxed);
            Err(SubscriberError::Other("downstream unavailable".into()))
        });

    let mut registry = Registry::default().with_subscriber(failing);
    let outcome = registry.route(Reading::new("A", 2.0, 0.0));
    let outcome_2 = registry.route(Reading::new("A", 4.0, 1.0));

    assert_eq!(outcome.update.subscriber_failures, 1);
    assert_eq!(outcome_2.update.subscriber_failures, 1);
    assert_eq!(attempts.load(Ordering::Relaxed), 2);
    assert_eq!(registry.get("A").unwrap().average(), 3.0);
}

fn evaluate_after(readings: &[f64]) -> Option<Alert> {
    let evaluator = AlertEvaluator::new(Arc::new(CollectingSink::new()));
    let mut window = BoundedWindow::new("A", 10);
    for (ts, value) in readings.iter().enumerate() {
        window.insert(*value, ts as f64);
    }
    evaluator.evaluate(&window)
}

#[test]
fn test_threshold_boundary_through_window() {
    let eps = 0.01;

    // 9 then 11: average 10, latest exactly 10% above
    assert_eq!(evaluate_after(&[9.0, 11.0]), None);
    assert!(evaluate_after(&[9.0, 11.0 + eps]).is_some());
    assert_eq!(evaluate_after(&[9.0, 11.0 - eps]), None);

    // 11 then 9: average 10, latest exactly 10% below
    assert_eq!(evaluate_after(&[11.0, 9.0]), None);
    assert!(evaluate_after(&[11.0, 9.0 - eps]).is_some());
    assert_eq!(evaluate_after(&[11.0, 9.0 + eps]), None);
}

#[test]
fn test_zero_average_through_window() {
    assert_eq!(evaluate_after(&[0.0, 0.0]), None);
    assert_eq!(
        evaluate_after(&[-1.0, 1.0]),
        Some(Alert::spot_change("A", 1.0))
    );
}

#[test]
fn test_negative_series_alerts_on_every_reading() {
    let (mut registry, sink) = alerting_registry();

    registry.route(Reading::new("N", -10.0, 0.0));
    registry.route(Reading::new("N", -10.0, 1.0));

    assert_eq!(
        sink.drain(),
        vec![Alert::spot_change("N", 0.0), Alert::spot_change("N", 1.0)]
    );
}
