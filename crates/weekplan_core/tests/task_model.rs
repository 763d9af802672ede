use uuid::Uuid;
use weekplan_core::{Priority, Task, TaskStatus, TaskValidationError, TimeInterval, Weekday};

fn wed(from: (i64, i64), to: (i64, i64)) -> TimeInterval {
    TimeInterval::on(Weekday::Wed, from, to).unwrap()
}

#[test]
fn new_task_starts_uncommitted_and_pending() {
    let task = Task::new("Read paper", wed((13, 0), (14, 0)), Priority::Medium, true);
    assert!(!task.id.is_nil());
    assert_eq!(task.version, 0);
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.window, task.interval);
    assert!(!task.is_fixed());
    assert!(task.validate().is_ok());
}

#[test]
fn validate_rejects_interval_outside_window() {
    let task = Task::new("Gym", wed((18, 0), (19, 0)), Priority::Low, true)
        .in_window(wed((12, 0), (17, 0)));
    assert!(matches!(
        task.validate(),
        Err(TaskValidationError::IntervalOutsideWindow { .. })
    ));
}

#[test]
fn validate_rejects_flexible_fixed_priority() {
    let task = Task::new("Exam", wed((9, 0), (11, 0)), Priority::Fixed, true);
    assert_eq!(
        task.validate().unwrap_err(),
        TaskValidationError::FlexibleFixedPriority
    );
}

#[test]
fn validate_rejects_blank_title_and_bad_color() {
    let blank = Task::new("   ", wed((9, 0), (10, 0)), Priority::Low, true);
    assert_eq!(blank.validate().unwrap_err(), TaskValidationError::BlankTitle);

    let mut colored = Task::new("Lunch", wed((12, 0), (13, 0)), Priority::Low, true);
    colored.color = Some("blue".to_string());
    assert_eq!(
        colored.validate().unwrap_err(),
        TaskValidationError::InvalidColor("blue".to_string())
    );
    colored.color = Some("#1a73e8".to_string());
    assert!(colored.validate().is_ok());
}

#[test]
fn priority_orders_low_to_fixed() {
    assert!(Priority::Low < Priority::Medium);
    assert!(Priority::Medium < Priority::High);
    assert!(Priority::High < Priority::Fixed);
}

#[test]
fn serialization_uses_expected_wire_fields() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let mut task = Task::with_id(id, "Math study", wed((14, 0), (17, 0)), Priority::High, false);
    task.version = 3;

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["priority"], "high");
    assert_eq!(json["flexible"], false);
    assert_eq!(json["status"], "pending");
    assert_eq!(json["version"], 3);
    assert_eq!(json["interval"]["start"], task.interval.start());

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, task);
}

#[test]
fn deserialize_rejects_interval_outside_window() {
    let value = serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "title": "Walk",
        "interval": { "start": 600, "end": 660 },
        "window": { "start": 0, "end": 120 },
        "priority": "low",
        "flexible": true
    });
    let err = serde_json::from_value::<Task>(value).unwrap_err();
    assert!(
        err.to_string().contains("must lie inside desired window"),
        "unexpected error: {err}"
    );
}
