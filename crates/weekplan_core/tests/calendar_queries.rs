use serde_json::json;
use weekplan_core::{Calendar, Priority, Task, TimeInterval, Weekday, DEFAULT_TITLE_SIMILARITY};

fn tue(from: (i64, i64), to: (i64, i64)) -> TimeInterval {
    TimeInterval::on(Weekday::Tue, from, to).unwrap()
}

fn task(title: &str, interval: TimeInterval) -> Task {
    Task::new(title, interval, Priority::Medium, true)
}

#[test]
fn decoded_calendar_is_reordered_and_audited_correctly() {
    let a = task("A", tue((9, 0), (10, 0)));
    let c = task("C", tue((12, 0), (13, 0)));
    let b = task("B", tue((9, 30), (11, 0)));
    let wire = json!({ "tasks": [a, c, b] });

    let calendar: Calendar = serde_json::from_value(wire).unwrap();
    let titles: Vec<&str> = calendar.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
    assert!(!calendar.is_conflict_free());
    assert_eq!(calendar.conflicts()[0].overlap, tue((9, 30), (10, 0)));
}

#[test]
fn decoded_calendar_rejects_invalid_tasks() {
    let wire = json!({
        "tasks": [{
            "id": uuid::Uuid::new_v4(),
            "title": "   ",
            "interval": { "start": 60, "end": 120 },
            "window": { "start": 60, "end": 120 },
            "priority": "low",
            "flexible": true
        }]
    });
    assert!(serde_json::from_value::<Calendar>(wire).is_err());
}

#[test]
fn day_view_only_lists_tasks_starting_that_day() {
    let late = task("Late", tue((23, 0), (23, 30)));
    let wed = task(
        "Early",
        TimeInterval::on(Weekday::Wed, (6, 0), (7, 0)).unwrap(),
    );
    let calendar = Calendar::from_tasks(vec![wed, late.clone()]);

    let tuesday: Vec<_> = calendar.tasks_on(Weekday::Tue).iter().map(|t| t.id).collect();
    assert_eq!(tuesday, vec![late.id]);
    assert!(calendar.tasks_on(Weekday::Mon).is_empty());
}

#[test]
fn similar_titles_are_ranked_best_first() {
    let dentist = task("Dentist appt", tue((9, 0), (10, 0)));
    let dent = task("Dentist", tue((11, 0), (12, 0)));
    let gym = task("Gym", tue((13, 0), (14, 0)));
    let calendar = Calendar::from_tasks(vec![gym, dentist.clone(), dent.clone()]);

    let matches = calendar.find_similar("dentist", DEFAULT_TITLE_SIMILARITY);
    let ids: Vec<_> = matches.iter().map(|(task, _)| task.id).collect();
    assert_eq!(ids, vec![dent.id, dentist.id]);
    assert!((matches[0].1 - 1.0).abs() < f32::EPSILON);
    assert!(matches[1].1 < 1.0);

    assert!(calendar.find_similar("groceries", DEFAULT_TITLE_SIMILARITY).is_empty());
}

#[test]
fn exact_lookup_ignores_case_and_padding() {
    let gym = task("Gym", tue((7, 0), (8, 0)));
    let calendar = Calendar::from_tasks(vec![gym.clone()]);
    assert_eq!(calendar.find_by_title("  gYM ")[0].id, gym.id);
    assert!(calendar.find_by_title("gy").is_empty());
}
