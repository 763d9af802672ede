use weekplan_core::{
    detect_conflicts, sweep_overlaps, Calendar, Priority, Severity, Task, TimeInterval, Weekday,
};

fn mon(from: (i64, i64), to: (i64, i64)) -> TimeInterval {
    TimeInterval::on(Weekday::Mon, from, to).unwrap()
}

#[test]
fn fixed_versus_fixed_is_hard() {
    let lecture = Task::new("Lecture", mon((9, 0), (11, 0)), Priority::High, false);
    let exam = Task::new("Exam", mon((10, 0), (12, 0)), Priority::Fixed, false);
    let calendar = Calendar::from_tasks(vec![lecture.clone()]);

    let conflicts = detect_conflicts(&calendar, &exam);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].other_task_id, lecture.id);
    assert_eq!(conflicts[0].severity, Severity::Hard);
    assert_eq!(conflicts[0].overlap, mon((10, 0), (11, 0)));
}

#[test]
fn fixed_versus_flexible_makes_flexible_yield() {
    let errand = Task::new("Errand", mon((9, 0), (10, 0)), Priority::High, true);
    let meeting = Task::new("Meeting", mon((9, 30), (10, 30)), Priority::Medium, false);
    let calendar = Calendar::from_tasks(vec![errand.clone()]);

    let conflicts = detect_conflicts(&calendar, &meeting);
    assert_eq!(conflicts[0].severity, Severity::Soft);
    assert_eq!(conflicts[0].yielding, errand.id);

    let calendar = Calendar::from_tasks(vec![meeting.clone()]);
    let conflicts = detect_conflicts(&calendar, &errand);
    assert_eq!(conflicts[0].yielding, errand.id);
}

#[test]
fn flexible_tie_makes_candidate_yield() {
    let reading = Task::new("Reading", mon((13, 0), (14, 0)), Priority::Medium, true);
    let walk = Task::new("Walk", mon((13, 30), (14, 30)), Priority::Medium, true);
    let calendar = Calendar::from_tasks(vec![reading]);

    let conflicts = detect_conflicts(&calendar, &walk);
    assert_eq!(conflicts[0].severity, Severity::Soft);
    assert_eq!(conflicts[0].yielding, walk.id);
}

#[test]
fn lower_priority_neighbour_yields_to_candidate() {
    let nap = Task::new("Nap", mon((13, 0), (14, 0)), Priority::Low, true);
    let report = Task::new("Report", mon((13, 0), (15, 0)), Priority::High, true);
    let calendar = Calendar::from_tasks(vec![nap.clone()]);

    let conflicts = detect_conflicts(&calendar, &report);
    assert_eq!(conflicts[0].yielding, nap.id);
}

#[test]
fn candidate_own_previous_placement_is_ignored() {
    let mut gym = Task::new("Gym", mon((7, 0), (8, 0)), Priority::Low, true);
    let calendar = Calendar::from_tasks(vec![gym.clone()]);
    gym.interval = mon((7, 30), (8, 30));
    gym.window = gym.interval;
    assert!(detect_conflicts(&calendar, &gym).is_empty());
}

#[test]
fn touching_tasks_do_not_conflict_and_results_follow_start_order() {
    let a = Task::new("A", mon((8, 0), (9, 0)), Priority::Low, true);
    let b = Task::new("B", mon((9, 30), (10, 30)), Priority::Low, true);
    let c = Task::new("C", mon((10, 30), (11, 0)), Priority::Low, true);
    let d = Task::new("D", mon((12, 0), (13, 0)), Priority::Low, true);
    let calendar = Calendar::from_tasks(vec![d, c.clone(), b.clone(), a]);

    let candidate = Task::new("Cand", mon((9, 0), (11, 0)), Priority::High, true);
    let ids: Vec<_> = detect_conflicts(&calendar, &candidate)
        .into_iter()
        .map(|conflict| conflict.other_task_id)
        .collect();
    assert_eq!(ids, vec![b.id, c.id]);
}

#[test]
fn sweep_finds_every_overlapping_pair() {
    let long = Task::new("Long", mon((8, 0), (12, 0)), Priority::Low, true);
    let inner = Task::new("Inner", mon((9, 0), (10, 0)), Priority::Low, true);
    let later = Task::new("Later", mon((11, 0), (13, 0)), Priority::Low, true);
    let apart = Task::new("Apart", mon((13, 0), (14, 0)), Priority::Low, true);
    let calendar = Calendar::from_tasks(vec![apart, later.clone(), inner.clone(), long.clone()]);

    let pairs = sweep_overlaps(calendar.tasks());
    assert_eq!(pairs.len(), 2);
    assert_eq!((pairs[0].first, pairs[0].second), (long.id, inner.id));
    assert_eq!((pairs[1].first, pairs[1].second), (long.id, later.id));
    assert_eq!(pairs[1].overlap, mon((11, 0), (12, 0)));
    assert!(!calendar.is_conflict_free());
}
