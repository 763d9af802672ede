use weekplan_core::{Priority, StoreError, StoreOp, Task, TaskStore, TimeInterval, Weekday};

fn thu(from: (i64, i64), to: (i64, i64)) -> TimeInterval {
    TimeInterval::on(Weekday::Thu, from, to).unwrap()
}

fn task(title: &str, interval: TimeInterval) -> Task {
    Task::new(title, interval, Priority::Medium, true)
}

#[test]
fn put_assigns_version_one_then_bumps() {
    let mut store = TaskStore::new();
    let first = task("Laundry", thu((10, 0), (11, 0)));
    let id = first.id;

    assert_eq!(store.put(first.clone(), None).unwrap(), 1);
    let mut edited = store.get(id).unwrap().clone();
    edited.title = "Laundry and ironing".to_string();
    assert_eq!(store.put(edited, Some(1)).unwrap(), 2);
    assert_eq!(store.get(id).unwrap().version, 2);
    assert_eq!(store.len(), 1);
}

#[test]
fn put_with_stale_version_is_rejected() {
    let mut store = TaskStore::new();
    let original = task("Call mom", thu((18, 0), (18, 30)));
    let id = original.id;
    store.put(original.clone(), None).unwrap();
    store.put(original.clone(), Some(1)).unwrap();

    let err = store.put(original, Some(1)).unwrap_err();
    assert_eq!(
        err,
        StoreError::VersionConflict {
            id,
            expected: 1,
            actual: 2
        }
    );
}

#[test]
fn put_with_expected_zero_asserts_absence() {
    let mut store = TaskStore::new();
    let fresh = task("Plan trip", thu((20, 0), (21, 0)));
    store.put(fresh.clone(), Some(0)).unwrap();
    assert!(matches!(
        store.put(fresh, Some(0)),
        Err(StoreError::VersionConflict { actual: 1, .. })
    ));
}

#[test]
fn remove_missing_task_returns_not_found() {
    let mut store = TaskStore::new();
    let ghost = task("Ghost", thu((9, 0), (10, 0)));
    assert_eq!(
        store.remove(ghost.id, None).unwrap_err(),
        StoreError::NotFound(ghost.id)
    );
}

#[test]
fn snapshot_is_ordered_and_detached() {
    let mut store = TaskStore::new();
    let late = task("Late", thu((16, 0), (17, 0)));
    let early = task("Early", thu((8, 0), (9, 0)));
    store.put(late.clone(), None).unwrap();
    store.put(early.clone(), None).unwrap();

    let snapshot = store.all_ordered_by_start();
    let titles: Vec<&str> = snapshot.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Early", "Late"]);

    store.remove(early.id, None).unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(store.all_ordered_by_start().len(), 1);

    let again: Vec<&str> = snapshot.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(again, titles);
}

#[test]
fn moving_a_task_reorders_the_index() {
    let mut store = TaskStore::new();
    let a = task("A", thu((8, 0), (9, 0)));
    let b = task("B", thu((10, 0), (11, 0)));
    store.put(a.clone(), None).unwrap();
    store.put(b.clone(), None).unwrap();

    let mut moved = store.get(a.id).unwrap().clone();
    moved.interval = thu((12, 0), (13, 0));
    moved.window = moved.interval;
    store.put(moved, None).unwrap();

    let order: Vec<_> = store.all_ordered_by_start().tasks().iter().map(|t| t.id).collect();
    assert_eq!(order, vec![b.id, a.id]);
}

#[test]
fn apply_is_all_or_nothing() {
    let mut store = TaskStore::new();
    let keep = task("Keep", thu((9, 0), (10, 0)));
    store.put(keep.clone(), None).unwrap();
    let before = store.all_ordered_by_start();

    let newcomer = task("Newcomer", thu((11, 0), (12, 0)));
    let err = store
        .apply(vec![
            StoreOp::Put {
                task: newcomer.clone(),
                expected_version: None,
            },
            StoreOp::Remove {
                id: keep.id,
                expected_version: Some(7),
            },
        ])
        .unwrap_err();

    assert!(matches!(err, StoreError::VersionConflict { expected: 7, .. }));
    assert!(store.get(newcomer.id).is_none());
    assert_eq!(store.all_ordered_by_start(), before);
}

#[test]
fn apply_returns_written_tasks_in_batch_order() {
    let mut store = TaskStore::new();
    let a = task("A", thu((9, 0), (10, 0)));
    let b = task("B", thu((7, 0), (8, 0)));
    let written = store
        .apply(vec![
            StoreOp::Put {
                task: a.clone(),
                expected_version: None,
            },
            StoreOp::Put {
                task: b.clone(),
                expected_version: None,
            },
        ])
        .unwrap();
    let ids: Vec<_> = written.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![a.id, b.id]);
    assert!(written.iter().all(|t| t.version == 1));
}

#[test]
fn replace_all_rejects_duplicate_ids_and_keeps_versions() {
    let mut store = TaskStore::new();
    let mut stored = task("Stored", thu((9, 0), (10, 0)));
    stored.version = 5;
    store.replace_all(vec![stored.clone()]).unwrap();
    assert_eq!(store.version_of(stored.id), 5);

    let err = store
        .replace_all(vec![stored.clone(), stored.clone()])
        .unwrap_err();
    assert_eq!(err, StoreError::DuplicateId(stored.id));
    assert_eq!(store.len(), 1);
}
