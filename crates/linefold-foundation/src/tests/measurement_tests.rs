use crate::{MeasurementSnapshot, MeasurementStore, MergeOutcome};

#[test]
fn merge_keeps_the_larger_value() {
    let mut store = MeasurementStore::new(3);
    store.merge([(0, 3)]);
    let outcome = store.merge([(0, 2)]);

    assert_eq!(store.get(0), Some(3));
    assert_eq!(outcome, MergeOutcome::default());
}

#[test]
fn merge_reports_change_only_when_something_grew() {
    let mut store = MeasurementStore::new(2);
    assert!(store.merge([(0, 2)]).changed);
    assert!(!store.merge([(0, 2)]).changed);
    assert!(store.merge([(0, 4)]).changed);
    assert_eq!(store.get(0), Some(4));
}

#[test]
fn zero_counts_are_not_measurements() {
    let mut store = MeasurementStore::new(1);
    let outcome = store.merge([(0, 0)]);

    assert!(!outcome.changed);
    assert_eq!(store.get(0), None);
    assert!(!store.is_ready());
}

#[test]
fn out_of_range_indices_are_ignored() {
    let mut store = MeasurementStore::new(2);
    let outcome = store.merge([(2, 5), (7, 1)]);

    assert!(!outcome.changed);
    assert!(store.snapshot().is_empty());
}

#[test]
fn readiness_flips_once_every_block_is_measured() {
    let mut store = MeasurementStore::new(3);
    assert!(!store.merge([(0, 1), (2, 1)]).became_ready);
    assert!(!store.is_ready());

    let outcome = store.merge([(1, 4)]);
    assert!(outcome.became_ready);
    assert!(store.is_ready());

    let later = store.merge([(1, 6)]);
    assert!(later.changed);
    assert!(!later.became_ready);
    assert!(store.is_ready());
}

#[test]
fn empty_document_is_ready_immediately() {
    let store = MeasurementStore::new(0);
    assert!(store.is_ready());
}

#[test]
fn merge_order_does_not_matter() {
    let batches: [&[(usize, usize)]; 3] = [&[(0, 2), (1, 1)], &[(1, 3)], &[(0, 1), (2, 5)]];

    let mut forward = MeasurementStore::new(3);
    for batch in batches {
        forward.merge(batch.iter().copied());
    }
    let mut backward = MeasurementStore::new(3);
    for batch in batches.iter().rev() {
        backward.merge(batch.iter().copied());
    }

    assert_eq!(forward.snapshot(), backward.snapshot());
    assert_eq!(
        forward.snapshot(),
        MeasurementSnapshot::from([(0, 2), (1, 3), (2, 5)])
    );
}

#[test]
fn snapshot_values_never_decrease() {
    let mut store = MeasurementStore::new(4);
    let reports = [(0, 2), (1, 5), (0, 1), (1, 3), (3, 2), (0, 4), (3, 1)];
    let mut previous = store.snapshot();

    for report in reports {
        store.merge([report]);
        let current = store.snapshot();
        for (index, lines) in previous.iter() {
            let now = current.get(index).expect("measured block stays measured");
            assert!(now >= lines, "block {index} shrank from {lines} to {now}");
        }
        previous = current;
    }
}

#[test]
fn reset_forgets_measurements() {
    let mut store = MeasurementStore::new(1);
    store.merge([(0, 3)]);
    assert!(store.is_ready());

    store.reset(2);
    assert_eq!(store.total_blocks(), 2);
    assert!(store.snapshot().is_empty());
    assert!(!store.is_ready());
}

#[test]
fn snapshot_collect_max_merges_duplicates() {
    let snapshot: MeasurementSnapshot = [(0, 2), (0, 5), (0, 3), (1, 0)].into_iter().collect();
    assert_eq!(snapshot.get(0), Some(5));
    assert!(!snapshot.contains(1));
}
