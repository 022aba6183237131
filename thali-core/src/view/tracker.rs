//! Snapshot diffing
//!
//! 上一个快照的 id 集合 + 当前快照 → `added / removed / changed`。
//! 每次更新只计算一次，然后交给每个观察者。

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::store::{Document, Snapshot};

/// Difference between two consecutive snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub sequence: u64,
    /// 首个快照：与空集合比较，全部文档都在 `added` 里
    pub initial: bool,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Receives each diff together with the current documents
pub trait DiffObserver: Send + Sync {
    fn on_diff(&self, diff: &SnapshotDiff, docs: &[Document]);
}

#[derive(Default)]
struct TrackerState {
    last_sequence: Option<u64>,
    previous: HashMap<String, Value>,
}

/// Tracks the previous snapshot and fans diffs out to observers
#[derive(Clone, Default)]
pub struct SnapshotTracker {
    state: Arc<Mutex<TrackerState>>,
    observers: Arc<Mutex<Vec<Arc<dyn DiffObserver>>>>,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, observer: Arc<dyn DiffObserver>) {
        self.observers.lock().push(observer);
    }

    /// Diff without notifying observers
    ///
    /// 序号不大于已处理序号的快照返回 `None`
    pub fn diff(&self, snapshot: &Snapshot) -> Option<SnapshotDiff> {
        let mut state = self.state.lock();
        if state
            .last_sequence
            .is_some_and(|last| snapshot.sequence <= last)
        {
            tracing::trace!(sequence = snapshot.sequence, "Dropping stale snapshot");
            return None;
        }
        let initial = state.last_sequence.is_none();

        let current: HashMap<String, Value> = snapshot
            .docs
            .iter()
            .map(|d| (d.id.clone(), d.data.clone()))
            .collect();

        let mut diff = SnapshotDiff {
            sequence: snapshot.sequence,
            initial,
            ..Default::default()
        };
        // 按快照顺序输出，便于视图按原顺序高亮
        for doc in &snapshot.docs {
            match state.previous.get(&doc.id) {
                None => diff.added.push(doc.id.clone()),
                Some(prev) if *prev != doc.data => diff.changed.push(doc.id.clone()),
                Some(_) => {}
            }
        }
        let mut removed: Vec<String> = state
            .previous
            .keys()
            .filter(|id| !current.contains_key(*id))
            .cloned()
            .collect();
        removed.sort();
        diff.removed = removed;

        state.last_sequence = Some(snapshot.sequence);
        state.previous = current;
        Some(diff)
    }

    /// Diff once, then notify every observer
    pub fn process(&self, snapshot: Snapshot) -> Option<SnapshotDiff> {
        let diff = self.diff(&snapshot)?;
        let observers = self.observers.lock().clone();
        for observer in observers {
            observer.on_diff(&diff, &snapshot.docs);
        }
        Some(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap(sequence: u64, ids: &[&str]) -> Snapshot {
        Snapshot {
            sequence,
            docs: ids
                .iter()
                .map(|id| Document {
                    id: id.to_string(),
                    data: json!({"table": id}),
                })
                .collect(),
        }
    }

    struct Counter(Mutex<Vec<SnapshotDiff>>);

    impl DiffObserver for Counter {
        fn on_diff(&self, diff: &SnapshotDiff, _docs: &[Document]) {
            self.0.lock().push(diff.clone());
        }
    }

    #[test]
    fn test_added_only_new_ids() {
        let tracker = SnapshotTracker::new();
        let first = tracker.process(snap(1, &["A", "B"])).unwrap();
        assert!(first.initial);
        assert_eq!(first.added, vec!["A".to_string(), "B".to_string()]);

        let diff = tracker.process(snap(2, &["A", "B", "C"])).unwrap();
        assert_eq!(diff.added, vec!["C".to_string()]);
        assert!(diff.removed.is_empty());

        let diff = tracker.process(snap(3, &["A"])).unwrap();
        assert!(diff.added.is_empty());
        assert_eq!(diff.removed, vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_changed_and_stale() {
        let tracker = SnapshotTracker::new();
        tracker.process(snap(5, &["A"]));

        let mut edited = snap(6, &["A"]);
        edited.docs[0].data = json!({"table": "A", "status": "prepared"});
        let diff = tracker.process(edited).unwrap();
        assert_eq!(diff.changed, vec!["A".to_string()]);

        assert!(tracker.process(snap(4, &["A", "Z"])).is_none());
    }

    #[test]
    fn test_observers_share_one_diff() {
        let tracker = SnapshotTracker::new();
        let a = Arc::new(Counter(Mutex::new(Vec::new())));
        let b = Arc::new(Counter(Mutex::new(Vec::new())));
        tracker.observe(a.clone());
        tracker.observe(b.clone());

        tracker.process(snap(1, &["A"]));
        tracker.process(snap(2, &["A", "B"]));

        assert_eq!(a.0.lock().len(), 2);
        assert_eq!(*a.0.lock(), *b.0.lock());
    }
}
