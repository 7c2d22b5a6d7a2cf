use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use cadence_runner::prelude::*;

fn recording_sequence(labels: &[u8], log: &Arc<Mutex<Vec<u8>>>) -> Arc<ActionSequence> {
    let seq = Arc::new(ActionSequence::new());
    for &label in labels {
        let log = log.clone();
        seq.add(Action::new(move || log.lock().unwrap().push(label)));
    }
    seq
}

// ---------------------------------------------------------------------------
// 1. Pass order equals insertion order for any N >= 0, duplicates included.
// ---------------------------------------------------------------------------
proptest! {
    #[test]
    fn pass_order_equals_insertion_order(labels in prop::collection::vec(0u8..8, 0..48)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let seq = recording_sequence(&labels, &log);
        let manager = DefaultSequenceManager::with_sequence(seq.clone());

        let outcome = rt.block_on(manager.run_to_completion(RunConfig::new())).unwrap();
        prop_assert_eq!(outcome, PassOutcome::Completed { invoked: labels.len() });
        let logged = log.lock().unwrap().clone();
        prop_assert_eq!(logged, labels);
        prop_assert!(!seq.is_running());
    }
}

// ---------------------------------------------------------------------------
// 2. Stopping from slot k runs exactly the prefix [0..=k] and nothing after.
// ---------------------------------------------------------------------------
proptest! {
    #[test]
    fn stop_runs_exact_prefix((len, stop_at) in (1usize..32).prop_flat_map(|n| (Just(n), 0..n))) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let seq = Arc::new(ActionSequence::new());
        for i in 0..len {
            let log = log.clone();
            let weak = Arc::downgrade(&seq);
            seq.add(Action::new(move || {
                log.lock().unwrap().push(i);
                if i == stop_at {
                    if let Some(seq) = weak.upgrade() {
                        seq.stop();
                    }
                }
            }));
        }
        let manager = DefaultSequenceManager::with_sequence(seq.clone());

        let outcome = rt.block_on(manager.run_to_completion(RunConfig::new())).unwrap();
        let expected: Vec<usize> = (0..=stop_at).collect();
        let logged = log.lock().unwrap().clone();
        prop_assert_eq!(logged, expected);
        prop_assert_eq!(outcome.invoked(), stop_at + 1);
        prop_assert_eq!(outcome.is_stopped(), stop_at + 1 < len);
    }
}
