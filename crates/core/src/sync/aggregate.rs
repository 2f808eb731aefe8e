//! Grouping and batch planning for pending signals
//!
//! Pure functions over in-memory data; the dispatch order they produce is
//! deterministic so a failed run can be re-invoked and resume where it
//! aborted.

use std::collections::BTreeMap;

use watchpost_domain::constants::MAX_SIGNAL_BATCH;
use watchpost_domain::Signal;

/// Partition the not-yet-sent signals by owning machine id.
///
/// Signals already marked `sent` are dropped. The map is ordered by machine
/// id so callers iterate machines deterministically.
pub fn group_unsent_by_machine(signals: Vec<Signal>) -> BTreeMap<String, Vec<Signal>> {
    let mut groups: BTreeMap<String, Vec<Signal>> = BTreeMap::new();
    for signal in signals.into_iter().filter(|signal| !signal.sent) {
        groups.entry(signal.machine_id.clone()).or_default().push(signal);
    }
    groups
}

/// Deduplicated, lexicographically sorted scenario names of a signal group.
///
/// This is the scenario set submitted when registering or logging in the
/// owning machine.
pub fn scenario_set(signals: &[Signal]) -> Vec<String> {
    let mut scenarios: Vec<String> =
        signals.iter().map(|signal| signal.scenario.clone()).collect();
    scenarios.sort_unstable();
    scenarios.dedup();
    scenarios
}

/// Split a machine's pending signals into contiguous dispatch batches.
///
/// Each batch holds at most [`MAX_SIGNAL_BATCH`] signals; the last one may be
/// smaller. Order is preserved with no omission or duplication.
pub fn batch_plan(signals: &[Signal]) -> impl Iterator<Item = &[Signal]> {
    signals.chunks(MAX_SIGNAL_BATCH)
}
