//! Repetition awareness — an optional loop-quality advisory.
//!
//! Adapted from the teacher's `LoopGuard`, which tracked per-tool-call
//! (name, argument hash, result snippet) triples and injected a hint
//! after three identical results. The spec's version operates one level
//! up — on the *set* of tool names issued per step rather than individual
//! call results — so the comparison key changes but the "three in a row
//! resets the counter" shape carries over unchanged.

use std::collections::{BTreeSet, VecDeque};

/// Tracks the sequence of tool-name sets issued across recent steps and
/// detects when the same single-tool set repeats three times running.
pub struct RepetitionGuard {
    recent: VecDeque<BTreeSet<String>>,
    threshold: usize,
}

impl RepetitionGuard {
    pub fn new(threshold: usize) -> Self {
        RepetitionGuard { recent: VecDeque::with_capacity(threshold + 1), threshold }
    }

    /// Record the tool names issued in the step just completed. Returns
    /// an advisory message when the same set has now repeated
    /// `threshold` times consecutively; resets tracking after firing so
    /// it doesn't fire again on every subsequent step.
    pub fn record(&mut self, tool_names: impl IntoIterator<Item = String>) -> Option<String> {
        let set: BTreeSet<String> = tool_names.into_iter().collect();
        self.recent.push_back(set.clone());
        while self.recent.len() > self.threshold {
            self.recent.pop_front();
        }

        if self.recent.len() >= self.threshold && self.recent.iter().all(|s| *s == set) {
            self.recent.clear();
            let names = set.into_iter().collect::<Vec<_>>().join(", ");
            return Some(format!(
                "The tool set [{names}] has been called {} times in a row with no apparent progress. \
                 Consider a different approach before calling it again.",
                self.threshold
            ));
        }

        None
    }

    pub fn reset(&mut self) {
        self.recent.clear();
    }
}

impl Default for RepetitionGuard {
    fn default() -> Self {
        Self::new(3)
    }
}
