//! Phase history buffer feeding the rep matcher.

use crate::phase::Phase;
use std::collections::VecDeque;

/// Bounded memory of recent phases, oldest evicted first.
///
/// With `collapse_repeats` a phase equal to the newest entry is not appended
/// again, so the buffer holds phase transitions rather than raw frames and
/// pattern length no longer depends on frame rate.
#[derive(Debug, Clone)]
pub struct PhaseHistory {
    entries: VecDeque<Phase>,
    capacity: usize,
    collapse_repeats: bool,
}

impl PhaseHistory {
    pub fn new(capacity: usize, collapse_repeats: bool) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            collapse_repeats,
        }
    }

    /// Record a classified phase. Returns whether an entry was appended.
    pub fn push(&mut self, phase: Phase) -> bool {
        if self.collapse_repeats && self.entries.back() == Some(&phase) {
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(phase);
        true
    }

    /// Whether the newest entries equal `pattern` exactly, in order
    pub fn ends_with(&self, pattern: &[Phase]) -> bool {
        if pattern.is_empty() || pattern.len() > self.entries.len() {
            return false;
        }
        let skip = self.entries.len() - pattern.len();
        self.entries.iter().skip(skip).eq(pattern.iter())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<Phase> {
        self.entries.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let mut h = PhaseHistory::new(3, false);
        for p in [Phase::Neutral, Phase::Tilted, Phase::Neutral, Phase::Tilted] {
            h.push(p);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.to_vec(), vec![Phase::Tilted, Phase::Neutral, Phase::Tilted]);
    }

    #[test]
    fn test_raw_history_keeps_repeats() {
        let mut h = PhaseHistory::new(5, false);
        assert!(h.push(Phase::Neutral));
        assert!(h.push(Phase::Neutral));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_collapsed_history_skips_repeats() {
        let mut h = PhaseHistory::new(5, true);
        assert!(h.push(Phase::Neutral));
        assert!(!h.push(Phase::Neutral));
        assert!(h.push(Phase::Cow));
        assert_eq!(h.to_vec(), vec![Phase::Neutral, Phase::Cow]);
    }

    #[test]
    fn test_ends_with() {
        let mut h = PhaseHistory::new(5, false);
        for p in [Phase::Neutral, Phase::Cow, Phase::Neutral, Phase::Cat, Phase::Neutral] {
            h.push(p);
        }
        assert!(h.ends_with(&[Phase::Cow, Phase::Neutral, Phase::Cat, Phase::Neutral]));
        assert!(!h.ends_with(&[Phase::Cow, Phase::Neutral, Phase::Cat]));
        assert!(!h.ends_with(&[]));
        assert!(!h.ends_with(&[Phase::Neutral; 6]));
    }

    #[test]
    fn test_zero_capacity_is_promoted() {
        let mut h = PhaseHistory::new(0, false);
        h.push(Phase::Up);
        h.push(Phase::Down);
        assert_eq!(h.capacity(), 1);
        assert_eq!(h.to_vec(), vec![Phase::Down]);
    }
}
