//! Per-species snapshot cooldown, measured in video time.

use std::collections::{BTreeSet, HashMap};

use crate::detect::Detection;

/// Last-seen time for species that have never been admitted.
const NEVER_SEEN: f64 = -999_999.0;

/// Decides whether a species may be snapshotted at a given video time.
///
/// Admission is independent per species: at most one admission per species
/// inside any window of `cooldown_secs`. State lives for a single run.
#[derive(Clone, Debug)]
pub struct CooldownGate {
    cooldown_secs: f64,
    last_admitted: HashMap<String, f64>,
}

impl CooldownGate {
    pub fn new(cooldown_secs: f64) -> Self {
        Self {
            cooldown_secs,
            last_admitted: HashMap::new(),
        }
    }

    /// Admit `species` at `now` if its cooldown has elapsed, recording the admission.
    pub fn try_admit(&mut self, species: &str, now: f64) -> bool {
        let last = self.last_admitted.get(species).copied().unwrap_or(NEVER_SEEN);
        if now - last >= self.cooldown_secs {
            self.last_admitted.insert(species.to_string(), now);
            true
        } else {
            false
        }
    }

    /// Species from one frame that pass the gate, in lexicographic order.
    pub fn admit_frame(&mut self, detections: &[Detection], now: f64) -> Vec<String> {
        let species: BTreeSet<&str> = detections.iter().map(|d| d.species.as_str()).collect();
        species
            .into_iter()
            .filter(|name| self.try_admit(name, now))
            .map(str::to_string)
            .collect()
    }

    pub fn last_admitted(&self, species: &str) -> Option<f64> {
        self.last_admitted.get(species).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn detection(species: &str) -> Detection {
        Detection {
            species: species.to_string(),
            confidence: 0.8,
            bbox: BoundingBox {
                x1: 0,
                y1: 0,
                x2: 1,
                y2: 1,
            },
        }
    }

    #[test]
    fn unseen_species_is_admitted_at_time_zero() {
        let mut gate = CooldownGate::new(180.0);
        assert!(gate.try_admit("lion", 0.0));
        assert_eq!(gate.last_admitted("lion"), Some(0.0));
    }

    #[test]
    fn admission_waits_for_full_window() {
        let mut gate = CooldownGate::new(180.0);
        assert!(gate.try_admit("lion", 5.0));
        assert!(!gate.try_admit("lion", 184.9));
        assert!(gate.try_admit("lion", 185.0));
        assert_eq!(gate.last_admitted("lion"), Some(185.0));
    }

    #[test]
    fn rejection_does_not_reset_timer() {
        let mut gate = CooldownGate::new(10.0);
        assert!(gate.try_admit("zebra", 0.0));
        assert!(!gate.try_admit("zebra", 9.0));
        assert!(gate.try_admit("zebra", 10.0));
    }

    #[test]
    fn species_are_independent_and_sorted() {
        let mut gate = CooldownGate::new(180.0);
        let frame = vec![detection("zebra"), detection("lion"), detection("zebra")];

        assert_eq!(gate.admit_frame(&frame, 1.0), vec!["lion", "zebra"]);
        assert!(gate.admit_frame(&frame, 2.0).is_empty());

        let later = vec![detection("elephant"), detection("lion")];
        assert_eq!(gate.admit_frame(&later, 3.0), vec!["elephant"]);
    }

    #[test]
    fn constant_stream_respects_window_bound() {
        // One sample per video second for T seconds.
        for window in [1.0, 7.0, 30.0, 180.0] {
            let mut gate = CooldownGate::new(window);
            let horizon = 600u32;
            let admitted = (0..=horizon)
                .filter(|t| gate.try_admit("lion", *t as f64))
                .count();
            let bound = (horizon as f64 / window).floor() as usize + 1;
            assert!(admitted <= bound, "window {window}: {admitted} > {bound}");
        }
    }
}
