use crate::phase::{Phase, PhaseSequence};

/// Where within the cycle a given amount of elapsed session time falls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasePosition {
    pub phase_index: usize,
    pub phase: Phase,
    pub duration_secs: f64,
    pub time_remaining_secs: f64,
    /// Progress through the current phase, always in `[0, 1)`.
    pub fraction_complete: f64,
}

/// Locate the current phase for `elapsed_secs` of session time.
///
/// Pure function of its inputs: tick jitter, missed ticks and suspension
/// gaps cannot drift the result, because nothing is accumulated between
/// calls. Phase intervals are half-open, so a cumulative boundary belongs
/// to the phase it begins. Zero-duration phases are never current.
pub fn locate(sequence: &PhaseSequence, elapsed_secs: f64) -> PhasePosition {
    let cycle = sequence.cycle_secs();
    let elapsed = if elapsed_secs.is_finite() && elapsed_secs > 0.0 {
        elapsed_secs
    } else {
        0.0
    };
    let cycle_pos = elapsed % cycle;

    // The walk accumulates durations in the same order cycle_secs() summed
    // them, so cycle_pos always lands inside a span; if floating point
    // disagrees, wrap to the cycle start.
    walk(sequence, cycle_pos)
        .or_else(|| walk(sequence, 0.0))
        .expect("validated sequence has a positive-duration phase")
}

fn walk(sequence: &PhaseSequence, cycle_pos: f64) -> Option<PhasePosition> {
    let mut phase_start = 0.0;
    for (phase_index, span) in sequence.spans().iter().enumerate() {
        if span.duration_secs <= 0.0 {
            continue;
        }
        let phase_end = phase_start + span.duration_secs;
        if cycle_pos < phase_end {
            return Some(PhasePosition {
                phase_index,
                phase: span.phase,
                duration_secs: span.duration_secs,
                time_remaining_secs: phase_end - cycle_pos,
                fraction_complete: (cycle_pos - phase_start) / span.duration_secs,
            });
        }
        phase_start = phase_end;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PhaseSequence;

    fn box_cycle() -> PhaseSequence {
        PhaseSequence::from_durations(4.0, 4.0, 4.0, 4.0).unwrap()
    }

    #[test]
    fn locates_each_phase_of_the_box_cycle() {
        let seq = box_cycle();
        assert_eq!(locate(&seq, 0.0).phase, Phase::Inhale);
        assert_eq!(locate(&seq, 3.9).phase, Phase::Inhale);
        assert_eq!(locate(&seq, 4.0).phase, Phase::HoldHigh);
        assert_eq!(locate(&seq, 8.0).phase, Phase::Exhale);
        assert_eq!(locate(&seq, 12.0).phase, Phase::HoldLow);
        assert_eq!(locate(&seq, 15.9).phase, Phase::HoldLow);
    }

    #[test]
    fn boundary_belongs_to_the_next_phase() {
        let seq = box_cycle();
        let at_boundary = locate(&seq, 4.0);
        assert_eq!(at_boundary.phase_index, 1);
        assert_eq!(at_boundary.fraction_complete, 0.0);
        assert_eq!(at_boundary.time_remaining_secs, 4.0);
    }

    #[test]
    fn wraps_around_the_cycle() {
        let seq = box_cycle();
        let wrapped = locate(&seq, 16.5);
        let fresh = locate(&seq, 0.5);
        assert_eq!(wrapped, fresh);
        assert_eq!(wrapped.phase, Phase::Inhale);
        assert_eq!(wrapped.fraction_complete, 0.125);
    }

    #[test]
    fn exact_cycle_multiple_wraps_to_the_first_phase() {
        let seq = box_cycle();
        let pos = locate(&seq, 32.0);
        assert_eq!(pos.phase, Phase::Inhale);
        assert_eq!(pos.fraction_complete, 0.0);
    }

    #[test]
    fn skips_zero_duration_phases() {
        let seq = PhaseSequence::from_durations(4.0, 0.0, 6.0, 0.0).unwrap();
        // Boundary at 4.0 jumps straight past the zero-length hold.
        let pos = locate(&seq, 4.0);
        assert_eq!(pos.phase, Phase::Exhale);
        assert_eq!(pos.phase_index, 2);
        // The tail hold is likewise never current.
        assert_eq!(locate(&seq, 9.9).phase, Phase::Exhale);
        assert_eq!(locate(&seq, 10.0).phase, Phase::Inhale);
    }

    #[test]
    fn fraction_stays_in_unit_interval() {
        let seq = PhaseSequence::from_durations(1.3, 0.7, 2.9, 0.0).unwrap();
        let mut elapsed = 0.0;
        while elapsed < 30.0 {
            let pos = locate(&seq, elapsed);
            assert!(
                (0.0..1.0).contains(&pos.fraction_complete),
                "fraction {} out of range at {elapsed}",
                pos.fraction_complete
            );
            assert!(pos.time_remaining_secs > 0.0);
            elapsed += 0.037;
        }
    }

    #[test]
    fn is_a_pure_function() {
        let seq = box_cycle();
        assert_eq!(locate(&seq, 7.25), locate(&seq, 7.25));
    }

    #[test]
    fn negative_and_non_finite_elapsed_clamp_to_start() {
        let seq = box_cycle();
        assert_eq!(locate(&seq, -5.0), locate(&seq, 0.0));
        assert_eq!(locate(&seq, f64::NAN), locate(&seq, 0.0));
    }

    #[test]
    fn remaining_plus_progress_covers_the_phase() {
        let seq = box_cycle();
        let pos = locate(&seq, 5.5);
        let progressed = pos.fraction_complete * pos.duration_secs;
        assert!((progressed + pos.time_remaining_secs - pos.duration_secs).abs() < 1e-9);
    }
}
