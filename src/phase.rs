use crate::error::PacerError;

/// A named segment of the breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Phase {
    Inhale,
    #[strum(serialize = "Hold")]
    HoldHigh,
    Exhale,
    #[strum(serialize = "Hold")]
    HoldLow,
}

/// A phase together with its configured duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSpan {
    pub phase: Phase,
    pub duration_secs: f64,
}

/// Ordered, cyclic sequence of phases.
///
/// Construction validates the spans: durations must be finite and
/// non-negative, and at least one must be positive, otherwise the cycle is
/// degenerate and a session must refuse to start.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSequence {
    spans: Vec<PhaseSpan>,
    cycle_secs: f64,
}

impl PhaseSequence {
    pub fn new(spans: Vec<PhaseSpan>) -> Result<Self, PacerError> {
        if spans.is_empty() {
            return Err(PacerError::InvalidConfiguration(
                "phase sequence is empty".into(),
            ));
        }
        for span in &spans {
            if !span.duration_secs.is_finite() || span.duration_secs < 0.0 {
                return Err(PacerError::InvalidConfiguration(format!(
                    "{} duration must be a non-negative number of seconds",
                    span.phase
                )));
            }
        }
        let cycle_secs: f64 = spans.iter().map(|s| s.duration_secs).sum();
        if cycle_secs <= 0.0 {
            return Err(PacerError::InvalidConfiguration(
                "at least one phase must have a positive duration".into(),
            ));
        }
        Ok(Self { spans, cycle_secs })
    }

    /// The standard four-phase cycle: inhale, hold, exhale, hold.
    pub fn from_durations(
        inhale_secs: f64,
        hold_high_secs: f64,
        exhale_secs: f64,
        hold_low_secs: f64,
    ) -> Result<Self, PacerError> {
        Self::new(vec![
            PhaseSpan {
                phase: Phase::Inhale,
                duration_secs: inhale_secs,
            },
            PhaseSpan {
                phase: Phase::HoldHigh,
                duration_secs: hold_high_secs,
            },
            PhaseSpan {
                phase: Phase::Exhale,
                duration_secs: exhale_secs,
            },
            PhaseSpan {
                phase: Phase::HoldLow,
                duration_secs: hold_low_secs,
            },
        ])
    }

    pub fn spans(&self) -> &[PhaseSpan] {
        &self.spans
    }

    /// Total cycle length: the sum of all phase durations.
    pub fn cycle_secs(&self) -> f64 {
        self.cycle_secs
    }
}
