//! Checkpoint distribution curves.
//!
//! A curve maps an even progress fraction (k/n of the target quantity) to a
//! fraction of the time window. `Power` pushes checkpoints toward the end
//! of the window: generous spacing early, tightening toward the deadline,
//! which fits a do-less habit. `Sigmoid` spaces them S-shaped: sparse at
//! both ends, dense in the middle, which fits ramping up a do-more habit.

use crate::store::models::CurveType;

pub const POWER_EXPONENT: f64 = 2.5;

/// Logit clamp; keeps the sigmoid inverse finite at the window edges.
const SIGMOID_EPSILON: f64 = 1e-3;

/// Fraction of the time window at which the checkpoint for `progress`
/// (0..=1 of the target quantity) falls.
pub fn time_fraction(curve: CurveType, progress: f64) -> f64 {
    fraction(curve, progress, SIGMOID_EPSILON)
}

fn fraction(curve: CurveType, progress: f64, epsilon: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    match curve {
        CurveType::Power => p.powf(1.0 / POWER_EXPONENT),
        CurveType::Sigmoid => {
            let lo = logit(epsilon);
            let hi = logit(1.0 - epsilon);
            let clamped = p.clamp(epsilon, 1.0 - epsilon);
            (logit(clamped) - lo) / (hi - lo)
        }
    }
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// One generated checkpoint. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub timestamp: i64,
    /// Fraction of the target quantity expected by this checkpoint.
    pub progress: f64,
    /// Milliseconds since the previous checkpoint (or the window start).
    pub interval_ms: i64,
}

/// Distribute `count` checkpoints over `[start_ms, start_ms + span_ms]`
/// along the curve. Zero `count` or an empty window yields an empty
/// schedule rather than an error.
pub fn generate(curve: CurveType, start_ms: i64, span_ms: i64, count: usize) -> Vec<Checkpoint> {
    if count == 0 || span_ms <= 0 {
        return Vec::new();
    }

    // The fixed clamp would flatten the first steps of a schedule with more
    // than 1/epsilon entries onto the window start; tighten it so every
    // progress step maps to a distinct fraction.
    let epsilon = SIGMOID_EPSILON.min(1.0 / (2.0 * count as f64));

    let mut checkpoints = Vec::with_capacity(count);
    let mut prev = start_ms;
    for i in 0..count {
        let progress = (i + 1) as f64 / count as f64;
        let offset = (span_ms as f64 * fraction(curve, progress, epsilon)).round() as i64;
        // Rounding can still collapse neighbours; timestamps must stay
        // strictly past the window start and each other.
        let timestamp = (start_ms + offset).max(prev + 1);
        checkpoints.push(Checkpoint {
            timestamp,
            progress,
            interval_ms: timestamp - prev,
        });
        prev = timestamp;
    }
    checkpoints
}
