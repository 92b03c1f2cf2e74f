//! Absolute m/z tolerance from condition qualifiers.

use log::warn;

use crate::query::Qualifiers;

/// Tolerance used when a condition carries no qualifier, in m/z units
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Resolve the absolute tolerance around `mz`
///
/// A ppm qualifier takes precedence over an absolute one.
pub fn resolve_tolerance(qualifiers: Option<&Qualifiers>, mz: f64) -> f64 {
    let Some(qualifiers) = qualifiers else {
        return DEFAULT_TOLERANCE;
    };

    if let Some(ppm) = qualifiers.ppm_tolerance {
        return (ppm * mz / 1_000_000.0).abs();
    }
    if let Some(tolerance) = qualifiers.mz_tolerance {
        return tolerance;
    }

    warn!("Qualifier set without a tolerance, using {}", DEFAULT_TOLERANCE);
    DEFAULT_TOLERANCE
}
