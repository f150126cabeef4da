//! Packets-per-second safety limiting

use tracing::warn;

/// Class-wide safety limit on packets per second
pub const MAX_PPS: u32 = 100;

/// Enforce the packets-per-second safety limit.
///
/// Returns the allowed rate: `min(requested, MAX_PPS)`. Logs a warning when
/// the requested rate had to be capped.
pub fn cap(requested: u32) -> u32 {
    if requested > MAX_PPS {
        warn!(
            requested,
            limit = MAX_PPS,
            "requested pps exceeds safety limit, capping"
        );
        return MAX_PPS;
    }
    requested
}
