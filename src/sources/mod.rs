//! Per-upstream fetch + reduce logic.
//!
//! Each submodule owns one public API: a narrow page-provider trait as the
//! test seam (implemented by `RetryingClient` in production), a paginating
//! `scan` that propagates fetch errors to the caller, and pure reducers that
//! turn scanned data into estimates. Converting a failed scan into a
//! `missing` record happens at the job call site, never here.

pub mod coingecko;
pub mod kalshi;
pub mod manifold;
pub mod polymarket;

/// Round a metric to two decimals for persistence.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.2345), 1.23);
        assert_eq!(round2(1.235), 1.24);
        assert_eq!(round2(-0.005), -0.01);
    }
}
