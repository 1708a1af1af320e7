//! Job orchestrators, one per subcommand.
//!
//! Each job loads what it needs, does its bounded network I/O sequentially,
//! writes files under the configured base directory, and returns. A failure
//! inside one platform's estimator is converted into a `missing` record at
//! the call site; anything outside those guarded regions is fatal and
//! propagates to the process exit for cron-level alerting.

pub mod crypto;
pub mod markets_history;
pub mod markets_today;
pub mod tesla;
