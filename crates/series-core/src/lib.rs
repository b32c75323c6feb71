//! Numeric engines behind the series convergence visualizer.
//!
//! Four independent derivations, one per theorem: limit comparison, ratio
//! test, alternating series with the Leibniz error bound, and rearrangement.
//! Each is a pure function of its parameters; the two that use randomness
//! take an explicit `Rng` so callers can seed them.
//!
//! Zero I/O: no logging, no rendering, no persistence.

pub mod alternating;
pub mod constants;
pub mod limit_comparison;
pub mod memo;
pub mod rearrangement;
pub mod sums;

pub use alternating::{AlternatingParams, AlternatingRecord, AlternatingSeries};
pub use constants::{EPSILON, MAX_TERMS, REARRANGEMENT_TERMS, Slider};
pub use limit_comparison::{
    Conclusion, LimitComparisonParams, LimitComparisonRecord, LimitComparisonSeries, Regime,
    Verdict,
};
pub use memo::Memo;
pub use ratio_test::{RatioTestParams, RatioTestRecord, RatioTestSeries, RatioVerdict};
pub use rearrangement::{PartialSumRecord, RearrangementMode, RearrangementSeries};
pub use sums::partial_sums;
