//! Alternating geometric series Σ (-1)^(n+1) r^n and the Leibniz error bound.
//!
//! The limit L = r / (1 + r) comes from the closed form, never from the loop,
//! so it can serve as ground truth for |L - S_n| ≤ u_{n+1}.

use serde::Serialize;

use crate::constants::{ALTERNATING_DEFAULT_TERMS, DECAY_R, EPSILON, clamp_terms};
use crate::sums::alternating_sign;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AlternatingParams {
    decay: f64,
    terms: usize,
}

impl Default for AlternatingParams {
    fn default() -> Self {
        Self {
            decay: DECAY_R.default,
            terms: ALTERNATING_DEFAULT_TERMS,
        }
    }
}

impl AlternatingParams {
    pub fn new(decay: f64, terms: usize) -> Self {
        Self {
            decay: DECAY_R.clamp(decay),
            terms: clamp_terms(terms),
        }
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn terms(&self) -> usize {
        self.terms
    }

    pub fn with_decay(self, decay: f64) -> Self {
        Self::new(decay, self.terms)
    }

    pub fn with_terms(self, terms: usize) -> Self {
        Self::new(self.decay, terms)
    }
}

/// Closed-form sum of Σ_{n≥1} (-1)^(n+1) r^n.
pub fn exact_limit(decay: f64) -> f64 {
    decay / (1.0 + decay)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AlternatingRecord {
    pub n: usize,
    /// u_n = r^n
    pub magnitude: f64,
    /// S_n
    pub partial_sum: f64,
    /// min(S_n, S_{n+1})
    pub trap_min: f64,
    /// max(S_n, S_{n+1})
    pub trap_max: f64,
    /// u_{n+1}, the Leibniz ceiling on |R_n|
    pub next_magnitude: f64,
    /// |L - S_n|
    pub error: f64,
}

impl AlternatingRecord {
    pub fn within_bound(&self) -> bool {
        self.error <= self.next_magnitude + EPSILON
    }

    pub fn traps(&self, limit: f64) -> bool {
        self.trap_min - EPSILON <= limit && limit <= self.trap_max + EPSILON
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlternatingSeries {
    pub params: AlternatingParams,
    pub limit: f64,
    pub records: Vec<AlternatingRecord>,
}

impl AlternatingSeries {
    /// True when every record satisfies |L - S_n| ≤ u_{n+1}.
    pub fn bound_holds(&self) -> bool {
        self.first_violation().is_none()
    }

    pub fn first_violation(&self) -> Option<&AlternatingRecord> {
        self.records.iter().find(|r| !r.within_bound())
    }

    pub fn partial_sums(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.partial_sum).collect()
    }
}

pub fn compute(params: &AlternatingParams) -> AlternatingSeries {
    let r = params.decay;
    let limit = exact_limit(r);
    let mut records = Vec::with_capacity(params.terms);
    let mut sum = 0.0;

    for n in 1..=params.terms {
        let magnitude = r.powi(n as i32);
        sum += alternating_sign(n) * magnitude;

        let next_magnitude = r.powi(n as i32 + 1);
        let next_sum = sum + alternating_sign(n + 1) * next_magnitude;

        records.push(AlternatingRecord {
            n,
            magnitude,
            partial_sum: sum,
            trap_min: sum.min(next_sum),
            trap_max: sum.max(next_sum),
            next_magnitude,
            error: (limit - sum).abs(),
        });
    }

    AlternatingSeries {
        params: *params,
        limit,
        records,
    }
}
