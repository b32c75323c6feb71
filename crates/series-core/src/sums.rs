/// Running partial sums S_1..S_n, accumulated left to right.
pub fn partial_sums(terms: &[f64]) -> Vec<f64> {
    terms
        .iter()
        .scan(0.0, |acc, &t| {
            *acc += t;
            Some(*acc)
        })
        .collect()
}

/// (-1)^(n+1) for 1-based n: +1 on odd n, -1 on even n.
pub fn alternating_sign(n: usize) -> f64 {
    if n % 2 == 1 { 1.0 } else { -1.0 }
}
