//! Wilson score confidence bounds
//!
//! One-sided confidence bounds on a Bernoulli success rate, used to decide
//! whether a bucket's observed accuracy is evidence that it is too easy or
//! too hard for the learner. Closed form, no iteration, and unlike the naive
//! normal approximation it stays accurate at the tiny sample sizes buckets
//! actually see.
//!
//! Picking `z` for a one-sided bound at confidence `1 - a`: the lower bound
//! uses the z-score whose left-tail area is `a`, the upper bound the z-score
//! whose left-tail area is `1 - a`.
//!
//! | confidence | one-sided lower-bound z | upper-bound z |
//! |------------|-------------------------|---------------|
//! | 0.80       | -0.845                  | 0.845         |
//! | 0.90       | -1.285                  | 1.285         |
//! | 0.95       | -1.645                  | 1.645         |
//! | 0.99       | -2.325                  | 2.325         |
//! | 0.999      | -3.1                    | 3.1           |

/// z-score for the one-sided 80%-confidence lower bound.
///
/// The threshold can't be too high or the tuner becomes too conservative:
/// higher confidence levels require more samples than a bucket ever collects.
const TOO_EASY_Z: f64 = -0.845;

/// z-score for the one-sided 99.9%-confidence upper bound.
///
/// Much stricter than the "too easy" side: a false positive here repeatedly
/// punishes a learner who is not actually struggling.
const TOO_HARD_Z: f64 = 3.1;

/// Lower-bound accuracy a bucket must exceed to count as too easy.
const TOO_EASY_THRESHOLD: f64 = 0.875;

/// Upper-bound accuracy a bucket must fall below to count as too hard.
const TOO_HARD_THRESHOLD: f64 = 0.8;

/// Computes a boundary point of the Wilson score interval for a Bernoulli
/// proportion with `successes` and `failures` observations.
///
/// Returns 0.0 when there are no observations; zero-sample buckets must be
/// treated as neither too easy nor too hard (see [`is_too_easy`] and
/// [`is_too_hard`], which both guard for this).
pub fn wilson(successes: u32, failures: u32, z: f64) -> f64 {
    let ns = f64::from(successes);
    let nf = f64::from(failures);
    let n = ns + nf;
    if n == 0.0 {
        return 0.0;
    }
    let z2 = z * z;
    (ns + z2 / 2.0) / (n + z2) + (z / (n + z2)) * ((ns * nf) / n + z2 / 4.0).sqrt()
}

/// True when the 80%-confidence one-sided lower bound on accuracy exceeds
/// 0.875.
///
/// The bar is deliberately high: it prevents premature lengthening of an
/// interval while evidence is still thin.
pub fn is_too_easy(correct: u32, incorrect: u32) -> bool {
    if correct + incorrect == 0 {
        return false;
    }
    wilson(correct, incorrect, TOO_EASY_Z) > TOO_EASY_THRESHOLD
}

/// True when the 99.9%-confidence one-sided upper bound on accuracy is below
/// 0.8.
pub fn is_too_hard(correct: u32, incorrect: u32) -> bool {
    if correct + incorrect == 0 {
        return false;
    }
    wilson(correct, incorrect, TOO_HARD_Z) < TOO_HARD_THRESHOLD
}
