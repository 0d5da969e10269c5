//! Unnormalized upper incomplete gamma for any real shape.
//!
//! The flux-normalized cutoff models need `Γ(s, x) = ∫_x^∞ t^{s-1} e^{-t} dt` with
//! zero and negative `s` as well. Positive shapes come from `statrs` as
//! `Γ(s) · Q(s, x)`. Zero is the exponential integral `E1`, negative shapes recur
//! upward from `(0, 1]`.

use statrs::function::gamma::{checked_gamma_ur, gamma};

const EPS: f64 = 1e-15;
const MAX_ITER: usize = 500;
const TINY: f64 = 1e-300;
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Exponential integral E1(x) = Γ(0, x), x > 0.
pub fn exp_integral_e1(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }

    if x > 1.0 {
        // continued fraction, modified Lentz
        let mut b = x + 1.0;
        let mut c = 1.0 / TINY;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..MAX_ITER {
            let an = -((i * i) as f64);
            b += 2.0;
            d = 1.0 / (an * d + b);
            c = b + an / c;
            let del = c * d;
            h *= del;
            if (del - 1.0).abs() < EPS {
                break;
            }
        }
        return h * (-x).exp();
    }

    let mut sum = 0.0;
    let mut term = 1.0;
    for k in 1..MAX_ITER {
        let kf = k as f64;
        term *= -x / kf;
        let contribution = -term / kf;
        sum += contribution;
        if contribution.abs() < sum.abs() * EPS {
            break;
        }
    }
    -EULER_GAMMA - x.ln() + sum
}

fn upper_gamma_positive(s: f64, x: f64) -> f64 {
    match checked_gamma_ur(s, x) {
        Ok(q) => gamma(s) * q,
        Err(_) => f64::NAN,
    }
}

/// Unnormalized upper incomplete gamma function Γ(s, x) for real `s` and `x >= 0`.
///
/// `Γ(s, 0)` is `Γ(s)` for positive `s` and infinite otherwise. Negative `x` yields NaN.
pub fn upper_incomplete_gamma(s: f64, x: f64) -> f64 {
    if x.is_nan() || s.is_nan() || x < 0.0 {
        return f64::NAN;
    }
    if x == 0.0 {
        return if s > 0.0 { gamma(s) } else { f64::INFINITY };
    }
    if x.is_infinite() {
        return 0.0;
    }
    if s > 0.0 {
        return upper_gamma_positive(s, x);
    }
    if s == 0.0 {
        return exp_integral_e1(x);
    }

    // Γ(s, x) = (Γ(s + 1, x) - x^s e^{-x}) / s, applied from the start shape down to s.
    let steps = (-s).ceil() as usize;
    let start = s + steps as f64;
    let mut value = if start == 0.0 {
        exp_integral_e1(x)
    } else {
        upper_gamma_positive(start, x)
    };
    for k in (0..steps).rev() {
        let shape = s + k as f64;
        value = (value - (shape * x.ln() - x).exp()) / shape;
    }
    value
}
