//! Continuity of the piecewise kernels at their breakpoints

use approx::assert_relative_eq;
use astrofunc_rs::functions::{Band, BandCalderone, BandGrbm, BrokenPowerlaw, SmoothlyBrokenPowerLaw};
use astrofunc_rs::{Function, Function1D};
use ndarray::array;

/// Values just below and at `x0`.
fn around(f: &dyn Function1D, x0: f64) -> (f64, f64) {
    let y = f.evaluate_values(&array![x0 * (1.0 - 1e-12), x0]).unwrap();
    (y[0], y[1])
}

#[test]
fn test_broken_powerlaw_break() {
    let mut f = BrokenPowerlaw::new().unwrap();
    for (alpha, beta, xb) in [(-1.5, -2.5, 10.0), (2.0, -3.0, 3.5), (0.0, -0.5, 100.0)] {
        f.set_value("alpha", alpha).unwrap();
        f.set_value("beta", beta).unwrap();
        f.set_value("xb", xb).unwrap();
        let (below, at) = around(&f, xb);
        assert_relative_eq!(below, at, max_relative = 1e-9);
    }
}

#[test]
fn test_band_split() {
    let mut f = Band::new().unwrap();
    for (alpha, beta, xp) in [(-1.0, -2.0, 500.0), (0.5, -3.0, 150.0), (-1.4, -2.5, 80.0)] {
        f.set_value("alpha", alpha).unwrap();
        f.set_value("beta", beta).unwrap();
        f.set_value("xp", xp).unwrap();
        let split = (alpha - beta) * xp / (2.0 + alpha);
        let (below, at) = around(&f, split);
        assert_relative_eq!(below, at, max_relative = 1e-9);
    }
}

#[test]
fn test_band_grbm_split() {
    let mut f = BandGrbm::new().unwrap();
    for (alpha, beta, xc) in [(-1.0, -2.0, 500.0), (1.0, -4.0, 20.0)] {
        f.set_value("alpha", alpha).unwrap();
        f.set_value("beta", beta).unwrap();
        f.set_value("xc", xc).unwrap();
        let (below, at) = around(&f, (alpha - beta) * xc);
        assert_relative_eq!(below, at, max_relative = 1e-9);
    }
}

#[test]
fn test_band_calderone_split() {
    let mut f = BandCalderone::new().unwrap();
    for (alpha, beta, xp) in [(-1.0, -2.2, 200.0), (0.0, -2.0, 300.0), (-1.8, -3.5, 50.0)] {
        f.set_value("alpha", alpha).unwrap();
        f.set_value("beta", beta).unwrap();
        f.set_value("xp", xp).unwrap();
        let split = (alpha - beta) * xp / (2.0 + alpha);
        let (below, at) = around(&f, split);
        assert_relative_eq!(below, at, max_relative = 1e-9);
    }
}

#[test]
fn test_smoothly_broken_thresholds() {
    let mut f = SmoothlyBrokenPowerLaw::new().unwrap();
    let xb = 300.0;
    for scale in [0.1, 0.5, 2.0] {
        f.set_value("break_scale", scale).unwrap();
        // log10(x / xb) / scale crosses -6 and 4 here
        for u in [-6.0, 4.0] {
            let x = xb * 10f64.powf(u * scale);
            let y = f.evaluate_values(&array![x * (1.0 - 1e-9), x * (1.0 + 1e-9)]).unwrap();
            assert_relative_eq!(y[0], y[1], max_relative = 1e-6);
        }
    }
}
