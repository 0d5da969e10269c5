//! Flux-normalized models reproduce their flux parameter when integrated

use crate::test_helpers::{integrate, integrate_weighted};
use approx::assert_relative_eq;
use astrofunc_rs::functions::band::KEV_PER_ERG;
use astrofunc_rs::functions::{BandCalderone, CutoffPowerlawFlux, PowerlawFlux};
use astrofunc_rs::Function;

#[test]
fn test_powerlaw_flux() {
    let mut f = PowerlawFlux::new().unwrap();
    f.set_value("F", 2.5).unwrap();
    // -1 is the logarithmic case
    for index in [-2.0, -1.0, -1.5, 0.5, -3.2] {
        f.set_value("index", index).unwrap();
        let total = integrate(&f, 1.0, 100.0);
        assert_relative_eq!(total, 2.5, max_relative = 0.01);
    }
}

#[test]
fn test_powerlaw_flux_with_pivot() {
    let mut f = PowerlawFlux::new().unwrap();
    f.set_value("piv", 10.0).unwrap();
    f.set_value("a", 5.0).unwrap();
    f.set_value("b", 500.0).unwrap();
    for index in [-2.3, -1.0, 0.0] {
        f.set_value("index", index).unwrap();
        assert_relative_eq!(integrate(&f, 5.0, 500.0), 1.0, max_relative = 0.01);
    }
}

#[test]
fn test_cutoff_powerlaw_flux() {
    let mut f = CutoffPowerlawFlux::new().unwrap();
    // index + 1 = 0 and negative integer shapes go through the recurrence
    for index in [-2.0, -1.0, -0.5, 1.0, -3.0] {
        f.set_value("index", index).unwrap();
        let total = integrate(&f, 1.0, 100.0);
        assert_relative_eq!(total, 1e-5, max_relative = 0.01);
    }
}

#[test]
fn test_band_calderone_energy_flux() {
    let mut f = BandCalderone::new().unwrap();
    let (a, b) = (1.0, 10000.0);
    // beta = -2 is the logarithmic power-law segment
    for (alpha, beta) in [(-1.0, -2.2), (-0.5, -2.5), (0.0, -2.0), (-1.5, -3.0)] {
        f.set_value("alpha", alpha).unwrap();
        f.set_value("beta", beta).unwrap();
        let energy_flux = integrate_weighted(&f, a, b, |x| x) / KEV_PER_ERG;
        assert_relative_eq!(energy_flux, 1e-6, max_relative = 0.01);
    }
}

#[test]
fn test_band_calderone_cutoff_option() {
    let mut f = BandCalderone::new().unwrap();
    f.set_value("opt", 0.0).unwrap();
    for alpha in [-1.0, -1.9, 0.5] {
        f.set_value("alpha", alpha).unwrap();
        let energy_flux = integrate_weighted(&f, 1.0, 10000.0, |x| x) / KEV_PER_ERG;
        assert_relative_eq!(energy_flux, 1e-6, max_relative = 0.01);
    }
}
