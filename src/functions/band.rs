//! The Band GRB spectrum and its variants.
//!
//! All three join a cutoff power law `x^α exp(-x / E)` to a power law `x^β` at the
//! split energy `(α - β) E`, where value and slope are continuous.

use super::broken::check_index_order;
use crate::error::{FunctionError, Result};
use crate::function::{fill_masked, masked_apply, Function1D, UnitAssignment};
use crate::special::upper_incomplete_gamma;
use crate::units::Unit;
use ndarray::Array1;

/// keV per erg, the conversion applied to the energy flux of [`BandCalderone`].
pub const KEV_PER_ERG: f64 = 6.24151e8;

/// Band shape with cutoff energy `e0` around pivot `piv`, normalized to `k`.
fn band_shape(x: &Array1<f64>, k: f64, alpha: f64, beta: f64, e0: f64, piv: f64) -> Array1<f64> {
    let split = (alpha - beta) * e0;
    let below: Vec<bool> = x.iter().map(|&v| v < split).collect();
    let above: Vec<bool> = below.iter().map(|&b| !b).collect();

    let high_norm = k * (split / piv).powf(alpha - beta) * (beta - alpha).exp();
    let mut out = masked_apply(x, &below, |v| k * (v / piv).powf(alpha) * (-v / e0).exp());
    fill_masked(&mut out, x, &above, |v| high_norm * (v / piv).powf(beta));
    out
}

fn band_units(cutoff: &'static str, x_unit: &Unit, y_unit: &Unit) -> UnitAssignment {
    vec![
        ("K", y_unit.clone()),
        (cutoff, x_unit.clone()),
        ("piv", x_unit.clone()),
        ("alpha", Unit::dimensionless()),
        ("beta", Unit::dimensionless()),
    ]
}

const BAND_META: &str = r#"
description: Band model from Band et al., 1993, parametrized with the peak energy
latex: ''
parameters:
  K:
    desc: Differential flux at the pivot energy
    initial value: 1e-4
    is_normalization: true
  alpha:
    desc: low-energy photon index
    initial value: -1.0
    min: -1.5
    max: 3
  xp:
    desc: peak in the x * x * N (nuFnu if x is a energy)
    initial value: 500
    min: 10
  beta:
    desc: high-energy photon index
    initial value: -2.0
    min: -5.0
    max: -1.6
  piv:
    desc: pivot energy
    initial value: 100.0
    fix: yes
"#;

builtin_function!(
    /// Band function parametrized with the nuFnu peak `xp`; the cutoff energy is
    /// `E0 = xp / (2 + α)`, so `α > -2` is required.
    Band,
    "Band",
    BAND_META
);

impl Function1D for Band {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(band_units("xp", x_unit, y_unit))
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let alpha = self.core.value("alpha")?;
        let xp = self.core.value("xp")?;
        let beta = self.core.value("beta")?;
        let piv = self.core.value("piv")?;

        check_index_order(Self::NAME, alpha, beta)?;
        if alpha <= -2.0 {
            return Err(FunctionError::ModelDomainViolation(format!(
                "Band: alpha ({}) must be above -2 for the peak to exist",
                alpha
            )));
        }

        let e0 = xp / (2.0 + alpha);
        Ok(band_shape(x, k, alpha, beta, e0, piv))
    }
}

const BAND_GRBM_META: &str = r#"
description: Band model from Band et al., 1993, parametrized with the cutoff energy
latex: ''
parameters:
  K:
    desc: Differential flux at the pivot energy
    initial value: 1e-4
    is_normalization: true
  alpha:
    desc: low-energy photon index
    initial value: -1.0
    min: -1.5
    max: 3
  xc:
    desc: cutoff of exp
    initial value: 500
    min: 10
  beta:
    desc: high-energy photon index
    initial value: -2.0
    min: -5.0
    max: -1.6
  piv:
    desc: pivot energy
    initial value: 100.0
    fix: yes
"#;

builtin_function!(
    /// Band function parametrized with the exponential cutoff `xc`.
    BandGrbm,
    "Band_grbm",
    BAND_GRBM_META
);

impl Function1D for BandGrbm {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(band_units("xc", x_unit, y_unit))
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let alpha = self.core.value("alpha")?;
        let xc = self.core.value("xc")?;
        let beta = self.core.value("beta")?;
        let piv = self.core.value("piv")?;

        check_index_order(Self::NAME, alpha, beta)?;
        Ok(band_shape(x, k, alpha, beta, xc, piv))
    }
}

const BAND_CALDERONE_META: &str = r#"
description: >
  The Band model (opt = 1) or a cutoff power law (opt = 0), normalized to the
  energy flux F integrated in the band [a, b]
latex: ''
parameters:
  alpha:
    desc: The index for x smaller than the x peak
    initial value: -1
    min: -10
    max: 10
  beta:
    desc: index for x greater than the x peak (only if opt=1, i.e., for the Band model)
    initial value: -2.2
    min: -7
    max: -1
  xp:
    desc: position of the peak in the x*x*f(x) space (if x is energy, this is the nuFnu or SED space)
    initial value: 200.0
    min: 0
  F:
    desc: integral in the band defined by a and b
    initial value: 1e-6
    is_normalization: true
  a:
    desc: lower limit of the band in which the integral will be computed
    initial value: 1.0
    min: 0
    fix: yes
  b:
    desc: upper limit of the band in which the integral will be computed
    initial value: 10000.0
    min: 0
    fix: yes
  opt:
    desc: option to select the spectral model (0 corresponds to a cutoff power law, 1 to the Band model)
    initial value: 1
    min: 0
    max: 1
    fix: yes
"#;

builtin_function!(
    /// Band function (`opt = 1`) or cutoff power law (`opt = 0`) normalized to the
    /// energy flux `F` over `[a, b]`.
    ///
    /// `∫_a^b x f(x) dx = F * KEV_PER_ERG`: with x in keV, `F` is an energy flux in
    /// erg per unit area and time.
    BandCalderone,
    "Band_Calderone",
    BAND_CALDERONE_META
);

impl BandCalderone {
    /// `∫ x (x / ec)^α exp(-x / ec) dx` over `[lo, hi]`.
    fn cutoff_energy_integral(alpha: f64, ec: f64, lo: f64, hi: f64) -> f64 {
        let s = 2.0 + alpha;
        ec * ec * (upper_incomplete_gamma(s, lo / ec) - upper_incomplete_gamma(s, hi / ec))
    }

    /// `∫ x (α - β)^(α - β) e^(β - α) (x / ec)^β dx` over `[lo, hi]`.
    fn powerlaw_energy_integral(alpha: f64, beta: f64, ec: f64, lo: f64, hi: f64) -> f64 {
        let pre = (alpha - beta).powf(alpha - beta) * (beta - alpha).exp() / ec.powf(beta);
        if beta == -2.0 {
            pre * (hi / lo).ln()
        } else {
            pre / (2.0 + beta) * (hi.powf(2.0 + beta) - lo.powf(2.0 + beta))
        }
    }
}

impl Function1D for BandCalderone {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![
            ("alpha", Unit::dimensionless()),
            ("beta", Unit::dimensionless()),
            ("xp", x_unit.clone()),
            ("F", y_unit.mul(x_unit)),
            ("a", x_unit.clone()),
            ("b", x_unit.clone()),
            ("opt", Unit::dimensionless()),
        ])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let alpha = self.core.value("alpha")?;
        let beta = self.core.value("beta")?;
        let xp = self.core.value("xp")?;
        let flux = self.core.value("F")?;
        let a = self.core.value("a")?;
        let b = self.core.value("b")?;
        let opt = self.core.value("opt")?;

        let band = if opt == 1.0 {
            true
        } else if opt == 0.0 {
            false
        } else {
            return Err(FunctionError::ModelDomainViolation(format!(
                "Band_Calderone: opt must be either 0 or 1, got {}",
                opt
            )));
        };
        check_index_order(Self::NAME, alpha, beta)?;
        if alpha < -2.0 {
            return Err(FunctionError::ModelDomainViolation(format!(
                "Band_Calderone: alpha ({}) cannot be smaller than -2",
                alpha
            )));
        }

        // alpha = -2 would put the cutoff at infinity
        let ec = if alpha == -2.0 { xp / 0.0001 } else { xp / (2.0 + alpha) };
        let split = (alpha - beta) * ec;

        let integral = if !band {
            Self::cutoff_energy_integral(alpha, ec, a, b)
        } else if a <= split && split <= b {
            Self::cutoff_energy_integral(alpha, ec, a, split)
                + Self::powerlaw_energy_integral(alpha, beta, ec, split, b)
        } else if split < a {
            Self::powerlaw_energy_integral(alpha, beta, ec, a, b)
        } else {
            return Err(FunctionError::ModelDomainViolation(format!(
                "Band_Calderone: split energy {} lies above the band upper bound {}",
                split, b
            )));
        };

        let norm = flux * KEV_PER_ERG / integral;

        if !band {
            return Ok(x.mapv(|v| norm * (v / ec).powf(alpha) * (-v / ec).exp()));
        }

        let below: Vec<bool> = x.iter().map(|&v| v < split).collect();
        let above: Vec<bool> = below.iter().map(|&m| !m).collect();
        let high_norm = norm * (alpha - beta).powf(alpha - beta) * (beta - alpha).exp();

        let mut out = masked_apply(x, &below, |v| norm * (v / ec).powf(alpha) * (-v / ec).exp());
        fill_masked(&mut out, x, &above, |v| high_norm * (v / ec).powf(beta));
        Ok(out)
    }
}
