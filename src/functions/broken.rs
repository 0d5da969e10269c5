//! Broken power laws, sharp and smoothed.

use crate::error::{FunctionError, Result};
use crate::function::{fill_masked, masked_apply, Function1D, UnitAssignment};
use crate::units::Unit;
use ndarray::Array1;
use std::f64::consts::LN_2;

/// Reject a two-index shape whose low-energy index is below the high-energy one.
pub(crate) fn check_index_order(function: &str, alpha: f64, beta: f64) -> Result<()> {
    if alpha < beta {
        return Err(FunctionError::ModelDomainViolation(format!(
            "{}: alpha ({}) cannot be less than beta ({})",
            function, alpha, beta
        )));
    }
    Ok(())
}

const BROKEN_POWERLAW_META: &str = r#"
description: A broken power law function
latex: 'f(x)= K~\begin{cases}\left( \frac{x}{x_{b}} \right)^{\alpha} & x < x_{b} \\ \left( \frac{x}{x_{b}} \right)^{\beta} & x \ge x_{b} \end{cases}'
parameters:
  K:
    desc: Normalization (differential flux at x_b)
    initial value: 1.0
    is_normalization: true
  xb:
    desc: Break point
    initial value: 10
    min: 1.0
  alpha:
    desc: Index before the break xb
    initial value: -1.5
    min: -10
    max: 10
  beta:
    desc: Index after the break xb
    initial value: -2.5
    min: -10
    max: 10
  piv:
    desc: Pivot energy
    initial value: 1.0
    fix: yes
"#;

builtin_function!(
    /// A power law broken at `xb`, normalized to `K` at the break.
    ///
    /// `piv` is declared for compatibility with other power laws and does not
    /// enter the formula.
    BrokenPowerlaw,
    "Broken_powerlaw",
    BROKEN_POWERLAW_META
);

impl Function1D for BrokenPowerlaw {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![
            ("K", y_unit.clone()),
            ("xb", x_unit.clone()),
            ("alpha", Unit::dimensionless()),
            ("beta", Unit::dimensionless()),
            ("piv", x_unit.clone()),
        ])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let xb = self.core.value("xb")?;
        let alpha = self.core.value("alpha")?;
        let beta = self.core.value("beta")?;
        check_index_order(Self::NAME, alpha, beta)?;

        let below: Vec<bool> = x.iter().map(|&v| v < xb).collect();
        let above: Vec<bool> = below.iter().map(|&b| !b).collect();

        let mut out = masked_apply(x, &below, |v| k * (v / xb).powf(alpha));
        fill_masked(&mut out, x, &above, |v| k * (v / xb).powf(beta));
        Ok(out)
    }
}

const SMOOTHLY_BROKEN_POWERLAW_META: &str = r#"
description: >
  A Smoothly Broken Power Law. Alpha is the index below the break, beta the index
  above it, and break_scale the width of the transition in decades.
latex: ''
parameters:
  K:
    desc: normalization
    initial value: 1
    min: 0
    is_normalization: true
  alpha:
    desc: power law index below the break
    initial value: -1
    min: -1.5
    max: 2
  break_energy:
    desc: location of the peak
    initial value: 300
    fix: no
    min: 10
  break_scale:
    desc: smoothness of the break
    initial value: 0.5
    min: 0.
    max: 10.
    fix: yes
  beta:
    desc: power law index above the break
    initial value: -2.
    min: -5.0
    max: -1.6
  pivot:
    desc: where the spectrum is normalized
    initial value: 100.
    fix: yes
"#;

builtin_function!(
    /// Smoothly broken power law,
    /// `K (x / pivot)^B 10^(pcosh(x) - pcosh(pivot))`
    /// with `pcosh(x) = M Δ ln cosh(log10(x / xb) / Δ)`, `B = (α + β) / 2`,
    /// `M = (β - α) / 2` and `Δ` the break scale.
    ///
    /// A zero break scale is the sharp limit `M |log10(x / xb)|`.
    SmoothlyBrokenPowerLaw,
    "SmoothlyBrokenPowerLaw",
    SMOOTHLY_BROKEN_POWERLAW_META
);

/// `ln cosh(u)`: asymptotic form plus remainder outside `[-6, 4]`, exact inside.
pub(crate) fn log_cosh(u: f64) -> f64 {
    if (-6.0..=4.0).contains(&u) {
        u.cosh().ln()
    } else {
        u.abs() - LN_2 + (-2.0 * u.abs()).exp().ln_1p()
    }
}

impl SmoothlyBrokenPowerLaw {
    fn pcosh(m: f64, scale: f64, x: f64, break_energy: f64) -> f64 {
        let decades = (x / break_energy).log10();
        if scale == 0.0 {
            m * decades.abs()
        } else {
            m * scale * log_cosh(decades / scale)
        }
    }
}

impl Function1D for SmoothlyBrokenPowerLaw {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![
            ("K", y_unit.clone()),
            ("break_energy", x_unit.clone()),
            ("pivot", x_unit.clone()),
            ("alpha", Unit::dimensionless()),
            ("beta", Unit::dimensionless()),
            ("break_scale", Unit::dimensionless()),
        ])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let alpha = self.core.value("alpha")?;
        let break_energy = self.core.value("break_energy")?;
        let scale = self.core.value("break_scale")?;
        let beta = self.core.value("beta")?;
        let pivot = self.core.value("pivot")?;
        check_index_order(Self::NAME, alpha, beta)?;

        let b = (alpha + beta) / 2.0;
        let m = (beta - alpha) / 2.0;
        let pcosh_piv = Self::pcosh(m, scale, pivot, break_energy);

        Ok(x.mapv(|v| {
            let pcosh = Self::pcosh(m, scale, v, break_energy);
            k * (v / pivot).powf(b) * 10f64.powf(pcosh - pcosh_piv)
        }))
    }
}
