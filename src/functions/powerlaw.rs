//! Power laws and their cutoff variants.
//!
//! The differential forms normalize at a pivot value `piv`; the `*_flux` forms take
//! the integral over a band `[a, b]` as their normalization instead, which is less
//! correlated with the index in fits.

use crate::error::{FunctionError, Result};
use crate::function::{Function1D, FunctionCore, UnitAssignment};
use crate::special::upper_incomplete_gamma;
use crate::units::Unit;
use ndarray::Array1;
use std::sync::Once;
use tracing::warn;

const POWERLAW_META: &str = r#"
description: A simple power-law
latex: 'K~\frac{x}{piv}^{index}'
parameters:
  K:
    desc: Normalization (differential flux at the pivot value)
    initial value: 1.0
    is_normalization: true
    transformation: log10
    min: 1e-30
    max: 1e3
    delta: 0.1
  piv:
    desc: Pivot value
    initial value: 1
    fix: yes
  index:
    desc: Photon index
    initial value: -2
    min: -10
    max: 10
"#;

builtin_function!(
    /// A simple power law, `K (x / piv)^index`.
    Powerlaw,
    "Powerlaw",
    POWERLAW_META
);

fn powerlaw_units(x_unit: &Unit, y_unit: &Unit) -> UnitAssignment {
    vec![
        ("K", y_unit.clone()),
        ("piv", x_unit.clone()),
        ("index", Unit::dimensionless()),
    ]
}

fn powerlaw_kernel(core: &FunctionCore, x: &Array1<f64>) -> Result<Array1<f64>> {
    let k = core.value("K")?;
    let piv = core.value("piv")?;
    let index = core.value("index")?;
    Ok(x.mapv(|v| k * (v / piv).powf(index)))
}

impl Function1D for Powerlaw {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(powerlaw_units(x_unit, y_unit))
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        powerlaw_kernel(&self.core, x)
    }
}

const POWERLAW_LOGNORM_META: &str = r#"
description: A simple power-law with a logarithmic normalization (deprecated, use Powerlaw)
latex: 'K~\frac{x}{piv}^{index}'
parameters:
  K:
    desc: Normalization (log of differential flux at the pivot value)
    initial value: 1.0
    is_normalization: true
    transformation: log10
  piv:
    desc: Pivot value
    initial value: 1
    fix: yes
  index:
    desc: Photon index
    initial value: -2
    min: -10
    max: 10
"#;

static LOGNORM_DEPRECATION: Once = Once::new();

builtin_function!(
    /// Deprecated alias of [`Powerlaw`] with an unbounded normalization.
    PowerlawLognorm,
    "Powerlaw_lognorm",
    POWERLAW_LOGNORM_META
);

impl Function1D for PowerlawLognorm {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        LOGNORM_DEPRECATION.call_once(|| {
            warn!("Powerlaw_lognorm is deprecated, use Powerlaw which has the same functionality")
        });
        Ok(powerlaw_units(x_unit, y_unit))
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        powerlaw_kernel(&self.core, x)
    }
}

const POWERLAW_FLUX_META: &str = r#"
description: >
  A simple power-law with the integral over the band [a, b] as normalization
  parameter instead of the differential flux at the pivot
latex: '\frac{F(\gamma+1)}{b^{\gamma+1} - a^{\gamma+1}} (x)^{\gamma}'
parameters:
  F:
    desc: Integral between a and b
    initial value: 1
    is_normalization: true
    transformation: log10
    min: 1e-30
    max: 1e3
    delta: 0.1
  index:
    desc: Photon index
    initial value: -2
    min: -10
    max: 10
  a:
    desc: lower bound for the band in which computing the integral F
    initial value: 1.0
    fix: yes
  b:
    desc: upper bound for the band in which computing the integral F
    initial value: 100.0
    fix: yes
  piv:
    desc: Pivot value
    initial value: 1
    fix: yes
"#;

builtin_function!(
    /// Power law normalized to its integral `F` over `[a, b]`.
    PowerlawFlux,
    "Powerlaw_flux",
    POWERLAW_FLUX_META
);

/// `∫_a^b (x / piv)^index dx`, with the logarithmic form at `index = -1`.
pub(crate) fn powerlaw_band_integral(index: f64, a: f64, b: f64, piv: f64) -> f64 {
    let gp1 = index + 1.0;
    if gp1.abs() < 1e-12 {
        piv * (b / a).ln()
    } else {
        piv * ((b / piv).powf(gp1) - (a / piv).powf(gp1)) / gp1
    }
}

impl Function1D for PowerlawFlux {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![
            ("F", y_unit.mul(x_unit)),
            ("index", Unit::dimensionless()),
            ("a", x_unit.clone()),
            ("b", x_unit.clone()),
            ("piv", x_unit.clone()),
        ])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let flux = self.core.value("F")?;
        let index = self.core.value("index")?;
        let a = self.core.value("a")?;
        let b = self.core.value("b")?;
        let piv = self.core.value("piv")?;

        let integral = powerlaw_band_integral(index, a, b, piv);
        let norm = flux / integral;
        Ok(x.mapv(|v| norm * (v / piv).powf(index)))
    }
}

const CUTOFF_POWERLAW_META: &str = r#"
description: A power law multiplied by an exponential cutoff
latex: 'K~\frac{x}{piv}^{index}~\exp{-x/xc}'
parameters:
  K:
    desc: Normalization (differential flux at the pivot value)
    initial value: 1.0
    is_normalization: true
    transformation: log10
    min: 1e-30
    max: 1e3
    delta: 0.1
  piv:
    desc: Pivot value
    initial value: 1
    fix: yes
  index:
    desc: Photon index
    initial value: -2
    min: -10
    max: 10
  xc:
    desc: Cutoff energy
    initial value: 10.0
    transformation: log10
"#;

builtin_function!(
    /// `K (x / piv)^index exp(-x / xc)`.
    CutoffPowerlaw,
    "Cutoff_powerlaw",
    CUTOFF_POWERLAW_META
);

impl Function1D for CutoffPowerlaw {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        let mut units = powerlaw_units(x_unit, y_unit);
        units.push(("xc", x_unit.clone()));
        Ok(units)
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let piv = self.core.value("piv")?;
        let index = self.core.value("index")?;
        let xc = self.core.value("xc")?;
        Ok(x.mapv(|v| k * (v / piv).powf(index) * (-v / xc).exp()))
    }
}

const INVERSE_CUTOFF_POWERLAW_META: &str = r#"
description: A power law multiplied by an exponential cutoff with the inverse cutoff energy as parameter
latex: 'K~\frac{x}{piv}^{index}~\exp{-x~b}'
parameters:
  K:
    desc: Normalization (differential flux at the pivot value)
    initial value: 1.0
    is_normalization: true
    transformation: log10
    min: 1e-30
    max: 1e3
    delta: 0.1
  piv:
    desc: Pivot value
    initial value: 1
    fix: yes
  index:
    desc: Photon index
    initial value: -2
    min: -10
    max: 10
  b:
    desc: inverse cutoff energy i.e 1/xc
    initial value: 1
"#;

builtin_function!(
    /// `K (x / piv)^index exp(-x b)`, with `b = 1 / xc`.
    InverseCutoffPowerlaw,
    "Inverse_cutoff_powerlaw",
    INVERSE_CUTOFF_POWERLAW_META
);

impl Function1D for InverseCutoffPowerlaw {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        let mut units = powerlaw_units(x_unit, y_unit);
        units.push(("b", x_unit.inverse()));
        Ok(units)
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let piv = self.core.value("piv")?;
        let index = self.core.value("index")?;
        let b = self.core.value("b")?;
        Ok(x.mapv(|v| k * (v / piv).powf(index) * (-v * b).exp()))
    }
}

const SUPER_CUTOFF_POWERLAW_META: &str = r#"
description: A power law with a super-exponential cutoff
latex: 'K~\frac{x}{piv}^{index}~\exp{(-x/xc)^{\gamma}}'
parameters:
  K:
    desc: Normalization (differential flux at the pivot value)
    initial value: 1.0
    is_normalization: true
  piv:
    desc: Pivot value
    initial value: 1
    fix: yes
  index:
    desc: Photon index
    initial value: -2
    min: -10
    max: 10
  xc:
    desc: Cutoff energy
    initial value: 10.0
    min: 1.0
  gamma:
    desc: Index of the super-exponential cutoff
    initial value: 1.0
    min: 0.1
    max: 10.0
"#;

builtin_function!(
    /// `K (x / piv)^index exp(-(x / xc)^gamma)`.
    SuperCutoffPowerlaw,
    "Super_cutoff_powerlaw",
    SUPER_CUTOFF_POWERLAW_META
);

impl Function1D for SuperCutoffPowerlaw {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        let mut units = powerlaw_units(x_unit, y_unit);
        units.push(("xc", x_unit.clone()));
        units.push(("gamma", Unit::dimensionless()));
        Ok(units)
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let piv = self.core.value("piv")?;
        let index = self.core.value("index")?;
        let xc = self.core.value("xc")?;
        let gamma = self.core.value("gamma")?;
        Ok(x.mapv(|v| k * (v / piv).powf(index) * (-(v / xc).powf(gamma)).exp()))
    }
}

const CUTOFF_POWERLAW_FLUX_META: &str = r#"
description: >
  A cutoff power law having the flux as normalization, which should reduce the
  correlation among parameters
latex: '\frac{F}{T(b)-T(a)}~x^{index}~\exp{(-x/x_{c})}~\text{with}~T(x)=-x_{c}^{index+1} \Gamma(index+1, x/C)'
parameters:
  F:
    desc: Integral between a and b
    initial value: 1e-5
    is_normalization: true
  index:
    desc: photon index
    initial value: -2.0
  xc:
    desc: cutoff position
    initial value: 50.0
  a:
    desc: lower bound for the band in which computing the integral F
    initial value: 1.0
    fix: yes
  b:
    desc: upper bound for the band in which computing the integral F
    initial value: 100.0
    fix: yes
"#;

builtin_function!(
    /// Cutoff power law normalized to its integral `F` over `[a, b]`.
    ///
    /// The band integral is `xc^{index+1} [Γ(index+1, a/xc) - Γ(index+1, b/xc)]`,
    /// valid for any real index thanks to the unnormalized incomplete gamma.
    CutoffPowerlawFlux,
    "Cutoff_powerlaw_flux",
    CUTOFF_POWERLAW_FLUX_META
);

/// `∫_a^b x^index exp(-x / xc) dx`.
pub(crate) fn cutoff_band_integral(index: f64, xc: f64, a: f64, b: f64) -> f64 {
    let ap1 = index + 1.0;
    xc.powf(ap1) * (upper_incomplete_gamma(ap1, a / xc) - upper_incomplete_gamma(ap1, b / xc))
}

impl Function1D for CutoffPowerlawFlux {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![
            ("F", y_unit.mul(x_unit)),
            ("index", Unit::dimensionless()),
            ("xc", x_unit.clone()),
            ("a", x_unit.clone()),
            ("b", x_unit.clone()),
        ])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let flux = self.core.value("F")?;
        let index = self.core.value("index")?;
        let xc = self.core.value("xc")?;
        let a = self.core.value("a")?;
        let b = self.core.value("b")?;

        let integral = cutoff_band_integral(index, xc, a, b);
        if !integral.is_finite() || integral <= 0.0 {
            return Err(FunctionError::ModelDomainViolation(format!(
                "Cutoff_powerlaw_flux band integral over [{}, {}] is {}",
                a, b, integral
            )));
        }
        let norm = flux / integral;
        Ok(x.mapv(|v| norm * v.powf(index) * (-v / xc).exp()))
    }
}

const EXPONENTIAL_CUTOFF_META: &str = r#"
description: An exponential cutoff
latex: 'K \exp{(-x/xc)}'
parameters:
  K:
    desc: Normalization
    initial value: 1.0
    fix: no
    is_normalization: true
  xc:
    desc: cutoff
    initial value: 100
    min: 1
"#;

builtin_function!(
    /// `K exp(-x / xc)`.
    ExponentialCutoff,
    "Exponential_cutoff",
    EXPONENTIAL_CUTOFF_META
);

impl Function1D for ExponentialCutoff {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![("K", y_unit.clone()), ("xc", x_unit.clone())])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let xc = self.core.value("xc")?;
        Ok(x.mapv(|v| k * (-v / xc).exp()))
    }
}

const LOG_PARABOLA_META: &str = r#"
description: >
  A log-parabolic function. NOTE that we use the high-energy convention of using
  the natural log in place of the base-10 logarithm. This means that beta is a
  factor 1 / log10(e) larger than what returned by those software using the other
  convention.
latex: 'K \left( \frac{x}{piv} \right)^{\alpha - \beta \log{\left( \frac{x}{piv} \right)}}'
parameters:
  K:
    desc: Normalization
    initial value: 1.0
    is_normalization: true
    transformation: log10
    min: 1e-30
    max: 1e5
  piv:
    desc: Pivot (keep this fixed)
    initial value: 1
    fix: yes
  alpha:
    desc: index
    initial value: -2.0
  beta:
    desc: curvature (positive is concave, negative is convex)
    initial value: 1.0
"#;

builtin_function!(
    /// `K (x / piv)^(alpha - beta ln(x / piv))`, natural-log convention.
    LogParabola,
    "Log_parabola",
    LOG_PARABOLA_META
);

impl LogParabola {
    /// Peak of the `x^2 f(x)` (nuFnu) spectrum, in the unit of `piv`.
    ///
    /// Only a concave parabola (`beta > 0`) has a peak.
    pub fn peak_energy(&self) -> Result<f64> {
        let piv = self.core.value("piv")?;
        let alpha = self.core.value("alpha")?;
        let beta = self.core.value("beta")?;
        if beta <= 0.0 {
            return Err(FunctionError::ModelDomainViolation(format!(
                "Log_parabola with beta = {} has no nuFnu peak",
                beta
            )));
        }
        Ok(piv * ((2.0 + alpha) / (2.0 * beta)).exp())
    }
}

impl Function1D for LogParabola {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![
            ("K", y_unit.clone()),
            ("piv", x_unit.clone()),
            ("alpha", Unit::dimensionless()),
            ("beta", Unit::dimensionless()),
        ])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let piv = self.core.value("piv")?;
        let alpha = self.core.value("alpha")?;
        let beta = self.core.value("beta")?;
        Ok(x.mapv(|v| {
            let xx = v / piv;
            k * xx.powf(alpha - beta * xx.ln())
        }))
    }
}
