//! Elementary shapes: steps, a blackbody, a sine, lines and a delta.

use crate::error::Result;
use crate::function::{masked_apply, Function1D, UnitAssignment};
use crate::units::{Dimension, Unit};
use ndarray::Array1;
use std::f64::consts::PI;

fn step_units(x_unit: &Unit, y_unit: &Unit) -> UnitAssignment {
    vec![
        ("lower_bound", x_unit.clone()),
        ("upper_bound", x_unit.clone()),
        ("value", y_unit.clone()),
    ]
}

const STEP_FUNCTION_META: &str = r#"
description: A function which is constant on the interval lower_bound - upper_bound and 0 outside the interval. The extremes of the interval are counted as part of the interval.
latex: 'f(x)=\begin{cases}0 & x < \text{lower_bound} \\\text{value} & \text{lower_bound} \le x \le \text{upper_bound} \\ 0 & x > \text{upper_bound} \end{cases}'
parameters:
  lower_bound:
    desc: Lower bound for the interval
    initial value: 0
  upper_bound:
    desc: Upper bound for the interval
    initial value: 1
  value:
    desc: Value in the interval
    initial value: 1.0
"#;

builtin_function!(
    /// `value` on the closed interval `[lower_bound, upper_bound]`, zero elsewhere.
    StepFunction,
    "StepFunction",
    STEP_FUNCTION_META
);

impl Function1D for StepFunction {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(step_units(x_unit, y_unit))
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let lower = self.core.value("lower_bound")?;
        let upper = self.core.value("upper_bound")?;
        let value = self.core.value("value")?;
        let inside: Vec<bool> = x.iter().map(|&v| v >= lower && v <= upper).collect();
        Ok(masked_apply(x, &inside, |_| value))
    }
}

const STEP_FUNCTION_UPPER_META: &str = r#"
description: A function which is constant on the interval lower_bound - upper_bound and 0 outside the interval. The upper interval is open.
latex: 'f(x)=\begin{cases}0 & x < \text{lower_bound} \\\text{value} & \text{lower_bound} \le x < \text{upper_bound} \\ 0 & x \ge \text{upper_bound} \end{cases}'
parameters:
  lower_bound:
    desc: Lower bound for the interval
    initial value: 0
    fix: yes
  upper_bound:
    desc: Upper bound for the interval
    initial value: 1
    fix: yes
  value:
    desc: Value in the interval
    initial value: 1.0
"#;

builtin_function!(
    /// `value` on the half-open interval `[lower_bound, upper_bound)`, zero elsewhere.
    ///
    /// Adjacent steps sharing a bound never overlap.
    StepFunctionUpper,
    "StepFunctionUpper",
    STEP_FUNCTION_UPPER_META
);

impl Function1D for StepFunctionUpper {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(step_units(x_unit, y_unit))
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let lower = self.core.value("lower_bound")?;
        let upper = self.core.value("upper_bound")?;
        let value = self.core.value("value")?;
        let inside: Vec<bool> = x.iter().map(|&v| v >= lower && v < upper).collect();
        Ok(masked_apply(x, &inside, |_| value))
    }
}

const BLACKBODY_META: &str = r#"
description: A blackbody function
latex: 'f(x) = K \frac{x^2}{\exp(\frac{x}{kT}) -1}'
parameters:
  K:
    desc: normalization
    initial value: 1e-4
    min: 0
    is_normalization: true
  kT:
    desc: temperature of the blackbody
    initial value: 30.0
    min: 0
"#;

builtin_function!(
    /// Photon blackbody, `K x^2 / (exp(x / kT) - 1)`.
    ///
    /// Samples with `x / kT` above 700 (where the exponential overflows) or equal
    /// to zero evaluate to zero.
    Blackbody,
    "Blackbody",
    BLACKBODY_META
);

impl Function1D for Blackbody {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![
            ("K", y_unit.div(&x_unit.powi(2))),
            ("kT", x_unit.clone()),
        ])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let kt = self.core.value("kT")?;
        let usable: Vec<bool> = x
            .iter()
            .map(|&v| {
                let arg = v / kt;
                arg <= 700.0 && arg != 0.0
            })
            .collect();
        Ok(masked_apply(x, &usable, |v| k * v * v / (v / kt).exp_m1()))
    }
}

const SIN_META: &str = r#"
description: A sinusodial function
latex: 'K~\sin{(2\pi f x + \phi)}'
parameters:
  K:
    desc: Normalization
    initial value: 1
    is_normalization: true
  f:
    desc: frequency
    initial value: "1.0 / (2 * pi)"
    min: 0
  phi:
    desc: phase
    initial value: 0
    min: -pi
    max: +pi
    unit: rad
"#;

builtin_function!(
    /// `K sin(2π f x + phi)`; the phase is always in radians.
    Sin,
    "Sin",
    SIN_META
);

impl Function1D for Sin {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        let radian = Unit::new("rad", 1.0, Dimension::ANGLE);
        Ok(vec![("K", y_unit.clone()), ("f", radian.div(x_unit))])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("K")?;
        let f = self.core.value("f")?;
        let phi = self.core.value("phi")?;
        Ok(x.mapv(|v| k * (2.0 * PI * f * v + phi).sin()))
    }
}

const LINE_META: &str = r#"
description: A linear function
latex: 'a * x + b'
parameters:
  a:
    desc: linear coefficient
    initial value: 1
  b:
    desc: intercept
    initial value: 0
"#;

builtin_function!(
    /// `a x + b`.
    Line,
    "Line",
    LINE_META
);

impl Function1D for Line {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![("a", y_unit.div(x_unit)), ("b", y_unit.clone())])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let a = self.core.value("a")?;
        let b = self.core.value("b")?;
        Ok(x.mapv(|v| a * v + b))
    }
}

const CONSTANT_META: &str = r#"
description: Return k
latex: 'k'
parameters:
  k:
    desc: Constant value
    initial value: 0
"#;

builtin_function!(
    /// The constant `k`, broadcast to the sample shape.
    Constant,
    "Constant",
    CONSTANT_META
);

impl Function1D for Constant {
    fn propagate_units(&self, _x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![("k", y_unit.clone())])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let k = self.core.value("k")?;
        Ok(Array1::from_elem(x.len(), k))
    }
}

const DIRAC_DELTA_META: &str = r#"
description: return  at zero_point
latex: 'value'
parameters:
  value:
    desc: Constant value
    initial value: 0
  zero_point:
    desc: value at which function is non-zero
    initial value: 0
    fix: yes
"#;

builtin_function!(
    /// `value` where `x` equals `zero_point` exactly, zero elsewhere.
    DiracDelta,
    "DiracDelta",
    DIRAC_DELTA_META
);

impl Function1D for DiracDelta {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![("value", y_unit.clone()), ("zero_point", x_unit.clone())])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let value = self.core.value("value")?;
        let zero_point = self.core.value("zero_point")?;
        let hit: Vec<bool> = x.iter().map(|&v| v == zero_point).collect();
        Ok(masked_apply(x, &hit, |_| value))
    }
}
