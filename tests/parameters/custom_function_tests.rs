//! A model defined outside the crate, with the crate's metadata format and traits

use approx::assert_relative_eq;
use astrofunc_rs::{function_impl, Function, Function1D, FunctionCore, FunctionError, Result, UnitAssignment};
use astrofunc_rs::{Parameters, Quantity, Samples, Unit};
use ndarray::{array, Array1};

const GAUSSIAN_LINE_META: &str = r#"
description: A Gaussian emission line
latex: 'F / (\sigma \sqrt{2 \pi}) \exp(-(x - \mu)^2 / 2 \sigma^2)'
parameters:
  F:
    desc: Integral of the line
    initial value: 1
    is_normalization: true
  mu:
    desc: Central value
    initial value: 6.4
    min: 0
  sigma:
    desc: Width
    initial value: 0.1
    min: 0
    fix: no
"#;

#[derive(Debug, Clone)]
struct GaussianLine {
    core: FunctionCore,
}

function_impl!(GaussianLine);

impl GaussianLine {
    fn new() -> Result<Self> {
        Ok(GaussianLine {
            core: FunctionCore::from_yaml("GaussianLine", GAUSSIAN_LINE_META)?,
        })
    }
}

impl Function1D for GaussianLine {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![
            ("F", y_unit.mul(x_unit)),
            ("mu", x_unit.clone()),
            ("sigma", x_unit.clone()),
        ])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let flux = self.core().value("F")?;
        let mu = self.core().value("mu")?;
        let sigma = self.core().value("sigma")?;
        let norm = flux / (sigma * (2.0 * std::f64::consts::PI).sqrt());
        Ok(x.mapv(|v| norm * (-(v - mu).powi(2) / (2.0 * sigma * sigma)).exp()))
    }
}

/// Forgets to assign a unit to `sigma`.
#[derive(Debug, Clone)]
struct Incomplete {
    core: FunctionCore,
}

function_impl!(Incomplete);

impl Function1D for Incomplete {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        Ok(vec![("F", y_unit.mul(x_unit)), ("mu", x_unit.clone())])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(x.clone())
    }
}

#[test]
fn test_custom_function_evaluates() {
    let f = GaussianLine::new().unwrap();
    assert_eq!(f.name(), "GaussianLine");
    assert_eq!(f.description(), "A Gaussian emission line");
    let y = f.evaluate_values(&array![6.4]).unwrap();
    assert_relative_eq!(y[0], 1.0 / (0.1 * (2.0 * std::f64::consts::PI).sqrt()), max_relative = 1e-12);
}

#[test]
fn test_custom_function_units() {
    let mut f = GaussianLine::new().unwrap();
    let kev = Unit::parse("keV").unwrap();
    let flux = Unit::parse("1 / (keV cm2 s)").unwrap();
    f.set_units(&kev, &flux).unwrap();
    assert!(f.has_units());
    assert!(f.parameters().all_units_assigned());
    assert!(f
        .parameter("F")
        .unwrap()
        .unit()
        .unwrap()
        .is_compatible(&Unit::parse("1 / (cm2 s)").unwrap()));

    // eV samples are converted into keV before the kernel runs
    let x = Samples::WithUnit(Quantity::new(array![6400.0], Unit::parse("eV").unwrap()));
    let y = f.evaluate(&x).unwrap();
    assert_relative_eq!(y.values()[0], f.evaluate_values(&array![6.4]).unwrap()[0], max_relative = 1e-12);
}

#[test]
fn test_incomplete_propagation_is_rejected() {
    let mut f = Incomplete {
        core: FunctionCore::from_yaml("Incomplete", GAUSSIAN_LINE_META).unwrap(),
    };
    let kev = Unit::parse("keV").unwrap();
    match f.set_units(&kev, &Unit::dimensionless()) {
        Err(FunctionError::Configuration(msg)) => assert!(msg.contains("sigma")),
        other => panic!("expected a configuration error, got {:?}", other),
    }
    // nothing was assigned
    assert!(!f.has_units());
    assert!(f.parameters().iter().all(|p| p.unit().is_none()));
}

#[test]
fn test_parameter_snapshot_restores_values() {
    let mut f = GaussianLine::new().unwrap();
    f.set_value("mu", 6.7).unwrap();
    f.set_value("sigma", 0.3).unwrap();
    let snapshot = f.parameters().to_json().unwrap();

    let mut g = GaussianLine::new().unwrap();
    g.parameters_mut()
        .update_values(&Parameters::from_json(&snapshot).unwrap())
        .unwrap();
    assert_eq!(g.parameter("mu").unwrap().value(), 6.7);
    assert_eq!(g.parameter("sigma").unwrap().value(), 0.3);
    assert_eq!(
        g.evaluate_values(&array![6.5]).unwrap(),
        f.evaluate_values(&array![6.5]).unwrap()
    );
}

#[test]
fn test_broken_metadata() {
    let missing_value = "description: x\nparameters:\n  a:\n    desc: no initial value\n";
    assert!(matches!(
        FunctionCore::from_yaml("Broken", missing_value),
        Err(FunctionError::Configuration(_))
    ));

    let outside = "description: x\nparameters:\n  a:\n    initial value: 5\n    max: 1\n";
    assert!(matches!(
        FunctionCore::from_yaml("Broken", outside),
        Err(FunctionError::Configuration(_))
    ));
}
