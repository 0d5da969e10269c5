//! Unit-tagged evaluation must agree with plain evaluation of the same magnitudes

use approx::assert_relative_eq;
use astrofunc_rs::functions::FUNCTIONS_1D;
use astrofunc_rs::{Capabilities, Function, Function1D, FunctionRegistry, Quantity, Samples, Unit};
use ndarray::array;

/// Move every free parameter a little, staying inside its bounds.
fn nudge(f: &mut dyn Function1D, step: f64) {
    let names: Vec<String> = f.parameters().names().iter().map(|n| n.to_string()).collect();
    for name in names {
        let param = f.parameter(&name).unwrap();
        let value = param.value();
        let scale = if value == 0.0 { 1.0 } else { value.abs() };
        let target = (value + step * scale).clamp(param.min(), param.max());
        // transformations may reject the clamped value (log10 at zero)
        let _ = f.set_value(&name, target);
    }
}

fn assert_roundtrip(f: &dyn Function1D, x_unit: &Unit, y_unit: &Unit) {
    let mev = Unit::parse("MeV").unwrap();
    let tagged = Quantity::new(array![0.001, 0.0125, 0.1, 0.75, 2.0], mev);
    let magnitudes = tagged.values_in(x_unit).unwrap();

    let plain = f.evaluate(&Samples::Plain(magnitudes));
    let with_unit = f.evaluate(&Samples::WithUnit(tagged));
    match (plain, with_unit) {
        (Ok(plain), Ok(with_unit)) => {
            assert_eq!(with_unit.unit(), Some(y_unit), "{}", f.name());
            assert!(plain.unit().is_none());
            for (a, b) in plain.values().iter().zip(with_unit.values().iter()) {
                assert_relative_eq!(*a, *b, max_relative = 1e-12);
            }
        }
        (Err(_), Err(_)) => {}
        (plain, tagged) => panic!(
            "{}: plain and unit evaluation disagree ({:?} vs {:?})",
            f.name(),
            plain.is_ok(),
            tagged.is_ok()
        ),
    }
}

#[test]
fn test_every_kernel_three_parameter_sets() {
    let registry = FunctionRegistry::new(&Capabilities::new());
    let kev = Unit::parse("keV").unwrap();
    let flux = Unit::parse("1 / (keV cm2 s)").unwrap();

    let names: Vec<&str> = registry
        .available()
        .into_iter()
        .filter(|name| FUNCTIONS_1D.contains(name))
        .collect();
    assert!(names.len() >= 20);

    for name in names {
        let mut f = registry.create_1d(name).unwrap();
        f.set_units(&kev, &flux).unwrap();
        for step in [0.0, 0.05, -0.1] {
            nudge(f.as_mut(), step);
            assert_roundtrip(f.as_ref(), &kev, &flux);
        }
    }
}

#[test]
fn test_unit_samples_need_units() {
    let registry = FunctionRegistry::new(&Capabilities::new());
    let f = registry.create_1d("Powerlaw").unwrap();
    let tagged = Samples::WithUnit(Quantity::new(array![1.0], Unit::parse("keV").unwrap()));
    assert!(f.evaluate(&tagged).is_err());
}

#[test]
fn test_incompatible_sample_unit() {
    let registry = FunctionRegistry::new(&Capabilities::new());
    let mut f = registry.create_1d("Cutoff_powerlaw").unwrap();
    let kev = Unit::parse("keV").unwrap();
    f.set_units(&kev, &Unit::parse("1 / (keV cm2 s)").unwrap()).unwrap();

    let lengths = Samples::WithUnit(Quantity::new(array![1.0], Unit::parse("cm").unwrap()));
    assert!(matches!(
        f.evaluate(&lengths),
        Err(astrofunc_rs::FunctionError::UnitMismatch { .. })
    ));
}
