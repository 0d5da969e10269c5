//! The built-in metadata produces the declared parameters

use astrofunc_rs::functions::{BandCalderone, Sin, SmoothlyBrokenPowerLaw, StepFunctionUpper, Synchrotron};
use astrofunc_rs::parameters::{Parameters, Transformation};
use astrofunc_rs::{Capabilities, Function, FunctionError, FunctionRegistry, Unit};
use std::f64::consts::PI;

#[test]
fn test_every_builtin_has_sane_parameters() {
    let registry = FunctionRegistry::new(&Capabilities::new());
    for name in registry.available() {
        let params: Parameters = match registry.create_1d(name) {
            Ok(f) => f.parameters().clone(),
            Err(_) => registry.create_2d(name).unwrap().parameters().clone(),
        };
        assert!(!params.is_empty(), "{} declares no parameters", name);
        for p in params.iter() {
            assert!(p.min() <= p.value() && p.value() <= p.max(), "{}.{}", name, p.name());
            assert!(p.unit().is_none(), "{}.{} has a unit before propagation", name, p.name());
        }
    }
}

#[test]
fn test_expressions_in_metadata() {
    let f = Sin::new().unwrap();
    let phi = f.parameter("phi").unwrap();
    assert_eq!(phi.min(), -PI);
    assert_eq!(phi.max(), PI);
    assert_eq!(phi.declared_unit(), Some(&Unit::parse("rad").unwrap()));
    assert!((f.parameter("f").unwrap().value() - 1.0 / (2.0 * PI)).abs() < 1e-15);
}

#[test]
fn test_flags() {
    let f = StepFunctionUpper::new().unwrap();
    assert!(f.parameter("lower_bound").unwrap().is_fixed());
    assert!(f.parameter("value").unwrap().is_free());

    let f = SmoothlyBrokenPowerLaw::new().unwrap();
    assert!(f.parameter("K").unwrap().is_normalization());
    assert!(f.parameter("break_scale").unwrap().is_fixed());
    assert!(f.parameter("break_energy").unwrap().is_free());
    assert_eq!(f.parameters().free().len(), 4);

    let f = BandCalderone::new().unwrap();
    assert_eq!(
        f.parameters().names(),
        vec!["alpha", "beta", "xp", "F", "a", "b", "opt"]
    );
    assert_eq!(f.parameter("K").err().map(|e| matches!(e, FunctionError::ParameterNotFound(_))), Some(true));
}

#[test]
fn test_log10_normalization_rejects_non_positive() {
    let registry = FunctionRegistry::new(&Capabilities::new());
    let mut f = registry.create_1d("Powerlaw").unwrap();
    assert_eq!(f.parameter("K").unwrap().transformation(), Transformation::Log10);
    assert!(matches!(f.set_value("K", 0.0), Err(FunctionError::ParameterError(_))));
    assert!(matches!(f.set_value("index", 11.0), Err(FunctionError::ParameterError(_))));
    assert_eq!(f.parameter("index").unwrap().value(), -2.0);
}

#[test]
fn test_declared_units_survive_propagation() {
    struct Silent;
    impl astrofunc_rs::functions::SynchrotronEmitter for Silent {
        fn flux(
            &self,
            _source: &dyn astrofunc_rs::functions::RadiationSource,
            _settings: &astrofunc_rs::functions::SynchrotronSettings,
            photon_energies: &astrofunc_rs::Quantity,
        ) -> astrofunc_rs::Result<astrofunc_rs::Quantity> {
            Ok(photon_energies.clone())
        }
    }

    use astrofunc_rs::Function1D;
    let mut f = Synchrotron::new(std::sync::Arc::new(Silent)).unwrap();
    f.set_units(&Unit::parse("keV").unwrap(), &Unit::parse("1 / (keV cm2 s)").unwrap())
        .unwrap();
    assert_eq!(f.parameter("B").unwrap().unit().map(|u| u.symbol()), Some("Gauss"));
    assert_eq!(f.parameter("distance").unwrap().unit().map(|u| u.symbol()), Some("kpc"));
    assert_eq!(f.parameter("emax").unwrap().unit().map(|u| u.symbol()), Some("GeV"));
    assert!(f.parameter("need").unwrap().unit().unwrap().is_dimensionless());
}
