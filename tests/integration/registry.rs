use astrofunc_rs::functions::{FUNCTIONS_1D, FUNCTIONS_2D};
use astrofunc_rs::{Capabilities, Capability, Function, Function1D, Function2D, FunctionError, FunctionRegistry, Quantity, Samples, Unit};
use ndarray::array;

#[test]
fn test_registry_names() {
    let registry = FunctionRegistry::new(&Capabilities::new());
    assert_eq!(registry.names().len(), FUNCTIONS_1D.len() + FUNCTIONS_2D.len());
    assert!(registry.contains("Band_Calderone"));
    assert!(registry.contains("SpatialTemplate_2D"));
    assert!(!registry.contains("band_calderone"));
}

#[test]
fn test_available_functions_evaluate() {
    let registry = FunctionRegistry::new(&Capabilities::new());
    let kev = Unit::parse("keV").unwrap();
    let flux = Unit::parse("1 / (keV cm2 s)").unwrap();

    for name in registry.available() {
        if !FUNCTIONS_1D.contains(&name) {
            continue;
        }
        let mut f = registry.create_1d(name).unwrap();
        assert_eq!(f.name(), name);
        f.set_units(&kev, &flux).unwrap();
        let y = f
            .evaluate(&Samples::WithUnit(Quantity::new(array![0.5, 1.0, 50.0], kev.clone())))
            .unwrap_or_else(|e| panic!("{} failed: {}", name, e));
        assert_eq!(y.unit(), Some(&flux), "{}", name);
        assert!(y.values().iter().all(|v| v.is_finite()), "{}", name);
    }
}

#[test]
fn test_available_spatial_functions_have_boundaries() {
    let registry = FunctionRegistry::new(&Capabilities::new());
    for name in registry.available() {
        if !FUNCTIONS_2D.contains(&name) || name == "SpatialTemplate_2D" {
            continue;
        }
        let f = registry.create_2d(name).unwrap();
        let b = f.get_boundaries().unwrap();
        assert!(b.lat.0 >= -90.0 && b.lat.1 <= 90.0, "{}", name);
        let y = f
            .evaluate(&Samples::from(vec![0.0, 1.0]), &Samples::from(vec![0.0, 0.0]))
            .unwrap();
        assert!(y.values().iter().all(|v| v.is_finite() && *v >= 0.0), "{}", name);
    }

    let template = registry.create_2d("SpatialTemplate_2D").unwrap();
    assert!(matches!(template.get_boundaries(), Err(FunctionError::InvalidState(_))));
}

#[test]
fn test_factory_errors() {
    let registry = FunctionRegistry::new(&Capabilities::new());
    assert!(matches!(
        registry.create_1d("NotAFunction"),
        Err(FunctionError::Configuration(msg)) if msg.contains("unknown")
    ));
    assert!(matches!(
        registry.create_2d("Band"),
        Err(FunctionError::Configuration(msg)) if msg.contains("2-D")
    ));

    for name in ["Synchrotron", "EBLattenuation"] {
        assert!(!registry.available().contains(&name));
        assert!(matches!(
            registry.create_1d(name),
            Err(FunctionError::DependencyUnavailable { function, .. }) if function == name
        ));
    }
}

#[cfg(feature = "galactic")]
#[test]
fn test_galactic_frame_compiled_in() {
    let registry = FunctionRegistry::new(&Capabilities::new());
    assert!(registry.capabilities().is_available(Capability::GalacticFrame));
    assert!(registry.create_2d("Latitude_galactic_diffuse").is_ok());
}

#[cfg(not(feature = "galactic"))]
#[test]
fn test_galactic_frame_missing() {
    let registry = FunctionRegistry::new(&Capabilities::new());
    assert!(matches!(
        registry.create_2d("Latitude_galactic_diffuse"),
        Err(FunctionError::DependencyUnavailable { .. })
    ));
}

#[test]
fn test_missing_capabilities_listed() {
    let caps = Capabilities::new();
    let missing = caps.missing();
    assert!(missing.contains(&Capability::Synchrotron));
    assert!(missing.contains(&Capability::EblAttenuation));
    assert_eq!(missing.len(), if cfg!(feature = "galactic") { 2 } else { 3 });
    assert_eq!(astrofunc_rs::functions::required_capability("Cutoff_powerlaw_flux"), None);
}
