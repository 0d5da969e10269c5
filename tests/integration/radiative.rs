use approx::assert_relative_eq;
use astrofunc_rs::functions::{
    FunctionSource, OpacityProvider, RadiationSource, StaticOpacityProvider, SynchrotronEmitter, SynchrotronSettings,
    TabulatedOpticalDepth,
};
use astrofunc_rs::{
    Capabilities, Capability, Function, Function1D, FunctionError, FunctionRegistry, Quantity, Result, Samples, Unit, UnitSystem,
};
use ndarray::{array, Array2};
use std::sync::Arc;

/// Flux proportional to `B E^2 dN/dE`, which is easy to check by hand.
struct ScaledEmitter;

impl SynchrotronEmitter for ScaledEmitter {
    fn flux(
        &self,
        source: &dyn RadiationSource,
        settings: &SynchrotronSettings,
        photon_energies: &Quantity,
    ) -> Result<Quantity> {
        let kev = Unit::parse("keV")?;
        let energies = photon_energies.values_in(&kev)?;
        let density = source.particle_density(&Quantity::new(energies.clone(), kev.clone()))?;
        let density = density.values_in(&kev.inverse())?;
        let values = &energies * &energies * &density * settings.magnetic_field;
        Ok(Quantity::new(values, Unit::parse("1 / (keV cm2 s)")?))
    }
}

fn opacity() -> Arc<dyn OpacityProvider> {
    // tau = z * log10(E / 0.1 TeV) between 0.1 and 100 TeV
    let tau = array![[0.0, 0.0, 0.0, 0.0], [0.0, 1.0, 2.0, 3.0], [0.0, 2.0, 4.0, 6.0]];
    let table = TabulatedOpticalDepth::new(vec![0.0, 1.0, 2.0], vec![0.1, 1.0, 10.0, 100.0], tau).unwrap();
    Arc::new(StaticOpacityProvider::new().with_model("dominguez", Arc::new(table)))
}

fn capabilities() -> Capabilities {
    Capabilities::new()
        .with_synchrotron(Arc::new(ScaledEmitter))
        .with_opacity(opacity())
}

#[test]
fn test_capabilities_unlock_optional_functions() {
    let caps = capabilities();
    assert!(caps.is_available(Capability::Synchrotron));
    assert!(caps.is_available(Capability::EblAttenuation));

    let registry = FunctionRegistry::new(&caps);
    assert!(registry.available().contains(&"Synchrotron"));
    assert!(registry.available().contains(&"EBLattenuation"));
    assert_eq!(registry.create_1d("Synchrotron").unwrap().name(), "Synchrotron");
}

#[test]
fn test_missing_default_ebl_model() {
    let table = TabulatedOpticalDepth::new(vec![0.0, 1.0], vec![0.1, 1.0], Array2::zeros((2, 2))).unwrap();
    let provider = StaticOpacityProvider::new().with_model("finke", Arc::new(table));
    let registry = FunctionRegistry::new(&Capabilities::new().with_opacity(Arc::new(provider)));
    assert!(matches!(
        registry.create_1d("EBLattenuation"),
        Err(FunctionError::Configuration(_))
    ));
}

#[test]
fn test_ebl_attenuation_through_registry() {
    let registry = FunctionRegistry::new(&capabilities());
    let mut ebl = registry.create_1d("EBLattenuation").unwrap();
    ebl.set_value("redshift", 2.0).unwrap();

    ebl.set_units(&Unit::parse("GeV").unwrap(), &Unit::dimensionless()).unwrap();
    let x = Samples::WithUnit(Quantity::new(array![0.1, 1.0, 10.0], Unit::parse("TeV").unwrap()));
    let y = ebl.evaluate(&x).unwrap();
    assert_relative_eq!(y.values()[0], 1.0, epsilon = 1e-12);
    assert_relative_eq!(y.values()[1], (-2.0f64).exp(), max_relative = 1e-12);
    assert_relative_eq!(y.values()[2], (-4.0f64).exp(), max_relative = 1e-12);

    // plain samples are in the x unit
    let y = ebl.evaluate_values(&array![1000.0]).unwrap();
    assert_relative_eq!(y[0], (-2.0f64).exp(), max_relative = 1e-12);

    // halfway in redshift
    ebl.set_value("redshift", 1.5).unwrap();
    let y = ebl.evaluate_values(&array![1000.0]).unwrap();
    assert_relative_eq!(y[0], (-1.5f64).exp(), max_relative = 1e-12);
}

#[test]
fn test_attenuated_spectrum() {
    let registry = FunctionRegistry::new(&capabilities());
    let kev = Unit::parse("keV").unwrap();
    let flux = Unit::parse("1 / (keV cm2 s)").unwrap();

    let mut powerlaw = registry.create_1d("Powerlaw").unwrap();
    let mut ebl = registry.create_1d("EBLattenuation").unwrap();
    powerlaw.set_units(&kev, &flux).unwrap();
    ebl.set_units(&kev, &Unit::dimensionless()).unwrap();

    let x = Samples::WithUnit(Quantity::new(array![1e8, 1e9, 1e10], kev.clone()));
    let spectrum = powerlaw.evaluate(&x).unwrap();
    let factor = ebl.evaluate(&x).unwrap();
    let attenuated = spectrum.values() * factor.values();
    // no absorption below 0.1 TeV
    assert_relative_eq!(attenuated[0], spectrum.values()[0], max_relative = 1e-12);
    assert!(attenuated[2] < attenuated[1] * 1e-2);
    assert_relative_eq!(attenuated[1], 1e-18 * (-1.0f64).exp(), max_relative = 1e-9);
}

#[test]
fn test_synchrotron_from_function_source() {
    let registry = FunctionRegistry::new(&capabilities());
    let system = UnitSystem::default();

    let mut electrons = registry.create_1d("Powerlaw").unwrap();
    electrons.set_value("index", -3.0).unwrap();
    let source = Arc::new(FunctionSource::new(electrons, &system).unwrap());

    // a FunctionSource is usable as a radiation source on its own
    let density = source
        .particle_density(&Quantity::new(array![1.0, 2.0], Unit::parse("MeV").unwrap()))
        .unwrap();
    assert!(density.unit.is_compatible(&Unit::parse("1 / keV").unwrap()));
    assert_relative_eq!(density.values_in(&Unit::parse("1 / keV").unwrap()).unwrap()[0], 1e-9, max_relative = 1e-12);

    let synchrotron = astrofunc_rs::functions::Synchrotron::new(Arc::new(ScaledEmitter)).unwrap();
    let mut synchrotron = synchrotron.with_unit_system(system.clone());
    synchrotron.set_particle_distribution(source);
    synchrotron.set_value("B", 1e-5).unwrap();

    // B E^2 E^-3 = B / E
    let y = synchrotron.evaluate_values(&array![10.0, 100.0]).unwrap();
    assert_relative_eq!(y[0], 1e-6, max_relative = 1e-12);
    assert_relative_eq!(y[1], 1e-7, max_relative = 1e-12);

    synchrotron
        .set_units(&Unit::parse("MeV").unwrap(), &Unit::parse("1 / (MeV cm2 s)").unwrap())
        .unwrap();
    let y = synchrotron
        .evaluate(&Samples::WithUnit(Quantity::new(array![0.01], Unit::parse("MeV").unwrap())))
        .unwrap();
    // 1e-6 per keV is 1e-3 per MeV
    assert_relative_eq!(y.values()[0], 1e-3, max_relative = 1e-12);
}
