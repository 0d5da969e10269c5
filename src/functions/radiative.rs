//! Models backed by external radiative collaborators.
//!
//! Synchrotron emission and EBL absorption are not computed here. The models talk
//! to a [`SynchrotronEmitter`] and to an [`OpticalDepth`] table through traits, and
//! the [`Capabilities`](crate::capabilities::Capabilities) registry decides whether
//! such collaborators exist in the process.

use crate::error::{FunctionError, Result};
use crate::function::{Function, Function1D, FunctionCore, UnitAssignment};
use crate::units::unit::EV_IN_JOULE;
use crate::units::{Dimension, Quantity, Samples, Unit, UnitSystem};
use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A particle energy distribution feeding a radiative model.
pub trait RadiationSource: Send + Sync {
    /// Differential number density `dN/dE` at the given particle energies.
    fn particle_density(&self, energies: &Quantity) -> Result<Quantity>;
}

/// Any 1-D function used as a particle distribution.
///
/// The wrapped function gets its units fixed to energy and 1/energy of the unit
/// system, so it can be evaluated at unit-tagged energies.
pub struct FunctionSource {
    function: Box<dyn Function1D>,
}

impl FunctionSource {
    pub fn new(mut function: Box<dyn Function1D>, system: &UnitSystem) -> Result<Self> {
        function.set_units(&system.energy, &system.energy.inverse())?;
        Ok(FunctionSource { function })
    }

    pub fn function(&self) -> &dyn Function1D {
        self.function.as_ref()
    }

    pub fn function_mut(&mut self) -> &mut dyn Function1D {
        self.function.as_mut()
    }
}

impl fmt::Debug for FunctionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSource")
            .field("function", &self.function.name())
            .finish()
    }
}

impl RadiationSource for FunctionSource {
    fn particle_density(&self, energies: &Quantity) -> Result<Quantity> {
        match self.function.evaluate(&Samples::WithUnit(energies.clone()))? {
            Samples::WithUnit(density) => Ok(density),
            Samples::Plain(_) => Err(FunctionError::InvalidState(format!(
                "{} returned a result without units",
                self.function.name()
            ))),
        }
    }
}

/// Physical configuration passed to a synchrotron emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynchrotronSettings {
    /// Magnetic field in Gauss.
    pub magnetic_field: f64,
    /// Source distance in kpc.
    pub distance: f64,
    /// Lower bound of the particle energies, GeV.
    pub emin: f64,
    /// Upper bound of the particle energies, GeV.
    pub emax: f64,
    /// Particle energy samples per decade.
    pub points_per_decade: usize,
}

/// Computes the synchrotron photon flux of a particle distribution.
pub trait SynchrotronEmitter: Send + Sync {
    fn flux(
        &self,
        source: &dyn RadiationSource,
        settings: &SynchrotronSettings,
        photon_energies: &Quantity,
    ) -> Result<Quantity>;
}

const SYNCHROTRON_META: &str = r#"
description: Synchrotron spectrum from an input particle distribution
parameters:
  B:
    desc: magnetic field
    initial value: 3.24e-6
    unit: Gauss
  distance:
    desc: distance of the source
    initial value: 1.0
    unit: kpc
  emin:
    desc: minimum energy for the particle distribution
    initial value: 1
    fix: yes
    unit: GeV
  emax:
    desc: maximum energy for the particle distribution
    initial value: 510e3
    fix: yes
    unit: GeV
  need:
    desc: number of points per decade in which to evaluate the function
    initial value: 10
    min: 2
    max: 100
    fix: yes
"#;

/// Synchrotron spectrum of a particle distribution, delegated to an emitter.
///
/// Only usable as a spectrum: x must be an energy and y a differential flux.
/// Plain samples are energies in the x unit once units are set, in the unit
/// system's energy unit before that; the result follows the same rule for y.
pub struct Synchrotron {
    core: FunctionCore,
    emitter: Arc<dyn SynchrotronEmitter>,
    source: Option<Arc<dyn RadiationSource>>,
    unit_system: UnitSystem,
}

crate::function_impl!(Synchrotron);

impl Synchrotron {
    pub fn new(emitter: Arc<dyn SynchrotronEmitter>) -> Result<Self> {
        Ok(Synchrotron {
            core: FunctionCore::from_yaml("Synchrotron", SYNCHROTRON_META)?,
            emitter,
            source: None,
            unit_system: UnitSystem::default(),
        })
    }

    pub fn with_unit_system(mut self, unit_system: UnitSystem) -> Self {
        self.unit_system = unit_system;
        self
    }

    pub fn unit_system(&self) -> &UnitSystem {
        &self.unit_system
    }

    /// Attach the particle distribution. The model keeps a shared handle only.
    pub fn set_particle_distribution(&mut self, source: Arc<dyn RadiationSource>) {
        self.source = Some(source);
    }

    pub fn particle_distribution(&self) -> Option<&Arc<dyn RadiationSource>> {
        self.source.as_ref()
    }

    fn settings(&self) -> Result<SynchrotronSettings> {
        Ok(SynchrotronSettings {
            magnetic_field: self.core.value("B")?,
            distance: self.core.value("distance")?,
            emin: self.core.value("emin")?,
            emax: self.core.value("emax")?,
            points_per_decade: self.core.value("need")?.round() as usize,
        })
    }
}

impl Function1D for Synchrotron {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        if !x_unit.is_energy() {
            return Err(FunctionError::unit_mismatch(
                "x",
                format!("Synchrotron can only be used as a spectrum, x must be an energy, got {}", x_unit),
            ));
        }

        let system = &self.unit_system;
        let should_be_unitless = y_unit.mul(&system.energy.mul(&system.time).mul(&system.area));
        if !should_be_unitless.is_dimensionless() {
            return Err(FunctionError::unit_mismatch(
                "y",
                format!("Synchrotron can only be used as a spectrum, y must be a differential flux, got {}", y_unit),
            ));
        }

        // B, distance, emin and emax carry fixed units
        Ok(vec![("need", Unit::dimensionless())])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let source = self.source.as_ref().ok_or_else(|| {
            FunctionError::InvalidState("Synchrotron has no particle distribution".to_string())
        })?;

        let x_unit = self
            .core
            .axis_unit(0)
            .cloned()
            .unwrap_or_else(|| self.unit_system.energy.clone());
        let y_unit = self
            .core
            .axis_unit(1)
            .cloned()
            .unwrap_or_else(|| self.unit_system.differential_flux());

        let settings = self.settings()?;
        let photons = Quantity::new(x.clone(), x_unit);
        let flux = self.emitter.flux(source.as_ref(), &settings, &photons)?;
        if flux.len() != x.len() {
            return Err(FunctionError::DimensionMismatch(format!(
                "synchrotron emitter returned {} values for {} energies",
                flux.len(),
                x.len()
            )));
        }
        flux.values_in(&y_unit)
            .map_err(|e| FunctionError::unit_mismatch("y", e.to_string()))
    }
}

/// EBL optical depth as a function of redshift and photon energy.
pub trait OpticalDepth: Send + Sync {
    /// Optical depth at `redshift` for photon energies in TeV.
    fn optical_depth(&self, redshift: f64, energies_tev: &Array1<f64>) -> Result<Array1<f64>>;
}

/// Source of optical-depth tables, looked up by model name (e.g. `dominguez`).
pub trait OpacityProvider: Send + Sync {
    fn load(&self, model: &str) -> Result<Arc<dyn OpticalDepth>>;

    /// Names of the models this provider can load.
    fn models(&self) -> Vec<String>;
}

#[derive(Deserialize)]
struct RawOpacityTable {
    redshifts: Vec<f64>,
    energies: Vec<f64>,
    tau: Vec<Vec<f64>>,
}

/// Optical depth tabulated on a (redshift, energy) grid.
///
/// Interpolation is bilinear in redshift and log-energy. Queries outside the grid
/// are clamped to its edges.
#[derive(Debug, Clone)]
pub struct TabulatedOpticalDepth {
    redshifts: Vec<f64>,
    log_energies: Vec<f64>,
    tau: Array2<f64>,
}

fn strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

impl TabulatedOpticalDepth {
    /// Build a table; `tau[[i, j]]` is the depth at `redshifts[i]` and `energies[j]` (TeV).
    pub fn new(redshifts: Vec<f64>, energies: Vec<f64>, tau: Array2<f64>) -> Result<Self> {
        if redshifts.len() < 2 || energies.len() < 2 {
            return Err(FunctionError::Configuration(
                "optical depth table needs at least two redshifts and two energies".to_string(),
            ));
        }
        if !strictly_increasing(&redshifts) || !strictly_increasing(&energies) {
            return Err(FunctionError::Configuration(
                "optical depth grid must be strictly increasing".to_string(),
            ));
        }
        if energies[0] <= 0.0 {
            return Err(FunctionError::Configuration(
                "optical depth energies must be positive".to_string(),
            ));
        }
        if tau.dim() != (redshifts.len(), energies.len()) {
            return Err(FunctionError::DimensionMismatch(format!(
                "optical depth table is {:?}, grid is ({}, {})",
                tau.dim(),
                redshifts.len(),
                energies.len()
            )));
        }

        Ok(TabulatedOpticalDepth {
            redshifts,
            log_energies: energies.iter().map(|e| e.ln()).collect(),
            tau,
        })
    }

    /// Parse a JSON table `{"redshifts": [...], "energies": [...], "tau": [[...], ...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawOpacityTable = serde_json::from_str(json)?;
        let rows = raw.tau.len();
        let cols = raw.energies.len();
        if raw.tau.iter().any(|row| row.len() != cols) {
            return Err(FunctionError::DimensionMismatch(format!(
                "every optical depth row must hold {} values",
                cols
            )));
        }
        let flat: Vec<f64> = raw.tau.into_iter().flatten().collect();
        let tau = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| FunctionError::DimensionMismatch(e.to_string()))?;
        Self::new(raw.redshifts, raw.energies, tau)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "loading optical depth table");
        Self::from_json(&text)
    }

    pub fn redshifts(&self) -> &[f64] {
        &self.redshifts
    }

    fn depth_at(&self, z: (usize, f64), log_energy: f64) -> f64 {
        let (j, v) = bracket(&self.log_energies, log_energy);
        let (i, u) = z;
        let t00 = self.tau[[i, j]];
        let t01 = self.tau[[i, j + 1]];
        let t10 = self.tau[[i + 1, j]];
        let t11 = self.tau[[i + 1, j + 1]];
        (1.0 - u) * ((1.0 - v) * t00 + v * t01) + u * ((1.0 - v) * t10 + v * t11)
    }
}

/// Lower grid index and fractional position of `value`, clamped to the grid.
fn bracket(grid: &[f64], value: f64) -> (usize, f64) {
    let last = grid.len() - 1;
    if value <= grid[0] {
        return (0, 0.0);
    }
    if value >= grid[last] {
        return (last - 1, 1.0);
    }
    let upper = grid.partition_point(|&g| g <= value);
    let lower = upper - 1;
    (lower, (value - grid[lower]) / (grid[upper] - grid[lower]))
}

impl OpticalDepth for TabulatedOpticalDepth {
    fn optical_depth(&self, redshift: f64, energies_tev: &Array1<f64>) -> Result<Array1<f64>> {
        let z = bracket(&self.redshifts, redshift);
        Ok(energies_tev.mapv(|e| {
            if e > 0.0 {
                self.depth_at(z, e.ln())
            } else {
                0.0
            }
        }))
    }
}

/// Loads `<dir>/<model>.json` tables.
#[derive(Debug, Clone)]
pub struct DirectoryOpacityProvider {
    dir: PathBuf,
}

impl DirectoryOpacityProvider {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        DirectoryOpacityProvider { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl OpacityProvider for DirectoryOpacityProvider {
    fn load(&self, model: &str) -> Result<Arc<dyn OpticalDepth>> {
        let path = self.dir.join(format!("{}.json", model));
        if !path.is_file() {
            return Err(FunctionError::Configuration(format!(
                "EBL model '{}' is not available in {}",
                model,
                self.dir.display()
            )));
        }
        Ok(Arc::new(TabulatedOpticalDepth::from_file(&path)?))
    }

    fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
                    .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        models.sort();
        models
    }
}

/// Tables held in memory, keyed by model name.
#[derive(Default, Clone)]
pub struct StaticOpacityProvider {
    tables: HashMap<String, Arc<dyn OpticalDepth>>,
}

impl StaticOpacityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, name: &str, table: Arc<dyn OpticalDepth>) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }
}

impl OpacityProvider for StaticOpacityProvider {
    fn load(&self, model: &str) -> Result<Arc<dyn OpticalDepth>> {
        self.tables
            .get(model)
            .cloned()
            .ok_or_else(|| FunctionError::Configuration(format!("EBL model '{}' is not available", model)))
    }

    fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.tables.keys().cloned().collect();
        models.sort();
        models
    }
}

/// EBL model loaded at construction.
pub const DEFAULT_EBL_MODEL: &str = "dominguez";

const EBL_META: &str = r#"
description: >
  Attenuation factor for absorption in the extragalactic background light (EBL),
  to be used for extragalactic source spectra
parameters:
  redshift:
    desc: redshift of the source
    initial value: 1.0
    fix: yes
"#;

/// EBL attenuation factor `exp(-tau(z, E))`.
///
/// Plain samples are energies in the x unit once units are set, in the unit
/// system's energy unit before that.
pub struct EblAttenuation {
    core: FunctionCore,
    provider: Arc<dyn OpacityProvider>,
    model: String,
    table: Arc<dyn OpticalDepth>,
    unit_system: UnitSystem,
    // tables are indexed in TeV
    tev: Unit,
}

crate::function_impl!(EblAttenuation);

impl EblAttenuation {
    /// Build the model with the default optical-depth table.
    pub fn new(provider: Arc<dyn OpacityProvider>) -> Result<Self> {
        let table = provider.load(DEFAULT_EBL_MODEL)?;
        Ok(EblAttenuation {
            core: FunctionCore::from_yaml("EBLattenuation", EBL_META)?,
            provider,
            model: DEFAULT_EBL_MODEL.to_string(),
            table,
            unit_system: UnitSystem::default(),
            tev: Unit::new("TeV", EV_IN_JOULE * 1e12, Dimension::ENERGY),
        })
    }

    pub fn with_unit_system(mut self, unit_system: UnitSystem) -> Self {
        self.unit_system = unit_system;
        self
    }

    /// Switch optical-depth table. The current table is kept if loading fails.
    pub fn set_ebl_model(&mut self, model: &str) -> Result<()> {
        let table = self.provider.load(model)?;
        debug!(model, "EBL model loaded");
        self.table = table;
        self.model = model.to_string();
        Ok(())
    }

    pub fn ebl_model(&self) -> &str {
        &self.model
    }
}

impl Function1D for EblAttenuation {
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment> {
        if !x_unit.is_energy() {
            return Err(FunctionError::unit_mismatch(
                "x",
                format!("EBLattenuation computes energy-dependent absorption, x must be an energy, got {}", x_unit),
            ));
        }
        if !y_unit.is_dimensionless() {
            return Err(FunctionError::unit_mismatch(
                "y",
                format!("EBLattenuation is a pure factor, y must be dimensionless, got {}", y_unit),
            ));
        }
        Ok(vec![("redshift", Unit::dimensionless())])
    }

    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let x_unit = self.core.axis_unit(0).unwrap_or(&self.unit_system.energy);
        let factor = x_unit
            .conversion_factor(&self.tev)
            .map_err(|e| FunctionError::unit_mismatch("x", e.to_string()))?;

        let redshift = self.core.value("redshift")?;
        let tau = self.table.optical_depth(redshift, &(x * factor))?;
        Ok(tau.mapv(|t| (-t).exp()))
    }
}
