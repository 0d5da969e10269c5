//! Built-in function catalogue.
//!
//! Every model carries its YAML metadata, a unit-propagation hook and a kernel.
//! [`FunctionRegistry`] creates models by their registered names (`Powerlaw`,
//! `Band_Calderone`, `Gaussian_on_sphere`, ...) and refuses the ones whose
//! optional collaborators are missing.

use crate::capabilities::{self, Capabilities, Capability};
use crate::error::{FunctionError, Result};
use crate::function::{Function1D, Function2D};
use tracing::debug;

/// Declare a model struct holding only a [`FunctionCore`](crate::function::FunctionCore),
/// with a constructor building it from the given metadata.
macro_rules! builtin_function {
    ($(#[$attr:meta])* $ty:ident, $name:literal, $metadata:expr) => {
        $(#[$attr])*
        #[derive(Debug, Clone)]
        pub struct $ty {
            core: $crate::function::FunctionCore,
        }

        impl $ty {
            /// Registered name.
            pub const NAME: &'static str = $name;

            pub fn new() -> $crate::error::Result<Self> {
                Ok($ty {
                    core: $crate::function::FunctionCore::from_yaml($name, $metadata)?,
                })
            }
        }

        $crate::function_impl!($ty);
    };
}

pub mod band;
pub mod basic;
pub mod broken;
pub mod powerlaw;
pub mod radiative;
pub mod spatial;

pub use band::{Band, BandCalderone, BandGrbm};
pub use basic::{Blackbody, Constant, DiracDelta, Line, Sin, StepFunction, StepFunctionUpper};
pub use broken::{BrokenPowerlaw, SmoothlyBrokenPowerLaw};
pub use powerlaw::{
    CutoffPowerlaw, CutoffPowerlawFlux, ExponentialCutoff, InverseCutoffPowerlaw, LogParabola, Powerlaw,
    PowerlawFlux, PowerlawLognorm, SuperCutoffPowerlaw,
};
pub use radiative::{
    DirectoryOpacityProvider, EblAttenuation, FunctionSource, OpacityProvider, OpticalDepth, RadiationSource,
    StaticOpacityProvider, Synchrotron, SynchrotronEmitter, SynchrotronSettings, TabulatedOpticalDepth,
};
#[cfg(feature = "galactic")]
pub use spatial::LatitudeGalacticDiffuse;
pub use spatial::{CoordinateFrame, DiskOnSphere, EllipseOnSphere, GaussianOnSphere, PowerLawOnSphere, SpatialTemplate2D};

/// Registered names of the 1-D functions.
pub const FUNCTIONS_1D: &[&str] = &[
    "Powerlaw",
    "Powerlaw_lognorm",
    "Powerlaw_flux",
    "Cutoff_powerlaw",
    "Inverse_cutoff_powerlaw",
    "Super_cutoff_powerlaw",
    "Cutoff_powerlaw_flux",
    "Exponential_cutoff",
    "Log_parabola",
    "Broken_powerlaw",
    "SmoothlyBrokenPowerLaw",
    "Band",
    "Band_grbm",
    "Band_Calderone",
    "StepFunction",
    "StepFunctionUpper",
    "Blackbody",
    "Sin",
    "Line",
    "Constant",
    "DiracDelta",
    "Synchrotron",
    "EBLattenuation",
];

/// Registered names of the 2-D functions.
pub const FUNCTIONS_2D: &[&str] = &[
    "Gaussian_on_sphere",
    "Disk_on_sphere",
    "Ellipse_on_sphere",
    "Power_law_on_sphere",
    "Latitude_galactic_diffuse",
    "SpatialTemplate_2D",
];

/// The optional capability a function needs, if any.
pub fn required_capability(name: &str) -> Option<Capability> {
    match name {
        "Synchrotron" => Some(Capability::Synchrotron),
        "EBLattenuation" => Some(Capability::EblAttenuation),
        "Latitude_galactic_diffuse" => Some(Capability::GalacticFrame),
        _ => None,
    }
}

/// Creates functions by name, honouring the available capabilities.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    capabilities: Capabilities,
}

impl FunctionRegistry {
    pub fn new(capabilities: &Capabilities) -> Self {
        FunctionRegistry {
            capabilities: capabilities.clone(),
        }
    }

    /// Registry over the process-wide capabilities.
    pub fn global() -> Self {
        Self::new(capabilities::global())
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Every registered name, 1-D first.
    pub fn names(&self) -> Vec<&'static str> {
        FUNCTIONS_1D.iter().chain(FUNCTIONS_2D.iter()).copied().collect()
    }

    /// Registered names that can actually be created here.
    pub fn available(&self) -> Vec<&'static str> {
        self.names()
            .into_iter()
            .filter(|name| self.check_capability(name).is_ok())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        FUNCTIONS_1D.contains(&name) || FUNCTIONS_2D.contains(&name)
    }

    fn check_capability(&self, name: &str) -> Result<()> {
        match required_capability(name) {
            Some(capability) if !self.capabilities.is_available(capability) => {
                Err(FunctionError::DependencyUnavailable {
                    function: name.to_string(),
                    capability: capability.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn unknown(&self, name: &str, arity: usize) -> FunctionError {
        if self.contains(name) {
            FunctionError::Configuration(format!("'{}' is not a {}-D function", name, arity))
        } else {
            FunctionError::Configuration(format!("unknown function '{}'", name))
        }
    }

    /// Create a 1-D function with its default parameters.
    pub fn create_1d(&self, name: &str) -> Result<Box<dyn Function1D>> {
        if !FUNCTIONS_1D.contains(&name) {
            return Err(self.unknown(name, 1));
        }
        self.check_capability(name)?;
        debug!(function = name, "creating 1-D function");

        let function: Box<dyn Function1D> = match name {
            "Powerlaw" => Box::new(Powerlaw::new()?),
            "Powerlaw_lognorm" => Box::new(PowerlawLognorm::new()?),
            "Powerlaw_flux" => Box::new(PowerlawFlux::new()?),
            "Cutoff_powerlaw" => Box::new(CutoffPowerlaw::new()?),
            "Inverse_cutoff_powerlaw" => Box::new(InverseCutoffPowerlaw::new()?),
            "Super_cutoff_powerlaw" => Box::new(SuperCutoffPowerlaw::new()?),
            "Cutoff_powerlaw_flux" => Box::new(CutoffPowerlawFlux::new()?),
            "Exponential_cutoff" => Box::new(ExponentialCutoff::new()?),
            "Log_parabola" => Box::new(LogParabola::new()?),
            "Broken_powerlaw" => Box::new(BrokenPowerlaw::new()?),
            "SmoothlyBrokenPowerLaw" => Box::new(SmoothlyBrokenPowerLaw::new()?),
            "Band" => Box::new(Band::new()?),
            "Band_grbm" => Box::new(BandGrbm::new()?),
            "Band_Calderone" => Box::new(BandCalderone::new()?),
            "StepFunction" => Box::new(StepFunction::new()?),
            "StepFunctionUpper" => Box::new(StepFunctionUpper::new()?),
            "Blackbody" => Box::new(Blackbody::new()?),
            "Sin" => Box::new(Sin::new()?),
            "Line" => Box::new(Line::new()?),
            "Constant" => Box::new(Constant::new()?),
            "DiracDelta" => Box::new(DiracDelta::new()?),
            "Synchrotron" => match self.capabilities.synchrotron() {
                Some(emitter) => Box::new(Synchrotron::new(emitter.clone())?),
                None => return Err(self.unavailable(name, Capability::Synchrotron)),
            },
            "EBLattenuation" => match self.capabilities.opacity() {
                Some(provider) => Box::new(EblAttenuation::new(provider.clone())?),
                None => return Err(self.unavailable(name, Capability::EblAttenuation)),
            },
            _ => return Err(self.unknown(name, 1)),
        };
        Ok(function)
    }

    /// Create a 2-D function with its default parameters.
    pub fn create_2d(&self, name: &str) -> Result<Box<dyn Function2D>> {
        if !FUNCTIONS_2D.contains(&name) {
            return Err(self.unknown(name, 2));
        }
        self.check_capability(name)?;
        debug!(function = name, "creating 2-D function");

        let function: Box<dyn Function2D> = match name {
            "Gaussian_on_sphere" => Box::new(GaussianOnSphere::new()?),
            "Disk_on_sphere" => Box::new(DiskOnSphere::new()?),
            "Ellipse_on_sphere" => Box::new(EllipseOnSphere::new()?),
            "Power_law_on_sphere" => Box::new(PowerLawOnSphere::new()?),
            #[cfg(feature = "galactic")]
            "Latitude_galactic_diffuse" => Box::new(LatitudeGalacticDiffuse::new()?),
            "SpatialTemplate_2D" => Box::new(SpatialTemplate2D::new()?),
            _ => return Err(self.unavailable(name, Capability::GalacticFrame)),
        };
        Ok(function)
    }

    fn unavailable(&self, name: &str, capability: Capability) -> FunctionError {
        FunctionError::DependencyUnavailable {
            function: name.to_string(),
            capability: capability.to_string(),
        }
    }
}
