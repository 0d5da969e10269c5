//! Availability of optional collaborators.
//!
//! Some models only work when an external collaborator is present: a synchrotron
//! emitter, a source of EBL optical-depth tables, the Galactic frame rotation
//! (feature `galactic`). The registry is built once per process and missing
//! capabilities are reported as warnings at that time.

use crate::functions::radiative::{DirectoryOpacityProvider, OpacityProvider, SynchrotronEmitter};
use std::env;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Environment variable naming a directory of `<model>.json` optical-depth tables.
pub const EBL_TABLES_ENV: &str = "ASTROFUNC_EBL_TABLES";

/// An optional capability some functions depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Synchrotron,
    EblAttenuation,
    /// ICRS to Galactic rotation.
    GalacticFrame,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::Synchrotron,
        Capability::EblAttenuation,
        Capability::GalacticFrame,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::Synchrotron => "synchrotron",
            Capability::EblAttenuation => "ebl-attenuation",
            Capability::GalacticFrame => "galactic-frame",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The optional collaborators available to the function factory.
#[derive(Clone, Default)]
pub struct Capabilities {
    synchrotron: Option<Arc<dyn SynchrotronEmitter>>,
    opacity: Option<Arc<dyn OpacityProvider>>,
}

impl Capabilities {
    /// Nothing optional beyond what is compiled in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe the environment: optical-depth tables come from the directory named
    /// by [`EBL_TABLES_ENV`]. Synchrotron emitters can only be supplied in code.
    pub fn detect() -> Self {
        let mut caps = Self::new();
        if let Ok(dir) = env::var(EBL_TABLES_ENV) {
            if Path::new(&dir).is_dir() {
                debug!(dir = %dir, "using EBL optical depth tables");
                caps.opacity = Some(Arc::new(DirectoryOpacityProvider::new(dir)));
            } else {
                warn!(dir = %dir, "{} does not name a directory", EBL_TABLES_ENV);
            }
        }
        caps
    }

    pub fn with_synchrotron(mut self, emitter: Arc<dyn SynchrotronEmitter>) -> Self {
        self.synchrotron = Some(emitter);
        self
    }

    pub fn with_opacity(mut self, provider: Arc<dyn OpacityProvider>) -> Self {
        self.opacity = Some(provider);
        self
    }

    pub fn synchrotron(&self) -> Option<&Arc<dyn SynchrotronEmitter>> {
        self.synchrotron.as_ref()
    }

    pub fn opacity(&self) -> Option<&Arc<dyn OpacityProvider>> {
        self.opacity.as_ref()
    }

    pub fn is_available(&self, capability: Capability) -> bool {
        match capability {
            Capability::Synchrotron => self.synchrotron.is_some(),
            Capability::EblAttenuation => self.opacity.is_some(),
            Capability::GalacticFrame => cfg!(feature = "galactic"),
        }
    }

    pub fn missing(&self) -> Vec<Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(|cap| !self.is_available(*cap))
            .collect()
    }

    /// Warn once for every missing capability.
    pub fn report(&self) {
        for capability in self.missing() {
            warn!(%capability, "optional capability unavailable, functions depending on it cannot be created");
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("synchrotron", &self.synchrotron.is_some())
            .field("opacity", &self.opacity.is_some())
            .field("galactic", &cfg!(feature = "galactic"))
            .finish()
    }
}

static GLOBAL: OnceLock<Capabilities> = OnceLock::new();

/// Install the process-wide registry. Fails, handing the value back, when the
/// registry has already been built.
pub fn install(capabilities: Capabilities) -> Result<(), Capabilities> {
    GLOBAL.set(capabilities)?;
    if let Some(installed) = GLOBAL.get() {
        installed.report();
    }
    Ok(())
}

/// The process-wide registry, detected from the environment on first use.
pub fn global() -> &'static Capabilities {
    GLOBAL.get_or_init(|| {
        let caps = Capabilities::detect();
        caps.report();
        caps
    })
}
