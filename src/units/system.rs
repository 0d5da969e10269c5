//! Preferred units for the quantities the library produces.

use super::unit::{Unit, UnitError};
use serde::{Deserialize, Serialize};

/// The physical-units configuration: the unit chosen for energy, time, area and angle.
///
/// The default is keV, s, cm2 and deg, which gives differential fluxes in
/// `1 / (keV cm2 s)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSystem {
    pub energy: Unit,
    pub time: Unit,
    pub area: Unit,
    pub angle: Unit,
}

impl Default for UnitSystem {
    fn default() -> Self {
        UnitSystem {
            energy: Unit::parse("keV").unwrap_or_else(|_| Unit::dimensionless()),
            time: Unit::parse("s").unwrap_or_else(|_| Unit::dimensionless()),
            area: Unit::parse("cm2").unwrap_or_else(|_| Unit::dimensionless()),
            angle: Unit::parse("deg").unwrap_or_else(|_| Unit::dimensionless()),
        }
    }
}

impl UnitSystem {
    /// Build a unit system from four unit strings.
    pub fn new(energy: &str, time: &str, area: &str, angle: &str) -> Result<Self, UnitError> {
        Ok(UnitSystem {
            energy: Unit::parse(energy)?,
            time: Unit::parse(time)?,
            area: Unit::parse(area)?,
            angle: Unit::parse(angle)?,
        })
    }

    /// Differential photon flux unit, `1 / (energy time area)`.
    pub fn differential_flux(&self) -> Unit {
        self.energy.mul(&self.time).mul(&self.area).inverse()
    }

    /// Integrated energy flux unit, `energy / (time area)`.
    pub fn energy_flux(&self) -> Unit {
        self.energy.div(&self.time.mul(&self.area))
    }
}
