//! Dimensional analysis types
//!
//! Each physical quantity has dimensions represented as an 8-element vector:
//! [length, mass, time, current, temperature, amount, luminosity, angle].
//! Plane angle is tracked as its own base so that `deg` and a pure number are not
//! silently interchangeable.

use serde::{Deserialize, Serialize};
use std::fmt;

const NAMES: [&str; 8] = ["m", "kg", "s", "A", "K", "mol", "cd", "rad"];

/// Represents the dimensions of a physical quantity as exponents of the base dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    /// [length, mass, time, current, temperature, amount, luminosity, angle]
    pub exponents: [i32; 8],
}

impl Dimension {
    /// Dimensionless quantity (all exponents zero)
    pub const DIMENSIONLESS: Dimension = Dimension { exponents: [0; 8] };

    /// Length dimension [L]
    pub const LENGTH: Dimension = Dimension { exponents: [1, 0, 0, 0, 0, 0, 0, 0] };

    /// Mass dimension [M]
    pub const MASS: Dimension = Dimension { exponents: [0, 1, 0, 0, 0, 0, 0, 0] };

    /// Time dimension [T]
    pub const TIME: Dimension = Dimension { exponents: [0, 0, 1, 0, 0, 0, 0, 0] };

    /// Electric current dimension [I]
    pub const CURRENT: Dimension = Dimension { exponents: [0, 0, 0, 1, 0, 0, 0, 0] };

    /// Temperature dimension [Θ]
    pub const TEMPERATURE: Dimension = Dimension { exponents: [0, 0, 0, 0, 1, 0, 0, 0] };

    /// Amount of substance dimension [N]
    pub const AMOUNT: Dimension = Dimension { exponents: [0, 0, 0, 0, 0, 1, 0, 0] };

    /// Luminous intensity dimension [J]
    pub const LUMINOSITY: Dimension = Dimension { exponents: [0, 0, 0, 0, 0, 0, 1, 0] };

    /// Plane angle
    pub const ANGLE: Dimension = Dimension { exponents: [0, 0, 0, 0, 0, 0, 0, 1] };

    /// Energy [M L^2 T^-2]
    pub const ENERGY: Dimension = Dimension { exponents: [2, 1, -2, 0, 0, 0, 0, 0] };

    /// Area [L^2]
    pub const AREA: Dimension = Dimension { exponents: [2, 0, 0, 0, 0, 0, 0, 0] };

    /// Frequency [T^-1]
    pub const FREQUENCY: Dimension = Dimension { exponents: [0, 0, -1, 0, 0, 0, 0, 0] };

    /// Magnetic flux density [M T^-2 I^-1]
    pub const MAGNETIC_FIELD: Dimension = Dimension { exponents: [0, 1, -2, -1, 0, 0, 0, 0] };

    /// Solid angle [angle^2]
    pub const SOLID_ANGLE: Dimension = Dimension { exponents: [0, 0, 0, 0, 0, 0, 0, 2] };

    /// Create a new dimension from exponents
    pub fn new(exponents: [i32; 8]) -> Self {
        Dimension { exponents }
    }

    /// Check if this is a dimensionless quantity
    pub fn is_dimensionless(&self) -> bool {
        self.exponents.iter().all(|&e| e == 0)
    }

    /// Multiply dimensions (add exponents)
    pub fn multiply(&self, other: &Dimension) -> Dimension {
        let mut result = [0i32; 8];
        for (i, r) in result.iter_mut().enumerate() {
            *r = self.exponents[i] + other.exponents[i];
        }
        Dimension { exponents: result }
    }

    /// Divide dimensions (subtract exponents)
    pub fn divide(&self, other: &Dimension) -> Dimension {
        self.multiply(&other.invert())
    }

    /// Raise to integer power (multiply exponents)
    pub fn power(&self, exp: i32) -> Dimension {
        let mut result = self.exponents;
        for r in result.iter_mut() {
            *r *= exp;
        }
        Dimension { exponents: result }
    }

    /// Invert dimensions (negate exponents)
    pub fn invert(&self) -> Dimension {
        self.power(-1)
    }

    /// Get the physical kind if it matches a common dimension
    pub fn name(&self) -> Option<&'static str> {
        match self.exponents {
            [0, 0, 0, 0, 0, 0, 0, 0] => Some("dimensionless"),
            [1, 0, 0, 0, 0, 0, 0, 0] => Some("length"),
            [0, 1, 0, 0, 0, 0, 0, 0] => Some("mass"),
            [0, 0, 1, 0, 0, 0, 0, 0] => Some("time"),
            [0, 0, 0, 1, 0, 0, 0, 0] => Some("current"),
            [0, 0, 0, 0, 1, 0, 0, 0] => Some("temperature"),
            [0, 0, 0, 0, 0, 1, 0, 0] => Some("amount"),
            [0, 0, 0, 0, 0, 0, 1, 0] => Some("luminosity"),
            [0, 0, 0, 0, 0, 0, 0, 1] => Some("angle"),
            [0, 0, 0, 0, 0, 0, 0, 2] => Some("solid angle"),
            [2, 1, -2, 0, 0, 0, 0, 0] => Some("energy"),
            [2, 0, 0, 0, 0, 0, 0, 0] => Some("area"),
            [0, 0, -1, 0, 0, 0, 0, 0] => Some("frequency"),
            [0, 1, -2, -1, 0, 0, 0, 0] => Some("magnetic flux density"),
            _ => None,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name() {
            return write!(f, "{}", name);
        }
        let parts: Vec<String> = self
            .exponents
            .iter()
            .zip(NAMES.iter())
            .filter(|(&e, _)| e != 0)
            .map(|(&e, n)| if e == 1 { n.to_string() } else { format!("{}^{}", n, e) })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}
