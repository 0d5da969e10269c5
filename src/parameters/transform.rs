//! Parameter transformations.
//!
//! A transformation maps the external (physical) value of a parameter into the
//! space a fitting engine should explore. Normalizations spanning many decades are
//! usually declared with `log10`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transform between the external value and the value a fitter works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transformation {
    #[default]
    Identity,
    Log10,
}

impl Transformation {
    /// External value to internal value.
    pub fn forward(&self, external: f64) -> f64 {
        match self {
            Transformation::Identity => external,
            Transformation::Log10 => external.log10(),
        }
    }

    /// Internal value to external value.
    pub fn backward(&self, internal: f64) -> f64 {
        match self {
            Transformation::Identity => internal,
            Transformation::Log10 => 10f64.powf(internal),
        }
    }

    /// Whether `value` can be represented in the transformed space.
    pub fn accepts(&self, value: f64) -> bool {
        match self {
            Transformation::Identity => !value.is_nan(),
            Transformation::Log10 => value > 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transformation::Identity => "identity",
            Transformation::Log10 => "log10",
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Transformation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" | "identity" => Ok(Transformation::Identity),
            "log10" => Ok(Transformation::Log10),
            other => Err(format!("unknown transformation '{}'", other)),
        }
    }
}
