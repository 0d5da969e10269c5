//! Parameter bounds
//!
//! Bounds are closed intervals `[min, max]`; an infinite endpoint means the
//! parameter is open on that side. JSON has no representation for infinity, so an
//! open endpoint is serialized as `null`.

use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must not exceed max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Parameter value must be a number, got NaN")]
    NotANumber,
}

/// The closed interval a parameter value must stay in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lower limit, `-inf` when open
    pub min: f64,

    /// Upper limit, `+inf` when open
    pub max: f64,
}

impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Bounds", 2)?;
        let min = if self.min == NEG_INFINITY { None } else { Some(self.min) };
        let max = if self.max == INFINITY { None } else { Some(self.max) };
        state.serialize_field("min", &min)?;
        state.serialize_field("max", &max)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BoundsHelper {
            #[serde(default)]
            min: Option<f64>,

            #[serde(default)]
            max: Option<f64>,
        }

        let helper = BoundsHelper::deserialize(deserializer)?;
        Bounds::from_options(helper.min, helper.max).map_err(serde::de::Error::custom)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create bounds from explicit limits.
    ///
    /// # Examples
    ///
    /// ```
    /// use astrofunc_rs::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(-10.0, 10.0).unwrap();
    /// assert!(bounds.contains(-2.0));
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min.is_nan() || max.is_nan() {
            return Err(BoundsError::NotANumber);
        }
        if min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Create bounds where a missing limit means "open".
    pub fn from_options(min: Option<f64>, max: Option<f64>) -> Result<Self, BoundsError> {
        Self::new(min.unwrap_or(NEG_INFINITY), max.unwrap_or(INFINITY))
    }

    /// Unbounded on both sides
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Check if a value is within the bounds (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Validate a candidate value against the bounds.
    pub fn check(&self, value: f64) -> Result<(), BoundsError> {
        if value.is_nan() {
            return Err(BoundsError::NotANumber);
        }
        if !self.contains(value) {
            return Err(BoundsError::ValueOutsideBounds {
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Clamp a value to be within the bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// The largest magnitude a value within the bounds can take, if finite.
    ///
    /// Spatial models size their bounding boxes from this.
    pub fn max_magnitude(&self) -> Option<f64> {
        if self.is_finite() {
            Some(self.min.abs().max(self.max.abs()))
        } else {
            None
        }
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}
