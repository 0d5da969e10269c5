//! Parameter definition and implementation
//!
//! A [`Parameter`] is a named scalar owned by a function: its current value,
//! bounds, a step hint for fitters, a fixed/free flag, the normalization marker and
//! the physical unit assigned once the owning function knows its axis units.

use crate::parameters::bounds::{Bounds, BoundsError};
use crate::parameters::transform::Transformation;
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Bounds error on parameter '{name}': {source}")]
    Bounds { name: String, source: BoundsError },

    #[error("Parameter '{name}' uses a {transformation} transformation and cannot hold {value}")]
    TransformDomain {
        name: String,
        transformation: Transformation,
        value: f64,
    },

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },

    #[error("Parameter '{name}' is declared more than once")]
    Duplicate { name: String },
}

/// A named, bounded scalar of a function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter
    name: String,

    /// Human readable description from the metadata
    #[serde(default)]
    description: String,

    /// Current value
    value: f64,

    /// Value at construction (for reset operations)
    init_value: f64,

    /// Closed interval the value must stay in
    bounds: Bounds,

    /// Step hint for fitters
    delta: f64,

    /// Whether a fitter should leave this parameter alone
    fixed: bool,

    /// Marks linear normalizations for scale-separated optimization
    is_normalization: bool,

    /// Space a fitter should explore
    #[serde(default)]
    transformation: Transformation,

    /// Unit assigned by the owning function's unit propagation
    #[serde(default)]
    unit: Option<Unit>,

    /// Unit declared in the metadata; assigned verbatim during propagation
    #[serde(default)]
    declared_unit: Option<Unit>,
}

/// Default step hint: a tenth of the magnitude, or 0.1 for a zero value.
pub fn default_delta(value: f64) -> f64 {
    if value == 0.0 {
        0.1
    } else {
        0.1 * value.abs()
    }
}

impl Parameter {
    /// Create a free, unbounded parameter
    ///
    /// # Examples
    ///
    /// ```
    /// use astrofunc_rs::parameters::parameter::Parameter;
    ///
    /// let param = Parameter::new("index", -2.01);
    /// assert_eq!(param.name(), "index");
    /// assert_eq!(param.value(), -2.01);
    /// assert!(!param.is_fixed());
    /// assert!(param.unit().is_none());
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            value,
            init_value: value,
            bounds: Bounds::default(),
            delta: default_delta(value),
            fixed: false,
            is_normalization: false,
            transformation: Transformation::Identity,
            unit: None,
            declared_unit: None,
        }
    }

    /// Create a parameter with bounds; the value must lie within them.
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self, ParameterError> {
        let mut param = Self::new(name, value);
        param.set_bounds(min, max)?;
        Ok(param)
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    pub fn normalization(mut self, is_normalization: bool) -> Self {
        self.is_normalization = is_normalization;
        self
    }

    /// Attach a transformation, validating the current value and lower bound against it.
    pub fn with_transformation(mut self, transformation: Transformation) -> Result<Self, ParameterError> {
        for candidate in [self.value, self.bounds.min] {
            if candidate.is_finite() && !transformation.accepts(candidate) {
                return Err(ParameterError::TransformDomain {
                    name: self.name.clone(),
                    transformation,
                    value: candidate,
                });
            }
        }
        self.transformation = transformation;
        Ok(self)
    }

    /// Declare a fixed physical unit, independent of the axis units.
    pub fn with_declared_unit(mut self, unit: Unit) -> Self {
        self.declared_unit = Some(unit);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Current value of the parameter
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value of the parameter.
    ///
    /// Values outside the bounds, or outside the domain of the transformation, are
    /// rejected and the current value is left unchanged.
    pub fn set_value(&mut self, value: f64) -> Result<(), ParameterError> {
        self.bounds.check(value).map_err(|source| ParameterError::Bounds {
            name: self.name.clone(),
            source,
        })?;
        if !self.transformation.accepts(value) {
            return Err(ParameterError::TransformDomain {
                name: self.name.clone(),
                transformation: self.transformation,
                value,
            });
        }

        self.value = value;
        Ok(())
    }

    pub fn init_value(&self) -> f64 {
        self.init_value
    }

    /// Reset the parameter to its initial value
    pub fn reset(&mut self) {
        self.value = self.bounds.clamp(self.init_value);
    }

    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Replace the bounds. The current value must lie within the new bounds.
    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<(), ParameterError> {
        let to_err = |name: &str, source| ParameterError::Bounds {
            name: name.to_string(),
            source,
        };
        let bounds = Bounds::new(min, max).map_err(|e| to_err(&self.name, e))?;
        bounds.check(self.value).map_err(|e| to_err(&self.name, e))?;
        self.bounds = bounds;
        Ok(())
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn set_delta(&mut self, delta: f64) {
        self.delta = delta;
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Whether a fitter may vary this parameter
    pub fn is_free(&self) -> bool {
        !self.fixed
    }

    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
    }

    pub fn is_normalization(&self) -> bool {
        self.is_normalization
    }

    pub fn transformation(&self) -> Transformation {
        self.transformation
    }

    /// Value in the transformed space a fitter works in
    pub fn internal_value(&self) -> f64 {
        self.transformation.forward(self.value)
    }

    /// Set the value from the transformed space.
    pub fn set_internal_value(&mut self, internal: f64) -> Result<(), ParameterError> {
        self.set_value(self.transformation.backward(internal))
    }

    /// Physical unit, `None` until the owning function has propagated its axis units
    pub fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    pub fn declared_unit(&self) -> Option<&Unit> {
        self.declared_unit.as_ref()
    }

    pub(crate) fn assign_unit(&mut self, unit: Unit) {
        self.unit = Some(unit);
    }

    /// Value expressed in `target`.
    ///
    /// Parameters without a unit yet are returned as they are.
    pub fn value_in(&self, target: &Unit) -> Result<f64, crate::units::UnitError> {
        match &self.unit {
            Some(unit) => Ok(self.value * unit.conversion_factor(target)?),
            None => Ok(self.value),
        }
    }
}
