//! Function traits and the shared function state.
//!
//! Every model composes a [`FunctionCore`] (metadata, parameters, axis units) and
//! implements either [`Function1D`] or [`Function2D`]. A model supplies two things:
//! a unit-propagation hook that says which unit each parameter takes given the axis
//! units, and a kernel that evaluates the formula on plain magnitudes. The traits
//! provide the unit-aware `evaluate` on top of those.

use crate::error::{FunctionError, Result};
use crate::parameters::schema::{build_parameters, FunctionSchema};
use crate::parameters::{Parameter, Parameters};
use crate::sphere::Boundaries;
use crate::units::{Quantity, Samples, Unit};
use ndarray::Array1;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Parameter name to unit, as produced by a unit-propagation hook.
pub type UnitAssignment = Vec<(&'static str, Unit)>;

/// State shared by every function: metadata, ordered parameters and axis units.
#[derive(Debug, Clone)]
pub struct FunctionCore {
    name: String,
    description: String,
    latex: Option<String>,
    parameters: Parameters,
    axis_units: Option<Vec<Unit>>,
}

impl FunctionCore {
    /// Build the core from a parsed schema.
    pub fn new(name: &str, schema: &FunctionSchema) -> Result<Self> {
        Ok(FunctionCore {
            name: name.to_string(),
            description: schema.description.trim().to_string(),
            latex: schema.latex.clone(),
            parameters: build_parameters(schema)?,
            axis_units: None,
        })
    }

    /// Build the core from a YAML metadata document.
    pub fn from_yaml(name: &str, metadata: &str) -> Result<Self> {
        Self::new(name, &FunctionSchema::from_yaml(metadata)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn latex(&self) -> Option<&str> {
        self.latex.as_deref()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    pub fn parameter(&self, name: &str) -> Result<&Parameter> {
        self.parameters
            .get(name)
            .ok_or_else(|| FunctionError::ParameterNotFound(format!("{}.{}", self.name, name)))
    }

    pub fn parameter_mut(&mut self, name: &str) -> Result<&mut Parameter> {
        let function = self.name.clone();
        self.parameters
            .get_mut(name)
            .ok_or_else(|| FunctionError::ParameterNotFound(format!("{}.{}", function, name)))
    }

    /// Current value of a declared parameter.
    pub fn value(&self, name: &str) -> Result<f64> {
        Ok(self.parameter(name)?.value())
    }

    /// Value of a parameter expressed in `unit`; parameters without a unit yet are taken as is.
    pub fn value_in(&self, name: &str, unit: &Unit) -> Result<f64> {
        let param = self.parameter(name)?;
        param
            .value_in(unit)
            .map_err(|e| FunctionError::unit_mismatch(name, e.to_string()))
    }

    /// Axis units in order (x, y[, z]), once propagated.
    pub fn axis_units(&self) -> Option<&[Unit]> {
        self.axis_units.as_deref()
    }

    /// Unit of one axis, once propagated.
    pub fn axis_unit(&self, axis: usize) -> Option<&Unit> {
        self.axis_units.as_ref().and_then(|units| units.get(axis))
    }

    pub fn has_units(&self) -> bool {
        self.axis_units.is_some()
    }

    /// Apply a propagation result.
    ///
    /// Parameters with a unit declared in their metadata receive it here; every
    /// other parameter must appear in `assignment` exactly once. Nothing is changed
    /// when the assignment is incomplete.
    pub fn assign_units(&mut self, assignment: UnitAssignment, axes: Vec<Unit>) -> Result<()> {
        let mut resolved: HashMap<&str, Unit> = HashMap::new();

        for param in self.parameters.iter() {
            if let Some(unit) = param.declared_unit() {
                resolved.insert(param.name(), unit.clone());
            }
        }

        for (name, unit) in assignment {
            if !self.parameters.contains(name) {
                return Err(FunctionError::Configuration(format!(
                    "{}: unit assigned to undeclared parameter '{}'",
                    self.name, name
                )));
            }
            if resolved.insert(name, unit).is_some() {
                return Err(FunctionError::Configuration(format!(
                    "{}: parameter '{}' was assigned a unit more than once",
                    self.name, name
                )));
            }
        }

        let missing: Vec<&str> = self
            .parameters
            .names()
            .into_iter()
            .filter(|name| !resolved.contains_key(name))
            .collect();
        if !missing.is_empty() {
            return Err(FunctionError::Configuration(format!(
                "{}: no unit assigned to parameter(s) {}",
                self.name,
                missing.join(", ")
            )));
        }

        let resolved: Vec<(String, Unit)> = resolved
            .into_iter()
            .map(|(name, unit)| (name.to_string(), unit))
            .collect();
        for (name, unit) in resolved {
            debug!(function = %self.name, parameter = %name, unit = %unit, "assigned parameter unit");
            self.parameters.assign_unit(&name, unit)?;
        }
        self.axis_units = Some(axes);
        Ok(())
    }
}

/// Common interface of every function: metadata and named parameter access.
pub trait Function: Send + Sync {
    fn core(&self) -> &FunctionCore;

    fn core_mut(&mut self) -> &mut FunctionCore;

    /// Registered name of the function (e.g. `Powerlaw`).
    fn name(&self) -> &str {
        self.core().name()
    }

    fn description(&self) -> &str {
        self.core().description()
    }

    fn parameters(&self) -> &Parameters {
        self.core().parameters()
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        self.core_mut().parameters_mut()
    }

    fn parameter(&self, name: &str) -> Result<&Parameter> {
        self.core().parameter(name)
    }

    fn parameter_mut(&mut self, name: &str) -> Result<&mut Parameter> {
        self.core_mut().parameter_mut(name)
    }

    /// Set a parameter value; out-of-bounds values are rejected.
    fn set_value(&mut self, name: &str, value: f64) -> Result<()> {
        self.parameter_mut(name)?.set_value(value)?;
        Ok(())
    }

    fn has_units(&self) -> bool {
        self.core().has_units()
    }
}

/// A function of one variable, `y = f(x)`.
pub trait Function1D: Function {
    /// Units of the parameters that do not declare one, given the axis units.
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit) -> Result<UnitAssignment>;

    /// Evaluate the formula on plain magnitudes expressed in the axis units.
    fn kernel(&self, x: &Array1<f64>) -> Result<Array1<f64>>;

    /// Fix the axis units and derive every parameter unit from them.
    fn set_units(&mut self, x_unit: &Unit, y_unit: &Unit) -> Result<()> {
        let assignment = self.propagate_units(x_unit, y_unit)?;
        self.core_mut()
            .assign_units(assignment, vec![x_unit.clone(), y_unit.clone()])?;
        debug!(function = %self.name(), x = %x_unit, y = %y_unit, "units propagated");
        Ok(())
    }

    /// Evaluate at plain or unit-tagged samples.
    ///
    /// Unit-tagged samples are converted into the x unit, and the result carries the
    /// y unit. Plain samples give a plain result.
    fn evaluate(&self, x: &Samples) -> Result<Samples> {
        match x {
            Samples::Plain(values) => {
                trace!(function = %self.name(), n = values.len(), "plain evaluation");
                Ok(Samples::Plain(self.kernel(values)?))
            }
            Samples::WithUnit(quantity) => {
                let (x_unit, y_unit) = match self.core().axis_units() {
                    Some([x_unit, y_unit]) => (x_unit, y_unit),
                    _ => {
                        return Err(FunctionError::unit_mismatch(
                            "x",
                            format!("{} received samples with units before set_units was called", self.name()),
                        ))
                    }
                };
                let values = quantity
                    .values_in(x_unit)
                    .map_err(|e| FunctionError::unit_mismatch("x", e.to_string()))?;
                trace!(function = %self.name(), n = values.len(), unit = %x_unit, "unit evaluation");
                let result = self.kernel(&values)?;
                Ok(Samples::WithUnit(Quantity::new(result, y_unit.clone())))
            }
        }
    }

    /// Evaluate plain magnitudes. Shorthand for the plain branch of [`Function1D::evaluate`].
    fn evaluate_values(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.kernel(x)
    }
}

pub(crate) fn degree() -> Unit {
    Unit::new("deg", std::f64::consts::PI / 180.0, crate::units::Dimension::ANGLE)
}

/// A function on the sky, `z = f(lon, lat)`.
///
/// Kernels work in degrees. Plain coordinates are taken in the axis units when units
/// have been set and in degrees otherwise.
pub trait Function2D: Function {
    /// Units of the parameters that do not declare one, given the axis units.
    fn propagate_units(&self, x_unit: &Unit, y_unit: &Unit, z_unit: &Unit) -> Result<UnitAssignment>;

    /// Evaluate the formula at coordinates in degrees.
    fn kernel(&self, lon: &Array1<f64>, lat: &Array1<f64>) -> Result<Array1<f64>>;

    /// Smallest lon/lat box that holds all non-negligible support of the function.
    fn get_boundaries(&self) -> Result<Boundaries>;

    /// Fix the axis units. Both coordinates must be angles.
    fn set_units(&mut self, x_unit: &Unit, y_unit: &Unit, z_unit: &Unit) -> Result<()> {
        for (axis, unit) in [("x", x_unit), ("y", y_unit)] {
            if !unit.is_angle() {
                return Err(FunctionError::unit_mismatch(
                    axis,
                    format!("{} needs an angle, got {}", self.name(), unit),
                ));
            }
        }
        let assignment = self.propagate_units(x_unit, y_unit, z_unit)?;
        self.core_mut().assign_units(
            assignment,
            vec![x_unit.clone(), y_unit.clone(), z_unit.clone()],
        )?;
        debug!(function = %self.name(), x = %x_unit, y = %y_unit, z = %z_unit, "units propagated");
        Ok(())
    }

    /// Angular parameter in degrees.
    fn degrees(&self, name: &str) -> Result<f64> {
        self.core().value_in(name, &degree())
    }

    /// Evaluate at plain or unit-tagged coordinates; both must be of the same kind.
    fn evaluate(&self, x: &Samples, y: &Samples) -> Result<Samples> {
        if x.len() != y.len() {
            return Err(FunctionError::DimensionMismatch(format!(
                "{}: {} longitudes but {} latitudes",
                self.name(),
                x.len(),
                y.len()
            )));
        }

        let deg = degree();
        match (x, y) {
            (Samples::Plain(lon), Samples::Plain(lat)) => {
                let (lon_scale, lat_scale) = match self.core().axis_units() {
                    Some([x_unit, y_unit, _]) => (
                        x_unit
                            .conversion_factor(&deg)
                            .map_err(|e| FunctionError::unit_mismatch("x", e.to_string()))?,
                        y_unit
                            .conversion_factor(&deg)
                            .map_err(|e| FunctionError::unit_mismatch("y", e.to_string()))?,
                    ),
                    _ => (1.0, 1.0),
                };
                trace!(function = %self.name(), n = lon.len(), "plain evaluation");
                let values = self.kernel(&(lon * lon_scale), &(lat * lat_scale))?;
                Ok(Samples::Plain(values))
            }
            (Samples::WithUnit(lon), Samples::WithUnit(lat)) => {
                let z_unit = match self.core().axis_units() {
                    Some([_, _, z_unit]) => z_unit.clone(),
                    _ => {
                        return Err(FunctionError::unit_mismatch(
                            "x",
                            format!("{} received coordinates with units before set_units was called", self.name()),
                        ))
                    }
                };
                let lon = lon
                    .values_in(&deg)
                    .map_err(|e| FunctionError::unit_mismatch("x", e.to_string()))?;
                let lat = lat
                    .values_in(&deg)
                    .map_err(|e| FunctionError::unit_mismatch("y", e.to_string()))?;
                trace!(function = %self.name(), n = lon.len(), "unit evaluation");
                let values = self.kernel(&lon, &lat)?;
                Ok(Samples::WithUnit(Quantity::new(values, z_unit)))
            }
            (Samples::Plain(_), _) => Err(FunctionError::unit_mismatch(
                "y",
                "latitude carries a unit but longitude does not",
            )),
            (_, Samples::Plain(_)) => Err(FunctionError::unit_mismatch(
                "x",
                "longitude carries a unit but latitude does not",
            )),
        }
    }
}

/// Implement [`Function`] for a struct holding its state in a `core` field.
#[macro_export]
macro_rules! function_impl {
    ($ty:ty) => {
        impl $crate::function::Function for $ty {
            fn core(&self) -> &$crate::function::FunctionCore {
                &self.core
            }

            fn core_mut(&mut self) -> &mut $crate::function::FunctionCore {
                &mut self.core
            }
        }
    };
}

/// Zero-filled output of the same length as `x`, with `f` applied where `mask` holds.
///
/// The branch formula only ever sees the selected samples.
pub(crate) fn masked_apply<F>(x: &Array1<f64>, mask: &[bool], f: F) -> Array1<f64>
where
    F: Fn(f64) -> f64,
{
    let mut out = Array1::zeros(x.len());
    fill_masked(&mut out, x, mask, f);
    out
}

/// Overwrite `out` with `f(x)` where `mask` holds.
pub(crate) fn fill_masked<F>(out: &mut Array1<f64>, x: &Array1<f64>, mask: &[bool], f: F)
where
    F: Fn(f64) -> f64,
{
    for ((o, &xi), &selected) in out.iter_mut().zip(x.iter()).zip(mask.iter()) {
        if selected {
            *o = f(xi);
        }
    }
}
