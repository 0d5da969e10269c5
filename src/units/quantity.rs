//! Arrays of values carrying a unit.

use super::unit::{Unit, UnitError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// An array of values expressed in a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub values: Array1<f64>,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(values: Array1<f64>, unit: Unit) -> Self {
        Quantity { values, unit }
    }

    /// Single-element quantity.
    pub fn scalar(value: f64, unit: Unit) -> Self {
        Quantity {
            values: Array1::from_elem(1, value),
            unit,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Convert into `target`, scaling the values.
    pub fn to(&self, target: &Unit) -> Result<Quantity, UnitError> {
        let factor = self.unit.conversion_factor(target)?;
        Ok(Quantity {
            values: &self.values * factor,
            unit: target.clone(),
        })
    }

    /// Values expressed in `target`, without the unit.
    pub fn values_in(&self, target: &Unit) -> Result<Array1<f64>, UnitError> {
        Ok(self.to(target)?.values)
    }
}

/// Sample coordinates handed to a function: either plain numbers or a unit-tagged array.
///
/// Plain samples are interpreted in whatever units the function's parameters hold;
/// unit-tagged samples are converted into the axis unit fixed by `set_units` and the
/// result comes back tagged with the output unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Plain(Array1<f64>),
    WithUnit(Quantity),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::Plain(values) => values.len(),
            Samples::WithUnit(quantity) => quantity.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_unit(&self) -> bool {
        matches!(self, Samples::WithUnit(_))
    }

    /// The unit-tagged form, if any.
    pub fn as_quantity(&self) -> Option<&Quantity> {
        match self {
            Samples::Plain(_) => None,
            Samples::WithUnit(quantity) => Some(quantity),
        }
    }

    /// The plain values, if the samples carry no unit.
    pub fn as_plain(&self) -> Option<&Array1<f64>> {
        match self {
            Samples::Plain(values) => Some(values),
            Samples::WithUnit(_) => None,
        }
    }

    /// The numeric values regardless of unit.
    pub fn values(&self) -> &Array1<f64> {
        match self {
            Samples::Plain(values) => values,
            Samples::WithUnit(quantity) => &quantity.values,
        }
    }

    pub fn unit(&self) -> Option<&Unit> {
        self.as_quantity().map(|q| &q.unit)
    }

    /// Drop the unit tag, keeping the numbers.
    pub fn into_values(self) -> Array1<f64> {
        match self {
            Samples::Plain(values) => values,
            Samples::WithUnit(quantity) => quantity.values,
        }
    }
}

impl From<Array1<f64>> for Samples {
    fn from(values: Array1<f64>) -> Self {
        Samples::Plain(values)
    }
}

impl From<Vec<f64>> for Samples {
    fn from(values: Vec<f64>) -> Self {
        Samples::Plain(Array1::from_vec(values))
    }
}

impl From<Quantity> for Samples {
    fn from(quantity: Quantity) -> Self {
        Samples::WithUnit(quantity)
    }
}
