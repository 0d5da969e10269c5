//! Ordered parameter collections
//!
//! A function's parameters keep their declaration order, which is also the order
//! a fitting engine sees them in. Lookups by name go through an index map.

use crate::parameters::parameter::{Parameter, ParameterError};
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when saving or loading parameter snapshots
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Parameter error: {0}")]
    ParameterError(#[from] ParameterError),
}

/// An ordered collection of uniquely named parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Parameter>", into = "Vec<Parameter>")]
pub struct Parameters {
    params: Vec<Parameter>,
    index: HashMap<String, usize>,
}

impl TryFrom<Vec<Parameter>> for Parameters {
    type Error = ParameterError;

    fn try_from(list: Vec<Parameter>) -> Result<Self, Self::Error> {
        let mut params = Parameters::new();
        for param in list {
            params.add(param)?;
        }
        Ok(params)
    }
}

impl From<Parameters> for Vec<Parameter> {
    fn from(params: Parameters) -> Self {
        params.params
    }
}

impl Parameters {
    /// Create a new empty parameters collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter; names must be unique.
    ///
    /// # Examples
    ///
    /// ```
    /// use astrofunc_rs::parameters::{Parameter, Parameters};
    ///
    /// let mut params = Parameters::new();
    /// params.add(Parameter::new("K", 1.0)).unwrap();
    /// params.add(Parameter::new("index", -2.0)).unwrap();
    /// assert_eq!(params.names(), vec!["K", "index"]);
    /// assert!(params.add(Parameter::new("K", 2.0)).is_err());
    /// ```
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        let name = param.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ParameterError::Duplicate { name });
        }
        self.index.insert(name, self.params.len());
        self.params.push(param);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        match self.index.get(name) {
            Some(&i) => self.params.get_mut(i),
            None => None,
        }
    }

    /// Current value of a parameter
    pub fn value(&self, name: &str) -> Result<f64, ParameterError> {
        self.get(name)
            .map(|p| p.value())
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    /// Set the value of a named parameter, honouring its bounds.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        match self.get_mut(name) {
            Some(param) => param.set_value(value),
            None => Err(ParameterError::ParameterNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name()).collect()
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.params.iter_mut()
    }

    /// Parameters a fitter may vary
    pub fn free(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| p.is_free()).collect()
    }

    /// Parameters marked as linear normalizations
    pub fn normalizations(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| p.is_normalization()).collect()
    }

    /// Reset every parameter to its initial value
    pub fn reset(&mut self) {
        for param in self.params.iter_mut() {
            param.reset();
        }
    }

    /// Whether every parameter has been assigned a unit
    pub fn all_units_assigned(&self) -> bool {
        self.params.iter().all(|p| p.unit().is_some())
    }

    pub(crate) fn assign_unit(&mut self, name: &str, unit: Unit) -> Result<(), ParameterError> {
        match self.get_mut(name) {
            Some(param) => {
                param.assign_unit(unit);
                Ok(())
            }
            None => Err(ParameterError::ParameterNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Serialize the parameters to a JSON string
    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize parameters from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SerializationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save the parameters to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), SerializationError> {
        let mut file = File::create(path)?;
        file.write_all(self.to_json()?.as_bytes())?;
        Ok(())
    }

    /// Load parameters from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, SerializationError> {
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    /// Copy current values from a snapshot into this collection.
    ///
    /// Only names present in both collections are touched; bounds are honoured.
    pub fn update_values(&mut self, snapshot: &Parameters) -> Result<(), ParameterError> {
        for other in snapshot.iter() {
            if let Some(param) = self.get_mut(other.name()) {
                param.set_value(other.value())?;
            }
        }
        Ok(())
    }
}
