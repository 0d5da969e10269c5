//! Declarative parameter metadata.
//!
//! Every function ships a small YAML document describing itself and its
//! parameters:
//!
//! ```yaml
//! description: A simple power-law
//! latex: K~\frac{x}{piv}^{index}
//! parameters:
//!   K:
//!     desc: Normalization (differential flux at the pivot value)
//!     initial value: 1.0
//!     is_normalization: true
//!     transformation: log10
//!     min: 1e-30
//!     max: 1e3
//!   piv:
//!     desc: Pivot value
//!     initial value: 1
//!     fix: true
//! ```
//!
//! Numeric fields accept plain numbers or arithmetic over `pi` and `e`
//! (`1 / (2 * pi)`, `-pi`). The declaration order of `parameters` is preserved.

use crate::error::{FunctionError, Result};
use crate::parameters::expression::eval_constant;
use crate::parameters::parameter::{default_delta, Parameter};
use crate::parameters::parameters::Parameters;
use crate::parameters::transform::Transformation;
use crate::units::Unit;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// A numeric metadata value: a literal or a constant expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    Number(f64),
    Expression(String),
}

impl NumberField {
    pub fn resolve(&self) -> std::result::Result<f64, String> {
        match self {
            NumberField::Number(n) => Ok(*n),
            NumberField::Expression(text) => {
                eval_constant(text).map_err(|e| format!("'{}' is not a number: {}", text, e))
            }
        }
    }
}

impl From<f64> for NumberField {
    fn from(value: f64) -> Self {
        NumberField::Number(value)
    }
}

/// A boolean metadata flag; `yes`/`no` are accepted alongside `true`/`false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagField {
    Bool(bool),
    Text(String),
}

impl FlagField {
    pub fn resolve(&self) -> std::result::Result<bool, String> {
        match self {
            FlagField::Bool(b) => Ok(*b),
            FlagField::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" | "on" => Ok(true),
                "no" | "false" | "off" => Ok(false),
                other => Err(format!("'{}' is not a boolean flag", other)),
            },
        }
    }
}

/// Declaration of one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSpec {
    #[serde(skip)]
    pub name: String,

    #[serde(default)]
    pub desc: Option<String>,

    #[serde(rename = "initial value")]
    pub initial_value: NumberField,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<NumberField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<NumberField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<NumberField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<FlagField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_normalization: Option<FlagField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ParameterSpec {
    /// A bare declaration with only an initial value
    pub fn new(name: &str, initial_value: f64) -> Self {
        ParameterSpec {
            name: name.to_string(),
            desc: None,
            initial_value: NumberField::Number(initial_value),
            min: None,
            max: None,
            delta: None,
            fix: None,
            is_normalization: None,
            transformation: None,
            unit: None,
        }
    }
}

/// Metadata of a function: description, LaTeX formula and ordered parameter declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub description: String,

    #[serde(default)]
    pub latex: Option<String>,

    #[serde(with = "ordered_parameters")]
    pub parameters: Vec<ParameterSpec>,
}

impl FunctionSchema {
    /// Parse a YAML metadata document. Malformed documents are configuration errors.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| FunctionError::Configuration(format!("invalid function metadata: {}", e)))
    }
}

/// (De)serialize the parameter declarations as an ordered mapping keyed by name.
mod ordered_parameters {
    use super::*;

    pub fn serialize<S: Serializer>(specs: &[ParameterSpec], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(specs.len()))?;
        for spec in specs {
            map.serialize_entry(&spec.name, spec)?;
        }
        map.end()
    }

    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<ParameterSpec>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a mapping from parameter name to its declaration")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
            let mut specs = Vec::new();
            while let Some((name, mut spec)) = access.next_entry::<String, ParameterSpec>()? {
                spec.name = name;
                specs.push(spec);
            }
            Ok(specs)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<ParameterSpec>, D::Error> {
        deserializer.deserialize_map(OrderedVisitor)
    }
}

fn config_error(name: &str, message: impl fmt::Display) -> FunctionError {
    FunctionError::Configuration(format!("parameter '{}': {}", name, message))
}

/// Build one live parameter from its declaration.
pub fn build_parameter(spec: &ParameterSpec) -> Result<Parameter> {
    let name = spec.name.as_str();
    let number = |field: &Option<NumberField>| -> Result<Option<f64>> {
        field
            .as_ref()
            .map(|f| f.resolve().map_err(|e| config_error(name, e)))
            .transpose()
    };
    let flag = |field: &Option<FlagField>| -> Result<bool> {
        match field {
            Some(f) => f.resolve().map_err(|e| config_error(name, e)),
            None => Ok(false),
        }
    };

    let value = spec.initial_value.resolve().map_err(|e| config_error(name, e))?;
    let min = number(&spec.min)?.unwrap_or(f64::NEG_INFINITY);
    let max = number(&spec.max)?.unwrap_or(f64::INFINITY);

    if value.is_nan() {
        return Err(config_error(name, "initial value is NaN"));
    }
    if min > max {
        return Err(config_error(name, format!("min ({}) is larger than max ({})", min, max)));
    }
    if value < min || value > max {
        return Err(config_error(
            name,
            format!("initial value {} lies outside [{}, {}]", value, min, max),
        ));
    }

    let transformation = match spec.transformation.as_deref() {
        Some(keyword) => keyword
            .parse::<Transformation>()
            .map_err(|e| config_error(name, e))?,
        None => Transformation::Identity,
    };

    let delta = number(&spec.delta)?.unwrap_or_else(|| default_delta(value));

    let mut param = Parameter::with_bounds(name, value, min, max)
        .map_err(|e| config_error(name, e))?
        .describe(spec.desc.as_deref().unwrap_or_default())
        .with_delta(delta)
        .fixed(flag(&spec.fix)?)
        .normalization(flag(&spec.is_normalization)?)
        .with_transformation(transformation)
        .map_err(|e| config_error(name, e))?;

    if let Some(symbol) = &spec.unit {
        let unit = Unit::parse(symbol).map_err(|e| config_error(name, e))?;
        param = param.with_declared_unit(unit);
    }

    Ok(param)
}

/// Build the ordered parameter collection described by `schema`.
///
/// # Examples
///
/// ```
/// use astrofunc_rs::parameters::schema::{build_parameters, FunctionSchema};
///
/// let schema = FunctionSchema::from_yaml(r#"
/// description: A constant
/// parameters:
///   k:
///     desc: Constant value
///     initial value: 0.0
/// "#).unwrap();
/// let params = build_parameters(&schema).unwrap();
/// assert_eq!(params.names(), vec!["k"]);
/// ```
pub fn build_parameters(schema: &FunctionSchema) -> Result<Parameters> {
    if schema.parameters.is_empty() {
        return Err(FunctionError::Configuration(
            "function metadata declares no parameters".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut params = Parameters::new();
    for spec in &schema.parameters {
        if !seen.insert(spec.name.as_str()) {
            return Err(config_error(&spec.name, "declared more than once"));
        }
        params.add(build_parameter(spec)?)?;
    }

    Ok(params)
}
