//! Runtime physical units.
//!
//! A [`Unit`] is a scale factor to SI together with a [`Dimension`]. Units are
//! parsed from strings such as `"1 / (keV cm2 s)"` or `"erg / cm^2 / s"` using the
//! same expression grammar as parameter metadata, so whitespace means
//! multiplication and a trailing integer on a symbol is a power (`cm2 == cm^2`).

use super::dimension::Dimension;
use crate::parameters::expression::{BinaryOp, Expression, UnaryOp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Electron volt in joule.
pub const EV_IN_JOULE: f64 = 1.602176634e-19;

/// Parsec in metre.
pub const PARSEC_IN_METRE: f64 = 3.0856775814913673e16;

const DEG_IN_RAD: f64 = std::f64::consts::PI / 180.0;

/// Errors raised while parsing or converting units.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit symbol: '{0}'")]
    UnknownSymbol(String),

    #[error("Cannot convert '{from}' to '{to}': incompatible dimensions")]
    Incompatible { from: String, to: String },

    #[error("Cannot parse unit '{0}'")]
    Parse(String),

    #[error("Unit exponents must be integers, got '{0}'")]
    NonIntegerPower(String),
}

/// A physical unit: a multiplicative scale to SI and a dimension.
#[derive(Debug, Clone)]
pub struct Unit {
    symbol: String,
    scale: f64,
    dimension: Dimension,
}

/// Scale to SI and dimension for each recognised base symbol.
fn lookup_symbol(symbol: &str) -> Option<(f64, Dimension)> {
    let ev = EV_IN_JOULE;
    let entry = match symbol {
        // length
        "m" => (1.0, Dimension::LENGTH),
        "cm" => (1e-2, Dimension::LENGTH),
        "mm" => (1e-3, Dimension::LENGTH),
        "km" => (1e3, Dimension::LENGTH),
        "pc" => (PARSEC_IN_METRE, Dimension::LENGTH),
        "kpc" => (PARSEC_IN_METRE * 1e3, Dimension::LENGTH),
        "Mpc" => (PARSEC_IN_METRE * 1e6, Dimension::LENGTH),
        // time
        "s" => (1.0, Dimension::TIME),
        "ms" => (1e-3, Dimension::TIME),
        "h" => (3600.0, Dimension::TIME),
        "d" | "day" => (86400.0, Dimension::TIME),
        "yr" => (3.15576e7, Dimension::TIME),
        // mass
        "kg" => (1.0, Dimension::MASS),
        "g" => (1e-3, Dimension::MASS),
        // energy
        "J" => (1.0, Dimension::ENERGY),
        "erg" => (1e-7, Dimension::ENERGY),
        "eV" => (ev, Dimension::ENERGY),
        "keV" => (ev * 1e3, Dimension::ENERGY),
        "MeV" => (ev * 1e6, Dimension::ENERGY),
        "GeV" => (ev * 1e9, Dimension::ENERGY),
        "TeV" => (ev * 1e12, Dimension::ENERGY),
        // frequency
        "Hz" => (1.0, Dimension::FREQUENCY),
        "kHz" => (1e3, Dimension::FREQUENCY),
        "MHz" => (1e6, Dimension::FREQUENCY),
        "GHz" => (1e9, Dimension::FREQUENCY),
        // angle
        "rad" => (1.0, Dimension::ANGLE),
        "deg" => (DEG_IN_RAD, Dimension::ANGLE),
        "arcmin" => (DEG_IN_RAD / 60.0, Dimension::ANGLE),
        "arcsec" => (DEG_IN_RAD / 3600.0, Dimension::ANGLE),
        "sr" => (1.0, Dimension::SOLID_ANGLE),
        // electromagnetic
        "A" => (1.0, Dimension::CURRENT),
        "T" => (1.0, Dimension::MAGNETIC_FIELD),
        "G" | "Gauss" => (1e-4, Dimension::MAGNETIC_FIELD),
        // remaining SI bases
        "K" => (1.0, Dimension::TEMPERATURE),
        "mol" => (1.0, Dimension::AMOUNT),
        "cd" => (1.0, Dimension::LUMINOSITY),
        // counting units
        "ph" | "ct" | "photon" | "count" => (1.0, Dimension::DIMENSIONLESS),
        _ => return None,
    };
    Some(entry)
}

/// Resolve a symbol with an optional trailing integer power (`cm2`, `s-1` is not allowed).
fn resolve_symbol(symbol: &str) -> Result<Unit, UnitError> {
    if let Some((scale, dimension)) = lookup_symbol(symbol) {
        return Ok(Unit::new(symbol, scale, dimension));
    }

    let split = symbol
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i);
    if let Some(idx) = split {
        let (base, digits) = symbol.split_at(idx);
        if !base.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if let (Some((scale, dimension)), Ok(power)) = (lookup_symbol(base), digits.parse::<i32>()) {
                return Ok(Unit::new(
                    symbol,
                    scale.powi(power),
                    dimension.power(power),
                ));
            }
        }
    }

    Err(UnitError::UnknownSymbol(symbol.to_string()))
}

/// Insert explicit `*` where whitespace separates two factors.
fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    let mut prev: Option<char> = None;

    for c in input.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let left_operand = prev.map_or(false, |p| p.is_alphanumeric() || p == ')' || p == '_');
            let right_operand = c.is_alphabetic() || c == '(' || c.is_ascii_digit();
            if left_operand && right_operand {
                out.push('*');
            } else {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Evaluate an exponent sub-expression that must be an integer.
fn integer_exponent(expr: &Expression, original: &str) -> Result<i32, UnitError> {
    let value = match expr {
        Expression::Number(n) => *n,
        Expression::Unary(UnaryOp::Neg, inner) => -(integer_exponent(inner, original)? as f64),
        _ => return Err(UnitError::NonIntegerPower(original.to_string())),
    };
    if value.fract() != 0.0 || value.abs() > i32::MAX as f64 {
        return Err(UnitError::NonIntegerPower(original.to_string()));
    }
    Ok(value as i32)
}

fn from_expression(expr: &Expression, original: &str) -> Result<Unit, UnitError> {
    match expr {
        Expression::Variable(symbol) => resolve_symbol(symbol),
        Expression::Number(n) if *n > 0.0 && n.is_finite() => {
            Ok(Unit::new(&format!("{}", n), *n, Dimension::DIMENSIONLESS))
        }
        Expression::Binary(BinaryOp::Mul, lhs, rhs) => {
            Ok(from_expression(lhs, original)?.mul(&from_expression(rhs, original)?))
        }
        Expression::Binary(BinaryOp::Div, lhs, rhs) => {
            Ok(from_expression(lhs, original)?.div(&from_expression(rhs, original)?))
        }
        Expression::Binary(BinaryOp::Pow, base, exponent) => {
            let power = integer_exponent(exponent, original)?;
            Ok(from_expression(base, original)?.powi(power))
        }
        _ => Err(UnitError::Parse(original.to_string())),
    }
}

fn needs_parens(symbol: &str) -> bool {
    symbol.contains(' ') || symbol.contains('/')
}

impl Unit {
    /// Build a unit from its parts. `symbol` is used for display only.
    pub fn new(symbol: &str, scale: f64, dimension: Dimension) -> Self {
        Unit {
            symbol: symbol.to_string(),
            scale,
            dimension,
        }
    }

    /// The dimensionless unit with scale 1.
    pub fn dimensionless() -> Self {
        Unit::new("", 1.0, Dimension::DIMENSIONLESS)
    }

    /// Parse a unit string.
    ///
    /// An empty string is the dimensionless unit.
    pub fn parse(input: &str) -> Result<Unit, UnitError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Unit::dimensionless());
        }

        let expr = Expression::parse(&normalize(trimmed))
            .map_err(|_| UnitError::Parse(input.to_string()))?;
        let parsed = from_expression(&expr, input)?;
        Ok(Unit::new(trimmed, parsed.scale, parsed.dimension))
    }

    /// Symbol used for display and serialization.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Multiplicative factor converting one of this unit into SI base units.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Product of two units.
    pub fn mul(&self, other: &Unit) -> Unit {
        let symbol = match (self.symbol.is_empty(), other.symbol.is_empty()) {
            (true, _) => other.symbol.clone(),
            (false, true) => self.symbol.clone(),
            (false, false) => {
                let left = if self.symbol.contains('/') {
                    format!("({})", self.symbol)
                } else {
                    self.symbol.clone()
                };
                let right = if other.symbol.contains('/') {
                    format!("({})", other.symbol)
                } else {
                    other.symbol.clone()
                };
                format!("{} {}", left, right)
            }
        };
        Unit::new(
            &symbol,
            self.scale * other.scale,
            self.dimension.multiply(&other.dimension),
        )
    }

    /// Quotient of two units.
    pub fn div(&self, other: &Unit) -> Unit {
        if other.symbol.is_empty() {
            return Unit::new(
                &self.symbol,
                self.scale / other.scale,
                self.dimension.divide(&other.dimension),
            );
        }
        let numerator = if self.symbol.is_empty() {
            "1".to_string()
        } else if needs_parens(&self.symbol) {
            format!("({})", self.symbol)
        } else {
            self.symbol.clone()
        };
        let denominator = if needs_parens(&other.symbol) {
            format!("({})", other.symbol)
        } else {
            other.symbol.clone()
        };
        Unit::new(
            &format!("{} / {}", numerator, denominator),
            self.scale / other.scale,
            self.dimension.divide(&other.dimension),
        )
    }

    /// Integer power of a unit.
    pub fn powi(&self, power: i32) -> Unit {
        let symbol = match power {
            0 => String::new(),
            1 => self.symbol.clone(),
            _ if self.symbol.is_empty() => String::new(),
            _ if needs_parens(&self.symbol) || self.symbol.contains('^') => {
                format!("({})^{}", self.symbol, power)
            }
            _ => format!("{}^{}", self.symbol, power),
        };
        Unit::new(&symbol, self.scale.powi(power), self.dimension.power(power))
    }

    /// Reciprocal unit.
    pub fn inverse(&self) -> Unit {
        Unit::dimensionless().div(self)
    }

    /// Whether a value in this unit can be expressed in `other`.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    /// Factor that converts a value in `self` into `target`.
    pub fn conversion_factor(&self, target: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible(target) {
            return Err(UnitError::Incompatible {
                from: self.to_string(),
                to: target.to_string(),
            });
        }
        Ok(self.scale / target.scale)
    }

    pub fn is_energy(&self) -> bool {
        self.dimension == Dimension::ENERGY
    }

    pub fn is_angle(&self) -> bool {
        self.dimension == Dimension::ANGLE
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    /// Dimensionless and with unit scale.
    pub fn is_unity(&self) -> bool {
        self.is_dimensionless() && (self.scale - 1.0).abs() <= 1e-12
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension
            && (self.scale - other.scale).abs() <= 1e-12 * self.scale.abs().max(other.scale.abs())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbol.is_empty() {
            write!(f, "dimensionless")
        } else {
            write!(f, "{}", self.symbol)
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.symbol)
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Unit::parse(&symbol).map_err(serde::de::Error::custom)
    }
}
