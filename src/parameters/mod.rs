//! # Parameter System
//!
//! Named, bounded parameters built from declarative metadata.
//!
//! ## Core Components
//!
//! - [`Parameter`]: a value with bounds, step hint, fixed flag, normalization marker,
//!   transformation and (once propagated) a physical unit
//! - [`Parameters`]: an ordered collection keyed by name
//! - [`FunctionSchema`] and [`build_parameters`]: the declarative builder that turns
//!   YAML metadata into live parameters
//! - [`Expression`]: the small arithmetic grammar used for metadata values and
//!   unit strings
//!
//! ## Example Usage
//!
//! ```rust
//! use astrofunc_rs::parameters::{build_parameters, FunctionSchema};
//!
//! let schema = FunctionSchema::from_yaml(r#"
//! description: A straight line
//! parameters:
//!   a:
//!     desc: linear coefficient
//!     initial value: 1
//!   b:
//!     desc: intercept
//!     initial value: 0
//! "#).unwrap();
//!
//! let mut params = build_parameters(&schema).unwrap();
//! params.set_value("a", 2.5).unwrap();
//! assert_eq!(params.value("a").unwrap(), 2.5);
//! ```

pub mod bounds;
pub mod expression;
pub mod parameter;
pub mod parameters;
pub mod schema;
pub mod transform;


// Re-export key types
pub use bounds::{Bounds, BoundsError};
pub use expression::{eval_constant, ConstantContext, EvaluationContext, Expression, ExpressionError};
pub use parameter::{Parameter, ParameterError};
pub use parameters::{Parameters, SerializationError};
pub use schema::{build_parameters, FunctionSchema, ParameterSpec};
pub use transform::Transformation;
