//! # astrofunc-rs
//!
//! `astrofunc-rs` provides the closed-form spectral (1-D) and spatial (2-D) model
//! functions used to describe astrophysical sources, on top of a declarative,
//! unit-aware parameter system.
//!
//! The library provides:
//! - Parameters built from YAML metadata, with bounds, fixed/free flags,
//!   normalization markers and value transformations
//! - Unit propagation from the axis units to every parameter, and evaluation on
//!   plain or unit-tagged samples
//! - A catalogue of power laws, cutoff and broken shapes, Band spectra, elementary
//!   shapes and on-sphere spatial models
//! - Optional models (synchrotron, EBL attenuation) that plug in external
//!   collaborators through traits, gated by a capability registry
//!
//! ## Basic Usage
//!
//! ```
//! use astrofunc_rs::functions::Powerlaw;
//! use astrofunc_rs::{Function, Function1D, Quantity, Samples, Unit};
//! use ndarray::array;
//!
//! let mut powerlaw = Powerlaw::new().unwrap();
//! powerlaw.set_value("index", -2.0).unwrap();
//!
//! let y = powerlaw.evaluate_values(&array![10.0, 100.0]).unwrap();
//! assert!((y[0] - 0.01).abs() < 1e-15);
//!
//! let kev = Unit::parse("keV").unwrap();
//! let flux = Unit::parse("1 / (keV cm2 s)").unwrap();
//! powerlaw.set_units(&kev, &flux).unwrap();
//!
//! let x = Samples::WithUnit(Quantity::new(array![0.01], Unit::parse("MeV").unwrap()));
//! let y = powerlaw.evaluate(&x).unwrap();
//! assert_eq!(y.unit(), Some(&flux));
//! ```

pub mod capabilities;
pub mod error;
pub mod function;
pub mod functions;
pub mod parameters;
pub mod special;
pub mod sphere;
pub mod template;
pub mod units;

// Re-exports for convenience
pub use capabilities::{Capabilities, Capability};
pub use error::{FunctionError, Result};
pub use function::{Function, Function1D, Function2D, FunctionCore, UnitAssignment};
pub use functions::FunctionRegistry;
pub use parameters::{Parameter, Parameters};
pub use sphere::Boundaries;
pub use units::{Quantity, Samples, Unit, UnitSystem};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
