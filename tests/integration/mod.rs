//! End-to-end tests across the factory, the capability registry and the radiative models

mod radiative;
mod registry;
