//! Integration tests for the parameter system
//!
//! These tests drive parameters through the functions that own them.

// Metadata of the built-in functions
mod builtin_metadata_tests;

// User-defined functions built from the same metadata format
mod custom_function_tests;
