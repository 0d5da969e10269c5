//! Integration tests for the functions on the sphere

// The boundaries hold the support of each model
mod containment;

// Templates read from files
mod template_files;

// Degrees and radians give the same sky
mod unit_roundtrip;
