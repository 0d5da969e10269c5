//! Integration tests for the 1-D function catalogue

mod continuity;
mod flux;
mod unit_roundtrip;
