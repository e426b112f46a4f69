//! Shared utilities for the AeroSentinel zone service.
//!
//! This crate provides validation logic used across all other crates:
//! - Coordinate range checks for GeoPoints
//! - Zone name checks
//! - The minimum vertex count of a closed zone polygon

pub mod validation;
