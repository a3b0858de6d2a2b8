//! Test modules for the timestamped queue
//!
//! Tests are organized by functional area.

mod backpressure;
