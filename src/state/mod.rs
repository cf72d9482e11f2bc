//! State module for tracking scan job lifecycle
//!
//! # Components
//!
//! - `ScanStatus`: The job state machine (queued, visiting, analyzing, completed, failed)

mod scan_status;

pub use scan_status::ScanStatus;
