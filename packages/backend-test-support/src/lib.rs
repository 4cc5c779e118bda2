//! Test helpers shared by the backend's unit and integration tests:
//! one-time log setup and problem-details assertions.

pub mod logging;
pub mod problem_details;
