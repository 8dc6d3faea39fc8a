//! # Clinicore Worker Library
//!
//! Background processing for the clinic: periodic scans (appointment
//! reminders, low stock) and the outbox dispatcher that executes the side
//! effects recorded by the API.
//!
//! ## Modules
//!
//! - `scheduler`: Interval-driven job runner with graceful shutdown
//! - `jobs`: The periodic jobs themselves
//! - `dispatch`: Outbox entry execution with retries

pub mod dispatch;
pub mod jobs;
pub mod scheduler;
