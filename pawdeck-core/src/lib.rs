// src/lib.rs

pub mod config;
pub mod services;
pub mod test_utils;

pub use pawdeck_common::error::Error;
pub use services::automation_engine::AutomationEngine;
pub use services::interpreter::RuntimeContext;
