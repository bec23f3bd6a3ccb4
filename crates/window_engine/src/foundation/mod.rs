//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Registry handles and id types
//! - Raw tick clock bookkeeping
//! - Logging utilities

pub mod collections;
pub mod time;
pub mod logging;
