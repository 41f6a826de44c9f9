//! Test helpers module
//!
//! This module provides utilities and helpers for testing the EventDesk
//! application: database setup and test data factories.

pub mod database_helper;
pub mod test_data;

#[allow(unused_imports)]
pub use database_helper::*;
#[allow(unused_imports)]
pub use test_data::*;
