//! End-to-end scenarios exercising the engines through the public API.

pub mod filter_scenarios;
pub mod patch_scenarios;
pub mod projection;
pub mod property_tests;
pub mod provider;
