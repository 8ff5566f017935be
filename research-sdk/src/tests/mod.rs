//! Scenario tests for the research SDK
//!
//! Each file covers one concern; `support` holds the shared doubles.

pub mod support;

pub mod grok_mock_tests;
pub mod twitter_mock_tests;
