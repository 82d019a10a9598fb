//! Integration tests for the harvester
//!
//! These tests use wiremock to stand up a fake listing site and exercise
//! fetching, discovery and the full pipeline over real HTTP.

mod common;
mod discovery_tests;
mod pipeline_tests;
