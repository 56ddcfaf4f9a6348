//! Integration tests against the in-memory store

mod api_tests;
mod workflow_tests;
