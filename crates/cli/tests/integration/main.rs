//! End-to-end staging tests for the go-app-stager binary.

mod common;
mod stage_tests;
