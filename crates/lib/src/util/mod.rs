//! Shared utilities.
//!
//! Test helpers for building throwaway Go workspaces.

#[cfg(test)]
pub mod testutil;
