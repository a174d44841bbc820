//! appstager-lib: staging logic for go-app-stager
//!
//! Produces a self-contained copy of a Go application's source tree for a
//! managed hosting runtime:
//! - `config`: deployment descriptor and target version
//! - `context`: build context and runtime skip list
//! - `package`: Go package metadata provider
//! - `resolve`: dependency closure over the import graph
//! - `stage`: staging strategies and staged tree assembly

pub mod config;
pub mod consts;
pub mod context;
pub mod package;
pub mod platform;
pub mod resolve;
pub mod stage;
pub mod util;
