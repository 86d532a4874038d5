//! # nerdbuild - directive-driven C builds
//!
//! nerdbuild compiles a tree of C sources into one executable per top-level
//! file. Nothing is configured up front: each program and module header says
//! what it needs in a comment, and the build follows those directives.
//!
//! ## Layout
//!
//! ```text
//! src/
//!   app.c           //> use: net        (program "app")
//!   net/net.h       //> use: util       (module "net")
//!   net/socket.c
//!   util/.build     def: UTIL_FAST      (override file for "util")
//!   util/util.c
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Build every program in debug
//! nb
//!
//! # Build one program with optimizations, showing commands
//! nb app --release --verbose
//! ```
//!
//! ## Pipeline
//!
//! - [`directive`] - Parse `use`/`define` directives
//! - [`modules`] - Per-module configuration and dependency expansion
//! - [`sources`] - Programs and their translation units
//! - [`staleness`] - Timestamp-based rebuild decisions
//! - [`plan`] - The compile/link plan
//! - [`build`] - Running the plan

/// Plan execution: compiling, linking, cleaning and watching.
pub mod build;

/// Immutable build configuration and `nb.toml`.
pub mod config;

/// Directive grammar for sources, headers and override files.
pub mod directive;

/// Fatal error taxonomy.
pub mod error;

/// Module resolution and breadth-first dependency expansion.
pub mod modules;

/// Build planning.
pub mod plan;

/// Programs, source sets and translation units.
pub mod sources;

/// Staleness checks for objects and executables.
pub mod staleness;

/// Terminal UI utilities (tables, banner).
pub mod ui;
