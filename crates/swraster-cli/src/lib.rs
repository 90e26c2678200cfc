//! Command-line interface for swraster
//!
//! The `swraster` binary draws JSON scenes or a built-in demo to PPM, PGM
//! or PNG files. The pieces live here so they can be tested without
//! spawning the binary.

pub mod cli;
pub mod commands;
pub mod font;
pub mod scene;
