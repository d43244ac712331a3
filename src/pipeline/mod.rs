//! Classification pipeline
//!
//! Normalize -> validate -> trim -> extract -> classify -> report.

pub mod config;
pub mod runner;
