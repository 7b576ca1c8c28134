//! Command-line front end for the sessionize organizer tools.
//!
//! Parses arguments, merges them over the config file, runs one core command
//! flow and prints a JSON envelope on stdout.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod output;
