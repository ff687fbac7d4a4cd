#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod diff;
pub mod estimate;
pub mod gate;
