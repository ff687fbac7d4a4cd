#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod forecast;
pub mod harmonic;
pub mod linalg;
pub mod profile;
pub mod region;
pub mod stats;
