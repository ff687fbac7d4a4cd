#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod atmosphere;
pub mod cooling;
pub mod embodied;
pub mod error;
pub mod gpu;
pub mod thermal;

#[cfg(test)]
mod tests;
