//! Core building blocks shared across the inspection pipeline

pub mod error;
