#![allow(missing_docs, dead_code)]
//! Shared benchmark support: request and payload generators.

pub mod generators;
