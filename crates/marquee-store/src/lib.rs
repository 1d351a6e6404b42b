//! Marquee Store - File-backed document storage
//!
//! This crate provides the persistence layer for the harvester: each
//! collection (checkpoint, movie details, credits) is one JSON file in a
//! data directory, replaced atomically on every save.
//!
//! # Overview
//!
//! The main component is:
//! - [`JsonFileStore`] - [`DocumentStore`](marquee_core::traits::DocumentStore) over a directory of JSON files

mod json_store;

pub use json_store::JsonFileStore;
