//! Marquee Client - HTTP clients for external APIs
//!
//! This crate provides the HTTP client for:
//!
//! - [`tmdb`] - The Movie Database (TMDB) v3 API
//!
//! # Overview
//!
//! The client handles authentication, request building, response parsing,
//! and error mapping. It performs no retries: each operation is one request
//! and its outcome.

pub mod tmdb;

// Re-export main client types
pub use tmdb::TmdbClient;
