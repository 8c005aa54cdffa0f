//! Shared HTTP client with timeout and retry policy.

pub mod client;

pub use client::{map_transport_error, read_error_body, HttpClient, HttpClientBuilder, RetryPolicy};
