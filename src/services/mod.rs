//! External lookup services
//!
//! HTTP client for the public IP and geolocation lookups.

mod client;

pub use client::ServiceClient;
