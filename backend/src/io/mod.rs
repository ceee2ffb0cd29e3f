//! # IO Module
//!
//! Interface layer between clients and the domain logic. Translates HTTP
//! requests into domain commands and domain results back into JSON, and owns
//! the boundary concerns: serialization, status codes, CORS, request logging.

pub mod rest;

pub use rest::*;
