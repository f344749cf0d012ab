//! Shared test support: patient fixtures and an in-process mock of the
//! prediction API.

pub mod fixtures;
pub mod mock_backend;
