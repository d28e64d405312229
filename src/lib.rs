//! orthoplus-rest - PostgREST-style generic record API for Ortho+
//!
//! Translates `/rest/v1/:table` query strings into structured queries and
//! serves list/get/create/update/delete over a registry of named tables.

pub mod cli;
pub mod http_server;
pub mod observability;
pub mod rest_api;
