//! Shared helpers for Lowkey Vault integration tests

#![allow(dead_code)]

pub mod certs;
pub mod tls_server;
