//! credvault: a local encrypted credential vault.
//!
//! Records are encoded as text lines, encrypted with AES-256-CBC and stored
//! as one radix-64 blob per file.  Start with [`vault::Vault`], or
//! [`vault::VaultSession`] / [`vault::AsyncVault`] for the boolean and
//! background-task interfaces.

pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod generator;
pub mod vault;
