//! Administrative configuration screen for a SAML single sign-on plugin.
//!
//! The crate validates stored and submitted SSO settings field by field,
//! inspects pasted X.509 certificates, renders the configuration form and
//! persists accepted submissions. See [`services::ConfigScreen`] for the
//! entry point.

pub mod config;
pub mod db;
pub mod models;
#[cfg(feature = "cli")]
pub mod observability;
pub mod render;
pub mod services;
pub mod validation;

#[cfg(test)]
mod tests;
