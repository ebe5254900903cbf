//! Storefront core for an ethnic-wear boutique.
//!
//! The catalog is read through [`application::catalog::CatalogService`],
//! shaped for display by [`application::storefront::StorefrontService`] and
//! maintained through the services in [`application::admin`].

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
