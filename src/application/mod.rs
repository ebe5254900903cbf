//! Application services layer.

pub mod admin;
pub mod catalog;
pub mod enquiry;
pub mod error;
pub mod favorites;
pub mod listing;
pub mod presentation;
pub mod repos;
pub mod storefront;
