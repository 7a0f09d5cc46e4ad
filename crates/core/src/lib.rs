//! Marker Core - Shared cart domain types.
//!
//! This crate provides the types the cart store is built on:
//! - [`ProductId`] - String identifier of a product line
//! - [`Price`] - Decimal unit price, a plain JSON number on the wire
//! - [`LineItem`] / [`NewLineItem`] - One product placed in the cart
//! - [`Cart`] - Ordered, identifier-keyed collection of line items
//!
//! # Architecture
//!
//! The core crate contains only types and pure transitions - no I/O, no
//! storage access. Persistence and change notification live in `marker-cart`.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers and the cart model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
