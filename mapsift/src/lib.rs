#![allow(dead_code, unused_imports)]
//! # Mapsift - Incremental Geodata Filtering
//!
//! Mapsift is an embeddable filter engine for collections of geocoded
//! features. It analyzes a feature set's properties into typed, filterable
//! fields, maintains per-field filter clauses, compiles them to and from a
//! URL-safe nested-array expression, and re-evaluates the visible set
//! incrementally as clauses and features change.
//!
//! ## Key Features
//!
//! - **Embedded**: a library, not a service; no I/O of its own
//! - **Field Analysis**: classifies properties as discrete, number, or
//!   date fields with full-collection value domains
//! - **Boolean AND Filtering**: one membership or range clause per field
//! - **Wire Format**: compile/decompile to the nested-array filter syntax,
//!   plus URL-safe encoding for sharing filters as links
//! - **Incremental Evaluation**: crossfilter-style per-field dimension
//!   indexes; a clause change re-evaluates one dimension, not the world
//! - **Faceted Counts**: per-value aggregates that exclude the grouped
//!   field's own clause
//! - **Events**: collection listeners keep the indexes in sync
//! - **Clean API**: PIMPL pattern provides stable, encapsulated interface
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mapsift::engine::FilterEngine;
//! use mapsift::feature::{Feature, FeatureCollection, FeatureId};
//! use mapsift::filter::{compile, encode, Clause};
//! use mapsift::common::Value;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let collection = FeatureCollection::new("observations");
//! collection.add(
//!     Feature::new(FeatureId::new("f1"), -55.19, 5.84)
//!         .with_property("severity", "high")
//!         .with_property("reported_at", "2020-01-15"),
//! )?;
//!
//! let engine = FilterEngine::new(collection)?;
//! engine.apply_clause(
//!     "severity",
//!     Some(Clause::membership([Value::from("high")])?),
//! )?;
//!
//! let partition = engine.visible();
//! let share_url_param = encode(&compile(&engine.applied()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`analyzer`] - Field classification and domain derivation
//! - [`common`] - Common types, traits, and utilities
//! - [`engine`] - Incremental filter evaluation over dimension indexes
//! - [`errors`] - Error types and result definitions
//! - [`feature`] - Feature records, collections, and collection events
//! - [`filter`] - Filter state, wire expressions, and URL codec

use crate::common::*;

pub mod analyzer;
pub mod common;
pub mod engine;
pub mod errors;
pub mod feature;
pub mod filter;
