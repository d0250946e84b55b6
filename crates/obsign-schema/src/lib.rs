//! # obsign-schema — Schema Validation
//!
//! JSON Schemas (Draft 2020-12) for the Open Badges 3.0 documents this stack
//! consumes and produces, compiled into the binary, plus the
//! [`SchemaValidator`] that checks documents against them.
//!
//! | Schema | Boundary |
//! |---|---|
//! | `create-credential` | inbound unsigned credential |
//! | `proof-config` | proof options before hashing |
//! | `data-integrity-proof` | outbound proof object |
//! | `achievement-credential` | outbound signed credential |
//! | `signing-key-record` | persisted key row |
//!
//! ## Crate Policy
//!
//! - Depends on no other workspace crate.
//! - Schema `$id` and `$ref` URIs must never be changed without checking
//!   every reference across `schemas/`.

pub mod validate;

pub use validate::{
    load_document, SchemaName, SchemaValidationError, SchemaValidator, ValidationViolations,
    Violation,
};
