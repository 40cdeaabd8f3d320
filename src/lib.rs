//! OpenAPI documents from reflected route and type metadata.
//!
//! A reflection dumper running inside a web application writes a manifest describing its
//! routes, controller method signatures and structured types. This crate turns that manifest
//! into an OpenAPI 3.0 document: it resolves type descriptors into schemas, registers named
//! components (cycles included), translates validation rules into constraints, infers
//! response shapes and assembles one operation per route method.
//!
//! # Pipeline
//!
//! 1. [`scanner`] and [`manifest`] find, parse and merge manifest fragments into [`metadata::Metadata`]
//! 2. [`catalog`] indexes the reflected types and controller methods
//! 3. [`schema_generator`], [`type_resolver`] and [`analyzer`] turn types into schemas held by
//!    the [`registry`]
//! 4. [`response_inferencer`] and [`operation_assembler`] build each operation
//! 5. [`openapi_builder`] collects paths and components into an [`openapi_builder::OpenApiDocument`]
//! 6. [`serializer`] writes it as YAML or JSON
//!
//! # Example
//!
//! ```
//! use openapi_from_metadata::{config::GeneratorConfig, generate, metadata::Metadata};
//!
//! let metadata: Metadata = serde_json::from_str(r#"{
//!     "routes": [{"uri": "api/users/{id}", "methods": ["GET"],
//!                 "controller": "App\\Http\\Controllers\\UserController", "action": "show"}],
//!     "controllers": [{"identity": "App\\Http\\Controllers\\UserController",
//!                      "methods": [{"name": "show",
//!                                   "parameters": [{"name": "id", "type": {"kind": "primitive", "name": "int"}}],
//!                                   "returns": {"kind": "typed",
//!                                               "type": {"kind": "named", "identity": "App\\Http\\Resources\\UserResource"}}}]}],
//!     "types": [{"identity": "App\\Http\\Resources\\UserResource",
//!                "capability": {"kind": "projected",
//!                               "source": {"inline": "return ['id' => $this->id, 'email' => $this->email];"}}}]
//! }"#).unwrap();
//!
//! let document = generate(&metadata, &GeneratorConfig::default());
//!
//! assert_eq!(document.operation_count(), 1);
//! assert!(document.components.schemas.contains_key("UserResource"));
//! ```
//!
//! # Command-Line Interface
//!
//! See the [`cli`] module for the command line driver.

pub mod analyzer;
pub mod annotations;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod openapi_builder;
pub mod operation_assembler;
pub mod registry;
pub mod response_inferencer;
pub mod rule_translator;
pub mod scanner;
pub mod schema;
pub mod schema_generator;
pub mod serializer;
pub mod source_scan;
pub mod type_resolver;

pub use openapi_builder::generate;
