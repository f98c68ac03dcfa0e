//! Converts the services described by WSDL documents into Swagger 2.0 YAML files.
//!
//! A run loads every source into a [`Catalog`](wsdl2swagger_wsdl::Catalog) once,
//! then converts each service in its own failure boundary and reports every
//! outcome in a [`ConversionReport`].

pub mod config;
pub mod error;
pub mod generator;
pub mod loader;
pub mod orchestrator;
pub mod writer;

pub use config::Config;
pub use orchestrator::{ConversionReport, Orchestrator, ServiceOutcome};
