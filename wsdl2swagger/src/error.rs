use std::{io, path::PathBuf};

use thiserror::Error;

use wsdl2swagger_swagger as swagger;
use wsdl2swagger_wsdl as wsdl;

/// Failures that abort the whole run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Error loading WSDL: {0}")]
    Load(#[from] wsdl::error::Error),

    #[error("Unable to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("WSDL loader task did not complete")]
    Join(#[from] tokio::task::JoinError),
}

/// Failures confined to the conversion of a single service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Service {service} is not defined by any loaded WSDL")]
    Resolution { service: String },

    #[error("Service name {service:?} is not usable as a file name")]
    InvalidName { service: String },

    #[error("Unable to generate swagger: {0}")]
    Generation(#[from] swagger::error::Error),

    #[error("Unable to serialize swagger: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Unable to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
