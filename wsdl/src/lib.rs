use std::path::Path;
use url::Url;

mod parser;

pub mod catalog;
pub mod error;
pub mod types;

pub use catalog::{Catalog, ServiceDescriptor, WsdlEntry};

fn to_url(source: &str) -> Result<Url, error::Error> {
    match Url::parse(source) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::from_file_path(
            Path::new(source)
                .canonicalize()
                .map_err(|err| error::Error::PathConversionError(Some(err)))?,
        )
        .map_err(|()| error::Error::PathConversionError(None)),
        Err(err) => Err(err.into()),
    }
}

/// Parses a single WSDL document from a filesystem path or URL, following its imports.
pub fn parse<S: AsRef<str>>(source: S) -> Result<WsdlEntry, error::Error> {
    parser::parse(to_url(source.as_ref())?)
}

/// Parses an in-memory WSDL document. Relative imports cannot be resolved.
pub fn parse_str(xml: &str, filename: &str) -> Result<WsdlEntry, error::Error> {
    parser::parse_str(xml, filename)
}

/// Parses every source into its own catalog entry. Fails on the first source that fails.
pub fn load<S: AsRef<str>>(sources: &[S]) -> Result<Catalog, error::Error> {
    sources
        .iter()
        .map(parse)
        .collect::<Result<Vec<_>, _>>()
        .map(Catalog::new)
}
