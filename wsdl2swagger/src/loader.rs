#[cfg(test)]
use mockall::automock;

use wsdl2swagger_wsdl::{self as wsdl, Catalog};

/// Turns WSDL sources into a catalog of services.
#[cfg_attr(test, automock)]
pub trait Loader {
    fn load(&self, sources: &[String]) -> Result<Catalog, wsdl::error::Error>;
}

/// Reads WSDL files and URLs with the XML parser, following imports.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsdlLoader;

impl Loader for WsdlLoader {
    fn load(&self, sources: &[String]) -> Result<Catalog, wsdl::error::Error> {
        wsdl::load(sources)
    }
}
