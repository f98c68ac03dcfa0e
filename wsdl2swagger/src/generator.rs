#[cfg(test)]
use mockall::automock;

use wsdl2swagger_swagger::{self as swagger, Document};
use wsdl2swagger_wsdl::WsdlEntry;

/// Produces the Swagger document for one service of a catalog entry.
#[cfg_attr(test, automock)]
pub trait Generator {
    fn generate(
        &self,
        entry: &WsdlEntry,
        service: &str,
        wsdl_id: &str,
    ) -> Result<Document, swagger::error::Error>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SwaggerGenerator;

impl Generator for SwaggerGenerator {
    fn generate(
        &self,
        entry: &WsdlEntry,
        service: &str,
        wsdl_id: &str,
    ) -> Result<Document, swagger::error::Error> {
        swagger::from_entry(entry, service, wsdl_id)
    }
}
