use wsdl2swagger_wsdl::WsdlEntry;

pub mod document;
pub mod error;

mod generator;
mod preprocessor;
mod schema;
mod types;

pub use document::Document;

/// Builds the Swagger document for one service of a parsed WSDL.
///
/// `wsdl_id` names the originating file and ends up in `x-ibm-configuration`.
pub fn from_entry(
    entry: &WsdlEntry,
    service: &str,
    wsdl_id: &str,
) -> Result<Document, error::Error> {
    generator::generate(entry, service, wsdl_id)
}
