use wsdl2swagger_wsdl::types::{self as wsdl, NamespacedName, SoapVersion};

#[derive(Debug, Clone)]
pub struct Service {
    pub name: NamespacedName,
    pub documentation: Option<String>,
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: NamespacedName,
    pub location: Option<String>,
    pub soap_version: SoapVersion,
    pub operations: Vec<Operation>,
}

/// A port type operation joined with its binding details.
#[derive(Debug, Clone)]
pub struct Operation {
    pub operation: wsdl::Operation,
    pub action: Option<String>,
}
