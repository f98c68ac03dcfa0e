//! Swagger 2.0 document model.
//!
//! Only the parts a SOAP service description needs. Every map is an
//! [`IndexMap`] so documents serialize in insertion order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Document root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub swagger: String,

    pub info: Info,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(rename = "basePath", default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,

    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, Schema>,

    #[serde(
        rename = "x-ibm-configuration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub configuration: Option<Configuration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub version: String,

    #[serde(rename = "x-ibm-name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// SOAP endpoints are only ever reached with POST.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "x-ibm-soap", default, skip_serializing_if = "Option::is_none")]
    pub soap: Option<SoapOperation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    pub responses: IndexMap<String, Response>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoapOperation {
    #[serde(rename = "soap-action", default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Qualified operation name in `{namespace}local` form.
    #[serde(rename = "soap-operation")]
    pub operation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<String>,

    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml: Option<Xml>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Xml {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub attribute: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(rename = "wsdl-definition")]
    pub wsdl_definition: WsdlDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsdlDefinition {
    pub wsdl: String,
    pub service: String,
    pub port: String,

    #[serde(rename = "soap-version")]
    pub soap_version: String,
}

impl Document {
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

impl Schema {
    pub fn reference_to(name: &str) -> Self {
        Self {
            reference: Some(format!("#/definitions/{}", name)),
            ..Default::default()
        }
    }

    pub fn primitive(ty: &str, format: Option<&str>) -> Self {
        Self {
            ty: Some(ty.to_owned()),
            format: format.map(ToOwned::to_owned),
            ..Default::default()
        }
    }

    pub fn object(properties: IndexMap<String, Schema>, required: Vec<String>) -> Self {
        Self {
            ty: Some("object".to_owned()),
            properties,
            required,
            ..Default::default()
        }
    }

    pub fn array(items: Schema) -> Self {
        Self {
            ty: Some("array".to_owned()),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    pub fn with_xml(mut self, xml: Xml) -> Self {
        self.xml = Some(xml);
        self
    }
}

impl Xml {
    pub fn namespaced(namespace: &str) -> Self {
        Self {
            namespace: Some(namespace.to_owned()).filter(|namespace| !namespace.is_empty()),
            ..Default::default()
        }
    }
}
