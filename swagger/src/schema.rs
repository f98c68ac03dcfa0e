use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::warn;
use wsdl2swagger_wsdl::types::{self as wsdl, NamespacedName, Namespaces, XSD_NAMESPACE};

use super::document::{Schema, Xml};

pub trait ToSchema {
    fn to_schema(&self, context: &Context<'_>) -> Schema;
}

fn get_primitive(ty: &str) -> (&'static str, Option<&'static str>) {
    match ty {
        "int" | "short" | "byte" | "unsignedShort" | "unsignedByte" => ("integer", Some("int32")),
        "long" | "unsignedInt" | "unsignedLong" => ("integer", Some("int64")),
        "integer" | "positiveInteger" | "negativeInteger" | "nonPositiveInteger"
        | "nonNegativeInteger" => ("integer", None),
        "decimal" => ("number", None),
        "float" => ("number", Some("float")),
        "double" => ("number", Some("double")),
        "boolean" => ("boolean", None),
        "dateTime" => ("string", Some("date-time")),
        "date" => ("string", Some("date")),
        "base64Binary" => ("string", Some("byte")),
        "anyType" => ("object", None),
        _ => ("string", None),
    }
}

/// Hands out unique keys for the `definitions` section.
#[derive(Debug, Default)]
pub struct DefinitionNames {
    taken: HashSet<String>,
}

impl DefinitionNames {
    pub fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_owned()) {
            return base.to_owned();
        }

        (2..)
            .map(|suffix| format!("{}_{}", base, suffix))
            .find(|candidate| self.taken.insert(candidate.clone()))
            .unwrap_or_else(|| base.to_owned())
    }
}

pub struct Context<'a> {
    namespaces: &'a Namespaces,
    elements: HashMap<&'a NamespacedName, String>,
    types: HashMap<&'a NamespacedName, String>,
}

impl<'a> Context<'a> {
    pub fn new(
        definition: &'a wsdl::Definition,
        namespaces: &'a Namespaces,
        names: &mut DefinitionNames,
    ) -> Self {
        let elements = definition
            .elements
            .iter()
            .map(|element| (&element.name, names.claim(&element.name.name)))
            .collect();

        let types = definition
            .types
            .iter()
            .map(|ty| (&ty.name, names.claim(&ty.name.name)))
            .collect();

        Self {
            namespaces,
            elements,
            types,
        }
    }

    pub fn namespaces(&self) -> &'a Namespaces {
        self.namespaces
    }

    pub fn element_name(&self, name: &NamespacedName) -> Option<&str> {
        self.elements.get(name).map(String::as_str)
    }

    pub fn type_name(&self, name: &NamespacedName) -> Option<&str> {
        self.types.get(name).map(String::as_str)
    }

    pub fn type_schema(&self, name: &NamespacedName) -> Schema {
        if name.is_in(self.namespaces, XSD_NAMESPACE) {
            let (ty, format) = get_primitive(&name.name);
            return Schema::primitive(ty, format);
        }

        match self.type_name(name) {
            Some(definition) => Schema::reference_to(definition),
            None => {
                warn!(
                    ty = %name.name,
                    namespace = %name.namespace(self.namespaces),
                    "unresolved type reference"
                );
                Schema::primitive("object", None)
            }
        }
    }

    pub fn element_schema(&self, name: &NamespacedName) -> Schema {
        match self.element_name(name) {
            Some(definition) => Schema::reference_to(definition),
            None => {
                warn!(
                    element = %name.name,
                    namespace = %name.namespace(self.namespaces),
                    "unresolved element reference"
                );
                Schema::primitive("object", None)
            }
        }
    }
}

fn object_of(fields: &[wsdl::Field], context: &Context<'_>) -> Schema {
    let required = fields
        .iter()
        .filter(|field| !field.occurs.is_optional())
        .map(|field| field.name.name.clone())
        .collect();

    let properties: IndexMap<_, _> = fields
        .iter()
        .map(|field| (field.name.name.clone(), field.to_schema(context)))
        .collect();

    Schema::object(properties, required)
}

impl ToSchema for wsdl::TypeKind {
    fn to_schema(&self, context: &Context<'_>) -> Schema {
        match self {
            wsdl::TypeKind::Struct(fields) => object_of(fields, context),

            wsdl::TypeKind::Extension { base, fields } => Schema {
                all_of: vec![context.type_schema(base), object_of(fields, context)],
                ..Default::default()
            },

            wsdl::TypeKind::Alias(ty) => context.type_schema(ty),

            wsdl::TypeKind::Simple { base, enumeration } => {
                let mut schema = context.type_schema(base);

                if schema.reference.is_none() {
                    schema.enumeration = enumeration.clone();
                }

                schema
            }
        }
    }
}

impl ToSchema for wsdl::Field {
    fn to_schema(&self, context: &Context<'_>) -> Schema {
        let schema = match &self.ty {
            wsdl::FieldKind::Type(ty) => context.type_schema(ty),
            wsdl::FieldKind::Ref(element) => context.element_schema(element),
            wsdl::FieldKind::Inner(kind) => kind.to_schema(context),
        };

        if self.attribute {
            schema.with_xml(Xml {
                attribute: true,
                ..Default::default()
            })
        } else if self.occurs.is_repeated() {
            Schema::array(schema)
        } else {
            schema
        }
    }
}

impl ToSchema for wsdl::Type {
    fn to_schema(&self, context: &Context<'_>) -> Schema {
        self.kind.to_schema(context)
    }
}

/// Schema for a global element, carrying its qualified XML name.
pub fn element_definition(element: &wsdl::Type, context: &Context<'_>) -> Schema {
    let namespace = element.name.namespace(context.namespaces());

    element.to_schema(context).with_xml(Xml {
        name: Some(element.name.name.clone()),
        ..Xml::namespaced(namespace)
    })
}
