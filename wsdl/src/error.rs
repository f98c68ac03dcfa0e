use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to open file: {0}")]
    FileOpenError(quick_xml::Error),

    #[error("Unable to get file from server")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Error parsing XML input: {0}")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Element <{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Undeclared namespace prefix `{0}`")]
    UnknownPrefix(String),

    #[error("{0} is not a WSDL document")]
    NotWsdl(String),
}
