use std::path::{Component, Path, PathBuf};

use tracing::debug;
use wsdl2swagger_swagger::Document;

use super::error::ServiceError;

fn is_plain_file_name(name: &str) -> bool {
    if name.contains(|c: char| c == '/' || c == '\\') {
        return false;
    }

    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(component)), None) if component == name
    )
}

/// Writes documents as `<service>.yaml` into a fixed directory, replacing existing files.
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    output_dir: PathBuf,
}

impl DocumentWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Output path for `service`. Names that are not a single plain path component
    /// would land outside the output directory and are rejected.
    pub fn path_for(&self, service: &str) -> Result<PathBuf, ServiceError> {
        if !is_plain_file_name(service) {
            return Err(ServiceError::InvalidName {
                service: service.to_owned(),
            });
        }

        Ok(self.output_dir.join(format!("{}.yaml", service)))
    }

    pub async fn write(&self, service: &str, document: &Document) -> Result<PathBuf, ServiceError> {
        let path = self.path_for(service)?;
        let yaml = document.to_yaml()?;

        match tokio::fs::write(&path, yaml).await {
            Ok(()) => {
                debug!(path = %path.display(), "wrote swagger document");
                Ok(path)
            }

            Err(source) => Err(ServiceError::Write { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsdl2swagger_swagger::document::Info;

    fn document() -> Document {
        Document {
            swagger: "2.0".to_owned(),
            info: Info {
                title: "Bank".to_owned(),
                description: None,
                version: "1.0.0".to_owned(),
                name: None,
            },
            host: None,
            base_path: None,
            schemes: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
            paths: Default::default(),
            definitions: Default::default(),
            configuration: None,
        }
    }

    #[tokio::test]
    async fn writes_named_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DocumentWriter::new(dir.path());

        let path = writer.write("Bank", &document()).await.unwrap();

        assert_eq!(path, dir.path().join("Bank.yaml"));
        let yaml = std::fs::read_to_string(&path).unwrap();
        assert_eq!(Document::from_yaml(&yaml).unwrap(), document());
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Bank.yaml"), "stale").unwrap();

        let path = DocumentWriter::new(dir.path())
            .write("Bank", &document())
            .await
            .unwrap();

        assert!(std::fs::read_to_string(path)
            .unwrap()
            .starts_with("swagger:"));
    }

    #[tokio::test]
    async fn missing_directory_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DocumentWriter::new(dir.path().join("missing"));

        let result = writer.write("Bank", &document()).await;

        assert!(matches!(
            result,
            Err(ServiceError::Write { path, .. }) if path.ends_with("missing/Bank.yaml")
        ));
    }

    #[test]
    fn plain_names_are_accepted() {
        let writer = DocumentWriter::new("out");

        assert_eq!(
            writer.path_for("Bank.v2").unwrap(),
            Path::new("out").join("Bank.v2.yaml")
        );
    }

    #[tokio::test]
    async fn names_leaving_the_directory_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("out");
        std::fs::create_dir(&output_dir).unwrap();
        let writer = DocumentWriter::new(&output_dir);

        for name in ["../escaped", "/tmp/escaped", "nested/escaped", "..", ".", "", "a\\b"] {
            let result = writer.write(name, &document()).await;

            assert!(
                matches!(&result, Err(ServiceError::InvalidName { service }) if service == name),
                "{:?} was accepted: {:?}",
                name,
                result
            );
        }

        assert!(!dir.path().join("escaped.yaml").exists());
        assert_eq!(std::fs::read_dir(&output_dir).unwrap().count(), 0);
    }
}
