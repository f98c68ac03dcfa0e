use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::{stream, StreamExt};
use tokio::task;
use tracing::{debug, error, info, warn};
use wsdl2swagger_wsdl::{Catalog, ServiceDescriptor};

use super::{
    config::Config,
    error::{Error, ServiceError},
    generator::Generator,
    loader::Loader,
    writer::DocumentWriter,
};

/// Result of converting one service.
#[derive(Debug)]
pub struct ServiceOutcome {
    pub service: String,

    /// WSDL the service was discovered in. Empty when it was requested but never found.
    pub filename: String,

    pub result: Result<PathBuf, ServiceError>,
}

/// Every outcome of a run, ordered by service name.
#[derive(Debug, Default)]
pub struct ConversionReport {
    outcomes: Vec<ServiceOutcome>,
}

impl ServiceOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

impl ConversionReport {
    pub fn outcomes(&self) -> &[ServiceOutcome] {
        &self.outcomes
    }

    pub fn failures(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_deref().ok())
    }

    /// True when no service failed. A run over zero services is a success.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Splits sorted descriptors into runs sharing a service name.
fn group_by_service(descriptors: Vec<ServiceDescriptor>) -> Vec<Vec<ServiceDescriptor>> {
    let mut groups: Vec<Vec<ServiceDescriptor>> = Vec::new();

    for descriptor in descriptors {
        match groups.last_mut() {
            Some(group) if group[0].service == descriptor.service => group.push(descriptor),
            _ => groups.push(vec![descriptor]),
        }
    }

    groups
}

/// Loads a catalog once, then converts and writes each of its services independently.
pub struct Orchestrator<L, G> {
    loader: Arc<L>,
    generator: G,
    writer: DocumentWriter,
    config: Config,
}

impl<L, G> Orchestrator<L, G>
where
    L: Loader + Send + Sync + 'static,
    G: Generator,
{
    pub fn new(loader: L, generator: G, config: Config) -> Self {
        Self {
            loader: Arc::new(loader),
            generator,
            writer: DocumentWriter::new(&config.output_dir),
            config,
        }
    }

    pub async fn run(&self, sources: &[String]) -> Result<ConversionReport, Error> {
        let output_dir = self.writer.output_dir();
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| Error::OutputDir {
                path: output_dir.to_owned(),
                source,
            })?;

        let catalog = self.load(sources).await?;
        let descriptors = self.descriptors(&catalog);

        info!(
            entries = catalog.entries().len(),
            services = descriptors.len(),
            "loaded catalog"
        );

        let groups: Vec<Vec<_>> = stream::iter(group_by_service(descriptors))
            .map(|group| self.convert_group(&catalog, group))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut outcomes: Vec<_> = groups.into_iter().flatten().collect();

        outcomes.sort_by(|a, b| (&a.service, &a.filename).cmp(&(&b.service, &b.filename)));
        Ok(ConversionReport { outcomes })
    }

    async fn load(&self, sources: &[String]) -> Result<Catalog, Error> {
        let loader = Arc::clone(&self.loader);
        let sources = sources.to_vec();

        debug!(?sources, "loading WSDL");
        let catalog = task::spawn_blocking(move || loader.load(&sources)).await??;
        Ok(catalog)
    }

    fn descriptors(&self, catalog: &Catalog) -> Vec<ServiceDescriptor> {
        let mut descriptors = if self.config.services.is_empty() {
            catalog.services()
        } else {
            self.config
                .services
                .iter()
                .map(|service| ServiceDescriptor {
                    service: service.clone(),
                    filename: catalog
                        .find_wsdl_for_service(service)
                        .map(|entry| entry.filename.clone())
                        .unwrap_or_default(),
                })
                .collect()
        };

        descriptors.sort();
        descriptors.dedup();
        descriptors
    }

    /// Descriptors sharing a name write the same file, so they run one after another
    /// in filename order and the last one wins.
    async fn convert_group(
        &self,
        catalog: &Catalog,
        group: Vec<ServiceDescriptor>,
    ) -> Vec<ServiceOutcome> {
        let mut outcomes = Vec::with_capacity(group.len());

        for descriptor in group {
            outcomes.push(self.convert(catalog, descriptor).await);
        }

        outcomes
    }

    async fn convert(&self, catalog: &Catalog, descriptor: ServiceDescriptor) -> ServiceOutcome {
        let result = self.try_convert(catalog, &descriptor).await;

        match &result {
            Ok(path) => info!(
                service = %descriptor.service,
                path = %path.display(),
                "converted service"
            ),

            Err(err @ ServiceError::Resolution { .. }) => warn!(%err, "skipping service"),

            Err(err) => error!(service = %descriptor.service, %err, "conversion failed"),
        }

        ServiceOutcome {
            service: descriptor.service,
            filename: descriptor.filename,
            result,
        }
    }

    async fn try_convert(
        &self,
        catalog: &Catalog,
        descriptor: &ServiceDescriptor,
    ) -> Result<PathBuf, ServiceError> {
        let service = descriptor.service.as_str();
        let entry = catalog
            .find_entry(descriptor)
            .ok_or_else(|| ServiceError::Resolution {
                service: service.to_owned(),
            })?;

        let document = self.generator
            .generate(entry, service, &descriptor.filename)?;
        self.writer.write(service, &document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generator::MockGenerator, loader::MockLoader};
    use std::fs;
    use wsdl2swagger_swagger::{
        self as swagger,
        document::{Info, PathItem},
        Document,
    };
    use wsdl2swagger_wsdl::{self as wsdl, WsdlEntry};

    fn entry(filename: &str, services: &[&str]) -> WsdlEntry {
        let services: String = services
            .iter()
            .map(|service| format!(r#"<service name="{}"/>"#, service))
            .collect();

        let xml = format!(
            r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/" targetNamespace="urn:test">{}</definitions>"#,
            services
        );

        wsdl::parse_str(&xml, filename).unwrap()
    }

    fn document(service: &str) -> Document {
        let mut document = Document {
            swagger: "2.0".to_owned(),
            info: Info {
                title: service.to_owned(),
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
        };

        document
            .paths
            .insert(format!("/{}", service), PathItem::default());
        document
    }

    fn loader(entries: Vec<WsdlEntry>) -> MockLoader {
        let catalog = Catalog::new(entries);
        let mut loader = MockLoader::new();
        loader
            .expect_load()
            .times(1)
            .returning(move |_| Ok(catalog.clone()));
        loader
    }

    fn generator() -> MockGenerator {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .returning(|_, service, _| Ok(document(service)));
        generator
    }

    fn config(dir: &Path) -> Config {
        Config {
            output_dir: dir.join("out"),
            ..Default::default()
        }
    }

    fn sources() -> Vec<String> {
        vec!["test.wsdl".to_owned()]
    }

    fn yaml_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn writes_one_file_per_service() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            loader(vec![entry("bank.wsdl", &["Deposit", "Withdraw", "Balance"])]),
            generator(),
            config(dir.path()),
        );

        let report = orchestrator.run(&sources()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.written().count(), 3);
        assert_eq!(
            yaml_files(&dir.path().join("out")),
            ["Balance.yaml", "Deposit.yaml", "Withdraw.yaml"]
        );
    }

    #[tokio::test]
    async fn zero_services_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = MockGenerator::new();
        generator.expect_generate().never();

        let orchestrator =
            Orchestrator::new(loader(vec![entry("empty.wsdl", &[])]), generator, config(dir.path()));

        let report = orchestrator.run(&sources()).await.unwrap();

        assert!(report.is_success());
        assert!(report.outcomes().is_empty());
        assert!(yaml_files(&dir.path().join("out")).is_empty());
    }

    #[tokio::test]
    async fn generation_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .times(3)
            .returning(|_, service, _| match service {
                "Second" => Err(swagger::error::Error::NoSoapPort(service.to_owned())),
                _ => Ok(document(service)),
            });

        let orchestrator = Orchestrator::new(
            loader(vec![entry("three.wsdl", &["First", "Second", "Third"])]),
            generator,
            config(dir.path()),
        );

        let report = orchestrator.run(&sources()).await.unwrap();

        assert!(!report.is_success());
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].service, "Second");
        assert!(matches!(
            failures[0].result,
            Err(ServiceError::Generation(swagger::error::Error::NoSoapPort(_)))
        ));

        assert_eq!(
            yaml_files(&dir.path().join("out")),
            ["First.yaml", "Third.yaml"]
        );
    }

    #[tokio::test]
    async fn written_yaml_is_the_generated_document() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            loader(vec![entry("bank.wsdl", &["Deposit"])]),
            generator(),
            config(dir.path()),
        );

        orchestrator.run(&sources()).await.unwrap();

        let yaml = fs::read_to_string(dir.path().join("out/Deposit.yaml")).unwrap();
        assert_eq!(Document::from_yaml(&yaml).unwrap(), document("Deposit"));
    }

    #[tokio::test]
    async fn reruns_produce_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/Deposit.yaml");
        let mut outputs = Vec::new();

        for _ in 0..2 {
            let orchestrator = Orchestrator::new(
                loader(vec![entry("bank.wsdl", &["Deposit", "Withdraw"])]),
                generator(),
                config(dir.path()),
            );

            orchestrator.run(&sources()).await.unwrap();
            outputs.push(fs::read(&path).unwrap());
        }

        assert_eq!(outputs[0], outputs[1]);
    }

    #[tokio::test]
    async fn generator_receives_originating_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .withf(|entry, service, wsdl_id| {
                entry.filename == "withdraw.wsdl"
                    && service == "Withdraw"
                    && wsdl_id == "withdraw.wsdl"
            })
            .times(1)
            .returning(|_, service, _| Ok(document(service)));
        generator
            .expect_generate()
            .withf(|_, service, wsdl_id| service == "Deposit" && wsdl_id == "deposit.wsdl")
            .times(1)
            .returning(|_, service, _| Ok(document(service)));

        let orchestrator = Orchestrator::new(
            loader(vec![
                entry("deposit.wsdl", &["Deposit"]),
                entry("withdraw.wsdl", &["Withdraw"]),
            ]),
            generator,
            config(dir.path()),
        );

        let report = orchestrator.run(&sources()).await.unwrap();

        let filenames: Vec<_> = report
            .outcomes()
            .iter()
            .map(|outcome| outcome.filename.as_str())
            .collect();
        assert_eq!(filenames, ["deposit.wsdl", "withdraw.wsdl"]);
    }

    #[tokio::test]
    async fn outcomes_are_sorted_by_service() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            loader(vec![entry("bank.wsdl", &["Zeta", "Alpha", "Mu"])]),
            generator(),
            config(dir.path()),
        );

        let report = orchestrator.run(&sources()).await.unwrap();

        let services: Vec<_> = report
            .outcomes()
            .iter()
            .map(|outcome| outcome.service.as_str())
            .collect();
        assert_eq!(services, ["Alpha", "Mu", "Zeta"]);
    }

    #[tokio::test]
    async fn unknown_requested_service_fails_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            loader(vec![entry("bank.wsdl", &["Deposit", "Withdraw"])]),
            generator(),
            Config {
                services: vec!["Deposit".to_owned(), "Loan".to_owned()],
                ..config(dir.path())
            },
        );

        let report = orchestrator.run(&sources()).await.unwrap();

        assert_eq!(report.outcomes().len(), 2);
        let loan = &report.outcomes()[1];
        assert_eq!(loan.service, "Loan");
        assert!(loan.filename.is_empty());
        assert!(matches!(
            &loan.result,
            Err(ServiceError::Resolution { service }) if service == "Loan"
        ));

        assert_eq!(yaml_files(&dir.path().join("out")), ["Deposit.yaml"]);
    }

    #[tokio::test]
    async fn write_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("out/Withdraw.yaml")).unwrap();

        let orchestrator = Orchestrator::new(
            loader(vec![entry("bank.wsdl", &["Deposit", "Withdraw"])]),
            generator(),
            config(dir.path()),
        );

        let report = orchestrator.run(&sources()).await.unwrap();

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].service, "Withdraw");
        assert!(matches!(failures[0].result, Err(ServiceError::Write { .. })));
        assert!(dir.path().join("out/Deposit.yaml").is_file());
    }

    #[tokio::test]
    async fn unsafe_service_name_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            loader(vec![entry("bank.wsdl", &["../escaped", "Deposit"])]),
            generator(),
            config(dir.path()),
        );

        let report = orchestrator.run(&sources()).await.unwrap();

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            &failures[0].result,
            Err(ServiceError::InvalidName { service }) if service == "../escaped"
        ));

        assert!(!dir.path().join("escaped.yaml").exists());
        assert_eq!(yaml_files(&dir.path().join("out")), ["Deposit.yaml"]);
    }

    #[tokio::test]
    async fn duplicate_services_convert_from_their_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .withf(|entry, _, wsdl_id| entry.filename == wsdl_id)
            .times(2)
            .returning(|_, service, wsdl_id| {
                let mut document = document(service);
                document.info.description = Some(wsdl_id.to_owned());
                Ok(document)
            });

        let orchestrator = Orchestrator::new(
            loader(vec![entry("b.wsdl", &["Dup"]), entry("a.wsdl", &["Dup"])]),
            generator,
            Config {
                concurrency: 4,
                ..config(dir.path())
            },
        );

        let report = orchestrator.run(&sources()).await.unwrap();

        let filenames: Vec<_> = report
            .outcomes()
            .iter()
            .map(|outcome| outcome.filename.as_str())
            .collect();
        assert_eq!(filenames, ["a.wsdl", "b.wsdl"]);

        let yaml = fs::read_to_string(dir.path().join("out/Dup.yaml")).unwrap();
        let written = Document::from_yaml(&yaml).unwrap();
        assert_eq!(written.info.description.as_deref(), Some("b.wsdl"));
    }

    #[test]
    fn descriptors_are_grouped_by_service() {
        let descriptor = |service: &str, filename: &str| ServiceDescriptor {
            service: service.to_owned(),
            filename: filename.to_owned(),
        };

        let groups = group_by_service(vec![
            descriptor("A", "a.wsdl"),
            descriptor("B", "a.wsdl"),
            descriptor("B", "b.wsdl"),
            descriptor("C", "b.wsdl"),
        ]);

        let sizes: Vec<_> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, [1, 2, 1]);
    }

    #[tokio::test]
    async fn load_failure_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = MockLoader::new();
        loader
            .expect_load()
            .times(1)
            .returning(|_| Err(wsdl::error::Error::NotWsdl("bank.wsdl".to_owned())));

        let mut generator = MockGenerator::new();
        generator.expect_generate().never();

        let orchestrator = Orchestrator::new(loader, generator, config(dir.path()));
        let result = orchestrator.run(&sources()).await;

        assert!(matches!(
            result,
            Err(Error::Load(wsdl::error::Error::NotWsdl(_)))
        ));
        assert!(yaml_files(&dir.path().join("out")).is_empty());
    }

    #[tokio::test]
    async fn concurrency_of_one_still_converts_everything() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            loader(vec![entry("bank.wsdl", &["Deposit", "Withdraw"])]),
            generator(),
            Config {
                concurrency: 1,
                ..config(dir.path())
            },
        );

        let report = orchestrator.run(&sources()).await.unwrap();
        assert_eq!(report.written().count(), 2);
    }
}
