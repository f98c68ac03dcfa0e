use std::path::PathBuf;

pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory receiving one `<service>.yaml` per converted service.
    pub output_dir: PathBuf,

    /// Services to convert. Empty means every service in the catalog.
    pub services: Vec<String>,

    /// Upper bound on conversions in flight.
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            services: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}
