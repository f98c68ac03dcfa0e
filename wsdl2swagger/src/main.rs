use std::{fmt, path::PathBuf};

use structopt::StructOpt;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing_subscriber::util::TryInitError;

use wsdl2swagger::{
    error, generator::SwaggerGenerator, loader::WsdlLoader, Config, Orchestrator,
};

mod logging;

#[derive(Error)]
enum Error {
    #[error(transparent)]
    Conversion(#[from] error::Error),

    #[error("Unable to start runtime: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unable to initialise logging: {0}")]
    Logging(#[from] TryInitError),

    #[error("{failed} of {total} services failed to convert")]
    Incomplete { failed: usize, total: usize },
}

// `main` reports its error through `Debug`.
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

fn parse_concurrency(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("concurrency must be at least 1".to_owned()),
        Ok(n) => Ok(n),
        Err(err) => Err(err.to_string()),
    }
}

/// Converts WSDL service descriptions into Swagger 2.0 YAML, one file per service
#[derive(StructOpt)]
struct Args {
    /// Directory receiving the `<service>.yaml` files
    #[structopt(short, long, default_value = ".", parse(from_os_str))]
    output_dir: PathBuf,

    /// Only convert the named service (repeatable)
    #[structopt(short, long = "service", number_of_values = 1)]
    services: Vec<String>,

    /// Maximum number of services converted at once
    #[structopt(short = "j", long, default_value = "8", parse(try_from_str = parse_concurrency))]
    concurrency: usize,

    /// Log more (-v, -vv, -vvv)
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    /// Only log errors
    #[structopt(short, long)]
    quiet: bool,

    /// WSDL files or URLs
    #[structopt(required = true)]
    inputs: Vec<String>,
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    logging::init(args.verbose, args.quiet)?;

    let config = Config {
        output_dir: args.output_dir,
        services: args.services,
        concurrency: args.concurrency,
    };

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    let orchestrator = Orchestrator::new(WsdlLoader, SwaggerGenerator, config);
    let report = runtime.block_on(orchestrator.run(&args.inputs))?;

    for outcome in report.outcomes() {
        match &outcome.result {
            Ok(path) => println!("{}: wrote {}", outcome.service, path.display()),
            Err(err) => println!("{}: failed: {}", outcome.service, err),
        }
    }

    match report.failures().count() {
        0 => Ok(()),
        failed => Err(Error::Incomplete {
            failed,
            total: report.outcomes().len(),
        }),
    }
}
