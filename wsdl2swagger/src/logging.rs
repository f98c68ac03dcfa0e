//! Tracing subscriber setup for the binary. The library crates only emit events.
//!
//! No flag logs warnings, `-v` info, `-vv` debug, `-vvv` trace and `--quiet`
//! errors only. `RUST_LOG` overrides all of them.

use tracing_subscriber::{
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

pub fn init(verbose: u8, quiet: bool) -> Result<(), TryInitError> {
    let level = derive_level(verbose, quiet);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "wsdl2swagger={level},wsdl2swagger_wsdl={level},wsdl2swagger_swagger={level}",
            level = level
        ))
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
}

fn derive_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }

    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
