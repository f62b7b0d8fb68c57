use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn init_logger(verbose: bool) {
    // RUST_LOG wins over the -v flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("op_params=debug,op_params_demo=debug")
        } else {
            EnvFilter::new("op_params=info,op_params_demo=info")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
