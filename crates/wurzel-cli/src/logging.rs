use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Instala el subscriber de logs en stderr. `RUST_LOG` gana sobre `level`.
/// Los registros del facade `log` se reenvían al subscriber.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // un segundo init (tests) no es un error
    let _ = tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr))
                                          .with(filter)
                                          .try_init();
}
