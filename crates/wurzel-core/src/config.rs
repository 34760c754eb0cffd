//! Carga del fichero `.env`.

use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<bool> = Lazy::new(|| match dotenvy::dotenv() {
    Ok(path) => {
        log::debug!("loaded environment from {}", path.display());
        true
    }
    Err(_) => false, // sin .env no es un error
});

/// Fuerza la carga de `.env` (idempotente). Devuelve si se encontró uno.
pub fn init_dotenv() -> bool {
    *Lazy::force(&DOTENV_LOADED)
}
