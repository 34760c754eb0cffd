//! Contratos comunes entre steps de ingesta.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use wurzel_core::data_model;

// Patrones del front-matter.
static RE_HEADER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"---\s*([\s\S]*?)\s*---").ok());
static RE_TOPIC: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"topics:\s*(.*)").ok());
static RE_URL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"url:\s*(.*)").ok());
static RE_BODY: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"---[\s\S]*?---\s*([\s\S]*)").ok());

data_model!(
    /// Documento markdown con su origen y palabras clave.
    MarkdownDataContract { md: String, keywords: String, url: String }
);

/// Primer grupo de `re` en `text`.
fn first_group<'t>(re: &Lazy<Option<Regex>>, text: &'t str) -> Option<&'t str> {
    re.as_ref()?.captures(text)?.get(1).map(|m| m.as_str())
}

impl MarkdownDataContract {
    /// Construye el contrato a partir del texto de un `.md`.
    ///
    /// El front-matter (`--- ... ---`) puede declarar `url:` y `topics:`;
    /// sin ellos la url es `fallback_url` y las palabras clave
    /// `fallback_keywords`. El cuerpo es lo que sigue al front-matter.
    pub fn parse(text: &str, fallback_url: &str, fallback_keywords: &str) -> Self {
        let header = RE_HEADER.as_ref().and_then(|re| re.find(text)).map(|m| m.as_str()).unwrap_or("");
        Self { md: first_group(&RE_BODY, text).unwrap_or(text).to_string(),
               url: first_group(&RE_URL, header).unwrap_or(fallback_url).to_string(),
               keywords: first_group(&RE_TOPIC, header).unwrap_or(fallback_keywords).to_string() }
    }

    /// Lee un fichero markdown. La url por defecto es `url_prefix` seguido
    /// de la ruta absoluta; las palabras clave, el nombre sin extensión.
    pub fn from_file(path: &Path, url_prefix: &str) -> std::io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let stem = path.file_name()
                       .and_then(|n| n.to_str())
                       .and_then(|n| n.split('.').next())
                       .unwrap_or_default();
        Ok(Self::parse(&text, &format!("{url_prefix}{}", absolute.display()), stem))
    }
}
