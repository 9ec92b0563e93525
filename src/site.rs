//! The site build, as seen from the configuration layer.

use crate::config::FrozenConfig;
use anyhow::Result;
use tracing::info;

/// Renders a site from a resolved configuration.
pub trait SiteBuilder: Send + Sync {
    fn build(&self, config: &FrozenConfig) -> Result<()>;
}

/// Builder used until a rendering pipeline is plugged in: reports what it
/// would build and where the output would go.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBuilder;

impl SiteBuilder for LoggingBuilder {
    fn build(&self, config: &FrozenConfig) -> Result<()> {
        let content = config.site_path("contentDir")?;
        let publish = if config.get_bool("renderToMemory").unwrap_or(false) {
            "memory".to_string()
        } else {
            config.site_path("publishDir")?.display().to_string()
        };
        info!(
            "Building site from {} into {} ({} config file(s))",
            content.display(),
            publish,
            config.config_files().len()
        );
        Ok(())
    }
}
