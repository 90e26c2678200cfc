//! Subcommand implementations

pub mod demo;
pub mod info;
pub mod render;

use anyhow::{Context, Result};
use swraster_core::{Exporter, RasterConfig, Surface};
use swraster_export::{PngExporter, PnmExporter};

use crate::cli::{OutputArgs, OutputFormat};

/// Encode `surface` the way `output` asks and write it to disk.
pub fn write_output(surface: &Surface<'_>, output: &OutputArgs) -> Result<()> {
    let format = output.resolved_format();
    let data = match format {
        OutputFormat::Ppm | OutputFormat::Pgm => {
            let exporter = if format == OutputFormat::Ppm { PnmExporter::ppm() } else { PnmExporter::pgm() };
            let comment = output.path.display().to_string();
            exporter
                .alpha_only(output.alpha_only)
                .export_surface(surface, Some(&comment))?
        }
        OutputFormat::Png => {
            if output.alpha_only {
                log::warn!("--alpha-only only applies to PPM and PGM output");
            }
            PngExporter::new().export(surface)?
        }
    };

    std::fs::write(&output.path, &data)
        .with_context(|| format!("Failed to write {}", output.path.display()))?;
    log::info!(
        "Wrote {}x{} {:?} image to {} ({} bytes)",
        surface.width(),
        surface.height(),
        format,
        output.path.display(),
        data.len()
    );
    Ok(())
}

/// Settings from `SWRASTER_*` variables, overridden by command-line flags.
pub fn resolve_config(raster: &crate::cli::RasterArgs) -> RasterConfig {
    let config = raster.apply(RasterConfig::from_env());
    log::debug!("Raster config: {:?}", config);
    config
}
