//! CLI argument definitions using Clap v4

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use swraster_core::{CompressionMode, RasterConfig, SampleFilter};

/// swraster - software rasterizer from the command line
#[derive(Parser, Debug)]
#[command(name = "swraster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log debug output (RUST_LOG still applies)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draw a JSON scene description to an image file
    #[command(alias = "r")]
    Render(RenderArgs),

    /// Draw a built-in scene that exercises every drawing operation
    Demo(DemoArgs),

    /// Show pixel formats, output formats and the active configuration
    #[command(alias = "i")]
    Info,
}

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Scene file (JSON)
    pub scene: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub raster: RasterArgs,
}

/// Arguments for the demo command
#[derive(Args, Debug)]
pub struct DemoArgs {
    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub raster: RasterArgs,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output file
    #[arg(short = 'o', long = "output")]
    pub path: PathBuf,

    /// Output format; guessed from the file extension when omitted
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Write each pixel's alpha instead of its color (PPM/PGM only)
    #[arg(long = "alpha-only")]
    pub alpha_only: bool,
}

impl OutputArgs {
    pub fn resolved_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.path).unwrap_or(OutputFormat::Ppm))
    }
}

/// Overrides for settings otherwise read from `SWRASTER_*` variables
#[derive(Args, Debug, Default)]
pub struct RasterArgs {
    /// Image compression: off or rle
    #[arg(long = "compression")]
    pub compression: Option<CompressionMode>,

    /// Resampling filter for transformed images: nearest or bilinear
    #[arg(long = "filter")]
    pub filter: Option<SampleFilter>,

    /// Directory for PPM dumps of intermediate surfaces
    #[arg(long = "dump-dir")]
    pub dump_dir: Option<PathBuf>,
}

impl RasterArgs {
    /// `base` with every flag that was given applied on top.
    pub fn apply(&self, mut base: RasterConfig) -> RasterConfig {
        if let Some(mode) = self.compression {
            base.compression = mode;
        }
        if let Some(filter) = self.filter {
            base.transform_filter = filter;
        }
        if let Some(dir) = &self.dump_dir {
            base.dump_dir = Some(dir.clone());
        }
        base
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain-text color pixmap
    Ppm,
    /// Plain-text graymap
    Pgm,
    /// RGBA PNG, straight alpha
    Png,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ppm" => Some(OutputFormat::Ppm),
            "pgm" => Some(OutputFormat::Pgm),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a/b.PNG")), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_path(Path::new("out.pgm")), Some(OutputFormat::Pgm));
        assert_eq!(OutputFormat::from_path(Path::new("out")), None);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "swraster", "demo", "-o", "x.out", "--filter", "nearest", "--compression", "rle",
        ])
        .unwrap();
        let Commands::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.output.resolved_format(), OutputFormat::Ppm);

        let config = args.raster.apply(RasterConfig::default());
        assert_eq!(config.transform_filter, SampleFilter::Nearest);
        assert_eq!(config.compression, CompressionMode::Rle);
        assert_eq!(config.dump_dir, None);
    }

    #[test]
    fn test_bad_filter_is_rejected() {
        assert!(Cli::try_parse_from(["swraster", "demo", "-o", "x.ppm", "--filter", "cubic"]).is_err());
    }
}
