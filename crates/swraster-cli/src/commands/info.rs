//! Info command implementation
//!
//! Displays pixel formats, output formats and the configuration in effect.

use anyhow::Result;
use swraster_core::{Exporter, PixelFormat, PixelFormatType, RasterConfig};
use swraster_export::{PngExporter, PnmExporter};

pub fn run() -> Result<()> {
    println!("swraster v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print_pixel_formats();
    println!();
    print_output_formats();
    println!();
    print_config(&RasterConfig::from_env());
    Ok(())
}

fn print_pixel_formats() {
    println!("Pixel formats:");
    println!("  {:<6} {:>3}  {:<10} {:<10} {:<10} {:<10} shifts (r g b a)", "name", "bpp", "r_mask", "g_mask", "b_mask", "a_mask");
    for ft in PixelFormatType::ALL {
        let pf = PixelFormat::new(ft);
        println!(
            "  {:<6} {:>3}  {:#010x} {:#010x} {:#010x} {:#010x} {:>2} {:>2} {:>2} {:>2}",
            ft.name(),
            pf.bpp(),
            pf.r_mask,
            pf.g_mask,
            pf.b_mask,
            pf.a_mask,
            pf.r_shift,
            pf.g_shift,
            pf.b_shift,
            pf.a_shift
        );
    }
}

fn print_output_formats() {
    println!("Output formats:");
    let exporters: [Box<dyn Exporter>; 3] =
        [Box::new(PnmExporter::ppm()), Box::new(PnmExporter::pgm()), Box::new(PngExporter::new())];
    for e in &exporters {
        println!("  {:<6} .{:<5} {}", e.name(), e.extension(), e.mime_type());
    }
}

fn print_config(config: &RasterConfig) {
    println!("Configuration (SWRASTER_* environment):");
    println!("  compression          {:?}", config.compression);
    println!("  min_compress_bytes   {}", config.min_compress_bytes);
    println!("  glyph_scratch_pixels {}", config.glyph_scratch_pixels);
    println!("  transform_filter     {:?}", config.transform_filter);
    match &config.dump_dir {
        Some(dir) => println!("  dump_dir             {}", dir.display()),
        None => println!("  dump_dir             (off)"),
    }
}
