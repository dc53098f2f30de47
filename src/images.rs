//! PNG renditions of the site's SVG artwork (favicons, Open Graph image)

use anyhow::{Context, Result};
use resvg::{tiny_skia, usvg};
use std::fs;
use std::path::Path;

use crate::utils::osc8_file_link;

const FAVICON_SVG: &str = "favicon.svg";

/// (file name, edge length in pixels)
const FAVICON_SIZES: &[(&str, u32)] = &[
    ("favicon-16x16.png", 16),
    ("favicon-32x32.png", 32),
    ("apple-touch-icon.png", 180),
];

const OG_IMAGE_SVG: &str = "og-image.svg";
const OG_IMAGE_PNG: &str = "og-image.png";
const OG_IMAGE_SIZE: (u32, u32) = (1200, 630);

/// Render `svg_path` to a `width`x`height` PNG at `png_path`.
///
/// The drawing is stretched to the requested size regardless of its own
/// aspect ratio.
pub fn render_svg_to_png(svg_path: &Path, png_path: &Path, width: u32, height: u32) -> Result<()> {
    let data = fs::read(svg_path).with_context(|| format!("Failed to read {}", svg_path.display()))?;

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_data(&data, &options)
        .with_context(|| format!("Failed to parse SVG {}", svg_path.display()))?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .with_context(|| format!("Invalid output size {}x{}", width, height))?;

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .save_png(png_path)
        .with_context(|| format!("Failed to write {}", png_path.display()))?;

    Ok(())
}

/// `favicons` subcommand: favicon.svg -> 16, 32 and 180 pixel PNGs
pub fn run_favicons(public_dir: &Path) -> Result<()> {
    let svg_path = public_dir.join(FAVICON_SVG);

    for (name, edge) in FAVICON_SIZES {
        let png_path = public_dir.join(name);
        render_svg_to_png(&svg_path, &png_path, *edge, *edge)?;
        let path = png_path.display().to_string();
        println!("Created {}", osc8_file_link(&path, &path));
    }

    Ok(())
}

/// `og-image` subcommand: og-image.svg -> 1200x630 PNG
pub fn run_og_image(root: &Path) -> Result<()> {
    let (width, height) = OG_IMAGE_SIZE;
    let png_path = root.join(OG_IMAGE_PNG);
    render_svg_to_png(&root.join(OG_IMAGE_SVG), &png_path, width, height)?;

    let path = png_path.display().to_string();
    println!("Created {}", osc8_file_link(&path, &path));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64" viewBox="0 0 64 64">
<rect x="0" y="0" width="64" height="64" fill="#1e40af"/>
</svg>"##;

    fn png_dimensions(path: &Path) -> (u32, u32) {
        let pixmap = tiny_skia::Pixmap::load_png(path).unwrap();
        (pixmap.width(), pixmap.height())
    }

    #[test]
    fn test_run_favicons() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(FAVICON_SVG), SQUARE).unwrap();

        run_favicons(tmp.path()).unwrap();

        assert_eq!(png_dimensions(&tmp.path().join("favicon-16x16.png")), (16, 16));
        assert_eq!(png_dimensions(&tmp.path().join("favicon-32x32.png")), (32, 32));
        assert_eq!(png_dimensions(&tmp.path().join("apple-touch-icon.png")), (180, 180));
    }

    #[test]
    fn test_render_stretches_to_requested_size() {
        let tmp = TempDir::new().unwrap();
        let svg = tmp.path().join(OG_IMAGE_SVG);
        fs::write(&svg, SQUARE).unwrap();

        run_og_image(tmp.path()).unwrap();

        let pixmap = tiny_skia::Pixmap::load_png(tmp.path().join(OG_IMAGE_PNG)).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), OG_IMAGE_SIZE);
        // opaque fill reaches the far corner
        let corner = pixmap.pixel(1199, 629).unwrap();
        assert_eq!(corner.alpha(), 255);
    }

    #[test]
    fn test_missing_svg_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(run_favicons(tmp.path()).is_err());
    }
}
