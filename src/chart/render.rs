use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle, FontTransform};

use super::BarPlan;
use crate::error::RenderError;

/// Output resolution.
pub const DPI: u32 = 300;

/// Figure size in inches (width, height).
pub const FIGURE_INCHES: (u32, u32) = (10, 5);

/// Canvas size in pixels.
pub fn canvas_size() -> (u32, u32) {
    (FIGURE_INCHES.0 * DPI, FIGURE_INCHES.1 * DPI)
}

/// Typographic points to pixels at [`DPI`].
fn points(pt: f64) -> f64 {
    pt * DPI as f64 / 72.0
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Draw `plan` and write it as a PNG at `path`, replacing any existing file.
///
/// The image is encoded into a temporary file next to `path` and renamed
/// into place, so a failed render never leaves a partial file behind.
pub fn render_png(plan: &BarPlan, path: &Path) -> Result<(), RenderError> {
    if plan.is_empty() {
        return Err(RenderError::EmptySample);
    }

    let (width, height) = canvas_size();
    let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_bars(root, plan).map_err(|e| RenderError::Draw(format!("{e:#}")))?;
    }

    write_png_atomically(&buffer, (width, height), path)?;
    log::debug!("wrote {width}x{height} chart to {}", path.display());
    Ok(())
}

fn draw_bars<DB>(root: DrawingArea<DB, Shift>, plan: &BarPlan) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let n = plan.bars.len();
    let tick_px = points(10.0);
    let desc_px = points(11.0);
    let title_px = points(13.0);
    let (_, height) = root.dim_in_pixel();

    // Rotated category labels need room below the axis; size it from the
    // longest label but never let it swallow the plot.
    let longest = plan
        .bars
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(1);
    let bottom = (longest as f64 * tick_px * 0.62 + desc_px * 2.0).min(height as f64 * 0.55);
    let left = tick_px * 5.0 + desc_px * 2.0;

    let (lo, hi) = plan.value_range();
    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(points(12.0) as u32)
        .set_label_area_size(LabelAreaPosition::Left, left as u32)
        .set_label_area_size(LabelAreaPosition::Bottom, bottom as u32);
    if let Some(title) = &plan.title {
        builder.caption(title, FontDesc::new(FontFamily::SansSerif, title_px, FontStyle::Normal));
    }
    let mut chart = builder.build_cartesian_2d(-0.5..(n as f64 - 0.5), lo..hi)?;

    let tick_font = FontDesc::new(FontFamily::SansSerif, tick_px, FontStyle::Normal);
    let label_for = |x: &f64| {
        let i = x.round();
        if (x - i).abs() > 1e-6 || i < 0.0 {
            return String::new();
        }
        plan.bars
            .get(i as usize)
            .map(|b| b.label.clone())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_for)
        .x_label_style(tick_font.clone().transform(FontTransform::Rotate90))
        .y_label_style(tick_font)
        .x_desc(plan.x_label.as_str())
        .y_desc(plan.y_label.as_str())
        .axis_desc_style(FontDesc::new(FontFamily::SansSerif, desc_px, FontStyle::Normal))
        .draw()?;

    chart.draw_series(plan.bars.iter().enumerate().map(|(i, bar)| {
        let color = RGBColor(bar.color.red, bar.color.green, bar.color.blue);
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, bar.value.clamp(lo, hi))], color.filled())
    }))?;

    root.present()?;
    Ok(())
}

fn write_png_atomically(
    rgb: &[u8],
    (width, height): (u32, u32),
    path: &Path,
) -> Result<(), RenderError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".joinplot-")
        .suffix(".png")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        PngEncoder::new(&mut writer).write_image(rgb, width, height, ExtendedColorType::Rgb8)?;
        writer.flush()?;
    }

    tmp.persist(path)?;
    Ok(())
}
