use std::f64::consts::PI;
use std::fmt::Write as _;

use resvg::{tiny_skia, usvg};
use thiserror::Error;

use crate::models::{ScoreScale, ScoreSheet};

pub const BAR_CHART_WIDTH: u32 = 800;
const BAR_ROW_HEIGHT: u32 = 44;
const BAR_TOP: u32 = 60;
const BAR_BOTTOM: u32 = 50;
const BAR_LABEL_WIDTH: f64 = 190.0;
const BAR_RIGHT_MARGIN: f64 = 60.0;

pub const RADAR_CHART_SIZE: u32 = 640;
const RADAR_RADIUS: f64 = 210.0;
const RADAR_RINGS: usize = 4;

const BAR_COLOR: &str = "#2563eb";
const GRID_COLOR: &str = "#e5e7eb";
const AXIS_COLOR: &str = "#9ca3af";
const TEXT_COLOR: &str = "#374151";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("chart SVG could not be parsed: {0}")]
    Parse(String),
    #[error("unable to allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },
    #[error("PNG encoding failed")]
    Encode(#[from] png::EncodingError),
}

/// A rendered chart held in memory as SVG markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    pub width: u32,
    pub height: u32,
    pub svg: String,
}

impl Chart {
    pub fn rasterize(&self) -> Result<RasterImage, RenderError> {
        svg_to_png(&self.svg, self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarPoint {
    pub angle: f64,
    pub value: f64,
}

/// Evenly spaced angles starting at 0, with the first point repeated to close the loop.
pub fn radar_points(values: &[f64]) -> Vec<RadarPoint> {
    let count = values.len();
    if count == 0 {
        return Vec::new();
    }

    let mut points: Vec<RadarPoint> = values
        .iter()
        .enumerate()
        .map(|(index, value)| RadarPoint {
            angle: index as f64 / count as f64 * 2.0 * PI,
            value: *value,
        })
        .collect();
    points.push(points[0]);
    points
}

pub fn bar_chart(sheet: &ScoreSheet, title: &str) -> Chart {
    let rows = sheet.len() as u32;
    let width = BAR_CHART_WIDTH;
    let height = BAR_TOP + rows * BAR_ROW_HEIGHT + BAR_BOTTOM;
    let plot_left = BAR_LABEL_WIDTH;
    let plot_width = f64::from(width) - BAR_LABEL_WIDTH - BAR_RIGHT_MARGIN;
    let plot_bottom = f64::from(BAR_TOP + rows * BAR_ROW_HEIGHT);
    let scale = sheet.scale;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"##
    );
    let _ = writeln!(
        svg,
        r##"  <rect x="0" y="0" width="{width}" height="{height}" fill="#ffffff"/>"##
    );
    let _ = writeln!(
        svg,
        r##"  <text x="{}" y="32" text-anchor="middle" font-family="sans-serif" font-size="18" font-weight="600" fill="{TEXT_COLOR}">{}</text>"##,
        width / 2,
        escape_xml(title)
    );

    for tick in ticks(scale) {
        let x = plot_left + scale.fraction(tick) * plot_width;
        let _ = writeln!(
            svg,
            r##"  <line x1="{x:.1}" y1="{BAR_TOP}" x2="{x:.1}" y2="{plot_bottom:.1}" stroke="{GRID_COLOR}" stroke-width="1"/>"##
        );
        let _ = writeln!(
            svg,
            r##"  <text x="{x:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="12" fill="{AXIS_COLOR}">{}</text>"##,
            plot_bottom + 20.0,
            format_tick(tick)
        );
    }

    let _ = writeln!(
        svg,
        r##"  <line x1="{plot_left:.1}" y1="{BAR_TOP}" x2="{plot_left:.1}" y2="{plot_bottom:.1}" stroke="{AXIS_COLOR}" stroke-width="2"/>"##
    );

    for (index, entry) in sheet.scores.iter().enumerate() {
        let row_top = f64::from(BAR_TOP) + index as f64 * f64::from(BAR_ROW_HEIGHT);
        let bar_height = f64::from(BAR_ROW_HEIGHT) * 0.6;
        let bar_y = row_top + (f64::from(BAR_ROW_HEIGHT) - bar_height) / 2.0;
        let bar_width = scale.fraction(entry.score) * plot_width;
        let center_y = row_top + f64::from(BAR_ROW_HEIGHT) / 2.0 + 4.0;

        let _ = writeln!(
            svg,
            r##"  <text x="{:.1}" y="{center_y:.1}" text-anchor="end" font-family="sans-serif" font-size="13" fill="{TEXT_COLOR}">{}</text>"##,
            plot_left - 10.0,
            escape_xml(&entry.category)
        );
        let _ = writeln!(
            svg,
            r##"  <rect x="{plot_left:.1}" y="{bar_y:.1}" width="{bar_width:.1}" height="{bar_height:.1}" fill="{BAR_COLOR}" opacity="0.85"/>"##
        );
        let _ = writeln!(
            svg,
            r##"  <text x="{:.1}" y="{center_y:.1}" font-family="sans-serif" font-size="12" fill="{TEXT_COLOR}">{}</text>"##,
            plot_left + bar_width + 6.0,
            sheet.display_score(entry.score)
        );
    }

    svg.push_str("</svg>\n");

    Chart { width, height, svg }
}

pub fn radar_chart(sheet: &ScoreSheet, title: &str) -> Chart {
    let size = RADAR_CHART_SIZE;
    let center = f64::from(size) / 2.0;
    let center_y = center + 20.0;
    let scale = sheet.scale;
    let values: Vec<f64> = sheet.scores.iter().map(|entry| entry.score).collect();
    let points = radar_points(&values);

    let project = |angle: f64, fraction: f64| -> (f64, f64) {
        let radius = fraction * RADAR_RADIUS;
        (center + radius * angle.cos(), center_y - radius * angle.sin())
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"##
    );
    let _ = writeln!(
        svg,
        r##"  <rect x="0" y="0" width="{size}" height="{size}" fill="#ffffff"/>"##
    );
    let _ = writeln!(
        svg,
        r##"  <text x="{center:.1}" y="32" text-anchor="middle" font-family="sans-serif" font-size="18" font-weight="600" fill="{TEXT_COLOR}">{}</text>"##,
        escape_xml(title)
    );

    for ring in 1..=RADAR_RINGS {
        let fraction = ring as f64 / RADAR_RINGS as f64;
        let _ = writeln!(
            svg,
            r##"  <circle cx="{center:.1}" cy="{center_y:.1}" r="{:.1}" fill="none" stroke="{GRID_COLOR}" stroke-width="1"/>"##,
            fraction * RADAR_RADIUS
        );
        let _ = writeln!(
            svg,
            r##"  <text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="11" fill="{AXIS_COLOR}">{}</text>"##,
            center + 4.0,
            center_y - fraction * RADAR_RADIUS - 3.0,
            format_tick(scale.min + fraction * scale.span())
        );
    }

    for (point, entry) in points.iter().zip(&sheet.scores) {
        let (x, y) = project(point.angle, 1.0);
        let _ = writeln!(
            svg,
            r##"  <line x1="{center:.1}" y1="{center_y:.1}" x2="{x:.1}" y2="{y:.1}" stroke="{GRID_COLOR}" stroke-width="1"/>"##
        );

        let (label_x, label_y) = project(point.angle, 1.12);
        let anchor = match point.angle.cos() {
            c if c > 0.2 => "start",
            c if c < -0.2 => "end",
            _ => "middle",
        };
        let _ = writeln!(
            svg,
            r##"  <text x="{label_x:.1}" y="{:.1}" text-anchor="{anchor}" font-family="sans-serif" font-size="13" fill="{TEXT_COLOR}">{}</text>"##,
            label_y + 4.0,
            escape_xml(&entry.category)
        );
    }

    let outline: Vec<String> = points
        .iter()
        .map(|point| {
            let (x, y) = project(point.angle, scale.fraction(point.value));
            format!("{x:.1},{y:.1}")
        })
        .collect();
    let outline = outline.join(" ");

    let _ = writeln!(
        svg,
        r##"  <polygon points="{outline}" fill="{BAR_COLOR}" fill-opacity="0.25" stroke="none"/>"##
    );
    let _ = writeln!(
        svg,
        r##"  <polyline points="{outline}" fill="none" stroke="{BAR_COLOR}" stroke-width="2"/>"##
    );

    svg.push_str("</svg>\n");

    Chart {
        width: size,
        height: size,
        svg,
    }
}

fn ticks(scale: ScoreScale) -> Vec<f64> {
    let span = scale.span();
    if span <= 0.0 {
        return vec![scale.min];
    }
    let step = if span <= 5.0 { 1.0 } else { (span / 4.0).ceil() };
    let mut values = Vec::new();
    let mut tick = scale.min;
    while tick <= scale.max + f64::EPSILON {
        values.push(tick);
        tick += step;
    }
    values
}

fn format_tick(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Renders SVG markup to an opaque RGB PNG.
pub fn svg_to_png(svg: &str, width: u32, height: u32) -> Result<RasterImage, RenderError> {
    use png::{BitDepth, ColorType, Encoder};

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_data(svg.as_bytes(), &options)
        .map_err(|err| RenderError::Parse(err.to_string()))?;

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // Background is opaque white, so dropping alpha loses nothing.
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
        .collect();

    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, width, height);
        encoder.set_color(ColorType::Rgb);
        encoder.set_depth(BitDepth::Eight);
        encoder.write_header()?.write_image_data(&rgb)?;
    }

    Ok(RasterImage {
        width,
        height,
        png: out,
    })
}
