use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::png::PngDecoder;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::charts::{RasterImage, RenderError};
use crate::models::ScoreSheet;
use crate::report::{motivator_line, Report};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
const MAX_IMAGE_WIDTH_MM: f32 = 170.0;
const MAX_IMAGE_HEIGHT_MM: f32 = 150.0;
const BODY_FONT_SIZE: f32 = 11.0;
const BODY_LINE_MM: f32 = 5.5;
const WRAP_COLUMNS: usize = 88;
const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("chart rendering failed")]
    Render(#[from] RenderError),
    #[error("CSV encoding failed")]
    Csv(#[from] csv::Error),
    #[error("PDF composition failed: {0}")]
    Pdf(String),
    #[error("failed to write {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize)]
struct ScoreRow<'a> {
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Score")]
    score: f64,
}

#[derive(Debug, Deserialize)]
struct ParsedScoreRow {
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Score")]
    score: f64,
}

/// `Category,Score` rows in catalog order.
pub fn scores_csv(sheet: &ScoreSheet) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for entry in &sheet.scores {
        writer.serialize(ScoreRow {
            category: &entry.category,
            score: entry.score,
        })?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.into_error().into()))
}

pub fn parse_scores_csv(bytes: &[u8]) -> Result<Vec<(String, f64)>, ExportError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();
    for result in reader.deserialize::<ParsedScoreRow>() {
        let row = result?;
        rows.push((row.category, row.score));
    }
    Ok(rows)
}

pub fn write_csv(report: &Report, path: &Path) -> Result<(), ExportError> {
    let bytes = scores_csv(&report.sheet)?;
    write_atomic(path, &bytes)?;
    info!(path = %path.display(), rows = report.sheet.len(), "CSV written");
    Ok(())
}

pub fn write_summary(summary: &str, path: &Path) -> Result<(), ExportError> {
    write_atomic(path, summary.as_bytes())?;
    info!(path = %path.display(), "summary written");
    Ok(())
}

/// Writes `bar.svg`, `radar.svg`, `bar.png`, `radar.png` into `dir`.
pub fn write_charts(report: &Report, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let bar = report.bar_chart.rasterize()?;
    let radar = report.radar_chart.rasterize()?;

    let files: [(&str, &[u8]); 4] = [
        ("bar.svg", report.bar_chart.svg.as_bytes()),
        ("radar.svg", report.radar_chart.svg.as_bytes()),
        ("bar.png", &bar.png),
        ("radar.png", &radar.png),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, bytes) in files {
        let path = dir.join(name);
        write_atomic(&path, bytes)?;
        written.push(path);
    }
    info!(dir = %dir.display(), "charts written");
    Ok(written)
}

pub fn write_pdf(report: &Report, path: &Path) -> Result<(), ExportError> {
    let bytes = compose_pdf(report)?;
    write_atomic(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "PDF report written");
    Ok(())
}

/// Title, bar chart, radar chart, then the top and lower motivator sections.
pub fn compose_pdf(report: &Report) -> Result<Vec<u8>, ExportError> {
    let composer = lay_out_pdf(report)?;
    let outline: Vec<String> = composer.blocks.iter().map(PdfBlock::label).collect();
    debug!(
        pages = composer.pages,
        outline = %outline.join(" | "),
        "PDF laid out"
    );
    composer.finish()
}

fn lay_out_pdf(report: &Report) -> Result<PdfComposer, ExportError> {
    let bar = report.bar_chart.rasterize()?;
    let radar = report.radar_chart.rasterize()?;

    let mut composer = PdfComposer::new(&report.title)?;
    composer.heading(&report.title, 20.0);
    composer.line(
        &format!(
            "Generated {} - {} of each category's answers",
            report.generated_at.format("%Y-%m-%d %H:%M"),
            report.sheet.mode
        ),
        10.0,
    );
    composer.gap(4.0);

    composer.image(&bar)?;
    composer.image(&radar)?;

    composer.heading("Top Motivators", 14.0);
    for entry in &report.ranking.top {
        composer.paragraph(&motivator_line(entry));
    }
    composer.gap(4.0);

    composer.heading("Lower Motivators", 14.0);
    for entry in &report.ranking.lower {
        composer.paragraph(&motivator_line(entry));
    }

    Ok(composer)
}

/// What the composer placed, in document order.
#[derive(Debug, Clone, PartialEq)]
enum PdfBlock {
    Heading(String),
    Text(String),
    Image { width_px: u32, page: usize },
}

impl PdfBlock {
    fn label(&self) -> String {
        match self {
            PdfBlock::Heading(text) => format!("# {text}"),
            PdfBlock::Text(text) => text.chars().take(40).collect(),
            PdfBlock::Image { width_px, page } => format!("image {width_px}px on page {page}"),
        }
    }
}

struct PdfComposer {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    cursor: f32,
    pages: usize,
    blocks: Vec<PdfBlock>,
}

impl PdfComposer {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Page 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| ExportError::Pdf(format!("{err:?}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|err| ExportError::Pdf(format!("{err:?}")))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor: PAGE_HEIGHT_MM - MARGIN_MM,
            pages: 1,
            blocks: Vec::new(),
        })
    }

    fn ensure_room(&mut self, height: f32) {
        if self.cursor - height >= MARGIN_MM {
            return;
        }
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            format!("Page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = PAGE_HEIGHT_MM - MARGIN_MM;
    }

    fn gap(&mut self, height: f32) {
        self.cursor -= height;
    }

    fn heading(&mut self, text: &str, size: f32) {
        let height = size * 0.5;
        self.ensure_room(height + BODY_LINE_MM);
        self.cursor -= height;
        self.layer
            .use_text(text, size, Mm(MARGIN_MM), Mm(self.cursor), &self.bold);
        self.cursor -= 3.0;
        self.blocks.push(PdfBlock::Heading(text.to_string()));
    }

    fn line(&mut self, text: &str, size: f32) {
        let height = size * 0.5;
        self.ensure_room(height);
        self.cursor -= height;
        self.layer
            .use_text(text, size, Mm(MARGIN_MM), Mm(self.cursor), &self.regular);
        self.blocks.push(PdfBlock::Text(text.to_string()));
    }

    fn paragraph(&mut self, text: &str) {
        self.blocks.push(PdfBlock::Text(text.to_string()));
        for (index, row) in wrap(text, WRAP_COLUMNS).into_iter().enumerate() {
            let row = if index == 0 { row } else { format!("  {row}") };
            self.ensure_room(BODY_LINE_MM);
            self.cursor -= BODY_LINE_MM;
            self.layer.use_text(
                row,
                BODY_FONT_SIZE,
                Mm(MARGIN_MM),
                Mm(self.cursor),
                &self.regular,
            );
        }
    }

    /// Embeds a raster image centred in the content column, scaled to the bounded width.
    fn image(&mut self, raster: &RasterImage) -> Result<(), ExportError> {
        let (width_mm, height_mm) = fitted_size(raster.width, raster.height);
        let dpi = raster.width as f32 * MM_PER_INCH / width_mm;

        let decoder = PngDecoder::new(Cursor::new(raster.png.as_slice()))
            .map_err(|err| ExportError::Pdf(err.to_string()))?;
        let image = Image::try_from(decoder).map_err(|err| ExportError::Pdf(err.to_string()))?;

        self.ensure_room(height_mm);
        self.cursor -= height_mm;
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_MM + (CONTENT_WIDTH_MM - width_mm) / 2.0)),
                translate_y: Some(Mm(self.cursor)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        self.cursor -= 6.0;
        self.blocks.push(PdfBlock::Image {
            width_px: raster.width,
            page: self.pages,
        });
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        self.doc
            .save_to_bytes()
            .map_err(|err| ExportError::Pdf(format!("{err:?}")))
    }
}

/// Printed size in millimetres, no wider than the content column and no taller than
/// `MAX_IMAGE_HEIGHT_MM`, keeping the aspect ratio.
fn fitted_size(width_px: u32, height_px: u32) -> (f32, f32) {
    let aspect = height_px as f32 / width_px.max(1) as f32;
    let mut width = MAX_IMAGE_WIDTH_MM.min(CONTENT_WIDTH_MM);
    let mut height = width * aspect;
    if height > MAX_IMAGE_HEIGHT_MM {
        height = MAX_IMAGE_HEIGHT_MM;
        width = height / aspect;
    }
    (width, height)
}

fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut rows = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > columns {
            rows.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

/// Writes the whole artifact to a sibling temporary file, then renames it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let temp = temp_path(path);
    let result = fs::write(&temp, bytes).and_then(|()| fs::rename(&temp, path));
    if let Err(source) = result {
        let _ = fs::remove_file(&temp);
        return Err(ExportError::Io {
            path: path.display().to_string(),
            source,
        });
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
