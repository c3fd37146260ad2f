//! PDF export: rasterized preview laid out on A4 pages.

use std::io::Cursor;
use std::path::Path;

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::crop_imm;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};

use super::raster::Rasterizer;
use super::{ExportFormat, export_as_file};
use crate::error::ExportError;
use crate::preview::Preview;

/// A4 in PDF points.
pub const A4_WIDTH_PT: f32 = 595.28;
pub const A4_HEIGHT_PT: f32 = 841.89;

/// Preview is rasterized at twice its natural size for print sharpness.
pub const RASTER_SCALE: f32 = 2.0;

const PT_PER_MM: f32 = 72.0 / 25.4;
/// Offset from the top edge of each page.
const TOP_OFFSET_MM: f32 = 10.0;
/// Left, right, and bottom margin.
const MARGIN_MM: f32 = 10.0;
const JPEG_QUALITY: u8 = 92;

/// One page's share of the rasterized preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSlice {
    /// First pixel row of the slice in the source image
    pub y_px: u32,
    pub height_px: u32,
    /// Drawn size on the page, in points
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Split an image of `width_px` x `height_px` into A4 page slices.
///
/// The image is scaled to the printable width, keeping its aspect ratio;
/// whatever does not fit below the top offset continues on the next page.
pub fn page_slices(width_px: u32, height_px: u32) -> Vec<PageSlice> {
    if width_px == 0 || height_px == 0 {
        return Vec::new();
    }
    let printable_width = 2.0f32.mul_add(-MARGIN_MM * PT_PER_MM, A4_WIDTH_PT);
    let printable_height = A4_HEIGHT_PT - (TOP_OFFSET_MM + MARGIN_MM) * PT_PER_MM;
    let scale = printable_width / width_px as f32;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rows_per_page = ((printable_height / scale).floor() as u32).max(1);

    let mut slices = Vec::new();
    let mut y_px = 0;
    while y_px < height_px {
        let rows = rows_per_page.min(height_px - y_px);
        slices.push(PageSlice {
            y_px,
            height_px: rows,
            width_pt: printable_width,
            height_pt: rows as f32 * scale,
        });
        y_px += rows;
    }
    slices
}

/// Assemble a PDF with one JPEG-encoded page image per slice.
pub fn build_pdf(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let slices = page_slices(image.width(), image.height());
    if slices.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let pages_id = alloc.bump();
    let image_name = Name(b"Im0");

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(pages_id);

    let mut page_ids = Vec::with_capacity(slices.len());
    for slice in &slices {
        let page_id = alloc.bump();
        let image_id = alloc.bump();
        let content_id = alloc.bump();
        page_ids.push(page_id);

        let region = crop_imm(image, 0, slice.y_px, image.width(), slice.height_px).to_image();
        let jpeg = encode_jpeg(&region)?;

        let mut xobject = pdf.image_xobject(image_id, &jpeg);
        xobject.filter(Filter::DctDecode);
        xobject.width(to_i32(region.width()));
        xobject.height(to_i32(region.height()));
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        xobject.finish();

        let x = MARGIN_MM * PT_PER_MM;
        let y = A4_HEIGHT_PT - TOP_OFFSET_MM * PT_PER_MM - slice.height_pt;
        let mut content = Content::new();
        content.save_state();
        content.transform([slice.width_pt, 0.0, 0.0, slice.height_pt, x, y]);
        content.x_object(image_name);
        content.restore_state();
        pdf.stream(content_id, &content.finish());

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, A4_WIDTH_PT, A4_HEIGHT_PT));
        page.parent(pages_id);
        page.contents(content_id);
        page.resources().x_objects().pair(image_name, image_id);
        page.finish();
    }

    let count = to_i32(u32::try_from(page_ids.len()).unwrap_or(u32::MAX));
    pdf.pages(pages_id).kids(page_ids).count(count);
    tracing::debug!(pages = count, "pdf assembled");
    Ok(pdf.finish())
}

/// Rasterize the preview in light colors and write it as a PDF.
///
/// The light override is released whether or not rasterizing succeeds. The
/// file is only written once every page has been encoded.
pub fn export_as_pdf(
    preview: &mut Preview,
    rasterizer: &dyn Rasterizer,
    path: &Path,
) -> Result<(), ExportError> {
    let image = {
        let light = preview.force_light();
        rasterizer.rasterize(&light, RASTER_SCALE)
    }
    .inspect_err(|err| tracing::error!(%err, "pdf rasterization failed"))?;

    let bytes = build_pdf(&image)?;
    export_as_file(&bytes, path, ExportFormat::Pdf.mime())
}

fn encode_jpeg(region: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(region)?;
    Ok(out.into_inner())
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
