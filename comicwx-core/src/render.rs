//! Image decoding, scaling and composition.

use std::io::Cursor;

pub mod text;

use bytes::Bytes;
use image::{
    DynamicImage, GenericImageView, ImageBuffer, Luma, Rgb, RgbImage,
    codecs::jpeg::JpegEncoder,
    imageops::{self, FilterType},
};
use qrcode::QrCode;
use reqwest::Url;

use self::text::TextBox;

use crate::{
    error::{Error, Result},
    model::Dimensions,
};

/// Height reserved under the comic for the QR code.
pub const FOOTER_BAND: u32 = 100;
const FOOTER_MARGIN: u32 = 10;
const QR_BOTTOM_OFFSET: u32 = 20;
const QR_MODULE_PX: u32 = 2;
const JPEG_QUALITY: u8 = 95;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Size and offset of an image fitted into a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::internal(format!("could not decode image: {e}")))
}

/// Scales `(src_w, src_h)` by the largest factor that fits `(box_w, box_h)`
/// and centres it. Both results are at least one pixel.
pub fn fit_within(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> Placement {
    let scale = f64::min(
        f64::from(box_w) / f64::from(src_w.max(1)),
        f64::from(box_h) / f64::from(src_h.max(1)),
    );

    let width = ((f64::from(src_w) * scale) as u32).clamp(1, box_w.max(1));
    let height = ((f64::from(src_h) * scale) as u32).clamp(1, box_h.max(1));

    Placement {
        width,
        height,
        x: box_w.saturating_sub(width) / 2,
        y: box_h.saturating_sub(height) / 2,
    }
}

/// Where the footer pieces go on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FooterLayout {
    /// Top-left corner of the QR code, when it fits.
    qr: Option<(u32, u32)>,
    caption: TextBox,
    /// Under the QR code.
    attribution: Option<TextBox>,
}

fn footer_layout(dims: Dimensions, footer: u32, qr_w: u32, qr_h: u32) -> FooterLayout {
    let top = dims.height - footer;
    let fits = qr_w + 2 * FOOTER_MARGIN <= dims.width
        && qr_h + FOOTER_MARGIN + QR_BOTTOM_OFFSET <= footer;

    if !fits {
        return FooterLayout {
            qr: None,
            caption: TextBox {
                x: FOOTER_MARGIN,
                y: top + FOOTER_MARGIN,
                width: dims.width.saturating_sub(2 * FOOTER_MARGIN),
                height: footer.saturating_sub(2 * FOOTER_MARGIN),
            },
            attribution: None,
        };
    }

    let qr_x = dims.width - qr_w - FOOTER_MARGIN;
    let qr_y = dims.height - qr_h - FOOTER_MARGIN - QR_BOTTOM_OFFSET;
    FooterLayout {
        qr: Some((qr_x, qr_y)),
        caption: TextBox {
            x: FOOTER_MARGIN,
            y: qr_y,
            width: qr_x.saturating_sub(2 * FOOTER_MARGIN),
            height: qr_h,
        },
        attribution: Some(TextBox {
            x: qr_x,
            y: qr_y + qr_h,
            width: qr_w,
            height: QR_BOTTOM_OFFSET,
        }),
    }
}

/// Lays `comic` out on a white canvas of exactly `dims`. The comic is fitted
/// above the footer band. The footer holds `caption` on the left and a QR
/// code linking to `page_url` on the right, with the site's host under it.
/// Short canvases drop the footer.
pub fn compose_comic(
    comic: &DynamicImage,
    page_url: &str,
    caption: &str,
    dims: Dimensions,
) -> Result<RgbImage> {
    let footer = if dims.height > FOOTER_BAND * 2 { FOOTER_BAND } else { 0 };
    let available = dims.height - footer;

    let (src_w, src_h) = comic.dimensions();
    let placement = fit_within(src_w, src_h, dims.width, available);
    tracing::debug!(
        src = %format!("{src_w}x{src_h}"),
        canvas = %dims,
        placed = %format!("{}x{}+{}+{}", placement.width, placement.height, placement.x, placement.y),
        "composing comic"
    );

    let scaled = comic
        .resize_exact(placement.width, placement.height, FilterType::Lanczos3)
        .to_rgb8();

    let mut canvas = RgbImage::from_pixel(dims.width, dims.height, WHITE);
    imageops::overlay(&mut canvas, &scaled, i64::from(placement.x), i64::from(placement.y));

    if footer == 0 {
        return Ok(canvas);
    }

    let qr = qr_code(page_url)?;
    let layout = footer_layout(dims, footer, qr.width(), qr.height());
    let font = text::font()?;

    if let Some((qr_x, qr_y)) = layout.qr {
        let qr = DynamicImage::ImageLuma8(qr).to_rgb8();
        imageops::overlay(&mut canvas, &qr, i64::from(qr_x), i64::from(qr_y));
    }
    text::draw_in_box(&mut canvas, &font, caption, layout.caption, INK);
    if let (Some(area), Some(host)) = (layout.attribution, site_host(page_url)) {
        text::draw_in_box(&mut canvas, &font, &host, area, INK);
    }

    Ok(canvas)
}

fn site_host(page_url: &str) -> Option<String> {
    Url::parse(page_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
}

/// Scales `image` to exactly `dims`, ignoring aspect ratio.
pub fn resize_exact(image: &DynamicImage, dims: Dimensions) -> RgbImage {
    image
        .resize_exact(dims.width, dims.height, FilterType::Lanczos3)
        .to_rgb8()
}

pub fn encode_jpeg(image: &RgbImage) -> Result<Bytes> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode_image(image)?;
    Ok(Bytes::from(buf.into_inner()))
}

/// QR code without its own quiet zone; the white canvas provides one.
fn qr_code(data: &str) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| Error::internal(format!("could not encode QR code: {e}")))?;

    Ok(code
        .render::<Luma<u8>>()
        .quiet_zone(false)
        .module_dimensions(QR_MODULE_PX, QR_MODULE_PX)
        .build())
}
