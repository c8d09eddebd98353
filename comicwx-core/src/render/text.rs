//! Word-wrapped text that shrinks until it fits a box.

use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::error::{Error, Result};

static FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Largest size tried; the layout steps down one pixel at a time.
pub const START_SIZE: u32 = 18;
const LINE_SPACING: f32 = 1.1;

/// Axis-aligned area on the canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Lines and size chosen for a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub size: u32,
    pub line_height: u32,
    pub lines: Vec<String>,
}

pub fn font() -> Result<FontRef<'static>> {
    FontRef::try_from_slice(FONT_DATA)
        .map_err(|e| Error::internal(format!("bundled font is unreadable: {e}")))
}

/// Finds the largest size at which `text` wraps into `area`. `None` when it
/// does not fit even at one pixel, or when there is nothing to draw.
pub fn fit(font: &FontRef<'_>, text: &str, area: TextBox) -> Option<TextLayout> {
    if text.split_whitespace().next().is_none() {
        return None;
    }

    (1..=START_SIZE).rev().find_map(|size| {
        let line_height = ((size as f32 * LINE_SPACING) as u32).max(1);
        let max_lines = (area.height / line_height) as usize;
        if max_lines == 0 {
            return None;
        }

        let lines = wrap(font, PxScale::from(size as f32), text, area.width)?;
        (lines.len() <= max_lines).then_some(TextLayout {
            size,
            line_height,
            lines,
        })
    })
}

/// Greedy word wrap. `None` if a single word is wider than `width`.
fn wrap(font: &FontRef<'_>, scale: PxScale, text: &str, width: u32) -> Option<Vec<String>> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if text_size(scale, font, &candidate).0 <= width {
            current = candidate;
            continue;
        }

        if current.is_empty() {
            return None;
        }
        lines.push(std::mem::take(&mut current));
        if text_size(scale, font, word).0 > width {
            return None;
        }
        current = word.to_string();
    }

    if !current.is_empty() {
        lines.push(current);
    }
    Some(lines)
}

/// Draws `text` top-left aligned inside `area`. Returns whether anything was
/// drawn.
pub fn draw_in_box(
    canvas: &mut RgbImage,
    font: &FontRef<'_>,
    text: &str,
    area: TextBox,
    color: Rgb<u8>,
) -> bool {
    let Some(layout) = fit(font, text, area) else {
        tracing::debug!(text, ?area, "text does not fit, skipping");
        return false;
    };

    let scale = PxScale::from(layout.size as f32);
    for (i, line) in layout.lines.iter().enumerate() {
        let y = area.y + i as u32 * layout.line_height;
        draw_text_mut(canvas, color, area.x as i32, y as i32, scale, font, line);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDE: TextBox = TextBox {
        x: 0,
        y: 0,
        width: 400,
        height: 60,
    };

    #[test]
    fn short_text_keeps_start_size() {
        let font = font().unwrap();
        let layout = fit(&font, "hello", WIDE).unwrap();
        assert_eq!(layout.size, START_SIZE);
        assert_eq!(layout.lines, vec!["hello".to_string()]);
    }

    #[test]
    fn long_text_wraps_and_shrinks() {
        let font = font().unwrap();
        let text = "everything you love will be taken away from you and you will wait \
                    alone for the train that never comes and still you will buy a ticket";
        let area = TextBox {
            x: 0,
            y: 0,
            width: 200,
            height: 40,
        };

        let layout = fit(&font, text, area).unwrap();
        assert!(layout.size < START_SIZE);
        assert!(layout.lines.len() > 1);
        assert!(layout.lines.len() as u32 * layout.line_height <= area.height);
        assert_eq!(layout.lines.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn impossible_box_and_blank_text_do_not_fit() {
        let font = font().unwrap();
        let tiny = TextBox {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
        };
        assert!(fit(&font, "unbreakable", tiny).is_none());
        assert!(fit(&font, "   ", WIDE).is_none());
    }

    #[test]
    fn draw_marks_pixels_inside_the_box() {
        let font = font().unwrap();
        let mut canvas = RgbImage::from_pixel(120, 40, Rgb([255, 255, 255]));
        let area = TextBox {
            x: 10,
            y: 5,
            width: 100,
            height: 30,
        };

        assert!(draw_in_box(&mut canvas, &font, "ink", area, Rgb([0, 0, 0])));

        let dark = canvas
            .enumerate_pixels()
            .filter(|(_, _, px)| px.0[0] < 128)
            .count();
        assert!(dark > 0);
        let left_of_box = canvas
            .enumerate_pixels()
            .any(|(x, _, px)| x < area.x && px.0[0] < 128);
        assert!(!left_of_box);
    }
}
