//! Segment-stroke text rendering.
//!
//! Characters are drawn as short stroked line segments in a unit cell,
//! seven-segment style with diagonals for the letters. Good enough for
//! tick values, station codes, and axis captions without carrying a
//! font asset. Lowercase input is drawn as uppercase.

use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Advance width of one character cell relative to the font size.
const CHAR_WIDTH: f32 = 0.6;
/// Gap between character cells relative to the font size.
const CHAR_SPACING: f32 = 0.25;

type Seg = ((f32, f32), (f32, f32));

/// Segments for one character in unit-cell coordinates, x and y in
/// [0, 1] with y growing downward.
fn segments(ch: char) -> Vec<Seg> {
    // Shared seven-segment strokes
    const TOP: Seg = ((0.0, 0.0), (1.0, 0.0));
    const MID: Seg = ((0.0, 0.5), (1.0, 0.5));
    const BOT: Seg = ((0.0, 1.0), (1.0, 1.0));
    const TL: Seg = ((0.0, 0.0), (0.0, 0.5));
    const BL: Seg = ((0.0, 0.5), (0.0, 1.0));
    const TR: Seg = ((1.0, 0.0), (1.0, 0.5));
    const BR: Seg = ((1.0, 0.5), (1.0, 1.0));

    match ch.to_ascii_uppercase() {
        '0' | 'O' => vec![TOP, BOT, TL, BL, TR, BR],
        '1' => vec![((0.5, 0.0), (0.5, 1.0))],
        '2' => vec![TOP, TR, MID, BL, BOT],
        '3' => vec![TOP, TR, BR, BOT, MID],
        '4' => vec![TL, MID, TR, BR],
        '5' | 'S' => vec![TOP, TL, MID, BR, BOT],
        '6' => vec![TOP, TL, BL, BOT, BR, MID],
        '7' => vec![TOP, ((1.0, 0.0), (0.35, 1.0))],
        '8' => vec![TOP, MID, BOT, TL, BL, TR, BR],
        '9' => vec![TOP, TL, TR, MID, BR, BOT],
        'A' => vec![TOP, MID, TL, BL, TR, BR],
        'B' => vec![TL, BL, MID, BR, BOT],
        'C' => vec![TOP, TL, BL, BOT],
        'D' => vec![TR, BR, MID, BL, BOT],
        'E' => vec![TOP, TL, BL, MID, BOT],
        'F' => vec![TOP, TL, BL, MID],
        'G' => vec![TOP, TL, BL, BOT, BR, ((0.5, 0.5), (1.0, 0.5))],
        'H' => vec![TL, BL, TR, BR, MID],
        'I' => vec![
            ((0.5, 0.0), (0.5, 1.0)),
            ((0.25, 0.0), (0.75, 0.0)),
            ((0.25, 1.0), (0.75, 1.0)),
        ],
        'J' => vec![TR, BR, BOT, ((0.0, 0.75), (0.0, 1.0))],
        'K' => vec![TL, BL, ((0.0, 0.5), (1.0, 0.0)), ((0.0, 0.5), (1.0, 1.0))],
        'L' => vec![TL, BL, BOT],
        'M' => vec![
            TL,
            BL,
            TR,
            BR,
            ((0.0, 0.0), (0.5, 0.5)),
            ((0.5, 0.5), (1.0, 0.0)),
        ],
        'N' => vec![TL, BL, TR, BR, ((0.0, 0.0), (1.0, 1.0))],
        'P' => vec![TOP, TL, BL, TR, MID],
        'Q' => vec![TOP, BOT, TL, BL, TR, BR, ((0.6, 0.6), (1.0, 1.0))],
        'R' => vec![TOP, TL, BL, TR, MID, ((0.5, 0.5), (1.0, 1.0))],
        'T' => vec![TOP, ((0.5, 0.0), (0.5, 1.0))],
        'U' => vec![TL, BL, BOT, TR, BR],
        'V' => vec![((0.0, 0.0), (0.5, 1.0)), ((0.5, 1.0), (1.0, 0.0))],
        'W' => vec![
            TL,
            BL,
            TR,
            BR,
            ((0.0, 1.0), (0.5, 0.5)),
            ((0.5, 0.5), (1.0, 1.0)),
        ],
        'X' => vec![((0.0, 0.0), (1.0, 1.0)), ((1.0, 0.0), (0.0, 1.0))],
        'Y' => vec![
            ((0.0, 0.0), (0.5, 0.5)),
            ((1.0, 0.0), (0.5, 0.5)),
            ((0.5, 0.5), (0.5, 1.0)),
        ],
        'Z' => vec![TOP, ((1.0, 0.0), (0.0, 1.0)), BOT],
        '-' => vec![MID],
        '.' => vec![((0.4, 0.95), (0.6, 0.95))],
        ',' => vec![((0.5, 0.9), (0.35, 1.1))],
        ':' => vec![((0.5, 0.25), (0.5, 0.3)), ((0.5, 0.7), (0.5, 0.75))],
        '/' => vec![((1.0, 0.0), (0.0, 1.0))],
        ' ' => vec![],
        // Unknown characters render as an empty box
        _ => vec![TOP, BOT, TL, BL, TR, BR],
    }
}

/// Pixel width of a string at the given size.
pub fn text_width(text: &str, size: f32) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let n = text.chars().count() as f32;
    n * size * CHAR_WIDTH + (n - 1.0) * size * CHAR_SPACING
}

/// Draw a string with its top-left corner at (x, y).
pub fn draw_text(pixmap: &mut Pixmap, x: f32, y: f32, text: &str, size: f32, color: [u8; 4]) {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: (size * 0.12).max(1.0),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let cell_w = size * CHAR_WIDTH;
    let advance = size * (CHAR_WIDTH + CHAR_SPACING);

    let mut pb = PathBuilder::new();
    for (i, ch) in text.chars().enumerate() {
        let cx = x + i as f32 * advance;
        for ((x0, y0), (x1, y1)) in segments(ch) {
            pb.move_to(cx + x0 * cell_w, y + y0 * size);
            pb.line_to(cx + x1 * cell_w, y + y1 * size);
        }
    }

    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

/// Draw a string horizontally centered on (cx, y).
pub fn draw_text_centered(pixmap: &mut Pixmap, cx: f32, y: f32, text: &str, size: f32, color: [u8; 4]) {
    draw_text(pixmap, cx - text_width(text, size) / 2.0, y, text, size, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width_scales_with_length() {
        let one = text_width("A", 10.0);
        let three = text_width("AAA", 10.0);
        assert!(one > 0.0);
        assert!(three > 2.0 * one);
        assert_eq!(text_width("", 10.0), 0.0);
    }

    #[test]
    fn test_draw_text_touches_pixels() {
        let mut pixmap = Pixmap::new(60, 20).unwrap();
        draw_text(&mut pixmap, 2.0, 2.0, "AHUD", 12.0, [0, 0, 0, 255]);
        let touched = pixmap.data().chunks_exact(4).any(|p| p[3] != 0);
        assert!(touched, "drawing text should modify the pixmap");
    }

    #[test]
    fn test_space_draws_nothing() {
        let mut pixmap = Pixmap::new(20, 20).unwrap();
        draw_text(&mut pixmap, 2.0, 2.0, " ", 12.0, [0, 0, 0, 255]);
        let touched = pixmap.data().chunks_exact(4).any(|p| p[3] != 0);
        assert!(!touched);
    }

    #[test]
    fn test_every_printable_has_segments_or_is_space() {
        for ch in "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-.,:/".chars() {
            assert!(!segments(ch).is_empty(), "no segments for {:?}", ch);
        }
        assert!(segments(' ').is_empty());
    }
}
