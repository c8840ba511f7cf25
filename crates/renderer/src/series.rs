//! Time-series polyline plots.
//!
//! Much simpler than the map panel: a framed box with value/time axes
//! and one polyline. Time values are opaque seconds; the caller decides
//! what epoch they are relative to.

use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};
use viz_common::{VizError, VizResult};

use crate::map::nice_interval;
use crate::text;

const MARGIN_LEFT: u32 = 64;
const MARGIN_RIGHT: u32 = 16;
const MARGIN_TOP: u32 = 16;
const MARGIN_BOTTOM: u32 = 40;
const TICK_FONT: f32 = 10.0;
const BLACK: [u8; 4] = [0, 0, 0, 255];

/// One sample of a series: time (seconds) and value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub t: f64,
    pub v: f64,
}

impl SeriesPoint {
    /// Parse a backend payload line `time,value`.
    pub fn parse(line: &str) -> VizResult<Self> {
        let mut parts = line.splitn(2, ',');
        let t = parts
            .next()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| VizError::Transport(format!("malformed series line: {:?}", line)))?;
        let v = parts
            .next()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| VizError::Transport(format!("malformed series line: {:?}", line)))?;
        Ok(Self { t, v })
    }
}

/// Draws a single-series polyline plot.
pub struct SeriesRenderer {
    box_w: u32,
    box_h: u32,
}

impl SeriesRenderer {
    pub fn new(box_width: u32, box_height: u32) -> VizResult<Self> {
        if box_width < 64 || box_height < 48 {
            return Err(VizError::Render(format!(
                "plot box too small: {}x{}",
                box_width, box_height
            )));
        }
        Ok(Self {
            box_w: box_width,
            box_h: box_height,
        })
    }

    pub fn panel_size(&self) -> (u32, u32) {
        (
            self.box_w + MARGIN_LEFT + MARGIN_RIGHT,
            self.box_h + MARGIN_TOP + MARGIN_BOTTOM,
        )
    }

    /// Render the series. An empty series produces the framed axes with
    /// no polyline.
    pub fn render(&self, points: &[SeriesPoint]) -> VizResult<Pixmap> {
        let (panel_w, panel_h) = self.panel_size();
        let mut pixmap = Pixmap::new(panel_w, panel_h)
            .ok_or_else(|| VizError::Render(format!("bad panel size {}x{}", panel_w, panel_h)))?;
        pixmap.fill(Color::WHITE);

        // Data range, padded so flat series still have a visible band
        let (t0, t1, v0, v1) = data_range(points);

        self.draw_frame(&mut pixmap, v0, v1);

        if points.len() >= 2 {
            let mut pb = PathBuilder::new();
            for (i, p) in points.iter().enumerate() {
                let px = MARGIN_LEFT as f32
                    + ((p.t - t0) / (t1 - t0) * self.box_w as f64) as f32;
                let py = MARGIN_TOP as f32
                    + ((v1 - p.v) / (v1 - v0) * self.box_h as f64) as f32;
                if i == 0 {
                    pb.move_to(px, py);
                } else {
                    pb.line_to(px, py);
                }
            }
            let mut paint = Paint::default();
            paint.set_color_rgba8(20, 60, 180, 255);
            paint.anti_alias = true;
            let stroke = Stroke {
                width: 1.4,
                ..Stroke::default()
            };
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }

        Ok(pixmap)
    }

    fn draw_frame(&self, pixmap: &mut Pixmap, v0: f64, v1: f64) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: 1.2,
            ..Stroke::default()
        };

        let mut pb = PathBuilder::new();
        if let Some(rect) = Rect::from_xywh(
            MARGIN_LEFT as f32,
            MARGIN_TOP as f32,
            self.box_w as f32,
            self.box_h as f32,
        ) {
            pb.push_rect(rect);
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }

        // Value ticks on the left edge
        let step = nice_interval((v1 - v0) / 5.0);
        let mut v = (v0 / step).ceil() * step;
        while v <= v1 + 1e-12 {
            let py = MARGIN_TOP as f32 + ((v1 - v) / (v1 - v0) * self.box_h as f64) as f32;
            let mut tick = PathBuilder::new();
            tick.move_to(MARGIN_LEFT as f32, py);
            tick.line_to(MARGIN_LEFT as f32 - 5.0, py);
            if let Some(path) = tick.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }

            let label = format!("{}", (v * 1000.0).round() / 1000.0);
            let w = text::text_width(&label, TICK_FONT);
            text::draw_text(
                pixmap,
                MARGIN_LEFT as f32 - 9.0 - w,
                py - TICK_FONT / 2.0,
                &label,
                TICK_FONT,
                BLACK,
            );
            v += step;
        }
    }
}

/// Padded data range; degenerate spans widen to a unit band.
fn data_range(points: &[SeriesPoint]) -> (f64, f64, f64, f64) {
    if points.is_empty() {
        return (0.0, 1.0, 0.0, 1.0);
    }
    let mut t0 = f64::MAX;
    let mut t1 = f64::MIN;
    let mut v0 = f64::MAX;
    let mut v1 = f64::MIN;
    for p in points {
        t0 = t0.min(p.t);
        t1 = t1.max(p.t);
        v0 = v0.min(p.v);
        v1 = v1.max(p.v);
    }
    if t1 - t0 < 1e-12 {
        t1 = t0 + 1.0;
    }
    if v1 - v0 < 1e-12 {
        v0 -= 0.5;
        v1 += 0.5;
    }
    (t0, t1, v0, v1)
}
