//! Map raster composition.
//!
//! Given an area of interest and a conformal projection centered on it,
//! composes the full map panel: background imagery, bounding box,
//! graticule with optional tick marks/values, scale indicator, point
//! labels, and optional axis captions.

use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};
use tracing::debug;
use viz_common::{GeoArea, VizError, VizResult};

use projection::TransverseMercator;

use crate::background::BackgroundProvider;
use crate::labels::LabelSet;
use crate::text;

const MARGIN_LEFT: u32 = 60;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 24;
const MARGIN_BOTTOM: u32 = 60;

const TICK_LEN: f32 = 6.0;
const TICK_FONT: f32 = 10.0;
const CAPTION_FONT: f32 = 12.0;
const LABEL_FONT: f32 = 10.0;

const BLACK: [u8; 4] = [0, 0, 0, 255];

/// Per-request rendering options; defaults match the historical
/// behavior (ticks and unit captions on, extra labels off).
#[derive(Debug, Clone, Copy)]
pub struct MapOptions {
    pub x_tick_marks: bool,
    pub x_tick_values: bool,
    pub x_units: bool,
    pub x_label: bool,
    pub y_tick_marks: bool,
    pub y_tick_values: bool,
    pub y_units: bool,
    pub y_label: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            x_tick_marks: true,
            x_tick_values: true,
            x_units: true,
            x_label: false,
            y_tick_marks: true,
            y_tick_values: true,
            y_units: true,
            y_label: false,
        }
    }
}

/// Composes one map panel for an area of interest.
#[derive(Debug)]
pub struct MapRenderer {
    area: GeoArea,
    proj: TransverseMercator,
    opts: MapOptions,
    // Projected extents of the area, meters
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
    // Drawable box, pixels
    box_w: u32,
    box_h: u32,
}

impl MapRenderer {
    /// Set up a renderer for the area with a drawable box no wider than
    /// `box_width` and no taller than `max_box_height`; the box keeps
    /// the projected aspect ratio of the area.
    pub fn new(
        area: GeoArea,
        opts: MapOptions,
        box_width: u32,
        max_box_height: u32,
    ) -> VizResult<Self> {
        if box_width < 64 || max_box_height < 64 {
            return Err(VizError::Render(format!(
                "drawable box too small: {}x{}",
                box_width, max_box_height
            )));
        }

        let (center_lon, center_lat) = area.center();
        let proj = TransverseMercator::centered_on(center_lon, center_lat);
        let (min_x, max_x, min_y, max_y) =
            proj.projected_extents(area.west, area.east, area.south, area.north);

        let span_x = max_x - min_x;
        let span_y = max_y - min_y;
        if !(span_x.is_finite() && span_y.is_finite() && span_x > 0.0 && span_y > 0.0) {
            return Err(VizError::InvalidArea(format!(
                "area has no projected extent: west={} east={} south={} north={}",
                area.west, area.east, area.south, area.north
            )));
        }

        let aspect = span_y / span_x;
        let mut box_w = box_width;
        let mut box_h = (box_width as f64 * aspect).round() as u32;
        if box_h > max_box_height {
            box_h = max_box_height;
            box_w = ((max_box_height as f64 / aspect).round() as u32).max(64);
        }
        debug!(box_w, box_h, "map drawable box");

        Ok(Self {
            area,
            proj,
            opts,
            min_x,
            max_x,
            min_y,
            max_y,
            box_w,
            box_h,
        })
    }

    pub fn projection(&self) -> &TransverseMercator {
        &self.proj
    }

    /// Height of the drawable box in pixels.
    pub fn graph_height(&self) -> u32 {
        self.box_h
    }

    /// Total panel size including margins.
    pub fn panel_size(&self) -> (u32, u32) {
        (
            self.box_w + MARGIN_LEFT + MARGIN_RIGHT,
            self.box_h + MARGIN_TOP + MARGIN_BOTTOM,
        )
    }

    /// Map a geographic point to panel pixel coordinates.
    fn to_px(&self, lon: f64, lat: f64) -> (f32, f32) {
        let (x, y) = self.proj.forward(lon, lat);
        let px = MARGIN_LEFT as f32
            + ((x - self.min_x) / (self.max_x - self.min_x) * self.box_w as f64) as f32;
        let py = MARGIN_TOP as f32
            + ((self.max_y - y) / (self.max_y - self.min_y) * self.box_h as f64) as f32;
        (px, py)
    }

    fn in_box(&self, px: f32, py: f32) -> bool {
        px >= MARGIN_LEFT as f32
            && px <= (MARGIN_LEFT + self.box_w) as f32
            && py >= MARGIN_TOP as f32
            && py <= (MARGIN_TOP + self.box_h) as f32
    }

    /// Compose the full panel.
    pub fn render(
        &self,
        labels: &LabelSet,
        background: &dyn BackgroundProvider,
    ) -> VizResult<Pixmap> {
        let (panel_w, panel_h) = self.panel_size();
        let mut pixmap = Pixmap::new(panel_w, panel_h)
            .ok_or_else(|| VizError::Render(format!("bad panel size {}x{}", panel_w, panel_h)))?;
        pixmap.fill(Color::WHITE);

        self.draw_background(&mut pixmap, background)?;
        self.draw_graticule(&mut pixmap);
        self.draw_box(&mut pixmap);
        self.draw_scale_bar(&mut pixmap);
        self.draw_labels(&mut pixmap, labels);
        self.draw_captions(&mut pixmap);

        Ok(pixmap)
    }

    fn draw_background(
        &self,
        pixmap: &mut Pixmap,
        background: &dyn BackgroundProvider,
    ) -> VizResult<()> {
        let extents = (self.min_x, self.max_x, self.min_y, self.max_y);
        let Some(buf) = background.render(&self.proj, extents, self.box_w, self.box_h) else {
            debug!("no background imagery for area, leaving box blank");
            return Ok(());
        };

        let tile = Pixmap::from_vec(
            buf,
            tiny_skia::IntSize::from_wh(self.box_w, self.box_h)
                .ok_or_else(|| VizError::Render("zero-sized background tile".into()))?,
        )
        .ok_or_else(|| VizError::Render("background tile buffer mismatch".into()))?;

        pixmap.draw_pixmap(
            MARGIN_LEFT as i32,
            MARGIN_TOP as i32,
            tile.as_ref(),
            &tiny_skia::PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    fn stroke_path(&self, pixmap: &mut Pixmap, pb: PathBuilder, width: f32, color: [u8; 4]) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
        paint.anti_alias = true;
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    fn draw_box(&self, pixmap: &mut Pixmap) {
        let mut pb = PathBuilder::new();
        if let Some(rect) = Rect::from_xywh(
            MARGIN_LEFT as f32,
            MARGIN_TOP as f32,
            self.box_w as f32,
            self.box_h as f32,
        ) {
            pb.push_rect(rect);
        }
        self.stroke_path(pixmap, pb, 1.2, BLACK);
    }

    /// Graticule lines at nice lon/lat intervals, projected as curves,
    /// with optional tick marks and values along the bottom/left edges.
    fn draw_graticule(&self, pixmap: &mut Pixmap) {
        let lon_step = nice_interval(self.area.lon_width() / 8.0);
        let lat_step = nice_interval(self.area.lat_height() / 8.0);

        let grid_color = [90, 90, 90, 120];
        const SAMPLES: usize = 32;

        // Meridians
        let mut lon = (self.area.west / lon_step).ceil() * lon_step;
        while lon <= self.area.east + 1e-9 {
            let mut pb = PathBuilder::new();
            for s in 0..=SAMPLES {
                let lat =
                    self.area.south + s as f64 / SAMPLES as f64 * self.area.lat_height();
                let (px, py) = self.to_px(lon, lat);
                if s == 0 {
                    pb.move_to(px, py);
                } else {
                    pb.line_to(px, py);
                }
            }
            self.stroke_path(pixmap, pb, 0.8, grid_color);

            let (px, _) = self.to_px(lon, self.area.south);
            let bottom = (MARGIN_TOP + self.box_h) as f32;
            if self.opts.x_tick_marks {
                let mut pb = PathBuilder::new();
                pb.move_to(px, bottom);
                pb.line_to(px, bottom + TICK_LEN);
                self.stroke_path(pixmap, pb, 1.0, BLACK);
            }
            if self.opts.x_tick_values {
                let value = format_degrees(normalize_lon(lon));
                text::draw_text_centered(pixmap, px, bottom + TICK_LEN + 4.0, &value, TICK_FONT, BLACK);
            }

            lon += lon_step;
        }

        // Parallels
        let mut lat = (self.area.south / lat_step).ceil() * lat_step;
        while lat <= self.area.north + 1e-9 {
            let mut pb = PathBuilder::new();
            for s in 0..=SAMPLES {
                let lon =
                    self.area.west + s as f64 / SAMPLES as f64 * self.area.lon_width();
                let (px, py) = self.to_px(lon, lat);
                if s == 0 {
                    pb.move_to(px, py);
                } else {
                    pb.line_to(px, py);
                }
            }
            self.stroke_path(pixmap, pb, 0.8, grid_color);

            let (_, py) = self.to_px(self.area.west, lat);
            let left = MARGIN_LEFT as f32;
            if self.opts.y_tick_marks {
                let mut pb = PathBuilder::new();
                pb.move_to(left, py);
                pb.line_to(left - TICK_LEN, py);
                self.stroke_path(pixmap, pb, 1.0, BLACK);
            }
            if self.opts.y_tick_values {
                let value = format_degrees(lat);
                let w = text::text_width(&value, TICK_FONT);
                text::draw_text(
                    pixmap,
                    left - TICK_LEN - 4.0 - w,
                    py - TICK_FONT / 2.0,
                    &value,
                    TICK_FONT,
                    BLACK,
                );
            }

            lat += lat_step;
        }
    }

    /// Scale indicator: a bar of a round kilometer length in the lower
    /// left corner of the box.
    fn draw_scale_bar(&self, pixmap: &mut Pixmap) {
        let meters_per_px = (self.max_x - self.min_x) / self.box_w as f64;
        let target_km = meters_per_px * self.box_w as f64 / 5.0 / 1000.0;
        let km = nice_interval(target_km).max(0.001);
        let bar_px = (km * 1000.0 / meters_per_px) as f32;

        let x0 = MARGIN_LEFT as f32 + 12.0;
        let y0 = (MARGIN_TOP + self.box_h) as f32 - 14.0;

        let mut pb = PathBuilder::new();
        pb.move_to(x0, y0);
        pb.line_to(x0 + bar_px, y0);
        pb.move_to(x0, y0 - 4.0);
        pb.line_to(x0, y0 + 4.0);
        pb.move_to(x0 + bar_px, y0 - 4.0);
        pb.line_to(x0 + bar_px, y0 + 4.0);
        self.stroke_path(pixmap, pb, 1.5, BLACK);

        let caption = if km >= 1.0 {
            format!("{} KM", km.round() as i64)
        } else {
            format!("{} M", (km * 1000.0).round() as i64)
        };
        text::draw_text(pixmap, x0 + 4.0, y0 - 4.0 - TICK_FONT, &caption, TICK_FONT, BLACK);
    }

    fn draw_labels(&self, pixmap: &mut Pixmap, labels: &LabelSet) {
        let marker_color = [200, 30, 30, 255];
        for label in labels.iter() {
            let (px, py) = self.to_px(label.lon, label.lat);
            if !self.in_box(px, py) {
                continue;
            }

            // Marker triangle at the station position
            let mut pb = PathBuilder::new();
            pb.move_to(px, py - 4.0);
            pb.line_to(px - 4.0, py + 3.0);
            pb.line_to(px + 4.0, py + 3.0);
            pb.close();
            let mut paint = Paint::default();
            paint.set_color_rgba8(
                marker_color[0],
                marker_color[1],
                marker_color[2],
                marker_color[3],
            );
            paint.anti_alias = true;
            if let Some(path) = pb.finish() {
                pixmap.fill_path(
                    &path,
                    &paint,
                    tiny_skia::FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }

            text::draw_text(pixmap, px + 6.0, py - LABEL_FONT / 2.0, &label.key, LABEL_FONT, BLACK);
        }
    }

    fn draw_captions(&self, pixmap: &mut Pixmap) {
        if self.opts.x_units {
            let cx = MARGIN_LEFT as f32 + self.box_w as f32 / 2.0;
            let y = (MARGIN_TOP + self.box_h) as f32 + TICK_LEN + TICK_FONT + 12.0;
            text::draw_text_centered(pixmap, cx, y, "Longitude", CAPTION_FONT, BLACK);
        }
        if self.opts.y_units {
            // Drawn above the box, flush with the left axis; the panel
            // has no room for rotated text in this style.
            text::draw_text(
                pixmap,
                4.0,
                MARGIN_TOP as f32 - CAPTION_FONT - 6.0,
                "Latitude",
                CAPTION_FONT,
                BLACK,
            );
        }
    }
}

/// Round an interval up to a "nice" value: 1, 2, 2.5, or 5 times a
/// power of ten.
pub(crate) fn nice_interval(raw: f64) -> f64 {
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    for mult in [1.0, 2.0, 2.5, 5.0, 10.0] {
        let candidate = mult * magnitude;
        if candidate >= raw - 1e-12 {
            return candidate;
        }
    }
    10.0 * magnitude
}

/// Wrap a longitude into [-180, 180] for display.
fn normalize_lon(lon: f64) -> f64 {
    let mut lon = lon;
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

/// Format a degree value compactly for tick labels.
fn format_degrees(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        let s = format!("{:.3}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
