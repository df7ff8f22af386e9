//! Filled maps on a plate carrée projection with optional outlines, land fill and wind vectors.

use super::{
    contour::filled_bands, draw_frame, draw_label, draw_titles, local, style::ColorScale, Area,
    Chart, Ticks,
};
use crate::{
    error::{ReportError, Result},
    field::Grid,
    interpolation::{add_cyclic_point, wrap_longitudes},
    mask::{BoundaryPolygon, Outline},
};
use metfor::{MetersPSec, Quantity, WindUV};
use optional::Optioned;
use plotters::{
    prelude::*,
    style::text_anchor::{HPos, VPos},
};

/// Longitude and latitude limits of a map. Longitudes may run past 180 or 360 to center a map
/// away from the prime meridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExtent {
    /// Western edge.
    pub lon_min: f64,
    /// Eastern edge.
    pub lon_max: f64,
    /// Southern edge.
    pub lat_min: f64,
    /// Northern edge.
    pub lat_max: f64,
}

impl MapExtent {
    /// Global between 70S and 70N, centered on 200E.
    pub const PACIFIC_CENTERED: MapExtent = MapExtent::new(20.0, 380.0, -70.0, 70.0);
    /// Global between 70S and 70N, centered on the prime meridian.
    pub const GREENWICH_CENTERED: MapExtent = MapExtent::new(-180.0, 180.0, -70.0, 70.0);
    /// Mainland China.
    pub const CHINA: MapExtent = MapExtent::new(70.0, 140.0, 10.0, 60.0);
    /// The South China Sea inset.
    pub const SOUTH_CHINA_SEA: MapExtent = MapExtent::new(104.0, 125.0, 0.0, 25.0);

    /// Build an extent.
    pub const fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Self {
        MapExtent {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        }
    }

    fn wraps_globe(&self) -> bool {
        self.lon_max - self.lon_min >= 360.0 - 1.0e-9
    }

    fn contains(&self, (lon, lat): (f64, f64)) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }

    // Longitude offsets that could bring a shape in -180..360 onto this map.
    fn offsets(&self) -> [f64; 3] {
        [-360.0, 0.0, 360.0]
    }
}

/// Wind vectors drawn as arrows on a map.
#[derive(Debug, Clone)]
pub struct VectorLayer {
    u: Grid,
    v: Grid,
    lat_stride: usize,
    lon_stride: usize,
    scale: f64,
    reference: Option<f64>,
}

impl VectorLayer {
    /// Zonal and meridional components on the same grid.
    pub fn new(u: Grid, v: Grid) -> Result<Self> {
        if u.lats() != v.lats() || u.lons() != v.lons() {
            return Err(ReportError::ShapeMismatch(
                "wind components are on different grids".to_owned(),
            ));
        }

        Ok(VectorLayer {
            u,
            v,
            lat_stride: 4,
            lon_stride: 6,
            scale: 25.0,
            reference: None,
        })
    }

    /// Draw every `lat`-th row and `lon`-th column.
    pub fn with_stride(mut self, lat: usize, lon: usize) -> Self {
        self.lat_stride = lat.max(1);
        self.lon_stride = lon.max(1);
        self
    }

    /// The speed (m/s) of an arrow as long as the map is wide.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Add a key arrow of the given speed (m/s).
    pub fn with_reference(mut self, speed: f64) -> Self {
        self.reference = Some(speed);
        self
    }

    /// The subsampled arrows with both components present, as ((lon, lat), wind).
    pub fn arrows(&self) -> Vec<((f64, f64), WindUV<MetersPSec>)> {
        let (n_lat, n_lon) = self.u.shape();
        let mut arrows = vec![];

        for i in (0..n_lat).step_by(self.lat_stride) {
            for j in (0..n_lon).step_by(self.lon_stride) {
                if let (Some(u), Some(v)) =
                    (self.u.get(i, j).into_option(), self.v.get(i, j).into_option())
                {
                    let wind = WindUV {
                        u: MetersPSec(u),
                        v: MetersPSec(v),
                    };
                    arrows.push(((self.u.lons()[j], self.u.lats()[i]), wind));
                }
            }
        }

        arrows
    }
}

/// One map panel.
#[derive(Debug, Clone)]
pub struct MapPanel<'a> {
    title: String,
    extent: MapExtent,
    scale: &'a ColorScale,
    field: Option<&'a Grid>,
    land: Option<&'a BoundaryPolygon>,
    outlines: Vec<(&'a Outline, RGBColor)>,
    vectors: Option<&'a VectorLayer>,
    lon_ticks: Ticks,
    lat_ticks: Ticks,
}

impl<'a> MapPanel<'a> {
    /// An empty map with a title.
    pub fn new<S: Into<String>>(title: S, extent: MapExtent, scale: &'a ColorScale) -> Self {
        MapPanel {
            title: title.into(),
            extent,
            scale,
            field: None,
            land: None,
            outlines: vec![],
            vectors: None,
            lon_ticks: Ticks::default(),
            lat_ticks: Ticks::default(),
        }
    }

    /// Fill the map with a field, colored by the panel's scale.
    pub fn with_field(mut self, grid: &'a Grid) -> Self {
        self.field = Some(grid);
        self
    }

    /// Paint land white over the field with a grey coastline.
    pub fn with_land_fill(mut self, land: &'a BoundaryPolygon) -> Self {
        self.land = Some(land);
        self
    }

    /// Draw lines on top of the field.
    pub fn with_outline(mut self, outline: &'a Outline, color: RGBColor) -> Self {
        self.outlines.push((outline, color));
        self
    }

    /// Draw wind arrows on top of everything else.
    pub fn with_vectors(mut self, vectors: &'a VectorLayer) -> Self {
        self.vectors = Some(vectors);
        self
    }

    /// Ticks along the bottom (longitude) and left (latitude) edges.
    pub fn with_ticks(mut self, lon_ticks: Ticks, lat_ticks: Ticks) -> Self {
        self.lon_ticks = lon_ticks;
        self.lat_ticks = lat_ticks;
        self
    }

    /// Draw the panel filling `area`.
    pub fn draw(&self, area: &Area) -> Result<()> {
        let ext = self.extent;
        let top = if self.title.is_empty() {
            2
        } else {
            draw_titles(area, &self.title, None, 14)?;
            26
        };

        let mut chart = ChartBuilder::on(area)
            .margin_top(top)
            .margin_right(12)
            .margin_left(2)
            .margin_bottom(2)
            .x_label_area_size(if self.lon_ticks.major.is_empty() { 0 } else { 22 })
            .y_label_area_size(if self.lat_ticks.major.is_empty() { 0 } else { 40 })
            .build_cartesian_2d(ext.lon_min..ext.lon_max, ext.lat_min..ext.lat_max)?;

        if let Some(grid) = self.field {
            self.draw_bands(&mut chart, grid)?;
        }

        if let Some(land) = self.land {
            let grey = RGBColor(128, 128, 128);
            for poly in land.polygons() {
                let ring: Vec<(f64, f64)> = poly.exterior().coords().map(|c| (c.x, c.y)).collect();
                for offset in ext.offsets() {
                    let shifted: Vec<(f64, f64)> =
                        ring.iter().map(|&(x, y)| (x + offset, y)).collect();
                    let clipped = clip_ring(&shifted, &ext);
                    if clipped.len() >= 3 {
                        chart.draw_series(std::iter::once(Polygon::new(clipped, WHITE.filled())))?;
                    }
                    for piece in clip_polyline(&shifted, &ext) {
                        chart.draw_series(std::iter::once(PathElement::new(piece, grey)))?;
                    }
                }
            }
        }

        for (outline, color) in &self.outlines {
            for line in outline.lines() {
                let pts: Vec<(f64, f64)> = line.coords().map(|c| (c.x, c.y)).collect();
                for offset in ext.offsets() {
                    let shifted: Vec<(f64, f64)> =
                        pts.iter().map(|&(x, y)| (x + offset, y)).collect();
                    for piece in clip_polyline(&shifted, &ext) {
                        chart.draw_series(std::iter::once(PathElement::new(piece, *color)))?;
                    }
                }
            }
        }

        if let Some(vectors) = self.vectors {
            self.draw_arrows(area, &chart, vectors)?;
        }

        draw_frame(area, &chart, &self.lon_ticks, &self.lat_ticks, 11)?;

        Ok(())
    }

    fn draw_bands(&self, chart: &mut Chart, grid: &Grid) -> Result<()> {
        let ext = self.extent;
        let mut grid = wrap_longitudes(grid, ext.lon_min);
        if ext.wraps_globe() {
            grid = add_cyclic_point(&grid);
        }

        let (n_lat, _) = grid.shape();
        let rows: Vec<Vec<Optioned<f64>>> = (0..n_lat).map(|i| grid.row(i).to_vec()).collect();

        let colors = self.scale.colors();
        let polygons: Vec<_> = filled_bands(grid.lons(), grid.lats(), &rows, self.scale.levels())
            .into_iter()
            .filter_map(|(band, ring)| {
                let ring = clip_ring(&ring, &ext);
                (ring.len() >= 3).then(|| Polygon::new(ring, colors[band].filled()))
            })
            .collect();
        chart.draw_series(polygons)?;

        Ok(())
    }

    fn draw_arrows(&self, area: &Area, chart: &Chart, vectors: &VectorLayer) -> Result<()> {
        let ext = self.extent;
        let to_px = |pt: (f64, f64)| local(area, chart.backend_coord(&pt));
        let width = f64::from(to_px((ext.lon_max, ext.lat_min)).0 - to_px((ext.lon_min, ext.lat_min)).0);
        let px_per_speed = width / vectors.scale;

        for ((lon, lat), wind) in vectors.arrows() {
            let lon = match ext
                .offsets()
                .iter()
                .map(|off| lon + off)
                .find(|&l| ext.contains((l, lat)))
            {
                Some(l) => l,
                None => continue,
            };

            draw_arrow(area, to_px((lon, lat)), &wind, px_per_speed, true)?;
        }

        if let Some(speed) = vectors.reference {
            let (w, _) = area.dim_in_pixel();
            let key = WindUV {
                u: MetersPSec(speed),
                v: MetersPSec(0.0),
            };
            let len = (speed * px_per_speed).round() as i32;
            let tail = (w as i32 - 60 - len, 12);
            draw_arrow(area, tail, &key, px_per_speed, false)?;
            draw_label(
                area,
                &format!("{} m/s", speed),
                (tail.0 + len + 6, 12),
                12,
                (HPos::Left, VPos::Center),
            )?;
        }

        Ok(())
    }
}

// An arrow of the wind scaled to pixels. `centered` puts the midpoint at `at`, otherwise the
// tail.
fn draw_arrow(
    area: &Area,
    at: (i32, i32),
    wind: &WindUV<MetersPSec>,
    px_per_speed: f64,
    centered: bool,
) -> Result<()> {
    let (u, v) = (wind.u.unpack(), wind.v.unpack());
    let speed = u.hypot(v);
    if speed <= 0.0 {
        return Ok(());
    }

    // Screen y grows downward
    let (dx, dy) = (u * px_per_speed, -v * px_per_speed);
    let (x, y) = (f64::from(at.0), f64::from(at.1));
    let (tail, head) = if centered {
        ((x - dx / 2.0, y - dy / 2.0), (x + dx / 2.0, y + dy / 2.0))
    } else {
        ((x, y), (x + dx, y + dy))
    };

    let len = dx.hypot(dy);
    let barb = (0.35 * len).min(5.0);
    let angle = dy.atan2(dx);
    let wing = |rot: f64| {
        (
            (head.0 - barb * (angle + rot).cos()).round() as i32,
            (head.1 - barb * (angle + rot).sin()).round() as i32,
        )
    };

    let round = |p: (f64, f64)| (p.0.round() as i32, p.1.round() as i32);
    let style = BLACK.stroke_width(1);
    area.draw(&PathElement::new(vec![round(tail), round(head)], style))?;
    area.draw(&PathElement::new(vec![wing(0.45), round(head), wing(-0.45)], style))?;

    Ok(())
}

/// Clip a closed ring to the map extent (Sutherland-Hodgman).
pub fn clip_ring(ring: &[(f64, f64)], ext: &MapExtent) -> Vec<(f64, f64)> {
    // (axis, bound, keep values above the bound)
    let edges = [
        (0, ext.lon_min, true),
        (0, ext.lon_max, false),
        (1, ext.lat_min, true),
        (1, ext.lat_max, false),
    ];

    let coord = |p: (f64, f64), axis: usize| if axis == 0 { p.0 } else { p.1 };

    let mut out = ring.to_vec();
    for &(axis, bound, keep_above) in &edges {
        let input = std::mem::take(&mut out);
        let prev = match input.last() {
            Some(&p) => p,
            None => break,
        };

        let inside = |p: (f64, f64)| {
            if keep_above {
                coord(p, axis) >= bound
            } else {
                coord(p, axis) <= bound
            }
        };
        let cross = |a: (f64, f64), b: (f64, f64)| {
            let t = (bound - coord(a, axis)) / (coord(b, axis) - coord(a, axis));
            (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1))
        };

        let mut prev = prev;
        for &cur in &input {
            match (inside(cur), inside(prev)) {
                (true, true) => out.push(cur),
                (true, false) => {
                    out.push(cross(prev, cur));
                    out.push(cur);
                }
                (false, true) => out.push(cross(prev, cur)),
                (false, false) => {}
            }
            prev = cur;
        }
    }

    out
}

/// Clip an open line to the map extent, returning the pieces inside.
pub fn clip_polyline(line: &[(f64, f64)], ext: &MapExtent) -> Vec<Vec<(f64, f64)>> {
    let mut pieces = vec![];
    let mut current: Vec<(f64, f64)> = vec![];

    for w in line.windows(2) {
        match clip_segment(w[0], w[1], ext) {
            Some((a, b, enters, leaves)) => {
                if enters || current.is_empty() {
                    if current.len() >= 2 {
                        pieces.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(a);
                }
                current.push(b);
                if leaves {
                    pieces.push(std::mem::take(&mut current));
                }
            }
            None => {
                if current.len() >= 2 {
                    pieces.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }
    }
    if current.len() >= 2 {
        pieces.push(current);
    }

    pieces
}

// Liang-Barsky. Returns the clipped segment and whether it starts or ends on the boundary.
fn clip_segment(
    p0: (f64, f64),
    p1: (f64, f64),
    ext: &MapExtent,
) -> Option<((f64, f64), (f64, f64), bool, bool)> {
    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    let checks = [
        (-dx, p0.0 - ext.lon_min),
        (dx, ext.lon_max - p0.0),
        (-dy, p0.1 - ext.lat_min),
        (dy, ext.lat_max - p0.1),
    ];
    for &(p, q) in &checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }

    Some((
        (p0.0 + t0 * dx, p0.1 + t0 * dy),
        (p0.0 + t1 * dx, p0.1 + t1 * dy),
        t0 > 0.0,
        t1 < 1.0,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::render::{draw_svg, lat_label, lon_label, style::BLUE_WHITE_RED};
    use optional::some;
    use std::fs;

    #[test]
    fn test_clip_ring() {
        let ext = MapExtent::new(0.0, 10.0, 0.0, 10.0);
        let square = vec![(-5.0, -5.0), (5.0, -5.0), (5.0, 5.0), (-5.0, 5.0)];
        let clipped = clip_ring(&square, &ext);
        assert!(!clipped.is_empty());
        for &(x, y) in &clipped {
            assert!((0.0..=5.0).contains(&x));
            assert!((0.0..=5.0).contains(&y));
        }

        let outside = vec![(20.0, 20.0), (30.0, 20.0), (30.0, 30.0)];
        assert!(clip_ring(&outside, &ext).is_empty());
    }

    #[test]
    fn test_clip_polyline() {
        let ext = MapExtent::new(0.0, 10.0, 0.0, 10.0);
        // In, out, back in
        let line = vec![(1.0, 1.0), (5.0, 1.0), (15.0, 1.0), (15.0, 5.0), (5.0, 5.0)];
        let pieces = clip_polyline(&line, &ext);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0], vec![(1.0, 1.0), (5.0, 1.0), (10.0, 1.0)]);
        assert_eq!(pieces[1], vec![(10.0, 5.0), (5.0, 5.0)]);
    }

    #[test]
    fn test_arrows_subsampled() {
        let lats: Vec<f64> = (0..8).map(|i| f64::from(i) * 10.0 - 40.0).collect();
        let lons: Vec<f64> = (0..12).map(|j| f64::from(j) * 30.0).collect();
        let u = Grid::from_fn(lats.clone(), lons.clone(), |_, _| some(3.0));
        let v = Grid::from_fn(lats, lons, |_, _| some(-1.0));

        let layer = VectorLayer::new(u, v).unwrap();
        let arrows = layer.arrows();
        // rows 0 and 4, columns 0 and 6
        assert_eq!(arrows.len(), 4);
        assert_eq!(arrows[1].0, (180.0, -40.0));
        assert_eq!(arrows[0].1.u, MetersPSec(3.0));
    }

    #[test]
    fn test_map_panel_svg() {
        let lats: Vec<f64> = (-70..=70).step_by(10).map(f64::from).collect();
        let lons: Vec<f64> = (0..360).step_by(10).map(f64::from).collect();
        let grid = Grid::from_fn(lats, lons, |lat, lon| some((lon / 60.0).sin() * lat / 20.0));
        let scale = ColorScale::symmetric(3.6, 0.2, BLUE_WHITE_RED).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.svg");
        draw_svg(&path, (700, 400), |root| {
            MapPanel::new("SSTA 202403-202405 forecast", MapExtent::PACIFIC_CENTERED, &scale)
                .with_field(&grid)
                .with_ticks(
                    Ticks::at(&[60.0, 120.0, 180.0, 240.0, 300.0, 360.0], lon_label),
                    Ticks::at(&[-60.0, -30.0, 0.0, 30.0, 60.0], lat_label),
                )
                .draw(root)
        })
        .unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("SSTA 202403-202405 forecast"));
        assert!(svg.contains("120°W"));
        assert!(svg.contains("<polygon"));
    }
}
