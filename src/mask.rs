//! Polygon masks and map outlines read from shapefiles.

use crate::{
    error::{ReportError, Result},
    field::Grid,
    interpolation::wrap_longitudes,
    region::lon_180,
};
use geo::{BoundingRect, Contains, Coord, LineString, Point, Polygon, Rect};
use shapefile::Shape;
use std::path::Path;
use tracing::debug;

// Shapefile records list outer rings each followed by their holes.
macro_rules! rings_to_polygons {
    ($poly:expr) => {{
        let mut out: Vec<Polygon<f64>> = Vec::new();
        let mut exterior: Option<(LineString<f64>, Vec<LineString<f64>>)> = None;
        for ring in $poly.rings() {
            let line: LineString<f64> = ring
                .points()
                .iter()
                .map(|p| Coord { x: p.x, y: p.y })
                .collect();
            match ring {
                shapefile::PolygonRing::Outer(_) => {
                    if let Some((ext, holes)) = exterior.take() {
                        out.push(Polygon::new(ext, holes));
                    }
                    exterior = Some((line, Vec::new()));
                }
                shapefile::PolygonRing::Inner(_) => {
                    if let Some((_, holes)) = exterior.as_mut() {
                        holes.push(line);
                    }
                }
            }
        }
        if let Some((ext, holes)) = exterior {
            out.push(Polygon::new(ext, holes));
        }
        out
    }};
}

macro_rules! rings_to_lines {
    ($poly:expr) => {{
        $poly
            .rings()
            .iter()
            .map(|ring| {
                ring.points()
                    .iter()
                    .map(|p| Coord { x: p.x, y: p.y })
                    .collect::<LineString<f64>>()
            })
            .collect::<Vec<_>>()
    }};
}

macro_rules! parts_to_lines {
    ($line:expr) => {{
        $line
            .parts()
            .iter()
            .map(|part| {
                part.iter()
                    .map(|p| Coord { x: p.x, y: p.y })
                    .collect::<LineString<f64>>()
            })
            .collect::<Vec<_>>()
    }};
}

/// A set of polygons with holes, longitudes in -180..180.
#[derive(Debug, Clone, Default)]
pub struct BoundaryPolygon {
    // Each polygon with its bounding box for a quick rejection test.
    polygons: Vec<(Rect<f64>, Polygon<f64>)>,
}

impl BoundaryPolygon {
    /// Build from polygons already in memory.
    pub fn from_polygons<I>(polygons: I) -> Self
    where
        I: IntoIterator<Item = Polygon<f64>>,
    {
        let polygons = polygons
            .into_iter()
            .filter_map(|poly| poly.bounding_rect().map(|rect| (rect, poly)))
            .collect();

        BoundaryPolygon { polygons }
    }

    /// Read every polygon record from a shapefile. Other record types are ignored.
    pub fn from_shapefile(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::MissingFile(path.to_path_buf()));
        }

        let shapes = shapefile::read_shapes(path)?;
        let mut polygons = Vec::new();
        for shape in shapes {
            match shape {
                Shape::Polygon(poly) => polygons.extend(rings_to_polygons!(poly)),
                Shape::PolygonM(poly) => polygons.extend(rings_to_polygons!(poly)),
                Shape::PolygonZ(poly) => polygons.extend(rings_to_polygons!(poly)),
                _ => {}
            }
        }

        debug!(path = %path.display(), polygons = polygons.len(), "loaded boundary");

        if polygons.is_empty() {
            return Err(ReportError::InvalidInput(format!(
                "{} contains no polygons",
                path.display()
            )));
        }

        Ok(Self::from_polygons(polygons))
    }

    /// Iterate over the polygons.
    pub fn polygons(&self) -> impl Iterator<Item = &Polygon<f64>> {
        self.polygons.iter().map(|(_, poly)| poly)
    }

    /// Number of polygons.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Are there any polygons?
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Is the point strictly inside one of the polygons? Points on a boundary are outside.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let pnt = Point::new(lon_180(lon), lat);
        self.polygons.iter().any(|(rect, poly)| {
            let (min, max) = (rect.min(), rect.max());
            pnt.x() > min.x
                && pnt.x() < max.x
                && pnt.y() > min.y
                && pnt.y() < max.y
                && poly.contains(&pnt)
        })
    }

    /// Blank every grid point that is not strictly inside the boundary.
    ///
    /// The output grid has longitudes renormalized to -180..180 and sorted west to east. Values
    /// inside the boundary are unchanged.
    pub fn mask_outside(&self, grid: &Grid) -> Grid {
        let grid = wrap_longitudes(grid, -180.0);
        let lats = grid.lats().to_vec();
        let lons = grid.lons().to_vec();
        let (_, n_lon) = grid.shape();

        let values = grid
            .values()
            .iter()
            .enumerate()
            .map(|(k, &val)| {
                let (lat, lon) = (lats[k / n_lon], lons[k % n_lon]);
                if val.is_some() && self.contains(lon, lat) {
                    val
                } else {
                    optional::none()
                }
            })
            .collect();

        Grid::from_parts(lats, lons, values)
    }
}

/// Lines drawn on top of maps: coastlines, borders and outlines of regions.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    lines: Vec<LineString<f64>>,
}

impl Outline {
    /// Read polygon rings and polyline parts from a shapefile.
    pub fn from_shapefile(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::MissingFile(path.to_path_buf()));
        }

        let mut lines = Vec::new();
        for shape in shapefile::read_shapes(path)? {
            match shape {
                Shape::Polygon(poly) => lines.extend(rings_to_lines!(poly)),
                Shape::PolygonM(poly) => lines.extend(rings_to_lines!(poly)),
                Shape::PolygonZ(poly) => lines.extend(rings_to_lines!(poly)),
                Shape::Polyline(line) => lines.extend(parts_to_lines!(line)),
                Shape::PolylineM(line) => lines.extend(parts_to_lines!(line)),
                Shape::PolylineZ(line) => lines.extend(parts_to_lines!(line)),
                _ => {}
            }
        }

        debug!(path = %path.display(), lines = lines.len(), "loaded outline");
        Ok(Outline { lines })
    }

    /// The exterior and interior rings of a boundary.
    pub fn from_boundary(boundary: &BoundaryPolygon) -> Self {
        let lines = boundary
            .polygons()
            .flat_map(|poly| {
                std::iter::once(poly.exterior().clone()).chain(poly.interiors().to_vec())
            })
            .collect();

        Outline { lines }
    }

    /// Build from lines already in memory.
    pub fn from_lines(lines: Vec<LineString<f64>>) -> Self {
        Outline { lines }
    }

    /// The lines, longitudes as stored in the source.
    pub fn lines(&self) -> &[LineString<f64>] {
        &self.lines
    }
}
