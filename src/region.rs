//! Rectangular latitude/longitude boxes used to define climate indices.

use crate::error::{ReportError, Result};
use std::fmt;

const EDGE_TOLERANCE: f64 = 1.0e-6;

/// A named latitude/longitude box, inclusive on all four edges.
///
/// Longitudes are expressed in the 0..360 convention. Grid longitudes in any convention are
/// mapped into 0..360 before they are compared with the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBox {
    /// Short name used in logs and error messages.
    pub name: &'static str,
    /// Southern edge in degrees north.
    pub lat_min: f64,
    /// Northern edge in degrees north.
    pub lat_max: f64,
    /// Western edge in degrees east, 0..360.
    pub lon_min: f64,
    /// Eastern edge in degrees east, 0..360.
    pub lon_max: f64,
}

/// Niño3.4: 5S-5N, 170W-120W.
pub const NINO34: RegionBox = RegionBox::new("Nino3.4", -5.0, 5.0, 190.0, 240.0);
/// Niño3: 5S-5N, 150W-90W.
pub const NINO3: RegionBox = RegionBox::new("Nino3", -5.0, 5.0, 210.0, 270.0);
/// Niño4: 5S-5N, 160E-150W.
pub const NINO4: RegionBox = RegionBox::new("Nino4", -5.0, 5.0, 160.0, 210.0);
/// Niño1+2: 10S-0, 90W-80W.
pub const NINO12: RegionBox = RegionBox::new("Nino1+2", -10.0, 0.0, 270.0, 280.0);
/// Western tropical Indian Ocean pole of the dipole mode index.
pub const WIO: RegionBox = RegionBox::new("WIO", -10.0, 10.0, 50.0, 70.0);
/// Eastern tropical Indian Ocean pole of the dipole mode index.
pub const EIO: RegionBox = RegionBox::new("EIO", -10.0, 0.0, 90.0, 110.0);
/// Central Pacific box of the El Niño Modoki index.
pub const EMI_A: RegionBox = RegionBox::new("EMI-A", -10.0, 10.0, 165.0, 220.0);
/// Eastern Pacific box of the El Niño Modoki index.
pub const EMI_B: RegionBox = RegionBox::new("EMI-B", -15.0, 5.0, 250.0, 290.0);
/// Western Pacific box of the El Niño Modoki index.
pub const EMI_C: RegionBox = RegionBox::new("EMI-C", -10.0, 20.0, 125.0, 145.0);

impl RegionBox {
    /// Create a new box.
    pub const fn new(
        name: &'static str,
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    ) -> Self {
        RegionBox {
            name,
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Is this latitude inside the box (edges included)?
    #[inline]
    pub fn contains_lat(&self, lat: f64) -> bool {
        lat >= self.lat_min - EDGE_TOLERANCE && lat <= self.lat_max + EDGE_TOLERANCE
    }

    /// Is this longitude, in any convention, inside the box (edges included)?
    #[inline]
    pub fn contains_lon(&self, lon: f64) -> bool {
        let lon = lon_0_360(lon);
        lon >= self.lon_min - EDGE_TOLERANCE && lon <= self.lon_max + EDGE_TOLERANCE
    }

    /// Is the point inside the box?
    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.contains_lat(lat) && self.contains_lon(lon)
    }

    /// Indexes of the latitude and longitude coordinates that fall inside the box.
    ///
    /// A box that selects no coordinates along either axis is an error, a box that selects only
    /// missing values is not.
    pub fn select(&self, lats: &[f64], lons: &[f64]) -> Result<(Vec<usize>, Vec<usize>)> {
        let lat_idx: Vec<usize> = lats
            .iter()
            .enumerate()
            .filter(|(_, lat)| self.contains_lat(**lat))
            .map(|(i, _)| i)
            .collect();

        let lon_idx: Vec<usize> = lons
            .iter()
            .enumerate()
            .filter(|(_, lon)| self.contains_lon(**lon))
            .map(|(i, _)| i)
            .collect();

        if lat_idx.is_empty() || lon_idx.is_empty() {
            return Err(ReportError::EmptyRegion(self.to_string()));
        }

        Ok((lat_idx, lon_idx))
    }
}

impl fmt::Display for RegionBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({}..{}N, {}..{}E)",
            self.name, self.lat_min, self.lat_max, self.lon_min, self.lon_max
        )
    }
}

/// Map a longitude into 0..360.
#[inline]
pub fn lon_0_360(lon: f64) -> f64 {
    let lon = lon.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if lon >= 360.0 {
        0.0
    } else {
        lon
    }
}

/// Map a longitude into -180..180.
#[inline]
pub fn lon_180(lon: f64) -> f64 {
    let lon = lon_0_360(lon);
    if lon >= 180.0 {
        lon - 360.0
    } else {
        lon
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_edges_are_inclusive() {
        assert!(NINO34.contains(-5.0, 190.0));
        assert!(NINO34.contains(5.0, 240.0));
        assert!(!NINO34.contains(5.5, 200.0));
        assert!(!NINO34.contains(0.0, 240.5));
    }

    #[test]
    fn test_longitude_conventions() {
        // 170W is 190E
        assert!(NINO34.contains(0.0, -170.0));
        assert!(NINO12.contains(-5.0, -85.0));
        assert!(!NINO12.contains(-5.0, 85.0));

        assert_eq!(lon_0_360(-180.0), 180.0);
        assert_eq!(lon_0_360(360.0), 0.0);
        assert_eq!(lon_180(190.0), -170.0);
        assert_eq!(lon_180(180.0), -180.0);
        assert_eq!(lon_180(90.0), 90.0);
    }

    #[test]
    fn test_select() {
        let lats: Vec<f64> = (-10..=10).map(f64::from).collect();
        let lons: Vec<f64> = (0..360).step_by(10).map(f64::from).collect();

        let (lat_idx, lon_idx) = NINO34.select(&lats, &lons).unwrap();
        assert_eq!(lat_idx.len(), 11);
        assert_eq!(lon_idx.len(), 6); // 190, 200, ..., 240

        // No longitudes between 271 and 279 on a 10 degree grid except 270 and 280 on the edges
        let coarse: Vec<f64> = vec![0.0, 100.0, 200.0, 300.0];
        assert!(matches!(
            NINO12.select(&lats, &coarse),
            Err(ReportError::EmptyRegion(_))
        ));
    }
}
