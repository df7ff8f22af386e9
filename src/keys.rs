//! Enums used as keys for selecting indices, variables, and chart options.

use crate::region::{self, RegionBox};
use strum_macros::EnumIter;

/// Climate indices built from area means of sea surface temperature anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ClimateIndex {
    /// Niño3.4 index
    Nino34,
    /// Niño3 index
    Nino3,
    /// Niño4 index
    Nino4,
    /// Niño1+2 index
    Nino12,
    /// El Niño Modoki index, A - (B + C) / 2
    Emi,
    /// Western tropical Indian Ocean
    Wio,
    /// Eastern tropical Indian Ocean
    Eio,
    /// Dipole mode index, WIO - EIO
    Dmi,
}

impl ClimateIndex {
    /// Name used for the output file of this index's chart.
    pub fn plot_name(self) -> &'static str {
        use ClimateIndex::*;

        match self {
            Nino34 => "nino34",
            Nino3 => "nino3",
            Nino4 => "nino4",
            Nino12 => "nino12",
            Emi => "emi",
            Wio => "wio",
            Eio => "eio",
            Dmi => "dmi",
        }
    }

    /// Chart title.
    pub fn title(self) -> &'static str {
        use ClimateIndex::*;

        match self {
            Nino34 => "Niño3.4 index",
            Nino3 => "Niño3 index",
            Nino4 => "Niño4 index",
            Nino12 => "Niño1+2 index",
            Emi => "EMI index",
            Wio => "WIO index",
            Eio => "EIO index",
            Dmi => "Dipole mode index",
        }
    }

    /// The index as a weighted sum of box means.
    pub fn components(self) -> &'static [(f64, RegionBox)] {
        use ClimateIndex::*;

        match self {
            Nino34 => &[(1.0, region::NINO34)],
            Nino3 => &[(1.0, region::NINO3)],
            Nino4 => &[(1.0, region::NINO4)],
            Nino12 => &[(1.0, region::NINO12)],
            Emi => &[(1.0, region::EMI_A), (-0.5, region::EMI_B), (-0.5, region::EMI_C)],
            Wio => &[(1.0, region::WIO)],
            Eio => &[(1.0, region::EIO)],
            Dmi => &[(1.0, region::WIO), (-1.0, region::EIO)],
        }
    }

    /// The ENSO indices charted together.
    pub const NINO: [ClimateIndex; 4] = [
        ClimateIndex::Nino34,
        ClimateIndex::Nino3,
        ClimateIndex::Nino4,
        ClimateIndex::Nino12,
    ];

    /// The central Pacific and Indian Ocean indices charted together.
    pub const CP_IOD: [ClimateIndex; 4] = [
        ClimateIndex::Emi,
        ClimateIndex::Wio,
        ClimateIndex::Eio,
        ClimateIndex::Dmi,
    ];
}

/// Variables read from the input datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum FieldVariable {
    /// Observed sea surface temperature anomaly (K).
    ObservedSst,
    /// Modelled ocean temperature anomaly, read at the surface level (K).
    OceanTemperature,
    /// Geopotential height anomaly (gpm).
    Height,
    /// Zonal wind anomaly (m/s).
    UWind,
    /// Meridional wind anomaly (m/s).
    VWind,
    /// Total precipitation rate anomaly, stored in m/s and displayed in mm/day.
    Precipitation,
    /// Surface temperature anomaly (K).
    SurfaceTemperature,
}

impl FieldVariable {
    /// Variable name inside the dataset.
    pub fn dataset_name(self) -> &'static str {
        use FieldVariable::*;

        match self {
            ObservedSst => "sst",
            OceanTemperature => "thetao",
            Height => "hgt",
            UWind => "U",
            VWind => "V",
            Precipitation => "PRECT",
            SurfaceTemperature => "ts",
        }
    }

    /// Multiply stored values by this to get display units.
    pub fn display_scale(self) -> f64 {
        match self {
            // m/s -> mm/day
            FieldVariable::Precipitation => 86_400_000.0,
            _ => 1.0,
        }
    }

    /// Display units.
    pub fn display_units(self) -> &'static str {
        use FieldVariable::*;

        match self {
            ObservedSst | OceanTemperature | SurfaceTemperature => "K",
            Height => "gpm",
            UWind | VWind => "m/s",
            Precipitation => "mm/day",
        }
    }
}

/// Where the legend goes on an index chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendCorner {
    /// Used when the observed history is warm (mean >= 0), the curves sit high.
    LowerLeft,
    /// Used when the observed history is cool or unknown.
    UpperLeft,
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_plot_names_unique() {
        let mut names: Vec<_> = ClimateIndex::iter().map(|i| i.plot_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_weights() {
        for idx in ClimateIndex::iter() {
            let comps = idx.components();
            assert!(!comps.is_empty());
            // Every index leads with a positive unit weight
            assert_eq!(comps[0].0, 1.0);
        }

        let emi_sum: f64 = ClimateIndex::Emi.components().iter().map(|(w, _)| w).sum();
        assert_eq!(emi_sum, 0.0);
        let dmi_sum: f64 = ClimateIndex::Dmi.components().iter().map(|(w, _)| w).sum();
        assert_eq!(dmi_sum, 0.0);
    }
}
