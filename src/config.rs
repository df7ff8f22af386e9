//! Report configuration read from a TOML file.
//!
//! Every field has a default matching the conventional working directory layout, so an empty
//! file (or no file at all) describes a complete configuration:
//!
//! ```toml
//! [inputs]
//! observed_sst = "./tmp/HadISST_ssta_1x1.nc"
//!
//! [model]
//! name = "FGOALS-g3"
//! ```

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Default name of the configuration file, looked for in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "enso-report.toml";

/// Everything a report run needs to know about its surroundings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Input datasets.
    #[serde(default)]
    pub inputs: InputSettings,
    /// Shapefiles used for masks and map outlines.
    #[serde(default)]
    pub shapes: ShapeSettings,
    /// Where charts and decks are written.
    #[serde(default)]
    pub output: OutputSettings,
    /// The forecast system.
    #[serde(default)]
    pub model: ModelSettings,
    /// Title page text.
    #[serde(default)]
    pub deck: DeckSettings,
    /// Hindcast skill assessment inputs.
    #[serde(default)]
    pub skill: SkillSettings,
}

/// Paths of the NetCDF inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
    /// Observed monthly sea surface temperature anomalies (`sst`).
    #[serde(default = "default_observed_sst")]
    pub observed_sst: PathBuf,
    /// Ensemble mean ocean temperature anomalies (`thetao`).
    #[serde(default = "default_ocean_mme")]
    pub ocean_mme: PathBuf,
    /// Ocean temperature anomalies of each ensemble member.
    #[serde(default = "default_ensemble_members")]
    pub ensemble_members: Vec<PathBuf>,
    /// Ensemble mean atmosphere on pressure levels (`hgt`, `U`, `V`).
    #[serde(default = "default_atmosphere_4d")]
    pub atmosphere_4d: PathBuf,
    /// Ensemble mean single level atmosphere (`PRECT`, `ts`).
    #[serde(default = "default_atmosphere_3d")]
    pub atmosphere_3d: PathBuf,
}

impl Default for InputSettings {
    fn default() -> Self {
        InputSettings {
            observed_sst: default_observed_sst(),
            ocean_mme: default_ocean_mme(),
            ensemble_members: default_ensemble_members(),
            atmosphere_4d: default_atmosphere_4d(),
            atmosphere_3d: default_atmosphere_3d(),
        }
    }
}

fn default_observed_sst() -> PathBuf {
    PathBuf::from("./tmp/HadISST_ssta_1x1.nc")
}

fn default_ocean_mme() -> PathBuf {
    PathBuf::from("./tmp/thetao_MME.nc")
}

// Two initializations, each with two perturbations, from two physics versions.
fn default_ensemble_members() -> Vec<PathBuf> {
    ["F01", "F02", "A01", "A02"]
        .iter()
        .flat_map(|run| {
            ["C0100", "C0200"]
                .iter()
                .map(move |pert| PathBuf::from(format!("./tmp/thetao_{}_00_{}.nc", run, pert)))
        })
        .collect()
}

fn default_atmosphere_4d() -> PathBuf {
    PathBuf::from("./tmp/atm4D_MME.nc")
}

fn default_atmosphere_3d() -> PathBuf {
    PathBuf::from("./tmp/atm3D_MME.nc")
}

/// Paths of the shapefiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSettings {
    /// Global land polygons.
    #[serde(default = "default_land")]
    pub land: PathBuf,
    /// China boundary polygons, used as a mask.
    #[serde(default = "default_china")]
    pub china: PathBuf,
    /// China national and provincial outlines.
    #[serde(default = "default_china_outline")]
    pub china_outline: PathBuf,
    /// Tibetan Plateau outline.
    #[serde(default = "default_tibet")]
    pub tibet: PathBuf,
}

impl Default for ShapeSettings {
    fn default() -> Self {
        ShapeSettings {
            land: default_land(),
            china: default_china(),
            china_outline: default_china_outline(),
            tibet: default_tibet(),
        }
    }
}

fn default_land() -> PathBuf {
    PathBuf::from("./plot/land/ne_110m_land.shp")
}

fn default_china() -> PathBuf {
    PathBuf::from("./plot/china/china.shp")
}

fn default_china_outline() -> PathBuf {
    PathBuf::from("./plot/china/cnhimap.shp")
}

fn default_tibet() -> PathBuf {
    PathBuf::from("./plot/Tibet/Tibet.shp")
}

/// Output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Rendered charts, `<plot>_<YYYY>_<MM>.svg`.
    #[serde(default = "default_pic_dir")]
    pub pic_dir: PathBuf,
    /// Assembled slide decks.
    #[serde(default = "default_deck_dir")]
    pub deck_dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            pic_dir: default_pic_dir(),
            deck_dir: default_deck_dir(),
        }
    }
}

fn default_pic_dir() -> PathBuf {
    PathBuf::from("./pic")
}

fn default_deck_dir() -> PathBuf {
    PathBuf::from(".")
}

/// The forecast system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Name shown in legends and on the title page.
    #[serde(default = "default_model_name")]
    pub name: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            name: default_model_name(),
        }
    }
}

fn default_model_name() -> String {
    "FGOALS-g3".to_owned()
}

/// Text of the title and closing pages. Empty entries are left off the slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckSettings {
    /// System title, defaults to one built from the model name.
    #[serde(default)]
    pub title: Option<String>,
    /// Author list.
    #[serde(default)]
    pub authors: String,
    /// Affiliation printed under the authors.
    #[serde(default)]
    pub affiliation: String,
    /// Contact line on the closing page.
    #[serde(default)]
    pub contact: String,
}

/// Inputs and outputs of the hindcast skill assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSettings {
    /// Directory holding the skill charts.
    #[serde(default = "default_result_dir")]
    pub result_dir: PathBuf,
    /// Niño3.4 hindcasts, `start,lead1..leadN`.
    #[serde(default = "default_hindcast")]
    pub hindcast: PathBuf,
    /// Observed Niño3.4, `month,value`.
    #[serde(default = "default_observed_index")]
    pub observed: PathBuf,
}

impl Default for SkillSettings {
    fn default() -> Self {
        SkillSettings {
            result_dir: default_result_dir(),
            hindcast: default_hindcast(),
            observed: default_observed_index(),
        }
    }
}

fn default_result_dir() -> PathBuf {
    PathBuf::from("./result")
}

fn default_hindcast() -> PathBuf {
    PathBuf::from("./tmp/nino34_hindcast.csv")
}

fn default_observed_index() -> PathBuf {
    PathBuf::from("./tmp/nino34_observed.csv")
}

impl ReportConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReportError::MissingFile(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)?;
        let config: ReportConfig = toml::from_str(&contents)?;
        debug!(path = %path.display(), "loaded configuration");

        Ok(config)
    }

    /// Load the given file, or `enso-report.toml` from the working directory if it exists, or
    /// fall back to the defaults.
    ///
    /// An explicitly named file that does not exist is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)
            }
            None => {
                info!("no configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// The system title shown on the title pages.
    pub fn deck_title(&self) -> String {
        self.deck
            .title
            .clone()
            .unwrap_or_else(|| format!("基于{}动力模式的\nENSO预测系统", self.model.name))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: ReportConfig = toml::from_str("").unwrap();
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.model.name, "FGOALS-g3");
        assert_eq!(config.output.pic_dir, PathBuf::from("./pic"));
    }

    #[test]
    fn test_member_order() {
        let members = InputSettings::default().ensemble_members;
        assert_eq!(members.len(), 8);
        assert_eq!(members[0], PathBuf::from("./tmp/thetao_F01_00_C0100.nc"));
        assert_eq!(members[1], PathBuf::from("./tmp/thetao_F01_00_C0200.nc"));
        assert_eq!(members[7], PathBuf::from("./tmp/thetao_A02_00_C0200.nc"));
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[model]\nname = \"TEST-1\"\n\n[output]\npic_dir = \"/tmp/charts\"\n\n[deck]\nauthors = \"A. Author\""
        )
        .unwrap();

        let config = ReportConfig::from_file(file.path()).unwrap();
        assert_eq!(config.model.name, "TEST-1");
        assert_eq!(config.output.pic_dir, PathBuf::from("/tmp/charts"));
        assert_eq!(config.output.deck_dir, PathBuf::from("."));
        assert_eq!(config.deck.authors, "A. Author");
        assert_eq!(config.inputs, InputSettings::default());
        assert!(config.deck_title().contains("TEST-1"));
    }

    #[test]
    fn test_bad_files() {
        assert!(matches!(
            ReportConfig::from_file("no/such/config.toml"),
            Err(ReportError::MissingFile(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model\nname = 3").unwrap();
        assert!(matches!(
            ReportConfig::from_file(file.path()),
            Err(ReportError::Config(_))
        ));
    }
}
