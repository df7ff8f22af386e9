//! Command line entry point: draw the realtime charts, build the decks.

use clap::{Args, Parser, Subcommand};
use enso_report::{
    charts::{self, ChartSet},
    deck::{realtime_deck, realtime_deck_path, skill_deck, skill_deck_path},
    ForecastMonth, ReportConfig, Result,
};
use std::{error::Error, path::PathBuf, process::ExitCode};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "enso-report",
    version,
    about = "Charts and slide decks for the monthly ENSO forecast briefing"
)]
struct Cli {
    /// TOML configuration file. Defaults to ./enso-report.toml if present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Niño3.4, Niño3, Niño4 and Niño1+2 index plumes.
    Nino(Start),
    /// EMI, DMI, WIO and EIO index plumes.
    CpIod(Start),
    /// Observed and forecast SSTA along the equatorial Pacific.
    SstaEvolution(Start),
    /// Seasonal mean SSTA maps.
    SstaGlobal(Start),
    /// Geopotential height and wind anomalies at 850, 500 and 200 hPa.
    HgtUv(Start),
    /// Precipitation and surface temperature anomalies, global.
    PrecipLand(Start),
    /// Precipitation and surface temperature anomalies over China.
    PrecipChina(Start),
    /// Every realtime chart.
    All(Start),
    /// The realtime slide deck from previously drawn charts.
    Deck(Start),
    /// The hindcast skill charts.
    SkillCharts,
    /// The hindcast skill slide deck.
    SkillDeck,
}

/// The forecast start month.
#[derive(Args, Debug)]
struct Start {
    /// Four digit year.
    year: i32,
    /// Month, 1 through 12.
    month: u32,
}

impl Start {
    fn anchor(&self) -> Result<ForecastMonth> {
        ForecastMonth::new(self.year, self.month)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ReportConfig::load_or_default(cli.config.as_deref())?;

    let draw = |set: ChartSet, start: &Start| -> Result<()> {
        let written = set.render(&config, start.anchor()?)?;
        info!(charts = written.len(), "done");
        Ok(())
    };

    match cli.command {
        Command::Nino(start) => draw(ChartSet::Nino, &start),
        Command::CpIod(start) => draw(ChartSet::CpIod, &start),
        Command::SstaEvolution(start) => draw(ChartSet::SstaEvolution, &start),
        Command::SstaGlobal(start) => draw(ChartSet::SstaGlobal, &start),
        Command::HgtUv(start) => draw(ChartSet::HgtUv, &start),
        Command::PrecipLand(start) => draw(ChartSet::PrecipTempLand, &start),
        Command::PrecipChina(start) => draw(ChartSet::PrecipTempChina, &start),
        Command::All(start) => {
            let written = charts::all(&config, start.anchor()?)?;
            info!(charts = written.len(), "done");
            Ok(())
        }
        Command::Deck(start) => {
            let anchor = start.anchor()?;
            let issued = chrono::Local::now().date_naive();
            let deck = realtime_deck(&config, anchor, issued);
            deck.write(&realtime_deck_path(&config.output.deck_dir, anchor))
        }
        Command::SkillCharts => {
            let written = charts::skill_charts(&config)?;
            info!(charts = written.len(), "done");
            Ok(())
        }
        Command::SkillDeck => {
            let issued = chrono::Local::now().date_naive();
            skill_deck(&config, issued).write(&skill_deck_path(&config.output.deck_dir))
        }
    }
}
