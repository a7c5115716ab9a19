use std::sync::Arc;

use clap::{Parser, ValueEnum};
use recalc::{RecalcError, Result, render_summary};
use sqlx::postgres::PgPoolOptions;
use storage::{
    models::{RaceId, ResultSelection},
    repository::{PgProfileRepository, PgResultRepository},
    services::{FormulaChoice, LinearPoints, PointsFormula, PointsRecalculator, RankingEngine},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "recalculate")]
#[command(about = "Recompute stored leaderboard points from current rankings", long_about = None)]
#[command(version)]
struct Cli {
    /// Which result kinds to recalculate
    #[arg(long = "type", value_enum, default_value_t = Selection::All)]
    selection: Selection,

    /// Restrict to a single race
    #[arg(long)]
    race: Option<RaceId>,

    /// Overwrite points that are already set
    #[arg(long)]
    force: bool,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Points formula: linear (winner/step/floor) or field-size
    #[arg(long, env = "POINTS_FORMULA", value_enum, default_value_t = Formula::Linear)]
    formula: Formula,

    #[arg(long, env = "POINTS_WINNER", default_value_t = 100)]
    winner_points: i32,

    #[arg(long, env = "POINTS_STEP", default_value_t = 1)]
    points_step: i32,

    #[arg(long, env = "POINTS_FLOOR", default_value_t = 1)]
    points_floor: i32,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Selection {
    Individual,
    Team,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Formula {
    Linear,
    FieldSize,
}

impl From<Formula> for FormulaChoice {
    fn from(formula: Formula) -> Self {
        match formula {
            Formula::Linear => FormulaChoice::Linear,
            Formula::FieldSize => FormulaChoice::FieldSize,
        }
    }
}

impl From<Selection> for ResultSelection {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::Individual => ResultSelection::Individual,
            Selection::Team => ResultSelection::Team,
            Selection::All => ResultSelection::All,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("recalculate={},recalc={},storage={}", log_level, log_level, log_level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        tracing::error!("Recalculation failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let formula = points_formula(&cli)?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&cli.database_url)
        .await?;

    let engine = RankingEngine::new(
        Arc::new(PgResultRepository::new(pool.clone())),
        Arc::new(PgProfileRepository::new(pool)),
    );
    let recalculator = PointsRecalculator::new(engine, formula);

    let report = recalculator
        .recalculate(cli.race, cli.selection.into(), cli.force)
        .await?;

    print!("{}", render_summary(&report));

    Ok(())
}

fn points_formula(cli: &Cli) -> Result<Arc<dyn PointsFormula>> {
    let choice = FormulaChoice::from(cli.formula);
    let linear = match choice {
        FormulaChoice::Linear => linear_points(cli)?,
        FormulaChoice::FieldSize => LinearPoints::default(),
    };

    tracing::info!("Using {:?} points formula", choice);
    Ok(choice.build(linear))
}

fn linear_points(cli: &Cli) -> Result<LinearPoints> {
    if cli.points_step < 0 {
        return Err(RecalcError::FormulaError(format!(
            "points step must not be negative, got {}",
            cli.points_step
        )));
    }
    if cli.points_floor > cli.winner_points {
        return Err(RecalcError::FormulaError(format!(
            "points floor {} is above winner points {}",
            cli.points_floor, cli.winner_points
        )));
    }

    Ok(LinearPoints {
        winner: cli.winner_points,
        step: cli.points_step,
        floor: cli.points_floor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        let mut argv = vec!["recalculate", "--database-url", "postgres://localhost/test"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.selection, Selection::All);
        assert_eq!(cli.race, None);
        assert!(!cli.force);
        assert_eq!(cli.formula, Formula::Linear);
        assert_eq!(linear_points(&cli).unwrap(), LinearPoints::default());
    }

    #[test]
    fn test_type_and_race_flags() {
        let cli = parse(&["--type=team", "--race=4", "--force"]).unwrap();
        assert_eq!(ResultSelection::from(cli.selection), ResultSelection::Team);
        assert_eq!(cli.race, Some(4));
        assert!(cli.force);
    }

    #[test]
    fn test_unknown_type_is_usage_error() {
        assert!(parse(&["--type=relay"]).is_err());
    }

    #[test]
    fn test_floor_above_winner_is_rejected() {
        let cli = parse(&["--winner-points", "10", "--points-floor", "20"]).unwrap();
        assert!(matches!(
            points_formula(&cli),
            Err(RecalcError::FormulaError(_))
        ));
    }

    #[test]
    fn test_field_size_formula_flag() {
        let cli = parse(&["--formula", "field-size"]).unwrap();
        let formula = points_formula(&cli).unwrap();

        assert_eq!(formula.points(1, 12), 12);
        assert_eq!(formula.points(12, 12), 1);
    }
}
