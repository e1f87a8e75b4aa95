use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use mindful_track::config::AppConfig;
use mindful_track::engagement::EngagementCalculator;
use mindful_track::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "MindfulTrack",
    about = "Score event engagement and recommend mentors from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Combine three sub-scores into an engagement score using the configured weights
    Score(ScoreArgs),
    /// Seed an in-memory event and print its leaderboard and mentor matches
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Attendance sub-score (0-100)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) attendance: f64,
    /// Participation sub-score (0-100)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) participation: f64,
    /// Resource usage sub-score (0-100)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) resources: f64,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Demo(args) => run_demo(args),
    }
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let calculator = EngagementCalculator::new(config.engagement.weights);
    let score = calculator.calculate(args.attendance, args.participation, args.resources)?;

    let weights = calculator.weights();
    println!("Engagement score: {score:.2}");
    println!(
        "  attendance {:.1} x {:.2} | participation {:.1} x {:.2} | resources {:.1} x {:.2}",
        args.attendance,
        weights.attendance(),
        args.participation,
        weights.participation(),
        args.resources,
        weights.resources()
    );
    Ok(())
}
