mod cli;

use clap::Parser;
use cli::{Cli, Commands};

use postforge::config::Config;
use postforge::handlers::HandlerRegistry;
use postforge::jobs::{JobKind, JobPayload, JobRouter};
use postforge::observability::init_tracing;
use postforge::pipeline::{ContentGenerationRequest, NicheAnalysisRequest};

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(&config.telemetry.log_filter);

    match cli.command {
        Commands::Server(args) => postforge::api::run(config, args.address).await?,
        Commands::Generate(args) => {
            let request = ContentGenerationRequest::builder()
                .topic(args.topic)
                .platform(args.platform)
                .tone(args.tone)
                .include_image(args.image)
                .build();
            run_once(&config, JobKind::ContentGeneration, request.into()).await?;
        }
        Commands::Analyze(args) => {
            let request = NicheAnalysisRequest::new(args.url);
            run_once(&config, JobKind::NicheAnalysis, request.into()).await?;
        }
    }

    Ok(())
}

/// Run a single job in-process and print the submission
async fn run_once(config: &Config, kind: JobKind, payload: JobPayload) -> Result<(), AnyError> {
    let router = JobRouter::direct(HandlerRegistry::from_config(config)?);
    let submission = router.submit(kind, payload).await?;
    println!("{}", serde_json::to_string_pretty(&submission)?);
    Ok(())
}
