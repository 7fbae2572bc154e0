use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use postforge::pipeline::Tone;
use postforge::platform::Platform;

#[derive(Parser, Debug)]
#[command(name = "postforge")]
#[command(about = "Social media content generation and niche analysis", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Server(ServerArgs),
    /// Generate one post and print it as JSON
    Generate(GenerateArgs),
    /// Analyze a website's niche and print the result as JSON
    Analyze(AnalyzeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (defaults to server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    #[arg(long)]
    pub topic: String,

    /// twitter, linkedin, instagram, facebook or tiktok
    #[arg(long)]
    pub platform: Platform,

    #[arg(long, default_value = "professional")]
    pub tone: Tone,

    /// Also generate an accompanying image
    #[arg(long)]
    pub image: bool,
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Absolute http(s) URL of the site to analyze
    #[arg(long)]
    pub url: String,
}
