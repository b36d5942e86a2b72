use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use voicecaster::artifact::{self, card};
use voicecaster::compose::{ComposeSdk, Publisher, SystemClipboard};
use voicecaster::{
    create_router, AppState, Artifact, CaptureSession, Config, FarcasterClient, ObjectStore,
    Profile, RecorderConfig,
};

#[derive(Parser)]
#[command(name = "voicecaster", about = "Record a voice clip and share it")]
struct Cli {
    /// Config file path (without extension)
    #[arg(long, default_value = "config/voicecaster")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the share-preview HTTP routes
    Serve,

    /// Record from the microphone and publish the result
    Cast {
        /// Render a self-contained video instead of a share link
        #[arg(long)]
        video: bool,

        /// Override the capture duration cap, in seconds
        #[arg(long)]
        max_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    info!("{} v{}", config.service.name, env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Cast { video, max_secs } => cast(config, video, max_secs).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.service.http.bind, config.service.http.port);
    let router = create_router(AppState::new(config));

    info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, router).await?;

    Ok(())
}

async fn cast(config: Config, video: bool, max_secs: Option<u64>) -> Result<()> {
    let sdk = FarcasterClient::new(&config.compose.endpoint)?;

    // Profile context is best-effort; recording works without it.
    let profile = if sdk.ready().await {
        match sdk.context().await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Profile context unavailable: {}", e);
                Profile::anonymous()
            }
        }
    } else {
        warn!("Compose bridge not ready; recording anonymously");
        Profile::anonymous()
    };

    if let Some(attribution) = profile.attribution() {
        info!("Recording as {}", attribution);
    }

    let avatar = match &profile.avatar_url {
        Some(url) => card::fetch_avatar(&reqwest::Client::new(), url).await,
        None => None,
    };

    let mut recorder_config = RecorderConfig::from(&config.capture);
    if let Some(secs) = max_secs {
        recorder_config.max_duration = std::time::Duration::from_secs(secs);
    }

    let session = CaptureSession::microphone(recorder_config)?;
    session.start().await?;

    println!("Recording... press Enter to stop.");
    wait_for_enter().await?;

    let recording = session.stop().await?;
    info!(
        "Recorded {:.1}s ({} bytes)",
        recording.duration_secs,
        recording.bytes.len()
    );

    let artifact = if video {
        let blob = artifact::render_video(&recording, avatar, &config.video).await?;
        Artifact::Video(blob)
    } else {
        let store = ObjectStore::new(&config.storage);
        let link = artifact::render_link(
            &store,
            &recording,
            &profile,
            &config.app.origin,
            avatar,
        )
        .await?;
        Artifact::Link(link)
    };

    let publisher = Publisher::new(
        Box::new(sdk),
        Box::new(SystemClipboard),
        config.app.download_dir.clone().into(),
    );

    let text = match profile.attribution() {
        Some(who) => format!("Voice message from {}", who),
        None => "Voice message".to_string(),
    };
    let report = publisher.publish(&artifact, &text).await;

    info!("Publish finished: {:?}", report.state);
    if let Some(detail) = report.detail {
        println!("{}", detail);
    }

    Ok(())
}

async fn wait_for_enter() -> Result<()> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| ())
    })
    .await??;
    Ok(())
}
