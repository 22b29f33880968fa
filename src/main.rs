use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use incident_reporter::session::{self, SessionStore, SessionUser};
use incident_reporter::{
    CapturePipeline, Config, DraftHandoff, FileCamera, FixedLocator, IncidentDraft, IncidentFeed,
    PhotoRef, PlateDetectionClient, ReportError, SubmissionService,
};
use log::{debug, error, info, warn};
use std::path::PathBuf;

#[macro_use]
extern crate failure;

#[derive(Parser)]
#[command(name = "incident-reporter")]
#[command(about = "Report vehicle incidents from a plate photo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the plate in a photo and submit an incident for it.
    Report(ReportArgs),

    /// List incidents with their photo URLs.
    Incidents,

    /// Store a session token and user profile obtained from the backend.
    Login {
        #[arg(long)]
        token: String,

        /// User profile as returned by the login endpoint (JSON).
        #[arg(long)]
        user: String,
    },

    /// Forget the stored session.
    Logout,
}

#[derive(Debug, Clone, Args)]
struct ReportArgs {
    /// Photo of the plate.
    #[arg(long)]
    photo: PathBuf,

    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    lng: f64,

    /// Use this plate instead of the first detected one.
    #[arg(long)]
    plate: Option<String>,

    #[arg(long, default_value = "")]
    description: String,

    /// Evidence photo; repeat for more.
    #[arg(long)]
    evidence: Vec<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting incident-reporter");

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        if e.downcast_ref::<ReportError>().map_or(false, ReportError::is_retryable) {
            info!("Nothing was lost; run the same command again to retry");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), failure::Error> {
    let config = Config::from_env()?;
    match cli.command {
        Commands::Report(args) => report(&config, args).await,
        Commands::Incidents => list_incidents(&config).await,
        Commands::Login { token, user } => {
            let user: SessionUser = serde_json::from_str(&user)
                .map_err(|e| format_err!("Invalid user profile: {}", e))?;
            SessionStore::open(&config.session_db)?.save_login(&token, &user)?;
            Ok(())
        }
        Commands::Logout => {
            SessionStore::open(&config.session_db)?.logout()?;
            Ok(())
        }
    }
}

async fn report(config: &Config, args: ReportArgs) -> Result<(), failure::Error> {
    let client = config.http_client()?;
    let detector = PlateDetectionClient::new(client.clone(), &config.detector_host)?;
    let mut pipeline = CapturePipeline::new(
        FileCamera::new(&args.photo),
        FixedLocator::new(args.lat, args.lng),
        detector,
    );
    let handoff = pipeline.capture().await?.to_json()?;
    debug!("Handing off to the form: {}", handoff);
    let mut draft = IncidentDraft::from_handoff(DraftHandoff::from_json(&handoff)?)?;

    // The form is usable while the session is read.
    let session_task = tokio::spawn(session::load_session(config.session_db.clone()));
    if let Some(plate) = args.plate {
        draft.set_selected_plate(plate);
    }
    draft.set_description(args.description);
    for path in &args.evidence {
        let uri = path
            .to_str()
            .ok_or_else(|| format_err!("Evidence path {:?} is not valid UTF-8", path))?;
        draft.evidence_mut().add(PhotoRef::new(uri));
    }
    let token = match session_task.await {
        Ok(snapshot) => {
            draft.attach_reporter(snapshot.identity);
            snapshot.token
        }
        Err(e) => {
            warn!("Session unavailable: {}", e);
            None
        }
    };
    let service = SubmissionService::new(client, &config.backend_host)?.with_token(token);
    let message = service.submit(&draft).await?;
    println!("{}", message);
    Ok(())
}

async fn list_incidents(config: &Config) -> Result<(), failure::Error> {
    let feed = IncidentFeed::new(config.http_client()?, &config.backend_host)?;
    for incident in feed.fetch().await? {
        println!(
            "#{} {} {}",
            incident.id,
            incident.plate.as_deref().unwrap_or("-"),
            incident.description.as_deref().unwrap_or("")
        );
        if let Some(url) = &incident.principal_photo_url {
            println!("  photo: {}", url);
        }
        for url in &incident.evidence_photo_urls {
            println!("  evidence: {}", url);
        }
    }
    Ok(())
}
