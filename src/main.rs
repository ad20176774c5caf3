//! tenderwatch - Entry point for the tender screening command

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;

use tenderwatch::config::{self, EmbeddingBackend, MailCredentials, Settings};
use tenderwatch::embedding::{DistanceMetric, SimilarityRanker};
use tenderwatch::providers::ai::{EmbeddingProvider, OllamaEmbeddingProvider, OpenAiEmbeddingProvider};
use tenderwatch::providers::email::{self as email, Mailer, OutgoingEmail, SmtpConfig, SmtpMailer};
use tenderwatch::providers::source::{CandidateSource, FileListingSource, HadListingSource};
use tenderwatch::services::{DigestBuilder, NotifyOutcome, Notifier, ScreeningError, SkipReason};
use tenderwatch::{ScreeningService, ScreeningSession};

/// Rank current public tenders against an institutional profile.
#[derive(Debug, Parser)]
#[command(name = "tenderwatch", version, about)]
struct Cli {
    /// Settings file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of best-ranked tenders to consider (1-10).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
    top_k: Option<u8>,

    /// Email the digest to this address.
    #[arg(long)]
    recipient: Option<String>,

    /// Comma-separated denylist terms, added to the configured ones.
    #[arg(long)]
    denylist: Option<String>,

    /// Profile text file used as the ranking query.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Best-match distance above which a low-confidence warning is shown.
    #[arg(long)]
    threshold: Option<f64>,

    /// Distance metric: cosine, L1, L2 or Linf.
    #[arg(long)]
    metric: Option<DistanceMetric>,

    /// Read a saved listing page (or one tender per line) instead of fetching it.
    #[arg(long)]
    source_file: Option<PathBuf>,

    /// Print the email instead of sending it.
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(top_k) = self.top_k {
            settings.screening.top_k = usize::from(top_k);
        }
        if let Some(ref recipient) = self.recipient {
            settings.notification.recipient = Some(recipient.clone());
        }
        if let Some(ref denylist) = self.denylist {
            let merged = match settings.screening.denylist.take() {
                Some(existing) => format!("{},{}", existing, denylist),
                None => denylist.clone(),
            };
            settings.screening.denylist = Some(merged);
        }
        if let Some(ref profile) = self.profile {
            settings.screening.profile_path = profile.clone();
        }
        if let Some(threshold) = self.threshold {
            settings.screening.low_confidence_threshold = threshold;
        }
        if let Some(metric) = self.metric {
            settings.screening.metric = metric;
        }
    }
}

/// Prints outgoing email instead of sending it.
struct PrintMailer;

#[async_trait]
impl Mailer for PrintMailer {
    async fn send(&self, email: &OutgoingEmail) -> email::Result<String> {
        println!("--- email to {} ---", email.to);
        println!("Subject: {}\n", email.subject);
        println!("{}", email.body);
        Ok("<dry-run>".to_string())
    }
}

fn embedding_provider(settings: &Settings) -> Result<Box<dyn EmbeddingProvider>> {
    let embedding = &settings.embedding;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(embedding.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let provider: Box<dyn EmbeddingProvider> = match embedding.provider {
        EmbeddingBackend::OpenAi => {
            let api_key = config::openai_api_key()?;
            let provider = match embedding.base_url {
                Some(ref url) => OpenAiEmbeddingProvider::custom(url, Some(api_key), &embedding.model),
                None => OpenAiEmbeddingProvider::openai(api_key, &embedding.model),
            };
            Box::new(provider.with_client(client))
        }
        EmbeddingBackend::Ollama => {
            let provider = match embedding.base_url {
                Some(ref url) => OllamaEmbeddingProvider::with_url(url, &embedding.model),
                None => OllamaEmbeddingProvider::new(&embedding.model),
            };
            Box::new(provider.with_client(client))
        }
    };
    Ok(provider)
}

fn mailer(settings: &Settings, dry_run: bool) -> Result<Box<dyn Mailer>> {
    if dry_run || settings.notification.recipient.is_none() {
        return Ok(Box::new(PrintMailer));
    }

    let notification = &settings.notification;
    let creds = MailCredentials::from_env()?;
    let host = creds
        .smtp_server
        .clone()
        .or_else(|| notification.smtp_host.clone())
        .context("no SMTP server configured (set SMTP_SERVER)")?;

    let mut smtp = if notification.use_tls {
        SmtpConfig::tls(host, creds.email, creds.password)
    } else {
        SmtpConfig::starttls(host, creds.email, creds.password)
    };
    smtp.port = notification.smtp_port;
    Ok(Box::new(SmtpMailer::new(
        smtp.with_message_id_domain(&notification.message_id_domain),
    )))
}

fn source(settings: &Settings, cli: &Cli) -> Box<dyn CandidateSource> {
    match cli.source_file {
        Some(ref path) => Box::new(FileListingSource::new(path, &settings.source.text_column)),
        None => Box::new(HadListingSource::new(settings.listing_config())),
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let path = cli.config.clone().or_else(Settings::default_path);
    let mut settings = match path {
        Some(ref path) => Settings::load(path)?,
        None => Settings::default(),
    };
    cli.apply(&mut settings);
    settings.validate()?;

    let profile = settings.profile()?;
    println!("Institutional profile\n{}\n", profile.trim());

    let session = ScreeningSession::open(source(&settings, &cli).as_ref()).await;
    if let Some(message) = session.error() {
        println!("Something went wrong while reading the listing: {}", message);
        return Ok(ExitCode::SUCCESS);
    }
    println!(
        "{} tenders found ({})\n",
        session.len(),
        session.retrieved_at().format("%Y-%m-%d %H:%M UTC")
    );

    let notifier = Notifier::new(mailer(&settings, cli.dry_run)?)
        .with_settle_delay(Duration::from_secs(settings.notification.settle_secs));
    let service = ScreeningService::new(
        SimilarityRanker::new(embedding_provider(&settings)?, settings.ranker_config()),
        DigestBuilder::new(settings.digest_config()?),
        notifier,
        settings.email_template(),
    );

    let recipient = settings.notification.recipient.as_deref();
    let report = match service.run(&session, &profile, recipient).await {
        Ok(report) => report,
        Err(e) if e.is_defect() => return Err(e.into()),
        Err(e) => {
            tracing::error!(error = %e, "Screening failed");
            println!("{}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("Evaluation result\n");
    for block in report.digest.render() {
        println!("{}\n", block);
    }
    if report.digest.entries.is_empty() {
        println!("No tender passed the keyword filter.");
    }

    match report.notification {
        Err(e) => {
            println!("{}", ScreeningError::from(e).user_message());
            return Ok(ExitCode::FAILURE);
        }
        Ok(NotifyOutcome::Sent { message_id }) => {
            tracing::info!(message_id = %message_id, "Digest mailed");
            if let (false, Some(recipient)) = (cli.dry_run, recipient) {
                println!("Evaluation sent to {}.", recipient);
            }
        }
        Ok(NotifyOutcome::Skipped(SkipReason::InvalidAddress)) => {
            tracing::warn!("Recipient address is invalid, digest not mailed");
            println!("Please enter a valid email address.");
        }
        Ok(NotifyOutcome::Skipped(reason)) => {
            tracing::debug!(?reason, "Digest not mailed");
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting tenderwatch");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Application error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
