use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use sheaf::{
    read_checkpoint, BatchJob, Config, DocumentSource, DocxImporter, Manifest, OpenAiClient,
    PollOptions, PromptBuilder, ResultSink, S3Store,
};

#[derive(Parser)]
#[command(name = "sheaf", about = "Batch document structuring against an LLM batch API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download docx documents named by a manifest and store their text
    Import {
        /// Path to the headerless id,site,url manifest
        manifest: PathBuf,
    },
    /// Build a batch from the raw-documents folder and submit it
    Submit {
        /// Folder of raw documents (defaults to the configured raw-data folder)
        #[arg(long)]
        folder: Option<String>,
        /// Directory receiving the job-id checkpoint file
        #[arg(long, default_value = ".")]
        checkpoint_dir: PathBuf,
    },
    /// Poll a batch job once and print its status
    Status {
        /// Job id, or a path to a checkpoint file written by submit
        job: String,
    },
    /// Wait for a batch job to finish and persist its output
    Retrieve {
        /// Job id, or a path to a checkpoint file written by submit
        job: String,
    },
    /// Submit, wait, and persist in one invocation
    Run {
        #[arg(long)]
        folder: Option<String>,
        #[arg(long, default_value = ".")]
        checkpoint_dir: PathBuf,
    },
}

/// Accept either a literal job id or a checkpoint file path.
fn resolve_job_id(job: &str) -> anyhow::Result<String> {
    let path = PathBuf::from(job);
    if path.is_file() {
        Ok(read_checkpoint(&path)?)
    } else {
        Ok(job.to_string())
    }
}

fn client(config: &Config) -> OpenAiClient {
    let client = OpenAiClient::new(&config.api.api_key);
    match &config.api.organization_id {
        Some(organization) => client.with_organization(organization),
        None => client,
    }
}

fn poll_options(config: &Config) -> PollOptions {
    PollOptions {
        interval: Duration::from_secs(config.poll.interval_secs),
        max_attempts: config.poll.max_attempts,
    }
}

async fn build_entries(
    config: &Config,
    store: &S3Store,
    folder: &str,
) -> anyhow::Result<Vec<sheaf::BatchRequestEntry>> {
    let source = DocumentSource::new(store.clone());
    let documents = source.gather(folder).await?;
    let builder = PromptBuilder::new(&config.api.completions_model);
    Ok(documents
        .iter()
        .map(|document| builder.build(&document.id, &document.content))
        .collect())
}

async fn retrieve_and_store(
    config: &Config,
    store: &S3Store,
    job: &mut BatchJob<OpenAiClient>,
) -> anyhow::Result<()> {
    let status = job.await_completion(poll_options(config)).await?;
    println!("terminal status: {status}");

    let output = job.retrieve_output().await?;
    let sink = ResultSink::new(store.clone(), config.folders.batch_output.clone());
    let job_id = job.job_id().unwrap_or_default().to_string();
    let key = sink.store(&job_id, &output).await?;
    println!("output stored at {key}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sheaf=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let store = S3Store::new(&config.storage).await;

    match cli.command {
        Command::Import { manifest } => {
            let text = std::fs::read_to_string(&manifest)?;
            let manifest = Manifest::parse(&text)?;
            let importer = DocxImporter::new(store, config.folders.raw_data.clone());
            let stored = importer.import(&manifest).await?;
            println!("imported {stored} documents");
        }
        Command::Submit {
            folder,
            checkpoint_dir,
        } => {
            let folder = folder.unwrap_or_else(|| config.folders.raw_data.clone());
            let entries = build_entries(&config, &store, &folder).await?;
            let mut job = BatchJob::new(client(&config), entries);
            let job_id = job.submit().await?;
            let checkpoint = job.write_checkpoint(&checkpoint_dir)?;
            println!("submitted batch {job_id}");
            println!("checkpoint written to {}", checkpoint.display());
        }
        Command::Status { job } => {
            let job_id = resolve_job_id(&job)?;
            let mut job = BatchJob::resume(client(&config), job_id);
            let status = job.poll().await?;
            println!("{status}");
        }
        Command::Retrieve { job } => {
            let job_id = resolve_job_id(&job)?;
            let mut job = BatchJob::resume(client(&config), job_id);
            retrieve_and_store(&config, &store, &mut job).await?;
        }
        Command::Run {
            folder,
            checkpoint_dir,
        } => {
            let folder = folder.unwrap_or_else(|| config.folders.raw_data.clone());
            let entries = build_entries(&config, &store, &folder).await?;
            let mut job = BatchJob::new(client(&config), entries);
            let job_id = job.submit().await?;
            job.write_checkpoint(&checkpoint_dir)?;
            println!("submitted batch {job_id}");
            retrieve_and_store(&config, &store, &mut job).await?;
        }
    }

    Ok(())
}
