//! `medrag` — command-line interface for the MedRAG medical Q&A system.
//!
//! Subcommands: `collect` fetches PubMed article metadata, `patient`
//! manages the record store, `ask` answers one question, and `chat`
//! starts an interactive session.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use medrag_patient::PatientStore;
use medrag_rag::openai::{OpenAiEmbeddings, OpenAiGenerator};
use medrag_rag::{Answer, DocumentSource, MedicalRag, RagConfig, SeparatorChunker};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

mod collect;
mod sources;

use sources::{ArticleFileSource, CompositeSource, PatientSummarySource};

#[derive(Parser)]
#[command(name = "medrag", version, about = "Medical question answering over local documents")]
struct Cli {
    /// Directory holding collected articles and patient data.
    #[arg(long, default_value = "medical_data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch PubMed article metadata into the data directory.
    Collect {
        /// Search queries; defaults to a set of common medical topics.
        #[arg(long = "query")]
        queries: Vec<String>,
        /// Maximum articles fetched per query.
        #[arg(long, default_value_t = 10)]
        max_results: usize,
    },

    /// Manage patient records.
    Patient {
        #[command(subcommand)]
        action: PatientAction,
    },

    /// Ask a single question and print the answer.
    Ask {
        question: String,
        #[command(flatten)]
        backend: BackendOptions,
    },

    /// Interactive question-answering session.
    Chat {
        #[command(flatten)]
        backend: BackendOptions,
    },
}

#[derive(Subcommand)]
enum PatientAction {
    /// Add a new patient.
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        gender: String,
    },
    /// Record measurements for a patient, as `key=value` pairs.
    Measure {
        #[arg(long)]
        id: String,
        /// Measurements, e.g. `"Blood Sugar (Fasting)=180 mg/dL"`.
        values: Vec<String>,
    },
    /// Print a patient's summary.
    Show {
        #[arg(long)]
        id: String,
    },
    /// List all patient IDs.
    List,
}

/// Connection options for the embedding and generation backends.
#[derive(clap::Args)]
struct BackendOptions {
    /// Base URL of the OpenAI-compatible embeddings API.
    /// Falls back to MEDRAG_EMBEDDINGS_URL.
    #[arg(long)]
    embeddings_url: Option<String>,

    /// Embedding model name.
    #[arg(long, default_value = "text-embedding-3-small")]
    embedding_model: String,

    /// Base URL of the OpenAI-compatible completions API.
    /// Falls back to MEDRAG_LLM_URL.
    #[arg(long)]
    llm_url: Option<String>,

    /// Generation model name.
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,

    /// API key. Falls back to MEDRAG_API_KEY.
    #[arg(long)]
    api_key: Option<String>,
}

impl BackendOptions {
    fn resolve(&self) -> anyhow::Result<(OpenAiEmbeddings, OpenAiGenerator)> {
        let api_key = self
            .api_key
            .clone()
            .or_else(|| std::env::var("MEDRAG_API_KEY").ok())
            .context("no API key: pass --api-key or set MEDRAG_API_KEY")?;

        let mut embeddings =
            OpenAiEmbeddings::new(api_key.clone())?.with_model(&self.embedding_model);
        if let Some(url) =
            self.embeddings_url.clone().or_else(|| std::env::var("MEDRAG_EMBEDDINGS_URL").ok())
        {
            embeddings = embeddings.with_base_url(url);
        }

        let mut generator = OpenAiGenerator::new(api_key)?.with_model(&self.model);
        if let Some(url) = self.llm_url.clone().or_else(|| std::env::var("MEDRAG_LLM_URL").ok()) {
            generator = generator.with_base_url(url);
        }

        Ok((embeddings, generator))
    }
}

fn patients_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("patients.json")
}

fn build_rag(data_dir: &std::path::Path, backend: &BackendOptions) -> anyhow::Result<MedicalRag> {
    let (embeddings, generator) = backend.resolve()?;
    let config = RagConfig::default();
    let articles = ArticleFileSource::new(data_dir.join("pubmed_articles.json"));
    let patients = PatientSummarySource::new(patients_path(data_dir));
    let source = CompositeSource::new(vec![
        Arc::new(articles) as Arc<dyn DocumentSource>,
        Arc::new(patients) as Arc<dyn DocumentSource>,
    ]);

    let rag = MedicalRag::builder()
        .chunker(Arc::new(SeparatorChunker::new(config.chunk_size, config.chunk_overlap)))
        .config(config)
        .document_source(Arc::new(source))
        .embedding_provider(Arc::new(embeddings))
        .generator(Arc::new(generator))
        .build()?;
    Ok(rag)
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.text);
    println!("\nConfidence: {}", answer.confidence);
    if !answer.sources.is_empty() {
        println!("Sources:");
        for (i, source) in answer.sources.iter().enumerate() {
            println!("  {}. {}", i + 1, source.replace('\n', " "));
        }
    }
}

async fn run_chat(rag: &MedicalRag) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("MedRAG interactive session. Type 'exit' or 'quit' to leave.");

    loop {
        match editor.readline("question> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                editor.add_history_entry(line)?;
                match rag.ask(line).await {
                    Ok(answer) => print_answer(&answer),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn run_patient(action: PatientAction, data_dir: &std::path::Path) -> anyhow::Result<()> {
    let mut store = PatientStore::open(patients_path(data_dir))?;

    match action {
        PatientAction::Add { id, name, age, gender } => {
            store.add_patient(&id, name, age, gender)?;
            println!("Added patient {id}.");
        }
        PatientAction::Measure { id, values } => {
            let mut data = BTreeMap::new();
            for pair in &values {
                let Some((key, value)) = pair.split_once('=') else {
                    bail!("measurement '{pair}' is not in key=value form");
                };
                data.insert(key.trim().to_string(), value.trim().to_string());
            }
            if data.is_empty() {
                bail!("no measurements given");
            }
            store.add_measurements(&id, data)?;
            println!("Recorded measurements for {id}.");
        }
        PatientAction::Show { id } => match store.summary(&id) {
            Some(summary) => println!("{summary}"),
            None => bail!("patient '{id}' not found"),
        },
        PatientAction::List => {
            for id in store.patient_ids() {
                println!("{id}");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medrag=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Collect { queries, max_results } => {
            let queries = if queries.is_empty() {
                collect::DEFAULT_TOPICS.iter().map(|s| s.to_string()).collect()
            } else {
                queries
            };
            let count = collect::collect_all(&queries, max_results, &cli.data_dir).await?;
            println!("Collected {count} articles into {}.", cli.data_dir.display());
        }
        Command::Patient { action } => run_patient(action, &cli.data_dir)?,
        Command::Ask { question, backend } => {
            let rag = build_rag(&cli.data_dir, &backend)?;
            let answer = rag.ask(&question).await?;
            print_answer(&answer);
        }
        Command::Chat { backend } => {
            let rag = build_rag(&cli.data_dir, &backend)?;
            run_chat(&rag).await?;
        }
    }

    Ok(())
}
