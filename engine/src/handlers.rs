//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - ask: Answer one question, optionally with a practice problem
//! - session: Interactive tutoring loop with feedback
//! - ingest: Add reference problems to the knowledge store
//! - report: Render the practice collection as Markdown
//! - secret set: Store a provider API key in the keychain
//! - config show / validate: Inspect configuration
//! - doctor: Validate configuration and check dependencies

use anyhow::{Context, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tutor_sdk::errors::EngineError;
use tutor_sdk::{Subject, TutorErrorExt};

use crate::config::Config;
use crate::db::Database;
use crate::llm::{provider_from_config, LLMProvider};
use crate::report;
use crate::retrieval::{collection_name, InMemoryStore, VectorStore};
use crate::secrets::{SecretManager, KEYCHAIN_SERVICE, KEYED_PROVIDERS};
use crate::tutor::{Transition, TutorEngine, TutorError, TutorResponse, TutorSession};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

const HELPED_MESSAGE: &str = "Great! Keep up the good work!";
const NOT_HELPED_MESSAGE: &str = "Let's try a simpler explanation...";

/// The configured knowledge store, plus the database to close afterwards
pub struct KnowledgeBackend {
    pub store: Arc<dyn VectorStore>,
    database: Option<Database>,
}

impl KnowledgeBackend {
    /// Open the backend named in `[store]`
    ///
    /// The memory backend starts seeded with the built-in practice
    /// collection, since nothing persists between runs.
    pub async fn open(config: &Config) -> Result<Self> {
        match config.store.backend.as_str() {
            "memory" => {
                let store = InMemoryStore::new();
                for problem in report::collection() {
                    store.add(
                        &collection_name(&config.store.collection_prefix, problem.subject),
                        problem.document(),
                    );
                }
                tracing::info!("Using in-memory knowledge store seeded with built-in problems");
                Ok(Self {
                    store: Arc::new(store),
                    database: None,
                })
            }
            _ => {
                let path = config.store_path();
                let database = Database::new(&path).await.map_err(|e| {
                    EngineError::Database(format!("{}: {:#}", path.display(), e))
                })?;
                Ok(Self {
                    store: Arc::new(database.knowledge()),
                    database: Some(database),
                })
            }
        }
    }

    pub async fn close(self) -> Result<()> {
        if let Some(database) = self.database {
            database.close().await?;
        }
        Ok(())
    }
}

/// Build the configured provider and store, and the engine over them
pub async fn build_engine(config: &Config) -> Result<(TutorEngine, KnowledgeBackend)> {
    let secrets = SecretManager::new(KEYCHAIN_SERVICE);
    let llm: Arc<dyn LLMProvider> = provider_from_config(&config.llm, &secrets)
        .map_err(|e| anyhow::anyhow!("{} ({})", e, e.user_hint()))?;
    tracing::info!("Using LLM provider '{}'", llm.name());

    let backend = KnowledgeBackend::open(config).await?;
    let engine = TutorEngine::new(
        llm,
        Arc::clone(&backend.store),
        &config.tutor,
        &config.store.collection_prefix,
    );
    Ok((engine, backend))
}

/// Answer a single question
pub async fn handle_ask(
    question: String,
    practice: bool,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let (engine, backend) = build_engine(config).await?;
    let mut session = engine.new_session();

    let result = ask_once(&engine, &mut session, &question, practice, format).await;
    backend.close().await?;
    result
}

async fn ask_once(
    engine: &TutorEngine,
    session: &mut TutorSession,
    question: &str,
    practice: bool,
    format: OutputFormat,
) -> Result<()> {
    let response = engine
        .handle_question(session, question)
        .await
        .map_err(with_hint)?;

    let practice_text = if practice {
        Some(
            engine
                .practice_for_last_question(session)
                .await
                .map_err(with_hint)?,
        )
    } else {
        None
    };

    match format {
        OutputFormat::Text => {
            print_response(&response);
            if let Some(text) = &practice_text {
                print_practice(text);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "session_id": session.id(),
                "response": response,
                "practice": practice_text,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Run the interactive tutoring loop on stdin
///
/// After each answer the student is asked whether it helped; `y` or `n`
/// feeds the level tracker, anything else skips feedback. Lines starting
/// with `:` are commands.
pub async fn handle_session(config: &Config, format: OutputFormat) -> Result<()> {
    let (engine, backend) = build_engine(config).await?;
    let mut session = engine.new_session();
    tracing::info!("Started session {}", session.id());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if matches!(format, OutputFormat::Text) {
        println!("STEM Tutor");
        println!("Ask a mathematics, physics or chemistry question.");
        println!("Commands: :practice, :stats, :quit");
    }

    loop {
        let Some(line) = prompt_line(&mut lines, "\nQuestion> ").await? else {
            break;
        };
        let line = line.trim();

        match line {
            ":quit" | ":q" => break,
            ":stats" => {
                print_stats(&session, format)?;
                continue;
            }
            ":practice" => {
                match engine.practice_for_last_question(&session).await {
                    Ok(text) => match format {
                        OutputFormat::Text => print_practice(&text),
                        OutputFormat::Json => {
                            println!("{}", serde_json::to_string(&json!({ "practice": text }))?)
                        }
                    },
                    Err(e) => report_error(&e, format)?,
                }
                continue;
            }
            _ => {}
        }

        let response = match engine.handle_question(&mut session, line).await {
            Ok(response) => response,
            Err(e) => {
                report_error(&e, format)?;
                continue;
            }
        };

        match format {
            OutputFormat::Text => print_response(&response),
            OutputFormat::Json => println!("{}", serde_json::to_string(&response)?),
        }

        let Some(answer) = prompt_line(&mut lines, "\nDid this help? [y/n] ").await? else {
            break;
        };
        let success = match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => continue,
        };

        let change = engine
            .handle_feedback(&mut session, success)
            .map_err(with_hint)?;

        match format {
            OutputFormat::Text => {
                println!(
                    "{}",
                    if success {
                        HELPED_MESSAGE
                    } else {
                        NOT_HELPED_MESSAGE
                    }
                );
                match change.transition() {
                    Transition::Advanced => println!("Level up: now {}", change.current),
                    Transition::Retreated => println!("Level adjusted: now {}", change.current),
                    Transition::Unchanged => {}
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string(&change)?),
        }
    }

    if matches!(format, OutputFormat::Text) && !session.history().is_empty() {
        print_stats(&session, format)?;
    }

    backend.close().await
}

async fn prompt_line(lines: &mut Lines<BufReader<Stdin>>, prompt: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await.context("Failed to read from stdin")
}

/// Add reference problems to the knowledge store
pub async fn handle_ingest(
    subject: Option<Subject>,
    file: Option<PathBuf>,
    builtin: bool,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    if config.store.backend != "sqlite" {
        anyhow::bail!(
            "Ingest needs the sqlite store backend (configured: '{}')",
            config.store.backend
        );
    }

    let documents: Vec<(Subject, String)> = if builtin {
        report::collection()
            .iter()
            .map(|problem| (problem.subject, problem.document()))
            .collect()
    } else {
        let (Some(subject), Some(file)) = (subject, file) else {
            anyhow::bail!("Provide --subject and a file, or --builtin");
        };
        let text = tokio::fs::read_to_string(&file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        split_documents(&text)
            .into_iter()
            .map(|document| (subject, document))
            .collect()
    };

    let database = Database::new(&config.store_path())
        .await
        .context("Failed to open knowledge store")?;
    let store = database.knowledge();

    for (subject, document) in &documents {
        let collection = collection_name(&config.store.collection_prefix, *subject);
        store.insert(&collection, document).await?;
    }

    let mut totals = Vec::new();
    for subject in Subject::ALL {
        let collection = collection_name(&config.store.collection_prefix, subject);
        totals.push((collection.clone(), store.count(&collection).await?));
    }
    database.close().await?;

    tracing::info!("Ingested {} document(s)", documents.len());

    match format {
        OutputFormat::Text => {
            println!("✓ Added {} problem(s)", documents.len());
            for (collection, count) in &totals {
                println!("  {:<25} {}", format!("{}:", collection), count);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "added": documents.len(),
                "collections": totals.iter().map(|(name, count)| {
                    json!({ "name": name, "documents": count })
                }).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Split an ingest file into documents on `---` separator lines
pub fn split_documents(text: &str) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim() == "---" {
            documents.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    documents.push(current.join("\n"));

    documents
        .into_iter()
        .map(|document| document.trim().to_string())
        .filter(|document| !document.is_empty())
        .collect()
}

/// Render the practice collection as Markdown
pub async fn handle_report(output: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let markdown = report::render_markdown(report::collection());

    let Some(path) = output else {
        match format {
            OutputFormat::Text => print!("{}", markdown),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report::collection())?)
            }
        }
        return Ok(());
    };

    write_report(&path, &markdown).await?;

    match format {
        OutputFormat::Text => println!("✓ Wrote practice collection to {}", path.display()),
        OutputFormat::Json => {
            let output = json!({
                "status": "written",
                "path": path,
                "problems": report::collection().len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

async fn write_report(path: &Path, markdown: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create report directory")?;
    }
    tokio::fs::write(path, markdown)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Store a provider API key in the OS keychain
pub async fn handle_secret_set(
    provider: String,
    value: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    if !KEYED_PROVIDERS.contains(&provider.as_str()) {
        anyhow::bail!(
            "Unknown provider '{}'. Must be one of: {}",
            provider,
            KEYED_PROVIDERS.join(", ")
        );
    }

    let value = match value {
        Some(value) => value,
        None => {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            prompt_line(&mut lines, &format!("{} API key: ", provider))
                .await?
                .unwrap_or_default()
        }
    };

    let secrets = SecretManager::new(KEYCHAIN_SERVICE);
    secrets
        .set_secret(&SecretManager::key_for(&provider), value.trim())
        .map_err(|e| anyhow::anyhow!("{} ({})", e, e.user_hint()))?;

    match format {
        OutputFormat::Text => println!("✓ Stored API key for {}", provider),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "status": "stored", "provider": provider }))?
            );
        }
    }
    Ok(())
}

/// Show the effective configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", toml::to_string_pretty(config)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}

/// Report that the loaded configuration passed validation
pub fn handle_config_validate(config: &Config, format: OutputFormat) -> Result<()> {
    config.validate()?;
    match format {
        OutputFormat::Text => println!("✓ Configuration is valid"),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "valid": true }))?)
        }
    }
    Ok(())
}

/// Run system diagnostics
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks: Vec<(String, String)> = Vec::new();

    // Check 1: Configuration validation
    // Config is already validated when loaded
    checks.push(("Configuration".into(), "Valid".into()));

    // Check 2: Data directory
    if config.core.data_dir.exists() {
        checks.push(("Data directory".into(), "Exists".into()));
    } else {
        checks.push(("Data directory".into(), "Missing".into()));
        issues.push(format!(
            "Data directory does not exist: {:?}",
            config.core.data_dir
        ));
    }

    // Check 3: Knowledge store
    match config.store.backend.as_str() {
        "memory" => checks.push(("Knowledge store".into(), "In-memory (built-in problems)".into())),
        _ => {
            let db_path = config.store_path();
            match Database::new(&db_path).await {
                Ok(database) => {
                    let store = database.knowledge();
                    let mut empty = Vec::new();
                    for subject in Subject::ALL {
                        let collection = collection_name(&config.store.collection_prefix, subject);
                        let count = store.count(&collection).await.unwrap_or(0);
                        checks.push((collection.clone(), format!("{} document(s)", count)));
                        if count == 0 {
                            empty.push(collection);
                        }
                    }
                    if !empty.is_empty() {
                        issues.push(format!(
                            "Empty collections: {}. Run 'tutor ingest --builtin' to seed them.",
                            empty.join(", ")
                        ));
                    }
                    database.close().await?;
                }
                Err(e) => {
                    checks.push(("Knowledge store".into(), "Failed".into()));
                    issues.push(format!("Cannot open knowledge store: {}", e));
                }
            }
        }
    }

    // Check 4: LLM provider
    let provider = config.llm.default_provider.as_str();
    let secrets = SecretManager::new(KEYCHAIN_SERVICE);
    let env_var = match provider {
        "openai" => Some(config.llm.openai.api_key_env.as_str()),
        "groq" => Some(config.llm.groq.api_key_env.as_str()),
        _ => None,
    };
    if let Some(env_var) = env_var {
        if secrets.has_api_key(provider, env_var) {
            checks.push((format!("{} API key", provider), "Configured".into()));
        } else {
            checks.push((format!("{} API key", provider), "Not configured".into()));
            issues.push(format!(
                "No API key for {}. Set ${} or run 'tutor secret set {}'.",
                provider, env_var, provider
            ));
        }
    }

    match provider_from_config(&config.llm, &secrets) {
        Ok(llm) => {
            if llm.check_health().await {
                checks.push((format!("{} provider", provider), "Available".into()));
            } else {
                checks.push((format!("{} provider", provider), "Not available".into()));
                issues.push(format!("The {} provider did not respond.", provider));
            }
        }
        Err(e) => {
            checks.push((format!("{} provider", provider), "Not configured".into()));
            tracing::debug!("Provider construction failed: {}", e);
        }
    }

    // Output results
    match format {
        OutputFormat::Text => {
            println!("STEM Tutor Diagnostics");
            println!("============================");
            println!();

            println!("System Checks:");
            for (check, status) in &checks {
                println!("  {:<25} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn print_response(response: &TutorResponse) {
    let analysis = response.classification.analysis();

    println!();
    println!("Question Analysis");
    println!("  Subject:    {}", analysis.subject.title());
    println!("  Difficulty: {}", analysis.difficulty);
    if !analysis.concepts.is_empty() {
        println!("  Concepts:   {}", analysis.concepts.join(", "));
    }
    if let Some(reason) = response.classification.fallback_reason() {
        println!("  (default analysis used: {})", reason);
    }

    if !analysis.formulas.is_empty() {
        println!();
        println!("Relevant Formulas");
        for formula in &analysis.formulas {
            println!("  {}", formula);
        }
    }

    println!();
    println!(
        "Solution ({} level, {} reference(s))",
        response.level,
        response.references.len()
    );
    println!();
    println!("{}", response.solution.trim());
}

fn print_practice(text: &str) {
    println!();
    println!("Practice Problem");
    println!();
    println!("{}", text.trim());
}

fn print_stats(session: &TutorSession, format: OutputFormat) -> Result<()> {
    let summary = session.summary();

    match format {
        OutputFormat::Text => {
            println!();
            println!("Learning Analytics");
            println!("  Questions asked: {}", summary.total_questions);
            println!("  Current level:   {}", summary.current_level);
            for (subject, count) in &summary.subject_counts {
                println!("  {:<16} {} question(s)", format!("{}:", subject.title()), count);
            }
            if !summary.difficulty_progression.is_empty() {
                let progression: Vec<&str> = summary
                    .difficulty_progression
                    .iter()
                    .map(|tier| tier.as_str())
                    .collect();
                println!("  Difficulty:      {}", progression.join(" -> "));
            }
            for (subject, rate) in &summary.recent_rates {
                println!(
                    "  {:<16} {:.0}% recent success",
                    format!("{}:", subject.title()),
                    rate * 100.0
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
    }
    Ok(())
}

fn report_error(error: &TutorError, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if matches!(error, TutorError::EmptyQuestion) {
                println!("⚠ {}", error.user_hint());
            } else {
                println!("✗ {}", error);
                println!("  {}", error.user_hint());
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "error": error.to_string(),
                "hint": error.user_hint(),
                "recoverable": error.is_recoverable(),
            });
            println!("{}", serde_json::to_string(&output)?);
        }
    }
    Ok(())
}

fn with_hint(error: TutorError) -> anyhow::Error {
    let hint = error.user_hint().to_string();
    anyhow::Error::new(error).context(hint)
}
