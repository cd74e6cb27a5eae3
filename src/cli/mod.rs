//! Command-line interface for lesson-annotator.
//!
//! Provides commands for serving the review API, listing lessons, saving
//! annotations, exporting, and checking the catalog.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::catalog::{Catalog, LessonIssue};
use crate::config::{self, ResolvedConfig};
use crate::core::{AnnotationStore, AnnotatorContext, JsonFileStore, MemoryStore};
use crate::domain::{AnnotationFields, Confidence};

/// lesson-annotator - Review and annotate transcribed lesson segments
#[derive(Parser, Debug)]
#[command(name = "lesson-annotator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Data directory holding the catalog and annotation files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP review API
    Serve {
        /// Address to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep annotations in memory only (nothing is written to disk)
        #[arg(long)]
        ephemeral: bool,
    },

    /// List lessons with annotation progress
    Lessons,

    /// Save an annotation for one segment
    Annotate {
        /// Lesson ID
        lesson_id: String,

        /// Segment ID within the lesson
        segment_id: i64,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        subcategory: Option<String>,

        #[arg(long)]
        reasoning: Option<String>,

        /// Numeric score or label
        #[arg(long)]
        confidence: Option<String>,
    },

    /// Export annotations joined with their segments
    Export {
        /// Output file (writes to stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check the catalog for inconsistencies
    Check,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let mut config = config::load_config()?;
        if let Some(data_dir) = self.data_dir {
            config = config.with_data_dir(data_dir);
        }

        match self.command {
            Commands::Serve {
                host,
                port,
                ephemeral,
            } => {
                if let Some(host) = host {
                    config.host = host;
                }
                if let Some(port) = port {
                    config.port = port;
                }
                serve(&config, ephemeral).await
            }
            Commands::Lessons => list_lessons(&config).await,
            Commands::Annotate {
                lesson_id,
                segment_id,
                category,
                subcategory,
                reasoning,
                confidence,
            } => {
                let fields = AnnotationFields {
                    category,
                    subcategory,
                    reasoning,
                    confidence: confidence.map(|c| parse_confidence(&c)),
                };
                annotate(&config, &lesson_id, segment_id, fields).await
            }
            Commands::Export { output } => export(&config, output).await,
            Commands::Check => check(&config).await,
            Commands::Config => {
                show_config(&config);
                Ok(())
            }
        }
    }
}

/// Numbers become scores, anything else a label
fn parse_confidence(raw: &str) -> Confidence {
    raw.parse::<f64>()
        .map(Confidence::Score)
        .unwrap_or_else(|_| Confidence::Label(raw.to_string()))
}

async fn load_catalog(config: &ResolvedConfig) -> Result<Catalog> {
    Catalog::load(&config.lesson_index, &config.segments)
        .await
        .context("Failed to load lesson catalog")
}

/// Load the catalog and open the store
async fn open_context(config: &ResolvedConfig, ephemeral: bool) -> Result<AnnotatorContext> {
    let catalog = load_catalog(config).await?;

    let store: Arc<dyn AnnotationStore> = if ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            JsonFileStore::open(&config.annotations)
                .await
                .context("Failed to open annotation store")?,
        )
    };

    Ok(AnnotatorContext::new(catalog, store))
}

/// Start the HTTP API
async fn serve(config: &ResolvedConfig, ephemeral: bool) -> Result<()> {
    if ephemeral {
        tracing::warn!("Ephemeral mode: annotations will be lost on exit");
    }
    let ctx = open_context(config, ephemeral).await?;
    crate::api::run(ctx, &config.bind_address()).await
}

/// Print the lesson list
async fn list_lessons(config: &ResolvedConfig) -> Result<()> {
    let ctx = open_context(config, false).await?;
    let lessons = ctx.list_lessons().await?;

    if lessons.is_empty() {
        println!("No lessons in catalog");
        return Ok(());
    }

    println!("{:<24} {:<36} {:>10} {:>10}", "LESSON ID", "NAME", "SEGMENTS", "ANNOTATED");
    println!("{}", "-".repeat(83));

    for lesson in lessons {
        println!(
            "{:<24} {:<36} {:>10} {:>10}",
            lesson.id, lesson.name, lesson.segment_count, lesson.annotated_count
        );
    }

    Ok(())
}

/// Save an annotation from the command line
async fn annotate(
    config: &ResolvedConfig,
    lesson_id: &str,
    segment_id: i64,
    fields: AnnotationFields,
) -> Result<()> {
    let ctx = open_context(config, false).await?;

    let lesson = ctx
        .catalog()
        .lesson(lesson_id)
        .with_context(|| format!("Lesson not found: {}", lesson_id))?;
    if lesson.segment(segment_id).is_none() {
        eprintln!(
            "Warning: lesson {} has no segment {}; the annotation will not appear in exports",
            lesson_id, segment_id
        );
    }

    let annotation = ctx.save_annotation(lesson_id, segment_id, fields).await?;
    println!("Saved {} at {}", annotation.key(), annotation.timestamp.to_rfc3339());

    Ok(())
}

/// Write the export join as JSON
async fn export(config: &ResolvedConfig, output: Option<PathBuf>) -> Result<()> {
    let ctx = open_context(config, false).await?;
    let report = ctx.export().await?;
    let json = serde_json::to_string_pretty(&report.records)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            eprintln!("Exported {} records to {}", report.records.len(), path.display());
        }
        None => println!("{}", json),
    }

    if report.skipped.total() > 0 {
        eprintln!(
            "Skipped {} annotations (malformed key: {}, missing lesson: {}, missing segment: {})",
            report.skipped.total(),
            report.skipped.malformed_key,
            report.skipped.missing_lesson,
            report.skipped.missing_segment
        );
    }

    Ok(())
}

/// Audit the catalog
async fn check(config: &ResolvedConfig) -> Result<()> {
    let catalog = load_catalog(config).await?;
    let audit = catalog.audit();

    println!("Lessons:  {}", audit.lessons);
    println!("Segments: {}", audit.segments);
    match audit.flattened_segments {
        Some(n) => println!("Flattened segments: {}", n),
        None => println!("Flattened segments: (file not present)"),
    }

    if audit.is_clean() {
        println!("\nNo issues found");
        return Ok(());
    }

    println!("\n{} issue(s):", audit.issues.len());
    for issue in &audit.issues {
        match issue {
            LessonIssue::CountMismatch {
                lesson_id,
                declared,
                actual,
            } => println!(
                "  {}: segment_count is {} but {} segments are listed",
                lesson_id, declared, actual
            ),
            LessonIssue::DuplicateSegmentId {
                lesson_id,
                segment_id,
            } => println!("  {}: segment id {} appears more than once", lesson_id, segment_id),
            LessonIssue::FlattenedCountMismatch {
                lesson_id,
                index,
                flattened,
            } => println!(
                "  {}: {} segments in index, {} in flattened file",
                lesson_id, index, flattened
            ),
            LessonIssue::UnknownLesson {
                lesson_id,
                segments,
            } => println!(
                "  {}: {} flattened segments reference a lesson not in the index",
                lesson_id, segments
            ),
        }
    }

    anyhow::bail!("Catalog check failed with {} issue(s)", audit.issues.len())
}

/// Print the resolved configuration
fn show_config(config: &ResolvedConfig) {
    let config_file = match &config.config_file {
        Some(path) => path.display().to_string(),
        None => "(none)".to_string(),
    };
    println!("Config file:  {}", config_file);
    println!("Data dir:     {}", config.data_dir.display());
    println!("Lesson index: {}", config.lesson_index.display());
    println!("Segments:     {}", config.segments.display());
    println!("Annotations:  {}", config.annotations.display());
    println!("Listen:       {}", config.bind_address());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INDEX: &str = r#"{
        "L1": {
            "name": "Lesson one",
            "segment_count": 2,
            "segments": [
                {"id": 1, "text": "hello", "speaker": "A", "start_time": 0.0, "end_time": 1.2},
                {"id": 2, "text": "hi", "speaker": "B", "start_time": 1.2, "end_time": 2.5}
            ]
        }
    }"#;

    fn data_dir(index: &str) -> (ResolvedConfig, TempDir) {
        let temp = TempDir::new().unwrap();
        let config = ResolvedConfig::in_data_dir(temp.path());
        std::fs::write(&config.lesson_index, index).unwrap();
        (config, temp)
    }

    async fn stored(config: &ResolvedConfig) -> crate::domain::AnnotationSnapshot {
        JsonFileStore::open(&config.annotations)
            .await
            .unwrap()
            .load_all()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_annotate_saves_to_data_dir() {
        let (config, _temp) = data_dir(INDEX);
        let fields = AnnotationFields::default()
            .with_category("greeting")
            .with_confidence("high");

        annotate(&config, "L1", 1, fields.clone()).await.unwrap();

        let snapshot = stored(&config).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("L1_1").map(|a| a.fields()), Some(fields));
    }

    #[tokio::test]
    async fn test_annotate_unknown_lesson_fails_without_saving() {
        let (config, _temp) = data_dir(INDEX);

        let err = annotate(&config, "NOPE", 1, AnnotationFields::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Lesson not found: NOPE"));

        assert!(stored(&config).await.is_empty());
    }

    #[tokio::test]
    async fn test_annotate_unknown_segment_still_saves() {
        let (config, _temp) = data_dir(INDEX);

        annotate(&config, "L1", 9, AnnotationFields::default())
            .await
            .unwrap();

        assert!(stored(&config).await.contains_key("L1_9"));
    }

    #[tokio::test]
    async fn test_check_passes_on_consistent_catalog() {
        let (config, _temp) = data_dir(INDEX);
        check(&config).await.unwrap();
    }

    #[tokio::test]
    async fn test_check_fails_on_issues() {
        let index = INDEX.replace("\"segment_count\": 2", "\"segment_count\": 3");
        let (config, _temp) = data_dir(&index);

        let err = check(&config).await.unwrap_err();
        assert!(err.to_string().contains("1 issue(s)"));
    }

    #[tokio::test]
    async fn test_check_without_index_fails() {
        let temp = TempDir::new().unwrap();
        let config = ResolvedConfig::in_data_dir(temp.path());

        assert!(check(&config).await.is_err());
    }

    #[test]
    fn test_parse_confidence() {
        assert_eq!(parse_confidence("0.75"), Confidence::Score(0.75));
        assert_eq!(parse_confidence("high"), Confidence::Label("high".to_string()));
    }

    #[test]
    fn test_cli_parses_annotate() {
        let cli = Cli::try_parse_from([
            "lesson-annotator",
            "--data-dir",
            "/tmp/d",
            "annotate",
            "L1",
            "3",
            "--category",
            "greeting",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/d")));
        match cli.command {
            Commands::Annotate {
                lesson_id,
                segment_id,
                category,
                confidence,
                ..
            } => {
                assert_eq!(lesson_id, "L1");
                assert_eq!(segment_id, 3);
                assert_eq!(category.as_deref(), Some("greeting"));
                assert!(confidence.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_serve_flags() {
        let cli =
            Cli::try_parse_from(["lesson-annotator", "serve", "--port", "8080", "--ephemeral"])
                .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Serve {
                host: None,
                port: Some(8080),
                ephemeral: true,
            }
        ));
    }
}
