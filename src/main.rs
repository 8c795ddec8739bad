use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use classroom_pathways::cohort::{self, Direction, Segment};
use classroom_pathways::config::{self, AppConfig};
use classroom_pathways::ingest::{self, Roster};
use classroom_pathways::{db, notes, pathway, report};

#[derive(Parser)]
#[command(name = "classroom-pathways")]
#[command(about = "Pathway classification and student reports for classroom score sheets", long_about = None)]
struct Cli {
    /// TOML file with subjects, pathways and cohort thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Group students by the pathways they qualify for
    Classify {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Generate one student's report
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        student: String,
        /// Write a markdown document (uses the saved note when one exists)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// List students whose average is below the threshold
    AtRisk {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        threshold: Option<u32>,
        #[arg(long)]
        min_age: Option<i64>,
        #[arg(long)]
        max_age: Option<i64>,
    },
    /// List students whose average is at or above the threshold
    Excelling {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        threshold: Option<u32>,
        #[arg(long)]
        min_age: Option<i64>,
        #[arg(long)]
        max_age: Option<i64>,
    },
    /// Write a markdown class overview report
    Overview {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "overview.md")]
        out: PathBuf,
    },
    /// Manage saved student notes (requires DATABASE_URL)
    Notes {
        #[command(subcommand)]
        command: NotesCommand,
    },
}

#[derive(Subcommand)]
enum NotesCommand {
    /// Create or upgrade the notes schema
    InitDb,
    /// Save or replace a student's note
    Save {
        #[arg(long)]
        student: String,
        #[arg(long)]
        text: String,
    },
    /// Delete a student's note
    Delete {
        #[arg(long)]
        student: String,
    },
    /// Export all notes as plain text
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Classify { csv, json } => {
            let roster = load_roster(&csv, &config)?;
            let curriculum = &config.curriculum;
            let result =
                pathway::classify(&roster.students, curriculum.subjects(), curriculum.pathways())?;

            if json {
                let output = serde_json::json!({
                    "groupings": result.groupings,
                    "counts": result.counts(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if result.is_empty() {
                println!("No students qualify for any pathway.");
            } else {
                for group in &result.groupings {
                    println!(
                        "{} ({}): {}",
                        group.pathway,
                        group.students.len(),
                        group.students.join(", ")
                    );
                }
            }
        }
        Commands::Report {
            csv,
            student,
            out,
            json,
        } => {
            let roster = load_roster(&csv, &config)?;
            let curriculum = &config.curriculum;
            let record = cohort::find_student(&roster.students, &student)
                .with_context(|| format!("no student named '{student}'"))?;
            let content =
                report::generate_report(record, curriculum.subjects(), curriculum.pathways())?;

            if let Some(out) = out {
                let book = match database_url() {
                    Some(_) => db::fetch_notes(&connect().await?).await?,
                    None => notes::NoteBook::new(),
                };
                let body = notes::report_body(&book, &content);
                let document = report::student_document(record, curriculum.subjects(), &body)?;
                std::fs::write(&out, document)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!("Report written to {}.", out.display());
            } else if json {
                println!("{}", serde_json::to_string_pretty(&content)?);
            } else {
                print!("{content}");
            }
        }
        Commands::AtRisk {
            csv,
            threshold,
            min_age,
            max_age,
        } => {
            let threshold = threshold.unwrap_or(config.cohort.at_risk_threshold);
            print_segment(
                &csv,
                &config,
                threshold,
                Direction::AtRisk,
                (min_age, max_age),
            )?;
        }
        Commands::Excelling {
            csv,
            threshold,
            min_age,
            max_age,
        } => {
            let threshold = threshold.unwrap_or(config.cohort.excelling_threshold);
            print_segment(
                &csv,
                &config,
                threshold,
                Direction::Excelling,
                (min_age, max_age),
            )?;
        }
        Commands::Overview { csv, out } => {
            let roster = load_roster(&csv, &config)?;
            let curriculum = &config.curriculum;
            let overview = report::build_class_report(
                &roster.students,
                curriculum.subjects(),
                curriculum.pathways(),
                config.cohort.at_risk_threshold,
                config.cohort.excelling_threshold,
                chrono::Local::now().date_naive(),
            )?;
            std::fs::write(&out, overview)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Overview written to {}.", out.display());
        }
        Commands::Notes { command } => {
            let pool = connect().await?;
            match command {
                NotesCommand::InitDb => {
                    db::init_db(&pool).await?;
                    println!("Schema ready.");
                }
                NotesCommand::Save { student, text } => {
                    db::save_note(&pool, &student, &text).await?;
                    println!("Note for {student} saved.");
                }
                NotesCommand::Delete { student } => {
                    if db::delete_note(&pool, &student).await? {
                        println!("Note for {student} deleted.");
                    } else {
                        println!("No note saved for {student}.");
                    }
                }
                NotesCommand::Export { out } => {
                    let book = db::fetch_notes(&pool).await?;
                    let text = notes::export_notes(&book);
                    match out {
                        Some(out) => {
                            std::fs::write(&out, text)
                                .with_context(|| format!("failed to write {}", out.display()))?;
                            println!("Exported {} notes to {}.", book.len(), out.display());
                        }
                        None => print!("{text}"),
                    }
                }
            }
        }
    }

    Ok(())
}

fn load_roster(csv: &Path, config: &AppConfig) -> anyhow::Result<Roster> {
    ingest::load_students(csv, config.curriculum.subjects())
}

fn print_segment(
    csv: &Path,
    config: &AppConfig,
    threshold: u32,
    direction: Direction,
    (min_age, max_age): (Option<i64>, Option<i64>),
) -> anyhow::Result<()> {
    let roster = load_roster(csv, config)?;
    let subjects = config.curriculum.subjects();

    let label = match direction {
        Direction::AtRisk => "at-risk",
        Direction::Excelling => "excelling",
    };

    let selection = match cohort::segment(
        &roster.students,
        subjects,
        threshold,
        direction,
        min_age,
        max_age,
    )? {
        Segment::NoRoster => {
            println!("No students uploaded yet.");
            return Ok(());
        }
        Segment::NoneInAgeRange => {
            println!("No students in the selected age range.");
            return Ok(());
        }
        Segment::Selected(selection) => selection,
    };

    println!("Number of {label} students: {}", selection.len());
    if selection.is_empty() {
        println!("No {label} students found.");
        return Ok(());
    }

    for member in &selection.members {
        let scores: Vec<String> = subjects
            .iter()
            .filter_map(|subject| {
                member
                    .student
                    .scores
                    .get(subject)
                    .map(|score| format!("{subject} {score}"))
            })
            .collect();
        println!(
            "- {} (age {}) average {:.2}%: {}",
            member.student.name,
            member.student.age,
            member.overall_average,
            scores.join(", ")
        );
    }

    Ok(())
}

fn database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url =
        database_url().context("DATABASE_URL must be set to a Postgres instance for notes")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}
