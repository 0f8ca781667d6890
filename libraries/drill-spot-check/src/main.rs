use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use drill_core::QuizPrompt;
use drill_utils::hint::hint_for;
use drill_utils::text_cleanup::{clean, split_article};
use drill_utils::{Direction, WordRecord, variants_for};
use serde::Serialize;

/// Check a word dataset before it reaches learners
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON file holding an array of word records
    #[arg(short, long)]
    words: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report records that would never accept any answer
    Audit {
        /// Also write the full report as JSON
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Print the accepted answers of one record in both directions
    Variants { id: String },
    /// Grade an answer against one record
    Grade {
        id: String,
        #[arg(value_enum)]
        direction: DirectionArg,
        answer: String,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DirectionArg {
    WordToMeaning,
    MeaningToWord,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::WordToMeaning => Direction::WordToMeaning,
            DirectionArg::MeaningToWord => Direction::MeaningToWord,
        }
    }
}

const DIRECTIONS: [Direction; 2] = [Direction::WordToMeaning, Direction::MeaningToWord];

#[derive(Debug, Serialize)]
struct RecordIssue {
    id: String,
    word: String,
    meaning: String,
    /// Directions in which the record has no accepted answers at all.
    empty_directions: Vec<Direction>,
}

#[derive(Debug, Default, Serialize)]
struct AuditReport {
    total_records: usize,
    duplicate_ids: Vec<String>,
    /// Nouns whose written form starts without an article.
    nouns_without_article: Vec<String>,
    issues: Vec<RecordIssue>,
}

fn load_records(path: &Path) -> Result<Vec<WordRecord>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of word records", path.display()))
}

fn find_record<'a>(records: &'a [WordRecord], id: &str) -> Result<&'a WordRecord> {
    match records.iter().find(|record| record.id == id) {
        Some(record) => Ok(record),
        None => bail!("No record with id {id:?}"),
    }
}

fn audit(records: &[WordRecord]) -> AuditReport {
    let mut report = AuditReport {
        total_records: records.len(),
        ..Default::default()
    };

    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.id.as_str()) {
            report.duplicate_ids.push(record.id.clone());
        }

        if record.is_noun() && split_article(&clean(&record.word)).is_none() {
            report.nouns_without_article.push(record.id.clone());
        }

        let empty_directions = DIRECTIONS
            .into_iter()
            .filter(|direction| variants_for(*direction, record).is_empty())
            .collect::<Vec<_>>();
        if !empty_directions.is_empty() {
            report.issues.push(RecordIssue {
                id: record.id.clone(),
                word: record.word.clone(),
                meaning: record.meaning.clone(),
                empty_directions,
            });
        }
    }
    report
}

fn print_summary(report: &AuditReport) {
    println!("\n=== DATASET AUDIT ===\n");
    println!("Records: {}", report.total_records);
    println!("Duplicate ids: {}", report.duplicate_ids.len());
    for id in &report.duplicate_ids {
        println!("  - {id}");
    }
    println!("Nouns without a leading article: {}", report.nouns_without_article.len());
    for id in &report.nouns_without_article {
        println!("  - {id}");
    }
    println!("Records with no accepted answers: {}", report.issues.len());
    for issue in &report.issues {
        println!(
            "  - {} ({:?} / {:?}) in {:?}",
            issue.id, issue.word, issue.meaning, issue.empty_directions
        );
    }
    println!();
}

fn print_variants(record: &WordRecord) {
    println!("{} ({})", record.id, record.word_type);
    for direction in DIRECTIONS {
        let variants = variants_for(direction, record);
        println!("  {direction:?}: {} accepted", variants.len());
        for variant in variants {
            println!("    {variant:?}");
        }
    }
    if let Some(hint) = hint_for(record) {
        println!("  hint: {hint:?}");
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let records = load_records(&args.words)?;
    log::info!("Loaded {} records from {:?}", records.len(), args.words);

    match args.command {
        Command::Audit { report: output } => {
            let report = audit(&records);
            print_summary(&report);
            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&report)?;
                fs::write(&path, json)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                println!("Report written to {path:?}");
            }
        }
        Command::Variants { id } => {
            print_variants(find_record(&records, &id)?);
        }
        Command::Grade {
            id,
            direction,
            answer,
        } => {
            let record = find_record(&records, &id)?;
            let prompt = QuizPrompt::new(record, direction.into(), false);
            let result = prompt.grade(&answer);
            println!("{result:?}");
            println!("{:?}", prompt.feedback(result, &answer));
        }
    }

    Ok(())
}
