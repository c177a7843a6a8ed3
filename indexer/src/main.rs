use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use newsrank::normalize::TokenPattern;
use newsrank::persist::{load_checked, save_index, save_meta, IndexPaths, MetaFile};
use newsrank::tfidf::{Norm, TfIdfOptions};
use newsrank::{explain_query, Document, DocumentRecord, IndexConfig, QueryTerm, RankingIndex, SearchOptions, StopWordSource};
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a TF-IDF keyword ranking index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternArg { Whitespace, Word }

#[derive(Clone, Copy, ValueEnum)]
enum NormArg { L2, L1, None }

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Stop-word list, one word per line, '#' for comments
        #[arg(long, conflicts_with = "french_stop_words")]
        stop_words: Option<PathBuf>,
        /// Use the bundled French stop-word list
        #[arg(long, default_value_t = false)]
        french_stop_words: bool,
        #[arg(long, value_enum, default_value_t = PatternArg::Whitespace)]
        token_pattern: PatternArg,
        #[arg(long, value_enum, default_value_t = NormArg::L2)]
        norm: NormArg,
        /// Use idf = ln(N/df) + 1 instead of the smoothed ln((1+N)/(1+df)) + 1
        #[arg(long, default_value_t = false)]
        no_smooth_idf: bool,
        /// Use tf = 1 + ln(count)
        #[arg(long, default_value_t = false)]
        sublinear_tf: bool,
    },
    /// Search a built index and print the ranked articles
    Search {
        /// Index directory
        #[arg(long)]
        index: String,
        /// Keywords
        #[arg(long)]
        query: String,
        /// Maximum number of results (defaults to the index configuration)
        #[arg(long)]
        limit: Option<usize>,
        /// Minimum score (defaults to the index configuration)
        #[arg(long)]
        score_floor: Option<f32>,
        /// Only keep articles containing every known keyword
        #[arg(long, default_value_t = false)]
        all_keywords: bool,
        /// Report stop words and unknown keywords
        #[arg(long, default_value_t = false)]
        explain: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stop_words, french_stop_words, token_pattern, norm, no_smooth_idf, sublinear_tf } => {
            let stop_word_source = match (stop_words, french_stop_words) {
                (Some(path), _) => StopWordSource::File(path),
                (None, true) => StopWordSource::BuiltinFrench,
                (None, false) => StopWordSource::None,
            };
            let config = IndexConfig {
                stop_word_source,
                token_pattern: match token_pattern {
                    PatternArg::Whitespace => TokenPattern::Whitespace,
                    PatternArg::Word => TokenPattern::Word,
                },
                tfidf: TfIdfOptions {
                    norm: match norm {
                        NormArg::L2 => Norm::L2,
                        NormArg::L1 => Norm::L1,
                        NormArg::None => Norm::None,
                    },
                    smooth_idf: !no_smooth_idf,
                    sublinear_tf,
                },
                ..IndexConfig::default()
            };
            build_index(&input, &output, &config)
        }
        Commands::Search { index, query, limit, score_floor, all_keywords, explain } => {
            search_index(&index, &query, limit, score_floor, all_keywords, explain)
        }
    }
}

fn build_index(input: &str, output: &str, config: &IndexConfig) -> Result<()> {
    let records = load_records(Path::new(input))?;
    tracing::info!(num_records = records.len(), input, "loaded records");

    let documents = Document::from_records(records);
    let index = RankingIndex::build(documents, config)?;

    let out_paths = IndexPaths::new(output);
    save_index(&out_paths, &index)?;
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into());
    save_meta(&out_paths, &MetaFile::describe(&index, created_at))?;

    tracing::info!(output, num_docs = index.document_count(), num_terms = index.vocabulary().len(), "index build complete");
    Ok(())
}

fn search_index(dir: &str, query: &str, limit: Option<usize>, score_floor: Option<f32>, all_keywords: bool, explain: bool) -> Result<()> {
    let (index, _meta) = load_checked(&IndexPaths::new(dir)).with_context(|| format!("loading index from {dir}"))?;

    if explain {
        for term in explain_query(&index, query) {
            match term {
                QueryTerm::Resolved { .. } => {}
                QueryTerm::StopWord { token } => println!("{token} is a stop word."),
                QueryTerm::Unknown { token } => println!("{token} doesn't appear in any article."),
            }
        }
    }

    let defaults = index.config().search_options();
    let opts = SearchOptions {
        limit: limit.unwrap_or(defaults.limit),
        score_floor: score_floor.unwrap_or(defaults.score_floor),
        require_all_terms: all_keywords,
    };
    let hits = index.search(query, &opts)?;
    print!("{}", format_results(&index, query, &hits));
    Ok(())
}

fn format_results(index: &RankingIndex, query: &str, hits: &[newsrank::SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results for: {query}\n");
    }
    let mut out = String::new();
    for (rank, hit) in hits.iter().enumerate() {
        if let Some(doc) = index.document(hit.doc_id) {
            out.push_str(&format!("{}. {}\n", rank + 1, doc.title));
            out.push_str(&format!(" ----> Score: {}\n", hit.score));
            out.push_str(doc.description.trim());
            out.push_str("\n\n");
        }
    }
    out
}

/// Collect records from a JSON/JSONL file or every such file under a directory,
/// in file-name order so ids are reproducible.
fn load_records(input_path: &Path) -> Result<Vec<DocumentRecord>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("input path {} does not exist", input_path.display());
    }

    let mut records = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut records)?;
        } else {
            read_json(&file, &mut records)?;
        }
    }
    Ok(records)
}

fn read_jsonl(file: &Path, records: &mut Vec<DocumentRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let value: serde_json::Value = serde_json::from_str(&line).with_context(|| format!("parsing {}", file.display()))?;
        push_record(file, value, records)?;
    }
    Ok(())
}

fn read_json(file: &Path, records: &mut Vec<DocumentRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader).with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                push_record(file, v, records)?;
            }
        }
        other => push_record(file, other, records)?,
    }
    Ok(())
}

fn push_record(file: &Path, value: serde_json::Value, records: &mut Vec<DocumentRecord>) -> Result<()> {
    if !value.is_object() {
        tracing::warn!(file = %file.display(), "skipping non-object record");
        return Ok(());
    }
    records.push(serde_json::from_value(value)?);
    Ok(())
}
