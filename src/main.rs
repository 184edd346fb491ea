mod convert;
mod env_check;
mod ocr;
mod parser;
mod pdf;
mod util;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};

use crate::ocr::OcrOptions;
use crate::parser::ParseOptions;

#[derive(Parser)]
#[command(
    name = "jlpt_extract",
    about = "Batch converters for JLPT study material (PDF, OCR scans) into app JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report availability of OCR and PDF capabilities
    CheckEnv,
    /// Extract the vocabulary PDF into lesson JSON
    ExtractPdf {
        /// Path to the vocabulary PDF
        pdf: PathBuf,
        /// Output JSON path
        #[arg(short, long, default_value = "public/data/tu-vung-n3.json")]
        output: PathBuf,
    },
    /// OCR a folder of grammar photos into raw JSON
    Ocr {
        #[command(flatten)]
        ocr: OcrArgs,
    },
    /// Split the raw OCR output into grammar entries and lessons
    Parse {
        #[command(flatten)]
        parse: ParseArgs,
    },
    /// Convert grammar lessons JSON into vocabulary-card lessons
    Convert {
        /// Grammar lessons source file
        #[arg(long, default_value = "public/data/ngu-phap-n3.json")]
        input: PathBuf,
        /// Directory for the two output files
        #[arg(long, default_value = "public/data")]
        output_dir: PathBuf,
    },
    /// Ocr + parse in one pipeline
    Run {
        #[command(flatten)]
        ocr: OcrArgs,
        #[command(flatten)]
        parse: ParseArgs,
    },
}

#[derive(Args)]
struct OcrArgs {
    /// Folder of grammar photos
    #[arg(long, default_value = "scripts/input_images")]
    input_dir: PathBuf,
    /// Folder for per-image and combined JSON
    #[arg(long, default_value = "scripts/output")]
    output_dir: PathBuf,
    /// Tesseract language(s), e.g. "jpn+vie+eng"
    #[arg(long)]
    lang: Option<String>,
    /// Tesseract page segmentation mode
    #[arg(long, default_value = "3")]
    psm: u32,
}

#[derive(Args)]
struct ParseArgs {
    /// Combined raw OCR JSON produced by the ocr step
    #[arg(long, default_value = "scripts/output/grammar_extracted_raw.json")]
    raw: PathBuf,
    /// Parsed output path
    #[arg(long, default_value = "scripts/output/grammar_parsed.json")]
    output: PathBuf,
    /// Copy of the parsed output for the web app
    #[arg(long, default_value = "public/data/grammar_parsed.json")]
    public_copy: PathBuf,
    /// Entries per lesson
    #[arg(long, default_value = "5")]
    per_lesson: usize,
    /// Max chars for the short-Japanese-line heading rule
    #[arg(long, default_value = "60")]
    heading_max_chars: usize,
    /// Patterns shorter than this are merge candidates
    #[arg(long, default_value = "3")]
    merge_min_pattern_chars: usize,
    /// Entries with fewer body lines than this are merge candidates
    #[arg(long, default_value = "3")]
    merge_max_body_lines: usize,
}

impl ParseArgs {
    fn options(&self) -> ParseOptions {
        ParseOptions {
            heading_max_chars: self.heading_max_chars,
            merge_min_pattern_chars: self.merge_min_pattern_chars,
            merge_max_body_lines: self.merge_max_body_lines,
            per_lesson: self.per_lesson,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::CheckEnv => {
            env_check::check().print();
            Ok(())
        }
        Commands::ExtractPdf { pdf, output } => cmd_extract_pdf(&pdf, &output),
        Commands::Ocr { ocr } => cmd_ocr(&ocr).map(|_| ()),
        Commands::Parse { parse } => cmd_parse(&parse),
        Commands::Convert { input, output_dir } => cmd_convert(&input, &output_dir),
        Commands::Run { ocr, parse } => {
            let stats = cmd_ocr(&ocr)?;
            if stats.ok == 0 {
                println!("Nothing to parse (no image produced OCR output).");
                return Ok(());
            }
            cmd_parse(&parse)
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", util::format_duration(elapsed));
    }

    result
}

fn cmd_extract_pdf(pdf_path: &Path, output: &Path) -> anyhow::Result<()> {
    if !pdf_path.exists() {
        bail!("PDF not found: {}", pdf_path.display());
    }

    println!("Extracting text from: {}", pdf_path.display());
    let text = pdf::extract_text(pdf_path)?;
    println!("Extracted {} characters", text.chars().count());

    let source_file = pdf_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let data = pdf::structure_vocabulary(&text, source_file);

    util::write_json(output, &data)?;
    println!("Saved to: {}", output.display());
    println!("Found {} lessons", data.total_lessons);
    if let Some(first) = data.lessons.first() {
        println!("First lesson: {}", first.title);
    }
    Ok(())
}

fn cmd_ocr(args: &OcrArgs) -> anyhow::Result<ocr::OcrStats> {
    env_check::require_ocr()?;

    let opts = OcrOptions {
        lang: args.lang.clone(),
        psm: args.psm,
    };
    let stats = ocr::run_batch(&args.input_dir, &args.output_dir, &opts)?;
    if stats.total > 0 {
        println!(
            "Done: {} images ({} ok, {} errors). Combined: {}",
            stats.total,
            stats.ok,
            stats.errors,
            args.output_dir.join("grammar_extracted_raw.json").display()
        );
    }
    Ok(stats)
}

fn cmd_parse(args: &ParseArgs) -> anyhow::Result<()> {
    if !args.raw.exists() {
        bail!("{} not found. Run the ocr step first.", args.raw.display());
    }

    let batch: ocr::RawBatch = util::read_json(&args.raw)?;
    let parsed = parser::parse_batch(&batch, &args.raw.display().to_string(), &args.options())?;

    util::write_json(&args.output, &parsed)?;
    util::write_json(&args.public_copy, &parsed)?;

    println!(
        "Parsed {} entries into {} lessons.",
        parsed.meta.count_entries, parsed.meta.count_lessons
    );
    println!(
        "Wrote {} and {}",
        args.output.display(),
        args.public_copy.display()
    );
    Ok(())
}

fn cmd_convert(input: &Path, output_dir: &Path) -> anyhow::Result<()> {
    if !input.exists() {
        bail!("{} not found. Run the earlier steps first.", input.display());
    }

    let doc: convert::GrammarDoc = util::read_json(input)?;
    let (lessons, refined) = convert::convert(&doc);

    let vocab_file = output_dir.join("grammar_vocabulary_lessons.json");
    let refined_file = output_dir.join("grammar_parsed_refined.json");
    util::write_json(&vocab_file, &lessons)?;
    util::write_json(&refined_file, &refined)?;

    println!("Wrote {} and {}", vocab_file.display(), refined_file.display());
    Ok(())
}
