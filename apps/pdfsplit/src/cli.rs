//! Command-line interface
//!
//! Argument definitions plus the glue between parsed arguments and the
//! splitter.

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use pdfsplit_core::{LopdfEngine, OutputFile, PageRange, SplitReport, Splitter, Strategy};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pdf-split")]
#[command(
    version,
    about = "Split a PDF into smaller PDFs by page count, page range, bookmark or keyword",
    disable_version_flag = true
)]
pub struct Args {
    /// Input PDF file
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Print a JSON report on stdout instead of the summary
    #[arg(long)]
    pub json: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,

    #[command(subcommand)]
    pub mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Split into files of a fixed number of pages
    Pages {
        /// Pages per output file
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        num: u32,
    },

    /// Extract page ranges, e.g. `1-5 8-10`
    Range {
        /// 1-indexed inclusive ranges, `<start>-<end>`
        #[arg(required = true)]
        ranges: Vec<PageRange>,
    },

    /// Split at every top-level bookmark
    Bookmark,

    /// Start a new file at every page containing a keyword
    Keyword {
        /// Case-sensitive text to look for
        #[arg(value_parser = clap::builder::NonEmptyStringValueParser::new())]
        keyword: String,
    },
}

impl Mode {
    fn strategy(&self) -> Strategy {
        match self {
            Mode::Pages { num } => Strategy::Pages {
                pages_per_file: *num,
            },
            Mode::Range { ranges } => Strategy::Range {
                ranges: ranges.iter().map(ToString::to_string).collect(),
            },
            Mode::Bookmark => Strategy::Bookmark,
            Mode::Keyword { keyword } => Strategy::Keyword {
                keyword: keyword.clone(),
            },
        }
    }
}

/// Open the input, run the requested strategy and describe what was written
pub fn execute(args: &Args, mode: &Mode) -> anyhow::Result<SplitReport> {
    if !args.input.exists() {
        bail!("Input file does not exist: {}", args.input.display());
    }

    let started = Instant::now();
    let splitter = Splitter::open(LopdfEngine::new(), &args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let total_pages = splitter.total_pages();
    info!(input = %args.input.display(), total_pages, "Processing");

    let output_dir = args.output.as_path();
    let outputs: Vec<OutputFile> = match mode {
        Mode::Pages { num } => splitter.split_by_pages(*num, output_dir)?,
        Mode::Range { ranges } => splitter.split_by_range(ranges, output_dir)?,
        Mode::Bookmark => splitter.split_by_bookmark(output_dir)?,
        Mode::Keyword { keyword } => splitter.split_by_keyword(keyword, output_dir)?,
    };

    Ok(SplitReport::new(
        &args.input,
        output_dir,
        total_pages,
        mode.strategy(),
        outputs,
        started.elapsed().as_millis() as u64,
    ))
}

/// Human-readable summary of a finished run
pub fn render_summary(report: &SplitReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Input: {}", report.source.display());
    let _ = writeln!(out, "Total pages: {}", report.total_pages);
    for reported in &report.files {
        let file = &reported.file;
        let _ = writeln!(
            out,
            "✓ {} (pages {}-{})",
            file.path.display(),
            file.first_page,
            file.last_page
        );
    }
    if report.files.is_empty() {
        let _ = writeln!(out, "No files generated");
    }
    let _ = writeln!(out, "Done. Output directory: {}", report.output_dir.display());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use lopdf::{Dictionary, Document, Object, Stream};
    use pretty_assertions::assert_eq;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(argv)
    }

    /// Blank pages are enough for page-count based splitting
    fn create_test_pdf(num_pages: u32) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for _ in 0..num_pages {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ]),
                ),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(num_pages as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_pages() {
        let args = parse(&["pdf-split", "in.pdf", "pages", "5"]).unwrap();
        assert_eq!(args.input, PathBuf::from("in.pdf"));
        assert_eq!(args.output, PathBuf::from("output"));
        assert_eq!(args.mode, Some(Mode::Pages { num: 5 }));
    }

    #[test]
    fn test_parse_pages_rejects_zero() {
        assert!(parse(&["pdf-split", "in.pdf", "pages", "0"]).is_err());
    }

    #[test]
    fn test_parse_ranges() {
        let args = parse(&["pdf-split", "in.pdf", "-o", "parts", "range", "1-5", "8-10"]).unwrap();
        assert_eq!(args.output, PathBuf::from("parts"));
        assert_eq!(
            args.mode,
            Some(Mode::Range {
                ranges: vec![PageRange::new(1, 5).unwrap(), PageRange::new(8, 10).unwrap()]
            })
        );
    }

    #[test]
    fn test_parse_range_rejects_malformed() {
        assert!(parse(&["pdf-split", "in.pdf", "range", "1-x"]).is_err());
        assert!(parse(&["pdf-split", "in.pdf", "range"]).is_err());
    }

    #[test]
    fn test_parse_keyword_and_bookmark() {
        let args = parse(&["pdf-split", "in.pdf", "--output", "o", "keyword", "Chapter"]).unwrap();
        assert_eq!(
            args.mode,
            Some(Mode::Keyword {
                keyword: "Chapter".into()
            })
        );

        let args = parse(&["pdf-split", "in.pdf", "bookmark"]).unwrap();
        assert_eq!(args.mode, Some(Mode::Bookmark));
    }

    #[test]
    fn test_parse_keyword_rejects_empty() {
        assert!(parse(&["pdf-split", "in.pdf", "keyword", ""]).is_err());
    }

    #[test]
    fn test_parse_without_mode() {
        let args = parse(&["pdf-split", "in.pdf"]).unwrap();
        assert_eq!(args.mode, None);
    }

    #[test]
    fn test_short_version_flag() {
        let err = parse(&["pdf-split", "-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_execute_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.pdf");
        let args = parse(&["pdf-split", input.to_str().unwrap(), "bookmark"]).unwrap();

        let err = execute(&args, &Mode::Bookmark).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_execute_pages_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan.pdf");
        create_test_pdf(5).save(&input).unwrap();
        let output = dir.path().join("out");

        let args = parse(&[
            "pdf-split",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "pages",
            "2",
        ])
        .unwrap();
        let mode = args.mode.clone().unwrap();
        let report = execute(&args, &mode).unwrap();

        assert_eq!(report.total_pages, 5);
        assert_eq!(report.files.len(), 3);
        assert!(output.join("scan_part3.pdf").is_file());
        assert!(report.files.iter().all(|f| f.size_bytes.is_some()));

        let summary = render_summary(&report);
        assert!(summary.contains("Total pages: 5"));
        assert!(summary.contains("scan_part2.pdf (pages 3-4)"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["strategy"]["type"], "pages");
        assert_eq!(json["files"][2]["page_count"], 1);
    }
}
