//! Command line tool for cuneiform manuscript XML.
//!
//! Converts free-text transliterations to manuscript XML, merges two
//! transcription passes of the same side, and reformats existing documents
//! through the canonical writer.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use clap::{Parser, Subcommand};

use aoxml::merge::{align_lines, collect_document_lines, export_merged_document, Publication};
use aoxml::node::{element_node, find_first_by_tag_name, Attributes, NodeRef};
use aoxml::translit::{parse_transliteration, write_line_parse_success_to_xml, LineParseResult};
use aoxml::xml::{parse_file, tlh_write_config, write_xml};

/// Cuneiform manuscript XML tool
#[derive(Parser)]
#[command(name = "aoxml")]
#[command(version)]
#[command(about = "Convert, merge and format cuneiform manuscript XML", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a transliteration text file to manuscript XML
    #[command(visible_alias = "c")]
    Convert {
        /// Transliteration input file
        input: String,
        /// Output file (default: stdout)
        output: Option<String>,
        /// Language tag written to the text element
        #[arg(short, long, default_value = "Hit")]
        language: String,
    },

    /// Merge two transcription passes of the same side
    #[command(visible_alias = "m")]
    Merge {
        /// First document (its header wins)
        left: String,
        /// Second document
        right: String,
        /// Output file (default: stdout)
        output: Option<String>,
    },

    /// Parse a document and rewrite it through the canonical writer
    #[command(visible_alias = "f")]
    Format {
        /// Input file
        input: String,
        /// Output file (default: stdout)
        output: Option<String>,
    },
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            language,
        } => run_convert(&input, output.as_deref(), &language),
        Commands::Merge {
            left,
            right,
            output,
        } => run_merge(&left, &right, output.as_deref()),
        Commands::Format { input, output } => run_format(&input, output.as_deref()),
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

/// Opens the output file, or stdout when none was given.
fn open_output(output_path: Option<&str>) -> Result<Box<dyn Write>, Box<dyn std::error::Error>> {
    Ok(match output_path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    })
}

/// Converts a transliteration to XML. Lines that fail to parse are
/// reported on stderr and skipped; the good lines are still written.
fn run_convert(
    input_path: &str,
    output_path: Option<&str>,
    language: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing transliteration: {}", input_path);
    let text = std::fs::read_to_string(input_path)?;
    let results = parse_transliteration(&text);

    let mut children: Vec<NodeRef> = Vec::new();
    let mut error_count = 0usize;

    for (index, result) in results.iter().enumerate() {
        match result {
            LineParseResult::Success(success) => {
                children.extend(write_line_parse_success_to_xml(success));
            }
            LineParseResult::PreParsingError { input, reason } => {
                error_count += 1;
                eprintln!("Line {}: {} ('{}')", index + 1, reason, input);
            }
            LineParseResult::WordParsingError { input, reason, .. } => {
                error_count += 1;
                eprintln!("Line {}: {} ('{}')", index + 1, reason, input);
            }
        }
    }

    let text_element = element_node(
        "text",
        aoxml::node::attrs(&[("xml:lang", language)]),
        children,
    );
    let div1 = element_node(
        "div1",
        aoxml::node::attrs(&[("type", "transliteration")]),
        vec![text_element],
    );

    let mut output = open_output(output_path)?;
    writeln!(output, "{}", write_xml(&div1, &tlh_write_config()))?;
    output.flush()?;

    if error_count > 0 {
        eprintln!(
            "Converted {} lines with {} errors.",
            results.len(),
            error_count
        );
    } else {
        eprintln!("Converted {} lines.", results.len());
    }

    Ok(())
}

/// Merges two transcription passes by line number.
fn run_merge(
    left_path: &str,
    right_path: &str,
    output_path: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing left: {}", left_path);
    let left_doc = parse_file(left_path)?;

    eprintln!("Parsing right: {}", right_path);
    let right_doc = parse_file(right_path)?;

    let left_lines = collect_document_lines(&left_doc)?;
    let right_lines = collect_document_lines(&right_doc)?;

    eprintln!(
        "Aligning {} + {} lines...",
        left_lines.len(),
        right_lines.len()
    );
    let merged = align_lines(&left_lines, &right_lines)?;

    let header = document_header(&left_doc);
    let publications = [
        Publication {
            number: "1".to_string(),
            text: document_id(&left_doc, left_path),
        },
        Publication {
            number: "2".to_string(),
            text: document_id(&right_doc, right_path),
        },
    ];
    let language = find_first_by_tag_name(&left_doc, "text")
        .and_then(|text| text.attribute("xml:lang"))
        .unwrap_or("Hit")
        .to_string();

    let exported = export_merged_document(&merged, &header, &publications, &language);

    let mut output = open_output(output_path)?;
    writeln!(output, "{}", write_xml(&exported, &tlh_write_config()))?;
    output.flush()?;

    eprintln!("Merge complete: {} lines.", merged.len());
    Ok(())
}

/// Re-serializes a document through the canonical writer.
fn run_format(
    input_path: &str,
    output_path: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing: {}", input_path);
    let doc = parse_file(input_path)?;

    let mut output = open_output(output_path)?;
    writeln!(output, "{}", write_xml(&doc, &tlh_write_config()))?;
    output.flush()?;

    eprintln!("Format complete.");
    Ok(())
}

/// The document's header element, or an empty one when absent.
fn document_header(doc: &NodeRef) -> NodeRef {
    find_first_by_tag_name(doc, "AOHeader")
        .map(|header| {
            element_node(
                &header.tag_name,
                header.attributes.clone(),
                header.children.clone(),
            )
        })
        .unwrap_or_else(|| element_node("AOHeader", Attributes::default(), vec![]))
}

/// The document's `docID` text, falling back to its file path.
fn document_id(doc: &NodeRef, path: &str) -> String {
    find_first_by_tag_name(doc, "docID")
        .and_then(|doc_id| doc_id.children.first())
        .and_then(|child| child.as_text())
        .map(|text| text.text_content.clone())
        .unwrap_or_else(|| path.to_string())
}
