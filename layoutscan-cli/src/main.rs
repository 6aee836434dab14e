use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

// Import from layoutscan-core
use layoutscan_core::{DocumentProcessor, Granularity, ParsingConfig, StepProfiler};

#[derive(Parser)]
#[command(name = "layoutscan")]
#[command(about = "Classify the lines of a TETML layout extraction")]
struct Args {
    /// Path to the TETML file to process
    #[arg(short, long)]
    input: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Document identifier written into every output (default: random UUID)
    #[arg(long)]
    document_id: Option<String>,

    /// Output view: line, page or word (overrides the config file)
    #[arg(short, long)]
    granularity: Option<Granularity>,

    /// Output directory (default: directory of the input file)
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Also write the heading table of contents (<stem>.line_heading.json)
    #[arg(long)]
    heading_toc: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Show available config options and exit
    #[arg(long)]
    show_configs: bool,

    /// Write the active heading rule table as JSON to this path and exit
    #[arg(long)]
    export_rules: Option<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    println!("🦀 Layoutscan TETML Classifier");

    if let Err(e) = run(&args) {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    if args.show_configs {
        show_help();
        return Ok(());
    }

    let config_path = args.config.as_deref().map(Path::new);
    let mut config = ParsingConfig::load_or_default(config_path).with_context(|| {
        format!(
            "Failed to load config from {}",
            args.config.as_deref().unwrap_or_default()
        )
    })?;

    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }

    // Apply CLI overrides to config
    if let Some(granularity) = args.granularity {
        config.output.granularity = granularity;
    }
    if args.heading_toc {
        config.output.heading_toc = true;
    }
    log::debug!("Effective config: {:?}", config);

    let processor = DocumentProcessor::new(config)?;

    if let Some(rules_path) = &args.export_rules {
        processor.export_heading_rules(Path::new(rules_path))?;
        println!("💾 Heading rules exported to: {}", rules_path);
        return Ok(());
    }

    let Some(input) = &args.input else {
        anyhow::bail!("No input file given (use --input <path>)");
    };

    let input_path = Path::new(input);
    if !input_path.is_file() {
        anyhow::bail!("Input TETML not found at: {}", input);
    }

    let document_id = args
        .document_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    println!("📄 Processing: {}", input);

    let mut profiler = StepProfiler::new(args.profile);
    let processed = processor
        .process_file_with_profiling(input_path, &document_id, &mut profiler)
        .context("Processing failed")?;

    let counts = &processed.document.counts;
    println!("✅ Successfully processed document");
    println!("📊 Document metrics:");
    println!("   - Pages: {}", counts.no_pages);
    println!("   - Paragraphs: {}", counts.no_paragraphs);
    println!("   - Lines: {}", counts.no_lines);
    if processor.config().output.granularity == Granularity::Line {
        println!("   - Headings: {}", counts.no_headings);
        println!("   - Bulleted lists: {}", counts.no_lists_bullet);
        println!("   - Numbered lists: {}", counts.no_lists_number);
        println!("   - Tables: {}", counts.no_tables);
        println!(
            "   - Header / footer / TOC lines: {} / {} / {}",
            counts.no_lines_header, counts.no_lines_footer, counts.no_lines_toc
        );
    }

    let output_dir = output_dir(args, input_path);
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let written = profiler
        .time_step("Write outputs", || {
            processor.write_outputs(&processed, &output_dir, stem)
        })
        .with_context(|| format!("Failed to write outputs for {}", input))?;
    for path in &written {
        println!("💾 Saved: {}", path.display());
    }

    profiler.print_summary();

    Ok(())
}

fn output_dir(args: &Args, input_path: &Path) -> PathBuf {
    match &args.output_dir {
        Some(dir) => PathBuf::from(dir),
        None => input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

fn show_help() {
    println!("\n📋 Available Configuration Options:");
    println!("  --input <path>          TETML file to process");
    println!("  --config <path>         Load custom config file (YAML)");
    println!("  --document-id <id>      Identifier written into outputs (default: random UUID)");
    println!("  --granularity <view>    Output view: line, page or word");
    println!("  --output-dir <path>     Output directory (default: next to the input)");
    println!("  --heading-toc           Also write <stem>.line_heading.json");
    println!("  --profile               Print step and rule timings");
    println!("  --export-rules <path>   Write the active heading rules as JSON and exit");

    println!("\n📄 Output Views:");
    println!("  line  - Every line with its type and coordinates (default)");
    println!("  page  - Paragraph texts per page");
    println!("  word  - Words per line, per paragraph");

    println!("\n🏷️  Line types (line view only):");
    println!("  body, header, footer, heading:<level>, list-bullet, list-number, table, toc");

    println!("\n⚙️  Config sections:");
    println!("  output         granularity, heading_toc");
    println!("  pipeline       rules: [{{name, enabled}}] (order is fixed)");
    println!("  header_footer  max_lines_header, max_lines_footer, max_distance, min_pages");
    println!("  toc            last_page, min_entries");
    println!("  heading        max_level, min_pages, tolerance_llx, toc_context_lines,");
    println!("                 toc_include_regexp, rule_file");
    println!("  list_bullet    min_entries, tolerance_llx, rule_file");
    println!("  list_number    min_entries, tolerance_llx, rule_file");

    println!("\n📝 Usage Examples:");
    println!("  cargo run -- -i report.tetml");
    println!("  cargo run -- -i report.tetml -g page -o /tmp/out");
    println!("  cargo run -- -i report.tetml -c config.yaml --heading-toc --profile");
    println!("  cargo run -- --export-rules heading_rules.json");
}
