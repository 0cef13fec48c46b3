//! Command-line front end for the pattern discovery engine.

use std::collections::{BTreeMap, BTreeSet};
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use patternforge::candidates::generate_candidates;
use patternforge::{
    evaluate_expr, explain, io, propose_solution, propose_solution_structured, AllowedPatterns,
    Budgets, Effort, Error, InvertStrategy, Limit, PatternKind, PerField, QualityMode,
    SolveOptions, SplitMethod, Weights,
};

#[derive(Parser)]
#[command(name = "patternforge")]
#[command(version)]
#[command(about = "Discover compact wildcard expressions over identifier sets")]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Propose a new expression for an include/exclude dataset
    Propose(ProposeArgs),
    /// Evaluate a boolean expression over saved atoms
    Evaluate(EvaluateArgs),
    /// Explain a saved solution against its dataset
    Explain(ExplainArgs),
    /// One-paragraph summary of a saved solution
    Summarize(SummarizeArgs),
    /// Dump the scored candidate pool for inspection
    DumpCandidates(DumpCandidatesArgs),
}

#[derive(Args)]
struct SolveArgs {
    /// File with items to match (text, JSON lines, or CSV)
    #[arg(long)]
    include: String,

    /// File with items to avoid
    #[arg(long)]
    exclude: Option<String>,

    #[arg(long, default_value = "EXACT")]
    mode: String,

    #[arg(long, default_value = "medium")]
    effort: String,

    #[arg(long, default_value = "auto")]
    invert: String,

    #[arg(long, default_value = "classchange")]
    splitmethod: String,

    #[arg(long, default_value_t = 3)]
    min_token_len: usize,

    #[arg(long, default_value_t = 16)]
    per_word_substrings: usize,

    #[arg(long, default_value_t = 3)]
    max_multi_segments: usize,

    #[arg(long, default_value_t = 4000)]
    max_candidates: usize,

    /// Absolute count, or a fraction of the include size in (0,1)
    #[arg(long)]
    max_patterns: Option<f64>,

    #[arg(long)]
    max_fp: Option<f64>,

    #[arg(long)]
    max_fn: Option<f64>,

    #[arg(long)]
    w_fp: Option<f64>,

    #[arg(long)]
    w_fn: Option<f64>,

    #[arg(long)]
    w_atom: Option<f64>,

    #[arg(long)]
    w_op: Option<f64>,

    #[arg(long)]
    w_wc: Option<f64>,

    #[arg(long)]
    w_len: Option<f64>,

    /// Restrict pattern kinds (exact, substring, prefix, suffix, multi)
    #[arg(long, num_args = 1..)]
    allowed_patterns: Option<Vec<String>>,

    #[arg(long, default_value_t = false)]
    allow_complex_expressions: bool,
}

#[derive(Args)]
struct ProposeArgs {
    #[command(flatten)]
    solve: SolveArgs,

    /// Treat inputs as structured rows (JSON lines or CSV)
    #[arg(long, default_value_t = false)]
    structured: bool,

    /// Field order for structured rows
    #[arg(long, num_args = 1..)]
    fields: Option<Vec<String>>,

    /// Schema JSON ({name, delimiter, fields}) supplying the field order
    #[arg(long)]
    schema: Option<String>,

    #[arg(long, default_value = "-")]
    out: String,

    #[arg(long, default_value = "text", value_parser = ["text", "json", "simple"])]
    format: String,

    /// Also write the solution JSON to this path
    #[arg(long)]
    save_solution: Option<String>,
}

#[derive(Args)]
struct EvaluateArgs {
    #[arg(long)]
    include: String,

    #[arg(long)]
    exclude: Option<String>,

    /// Expression over atom ids, e.g. "P1 | P2 & !P3"
    #[arg(long)]
    expr: String,

    /// Solution JSON (or a bare list of {id, text} atoms)
    #[arg(long)]
    patterns: String,

    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Args)]
struct ExplainArgs {
    #[arg(long)]
    solution: String,

    #[arg(long)]
    include: String,

    #[arg(long)]
    exclude: Option<String>,

    #[arg(long, default_value = "text", value_parser = ["text", "json", "simple"])]
    format: String,
}

#[derive(Args)]
struct SummarizeArgs {
    #[arg(long)]
    solution: String,
}

#[derive(Args)]
struct DumpCandidatesArgs {
    #[arg(long)]
    include: String,

    #[arg(long, default_value = "classchange")]
    splitmethod: String,

    #[arg(long, default_value_t = 3)]
    min_token_len: usize,

    #[arg(long, default_value_t = 16)]
    per_word_substrings: usize,

    #[arg(long, default_value_t = 3)]
    max_multi_segments: usize,

    #[arg(long, default_value_t = 50)]
    top: usize,

    #[arg(long, default_value = "json", value_parser = ["text", "json"])]
    format: String,
}

fn parse_limit(value: Option<f64>, name: &str) -> Result<Option<Limit>, Error> {
    match value {
        None => Ok(None),
        Some(v) if v < 0.0 || !v.is_finite() => Err(Error::InvalidOption(format!(
            "{name} must be a non-negative count or a fraction in (0,1)"
        ))),
        Some(v) if v > 0.0 && v < 1.0 => Ok(Some(Limit::Fraction(v))),
        Some(v) => Ok(Some(Limit::Count(v as usize))),
    }
}

fn weight(value: Option<f64>, default: f64) -> PerField<f64> {
    PerField::Scalar(value.unwrap_or(default))
}

fn build_options(args: &SolveArgs) -> Result<SolveOptions, Error> {
    let allowed_patterns = match &args.allowed_patterns {
        None => None,
        Some(kinds) => {
            let parsed: BTreeSet<PatternKind> = kinds
                .iter()
                .map(|kind| PatternKind::from_str(kind))
                .collect::<Result<_, _>>()?;
            Some(AllowedPatterns::Global(parsed))
        }
    };
    let options = SolveOptions {
        mode: QualityMode::from_str(&args.mode)?,
        effort: Effort::from_str(&args.effort)?,
        invert: InvertStrategy::from_str(&args.invert)?,
        weights: Weights {
            w_fp: weight(args.w_fp, 1.0),
            w_fn: weight(args.w_fn, 1.0),
            w_atom: weight(args.w_atom, 0.05),
            w_op: weight(args.w_op, 0.02),
            w_wc: weight(args.w_wc, 0.01),
            w_len: weight(args.w_len, 0.001),
            w_field: BTreeMap::new(),
        },
        budgets: Budgets {
            max_candidates: args.max_candidates,
            max_patterns: parse_limit(args.max_patterns, "max_patterns")?,
            max_fp: parse_limit(args.max_fp, "max_fp")?,
            max_fn: parse_limit(args.max_fn, "max_fn")?,
        },
        splitmethod: PerField::Scalar(SplitMethod::from_str(&args.splitmethod)?),
        min_token_len: PerField::Scalar(args.min_token_len),
        per_word_substrings: args.per_word_substrings,
        max_multi_segments: args.max_multi_segments,
        allowed_patterns,
        allow_complex_expressions: args.allow_complex_expressions,
    };
    options.validate()?;
    Ok(options)
}

fn command_propose(args: &ProposeArgs) -> Result<(), Error> {
    let options = build_options(&args.solve)?;
    let fields: Option<Vec<String>> = match (&args.fields, &args.schema) {
        (Some(fields), _) => Some(fields.clone()),
        (None, Some(schema)) => Some(io::load_schema(schema)?.fields),
        (None, None) => None,
    };

    let (solution, include, exclude) = if args.structured {
        let include_rows = io::read_structured_rows(&args.solve.include, fields.as_deref())?;
        let exclude_rows = match &args.solve.exclude {
            Some(path) => io::read_structured_rows(path, fields.as_deref())?,
            None => Vec::new(),
        };
        let solution = propose_solution_structured(
            &include_rows,
            &exclude_rows,
            fields.as_deref(),
            &options,
        )?;
        (solution, Vec::new(), Vec::new())
    } else {
        let include = io::read_items(&args.solve.include)?;
        let exclude = match &args.solve.exclude {
            Some(path) => io::read_items(path)?,
            None => Vec::new(),
        };
        let solution = propose_solution(&include, &exclude, &options)?;
        (solution, include, exclude)
    };
    info!(expr = %solution.expr, covered = solution.metrics.covered, "proposed solution");

    match args.format.as_str() {
        "json" => io::write_json(&solution.to_json(), &args.out)?,
        "simple" => io::write_text(&explain::explain_simple(&solution), &args.out)?,
        _ => io::write_text(&explain::explain_text(&solution, &include, &exclude), &args.out)?,
    }
    if let Some(path) = &args.save_solution {
        io::save_solution(&solution, path)?;
    }
    Ok(())
}

fn command_evaluate(args: &EvaluateArgs) -> Result<(), Error> {
    let include = io::read_items(&args.include)?;
    let exclude = match &args.exclude {
        Some(path) => io::read_items(path)?,
        None => Vec::new(),
    };
    let payload: serde_json::Value =
        serde_json::from_reader(std::io::BufReader::new(std::fs::File::open(&args.patterns)?))?;
    let atom_list = match &payload {
        serde_json::Value::Object(map) => map
            .get("patterns")
            .and_then(|v| v.as_array())
            .cloned()
            .ok_or_else(|| {
                Error::InputShape("patterns file must hold a 'patterns' list".to_string())
            })?,
        serde_json::Value::Array(list) => list.clone(),
        _ => {
            return Err(Error::InputShape(
                "patterns file must be a list or an object with 'patterns'".to_string(),
            ))
        }
    };
    let mut atoms: BTreeMap<String, String> = BTreeMap::new();
    for entry in &atom_list {
        let (Some(id), Some(text)) = (
            entry.get("id").and_then(|v| v.as_str()),
            entry.get("text").and_then(|v| v.as_str()),
        ) else {
            return Err(Error::InputShape(
                "each pattern needs 'id' and 'text'".to_string(),
            ));
        };
        atoms.insert(id.to_string(), text.to_string());
    }

    let metrics = evaluate_expr(&args.expr, &atoms, &include, &exclude)?;
    if args.format == "json" {
        io::write_json(&serde_json::to_value(&metrics)?, "-")?;
    } else {
        io::write_text(
            &format!(
                "EXPR: {}\nCOVERED {} of {} (FN={}) FP={}",
                args.expr, metrics.covered, metrics.total_positive, metrics.fn_count, metrics.fp
            ),
            "-",
        )?;
    }
    Ok(())
}

fn command_explain(args: &ExplainArgs) -> Result<(), Error> {
    let solution = io::load_solution(&args.solution)?;
    let include = io::read_items(&args.include)?;
    let exclude = match &args.exclude {
        Some(path) => io::read_items(path)?,
        None => Vec::new(),
    };
    match args.format.as_str() {
        "json" => io::write_json(&explain::explain_dict(&solution, &include, &exclude), "-")?,
        "simple" => io::write_text(&explain::explain_simple(&solution), "-")?,
        _ => io::write_text(&explain::explain_text(&solution, &include, &exclude), "-")?,
    }
    Ok(())
}

fn command_summarize(args: &SummarizeArgs) -> Result<(), Error> {
    let solution = io::load_solution(&args.solution)?;
    io::write_text(&explain::summarize_text(&solution), "-")
}

fn command_dump_candidates(args: &DumpCandidatesArgs) -> Result<(), Error> {
    let include = io::read_items(&args.include)?;
    let options = SolveOptions {
        splitmethod: PerField::Scalar(SplitMethod::from_str(&args.splitmethod)?),
        min_token_len: PerField::Scalar(args.min_token_len),
        per_word_substrings: args.per_word_substrings,
        max_multi_segments: args.max_multi_segments,
        ..SolveOptions::default()
    };
    let generated = generate_candidates(&include, &options);
    let top = &generated[..generated.len().min(args.top)];
    if args.format == "json" {
        let payload: Vec<serde_json::Value> = top
            .iter()
            .map(|c| {
                serde_json::json!({
                    "pattern": c.pattern,
                    "kind": c.kind,
                    "score": c.score,
                })
            })
            .collect();
        io::write_json(&serde_json::Value::Array(payload), "-")?;
    } else {
        let lines: Vec<String> = top
            .iter()
            .map(|c| format!("{}\t{}\t{:.2}", c.pattern, c.kind, c.score))
            .collect();
        io::write_text(&lines.join("\n"), "-")?;
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), Error> {
    match &cli.command {
        Command::Propose(args) => command_propose(args),
        Command::Evaluate(args) => command_evaluate(args),
        Command::Explain(args) => command_explain(args),
        Command::Summarize(args) => command_summarize(args),
        Command::DumpCandidates(args) => command_dump_candidates(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("patternforge={}", cli.log_level))),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
