use clap::Parser;
use xmlpoke::{CommitMode, Document, FileArg, PokeError, PokeOptions, PokeOutcome, Value, poke};

/// Patch XML files with XPath.
///
/// Operations run in the order: ensure, clear, remove, set, set-or-add, add.
/// A single pattern starting with `<` is patched as literal XML and printed.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Glob patterns of the files to patch
    #[arg(required = true)]
    patterns: Vec<String>,

    /// Set existing nodes
    #[arg(long, value_name = "PATH=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,

    /// Set nodes, creating the target under each parent when missing
    #[arg(long, value_name = "PATH=VALUE", value_parser = parse_assignment)]
    set_or_add: Vec<(String, String)>,

    /// Always create a new target under each parent
    #[arg(long, value_name = "PATH=VALUE", value_parser = parse_assignment)]
    add: Vec<(String, String)>,

    /// Create every missing step of a path
    #[arg(long, value_name = "PATH")]
    ensure: Vec<String>,

    /// Remove the children of matching nodes
    #[arg(long, value_name = "PATH")]
    clear: Vec<String>,

    /// Remove matching nodes
    #[arg(long, value_name = "PATH")]
    remove: Vec<String>,

    /// Namespace prefix to use in paths
    #[arg(long = "namespace", value_name = "PREFIX=URI", value_parser = parse_assignment)]
    namespaces: Vec<(String, String)>,

    /// Path prepended to every operation path
    #[arg(long)]
    base_path: Option<String>,

    /// Fail when a path matches nothing
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Write files only after every file was patched
    #[arg(long, default_value_t = false)]
    staged: bool,

    /// Write values as CDATA sections
    #[arg(long, default_value_t = false)]
    cdata: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Splits `PATH=VALUE` at the first `=` outside predicates and quotes.
fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, '=') if depth == 0 => return Ok((s[..i].to_string(), s[i + 1..].to_string())),
            _ => {}
        }
    }
    Err(format!("expected NAME=VALUE, got '{s}'"))
}

fn apply(args: &Args, doc: &mut Document) -> Result<(), PokeError> {
    let value = |v: &str| if args.cdata { Value::cdata(v) } else { Value::from(v) };
    for path in &args.ensure {
        doc.ensure(path)?;
    }
    for path in &args.clear {
        doc.clear(path)?;
    }
    for path in &args.remove {
        doc.remove(path)?;
    }
    for (path, v) in &args.set {
        doc.set(path, value(v))?;
    }
    for (path, v) in &args.set_or_add {
        doc.set_or_add(path, value(v))?;
    }
    for (path, v) in &args.add {
        doc.add(path, value(v))?;
    }
    Ok(())
}

fn main() -> Result<(), PokeError> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut options = PokeOptions::new()
        .with_strict(args.strict)
        .with_commit_mode(if args.staged {
            CommitMode::Staged
        } else {
            CommitMode::Immediate
        });
    if let Some(base_path) = &args.base_path {
        options = options.with_base_path(base_path.as_str());
    }
    for (prefix, uri) in &args.namespaces {
        options = options.with_namespace(prefix.as_str(), uri.as_str());
    }

    let patterns: Vec<FileArg> = args.patterns.iter().map(|p| FileArg::from(p.as_str())).collect();
    match poke(&patterns, &options, |doc, _| apply(&args, doc))? {
        PokeOutcome::Literal(xml) => println!("{xml}"),
        PokeOutcome::Files(report) => {
            for file in &report.files {
                log::info!("Patched {}", file.display());
            }
            println!("Patched {} file(s)", report.files.len());
        }
    }
    Ok(())
}
