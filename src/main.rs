mod frontmatter;
mod vault;

use clap::Parser;
use searchq::config::load_rule;
use searchq::{Filter, Matcher, Rule, SearchCompiler};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const ENV_LOG: &str = "SEARCHQ_LOG";

#[derive(Parser)]
#[command(
    name = "searchq",
    about = "Compile search strings into document-store filters"
)]
struct Cli {
    #[arg(long, env = "SEARCHQ_RULES", help = "YAML file with anyOf/isString/isDate field lists")]
    rules: Option<PathBuf>,

    #[arg(long, env = "SEARCHQ_VAULT", help = "Match Markdown frontmatter under this directory")]
    vault: Option<PathBuf>,

    #[arg(long, help = "Read file paths from stdin (use with --vault)")]
    stdin: bool,

    #[arg(long, help = "Pretty-print the compiled filter")]
    pretty: bool,

    #[arg(help = "Search string, e.g. 'deck:foo tag:hard due:+1d'")]
    query: String,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let rule = match &cli.rules {
        Some(path) => match load_rule(path) {
            Ok(rule) => rule,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(2);
            }
        },
        None => Rule::default(),
    };

    let filter = match SearchCompiler::new(rule).compile(&cli.query) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Query error: {}", e);
            return ExitCode::from(2);
        }
    };

    match &cli.vault {
        Some(vault_path) => run_match_mode(&filter, vault_path, cli.stdin),
        None => print_filter(&filter, cli.pretty),
    }
}

fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn print_filter(filter: &Filter, pretty: bool) -> ExitCode {
    let rendered = if pretty {
        serde_json::to_string_pretty(filter)
    } else {
        serde_json::to_string(filter)
    };
    match rendered {
        Ok(json) => {
            println!("{}", json);
            ExitCode::from(0)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run_match_mode(filter: &Filter, vault_path: &Path, from_stdin: bool) -> ExitCode {
    let matcher = match Matcher::new(filter) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Query error: {}", e);
            return ExitCode::from(2);
        }
    };

    let files = if from_stdin {
        vault::read_paths_from_stdin()
    } else {
        vault::collect_markdown_files(vault_path)
    };

    let mut found = false;

    for path in files {
        let Some(doc) = frontmatter::read_document(&path) else {
            continue;
        };
        if matcher.matches(&doc) {
            found = true;
            let display_path = path.strip_prefix(vault_path).unwrap_or(&path).display();
            println!("{}", display_path);
        }
    }

    if found {
        ExitCode::from(0)
    } else {
        ExitCode::from(1)
    }
}
