//! Entrypoint for CLI
use std::{
    env,
    error::Error,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use jack::{prelude::*, IMPL_VERSION};
use log::{error, info};

static USAGE: &str = r#"
usage: jackc CMD PATH [CONFIG]

commands:
    compile    Compile a .jack file, or every .jack file in a directory,
               into .vm files next to the sources
    tokens     Print the tokens of a .jack file as XML
    analyze    Print the parse tree of a .jack file as XML

options:
    CONFIG     YAML file with compiler settings, for example:
                   strict_declarations: true

examples:
    jackc compile Square
    jackc compile Main.jack strict.yaml
    jackc tokens Main.jack
    jackc analyze Main.jack
"#;

fn load_conf(filepath: Option<&str>) -> Result<CompileConf, Box<dyn Error>> {
    match filepath {
        Some(filepath) => {
            let text = fs::read_to_string(filepath)?;
            let conf: CompileConf = serde_yaml::from_str(&text)?;
            info!("loaded {filepath}: {conf:?}");
            Ok(conf)
        }
        None => Ok(CompileConf::default()),
    }
}

/// Source files to compile, in a stable order.
fn collect_sources(path: &Path) -> io::Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut sources = vec![];
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.extension().map_or(false, |ext| ext == "jack") {
            sources.push(entry_path);
        }
    }
    sources.sort();

    Ok(sources)
}

fn run_compiler(path: impl AsRef<Path>, config: Option<&str>) -> Result<(), Box<dyn Error>> {
    let conf = load_conf(config)?;
    let sources = collect_sources(path.as_ref())?;

    if sources.is_empty() {
        error!("no .jack files in {}", path.as_ref().display());
        return Err("nothing to compile".into());
    }

    for source_path in sources {
        let source_code = fs::read_to_string(&source_path)?;

        let start = Instant::now();
        let result = jack::compile_with(source_code, conf.clone());
        let elapsed = start.elapsed();

        match result {
            Ok(vm) => {
                let out_path = source_path.with_extension("vm");
                fs::write(&out_path, vm)?;
                info!(
                    "{} -> {} ({}ms)",
                    source_path.display(),
                    out_path.display(),
                    elapsed.as_nanos() as f64 / 1000000.0
                );
            }
            Err(err) => {
                error!("{}: {err}", source_path.display());
                // Exit process with error
                return Err(err.into());
            }
        }
    }

    Ok(())
}

fn run_tokenizer(filepath: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
    let source_code = fs::read_to_string(filepath.as_ref())?;

    let stdout = io::stdout().lock();
    let mut stdout = jack::xml::write_tokens(&source_code, stdout)?;
    stdout.flush()?;

    Ok(())
}

fn run_analyzer(filepath: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
    let source_code = fs::read_to_string(filepath.as_ref())?;

    let stdout = io::BufWriter::new(io::stdout().lock());
    let mut stdout = jack::xml::write_parse_tree(&source_code, stdout)?;
    stdout.flush()?;

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    match parse_args() {
        Some(Cmd::Compile { path, config }) => run_compiler(path, config.as_deref())?,
        Some(Cmd::Tokens { filepath }) => run_tokenizer(filepath)?,
        Some(Cmd::Analyze { filepath }) => run_analyzer(filepath)?,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    let cmd = args.next()?;

    match cmd.as_str() {
        "compile" => Some(Cmd::Compile {
            path: args.next()?,
            config: args.next(),
        }),
        "tokens" => Some(Cmd::Tokens {
            filepath: args.next()?,
        }),
        "analyze" => Some(Cmd::Analyze {
            filepath: args.next()?,
        }),
        _ => None,
    }
}

fn print_usage() {
    println!("Jack compiler v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Compile a file or directory
    Compile {
        path: String,
        config: Option<String>,
    },
    /// Dump tokens
    Tokens { filepath: String },
    /// Dump parse tree
    Analyze { filepath: String },
}
