use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use typeschema_core::{BeanIntrospector, CompileOptions, Compiler, FieldIntrospector, TypeCatalog};

#[derive(Parser)]
#[command(name = "typeschema")]
#[command(about = "Compile a graph of structural types into a $ref-linked schema document")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile one or more root types into a schema document
    Compile {
        /// Type catalog (JSON)
        input: PathBuf,

        /// Qualified name of a root type; may be repeated
        #[arg(short, long = "root", required = true)]
        roots: Vec<String>,

        /// Output document file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compile options file (JSON, kebab-case keys)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Max nesting depth below a root; overrides the config file
        #[arg(long)]
        max_depth: Option<usize>,

        /// Prefix for `$ref` strings; overrides the config file
        #[arg(long)]
        ref_prefix: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// List the serializable fields of a type
    Fields {
        /// Type catalog (JSON)
        input: PathBuf,

        /// Qualified name of the type
        name: String,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compile {
            input,
            roots,
            output,
            config,
            max_depth,
            ref_prefix,
            format,
        } => {
            let catalog = load_catalog(&input)?;

            let mut options = match config {
                Some(path) => load_options(&path)?,
                None => CompileOptions::default(),
            };
            if let Some(max_depth) = max_depth {
                options.max_depth = max_depth;
            }
            if let Some(ref_prefix) = ref_prefix {
                options.ref_prefix = ref_prefix;
            }
            tracing::debug!(?options, roots = roots.len(), "compiling");

            let doc = Compiler::new(options)
                .compile_by_name(&catalog, &roots)
                .map_err(|e| anyhow::Error::from(e).context("Compilation failed"))?;

            write_json(&doc.to_json(), output.as_ref(), format)?;
        }
        Commands::Fields { input, name } => {
            let catalog = load_catalog(&input)?;
            let key = catalog.require(&name)?;

            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            for field in BeanIntrospector.list_fields(&catalog, key) {
                writeln!(
                    out,
                    "{}\t{}\t{}",
                    field.name,
                    catalog[field.ty].qualified_name(),
                    catalog[field.declaring].qualified_name()
                )
                .context("Failed to write field listing")?;
            }
            out.flush().context("Failed to write field listing")?;
        }
    }

    Ok(())
}

fn load_catalog(path: &Path) -> Result<TypeCatalog> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    TypeCatalog::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to load type catalog from: {}", path.display()))
}

fn load_options(path: &Path) -> Result<CompileOptions> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open config file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse config from: {}", path.display()))
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
