use std::path::Path;

use clap::{Parser, Subcommand};

use tongwen::{Backend, Options};
use tongwen_cli::commands::convert_ops::ConverterSpec;
use tongwen_cli::commands::{config_ops, convert_ops, dict_ops};

#[derive(Parser)]
#[command(name = "twdict", about = "tongwen dictionary and conversion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a text dictionary (key<TAB>value value...) into a binary trie
    Compile {
        /// Trie backend: array or hashed
        #[arg(long, default_value = "hashed")]
        backend: Backend,
        /// Input text file
        input_txt: String,
        /// Output binary file
        output_file: String,
    },
    /// Write a dictionary back out in text form
    Decompile {
        /// Dictionary file (.twd or .txt)
        dict_file: String,
        /// Output text file (default: stdout)
        output_file: Option<String>,
    },
    /// Show dictionary info (backend auto-detected from the header)
    Info {
        /// Dictionary file (.twd or .txt)
        file: String,
    },
    /// Look up a key in the dictionary (exact match)
    Lookup {
        /// Dictionary file
        dict_file: String,
        /// Key to look up
        key: String,
    },
    /// Common-prefix search (all keys that are prefixes of the query)
    Prefix {
        /// Dictionary file
        dict_file: String,
        /// Query string
        query: String,
        /// List up to N keys starting with the query instead
        #[arg(long)]
        predict: Option<usize>,
    },
    /// Split text at the dictionary's longest-match boundaries
    Segment {
        /// Dictionary file
        dict_file: String,
        /// Text to segment
        text: String,
    },
    /// Convert text (argument or stdin)
    Convert {
        /// Converter configuration TOML
        #[arg(long, conflicts_with = "preset")]
        config: Option<String>,
        /// Preset: s2t, t2s, s2hk, hk2s, s2tw, tw2s, s2twp, tw2sp
        #[arg(long, required_unless_present = "config")]
        preset: Option<Options>,
        /// Directory holding the <Name>.twd dictionaries for presets
        #[arg(long, default_value = ".")]
        dict_dir: String,
        /// Text to convert (default: stdin)
        text: Option<String>,
    },
    /// Validate a converter configuration TOML file
    ConfigValidate {
        /// Path to the TOML file
        file: String,
    },
}

#[cfg(feature = "trace")]
fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

#[cfg(not(feature = "trace"))]
fn init_logging() {}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Compile {
            backend,
            input_txt,
            output_file,
        } => dict_ops::compile(&input_txt, &output_file, backend),
        Command::Decompile {
            dict_file,
            output_file,
        } => dict_ops::decompile(&dict_file, output_file.as_deref()),
        Command::Info { file } => dict_ops::info(&file),
        Command::Lookup { dict_file, key } => dict_ops::lookup(&dict_file, &key),
        Command::Prefix {
            dict_file,
            query,
            predict,
        } => dict_ops::prefix(&dict_file, &query, predict),
        Command::Segment { dict_file, text } => dict_ops::segment(&dict_file, &text),
        Command::Convert {
            config,
            preset,
            dict_dir,
            text,
        } => {
            let spec = match (config.as_deref(), preset) {
                (Some(path), _) => ConverterSpec::Config(Path::new(path)),
                (None, Some(options)) => ConverterSpec::Preset {
                    options,
                    dict_dir: Path::new(&dict_dir),
                },
                (None, None) => {
                    eprintln!("Error: either --config or --preset is required");
                    std::process::exit(1);
                }
            };
            convert_ops::convert_cmd(spec, text.as_deref());
        }
        Command::ConfigValidate { file } => config_ops::config_validate(&file),
    }
}
