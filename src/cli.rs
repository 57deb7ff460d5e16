//! Command-line interface for the `drawerd` binary.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;

use crate::clock::SystemClock;
use crate::locator::locate;
use crate::parser::{self, ParseMode};
use crate::serializer::{serialize, serialize_arrangement};
use crate::{Error, Options, convert};

/// Command-line arguments for drawerd
#[derive(Parser, Debug)]
#[command(name = "drawerd", author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a DSL file to a draw.io document
    Generate {
        /// Path to the input DSL file
        #[arg(env = "INPUT_FILE_NAME_PATH")]
        input: PathBuf,

        /// Output document (default: stdout)
        #[arg(short, long, env = "OUTPUT_FILE_NAME")]
        output: Option<PathBuf>,

        /// Warn about and skip lines that match no grammar
        #[arg(long)]
        lenient: bool,
    },
    /// Print ARRANGE lines for the tables of an existing document
    Locate {
        /// Path to a draw.io document
        document: PathBuf,
    },
    /// Print the canonical form of a DSL file
    Fmt {
        /// Path to the input DSL file
        input: PathBuf,
    },
}

fn mode(lenient: bool) -> ParseMode {
    if lenient {
        ParseMode::Lenient
    } else {
        ParseMode::Strict
    }
}

/// Run one command. Text meant for stdout goes to `out`.
///
/// The output file of `generate` is only created once conversion succeeded.
pub fn run(args: &Args, out: &mut impl Write) -> Result<(), Error> {
    match &args.command {
        Command::Generate {
            input,
            output,
            lenient,
        } => {
            info!("Processing {}", input.display());
            let source = fs::read_to_string(input)?;
            let options = Options::default().with_mode(mode(*lenient));
            let xml = convert(&source, &options, SystemClock)?;

            match output {
                Some(path) => {
                    fs::write(path, &xml)?;
                    info!("Document written to {}", path.display());
                }
                None => out.write_all(xml.as_bytes())?,
            }
        }
        Command::Locate { document } => {
            let xml = fs::read_to_string(document)?;
            let positions = locate(&xml)?;
            info!("Found {} tables in {}", positions.len(), document.display());
            out.write_all(serialize_arrangement(&positions).as_bytes())?;
        }
        Command::Fmt { input } => {
            let source = fs::read_to_string(input)?;
            let diagram = parser::parse(&source)?;
            out.write_all(serialize(&diagram).as_bytes())?;
        }
    }
    Ok(())
}
