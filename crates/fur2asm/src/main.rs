//! fur2asm binary

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use clap::{Args, Parser, Subcommand};
use compiler::module::FURNACE_MAGIC;
use compiler::{Diagnostics, Extraction};
use flate2::read::ZlibDecoder;

use std::fs;
use std::io::Read;
use std::path::PathBuf;

macro_rules! error {
    ($($arg:tt)*) => {{
        eprintln!($($arg)*);
        std::process::exit(1);
    }};
}

#[derive(Parser)]
#[command(author, version)]
#[command(about = "Extract instruments and samples from a Furnace module")]
#[command(arg_required_else_help = true)]
struct ArgParser {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract instrument information from a Furnace module
    Instruments(InstrumentsArgs),

    /// Extract samples data from a Furnace module
    Samples(SamplesArgs),
}

#[derive(Args)]
struct ModuleArgs {
    #[arg(value_name = "FILE", help = "Furnace module")]
    module: PathBuf,

    #[arg(short = 'o', long, value_name = "FILE", help = "output file name")]
    output: Option<PathBuf>,

    #[arg(short = 'v', long, help = "print details of processing")]
    verbose: bool,
}

// Instrument table generation
// ===========================

#[derive(Args)]
struct InstrumentsArgs {
    #[command(flatten)]
    module: ModuleArgs,

    #[arg(
        short = 'n',
        long,
        value_name = "NAME",
        default_value = "nss_instruments",
        help = "name of the generated instrument table"
    )]
    name: String,

    #[arg(
        short = 'm',
        long,
        value_name = "FILE",
        default_value = "samples.inc",
        help = "name of the ADPCM sample map file to include"
    )]
    map: String,
}

fn generate_instruments(args: InstrumentsArgs) {
    let e = extract_module(&args.module);

    let out = match compiler::export::generate_instruments(
        &e.module,
        &args.map,
        &args.name,
        &e.instruments,
        &e.samples,
    ) {
        Ok(out) => out,
        Err(why) => error!("Cannot generate instruments: {}", why),
    };

    write_output(&args.module, out);
}

// Sample map generation
// =====================

#[derive(Args)]
struct SamplesArgs {
    #[command(flatten)]
    module: ModuleArgs,
}

fn generate_sample_map(args: SamplesArgs) {
    let e = extract_module(&args.module);

    let out = match compiler::export::generate_sample_map(&e.module, &e.samples) {
        Ok(out) => out,
        Err(why) => error!("Cannot generate sample map: {}", why),
    };

    write_output(&args.module, out);
}

fn main() {
    let args = ArgParser::parse();

    match args.command {
        Command::Instruments(a) => generate_instruments(a),
        Command::Samples(a) => generate_sample_map(a),
    }
}

/// Furnace modules are zlib compressed, except when saved with
/// compression disabled.
fn load_module(path: &PathBuf) -> Vec<u8> {
    let raw = match fs::read(path) {
        Ok(d) => d,
        Err(why) => error!("Cannot load module {}: {}", path.display(), why),
    };

    if raw.starts_with(FURNACE_MAGIC) {
        return raw;
    }

    let mut data = Vec::new();
    match ZlibDecoder::new(raw.as_slice()).read_to_end(&mut data) {
        Ok(_) => data,
        Err(why) => error!("Cannot decompress module {}: {}", path.display(), why),
    }
}

fn extract_module(args: &ModuleArgs) -> Extraction {
    let data = load_module(&args.module);

    let mut diag = Diagnostics::default();
    let extraction = match compiler::extract(data, &mut diag) {
        Ok(e) => e,
        Err(why) => error!("Cannot read module {}: {}", args.module.display(), why),
    };

    if args.verbose {
        for m in diag.messages() {
            eprintln!("{}", m);
        }
    }

    extraction
}

fn write_output(args: &ModuleArgs, out: String) {
    match &args.output {
        Some(path) => match fs::write(path, out) {
            Ok(()) => (),
            Err(why) => error!("Error writing {}: {}", path.display(), why),
        },
        None => print!("{}", out),
    }
}
