//! vmtrans CLI - translates VM code to Hack assembly.
//!
//! Usage:
//!     vmtrans <file.vm | directory>
//!     vmtrans --lenient -o Prog.asm ProgDir/

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser as ClapParser, ValueEnum};
use vmtrans::{Bootstrap, TranslateOptions, output_path, translate_path, write_output};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BootstrapArg {
    Auto,
    Always,
    Never,
}

impl From<BootstrapArg> for Bootstrap {
    fn from(arg: BootstrapArg) -> Self {
        match arg {
            BootstrapArg::Auto => Bootstrap::Auto,
            BootstrapArg::Always => Bootstrap::Always,
            BootstrapArg::Never => Bootstrap::Never,
        }
    }
}

#[derive(ClapParser, Debug)]
#[command(name = "vmtrans")]
#[command(version)]
#[command(about = "Stack VM to Hack assembly translator")]
#[command(author = "nand2tetris")]
struct Args {
    /// Input .vm file or directory of .vm files
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output .asm file (defaults to INPUT.asm, or DIR/DIR.asm)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip unrecognized lines with a warning instead of failing
    #[arg(long)]
    lenient: bool,

    /// Do not echo VM commands as comments
    #[arg(long = "no-comments")]
    no_comments: bool,

    /// Clear each stack cell after it is popped
    #[arg(long = "zero-popped")]
    zero_popped: bool,

    /// When to emit SP initialization and the Sys.init call
    #[arg(long, value_enum, default_value = "auto")]
    bootstrap: BootstrapArg,

    /// Show progress and timing
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    vmtrans::log::set_verbose(args.verbose);

    if !args.input.exists() {
        vmtrans::error!("input not found: {}", args.input.display());
        return ExitCode::from(2);
    }

    let mut options = TranslateOptions::default()
        .with_bootstrap(args.bootstrap.into())
        .with_zero_popped(args.zero_popped);
    if args.lenient {
        options = options.lenient();
    }
    if args.no_comments {
        options = options.without_comments();
    }

    let start = Instant::now();
    let output = args.output.unwrap_or_else(|| output_path(&args.input));

    let result = translate_path(&args.input, &options).and_then(|asm| write_output(&output, &asm));

    match result {
        Ok(()) => {
            vmtrans::info!(
                "done in {:.2}ms",
                start.elapsed().as_secs_f64() * 1000.0
            );
            println!("{}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            vmtrans::error!("{e}");
            ExitCode::from(1)
        }
    }
}
