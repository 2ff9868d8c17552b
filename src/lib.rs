//! vmtrans - stack VM to Hack assembly translator.
//!
//! Reads `.vm` sources, one file or a whole directory, and produces a single
//! Hack assembly program: bootstrap, one block per VM command, halt loop.
//!
//! ```
//! let asm = vmtrans::translate("push constant 7\npush constant 2\nadd", "Main").unwrap();
//! assert!(asm.contains("M=D+M"));
//! ```

pub mod bootstrap;
pub mod codegen;
pub mod command;
pub mod config;
pub mod error;
pub mod log;
pub mod memory;
pub mod parser;
pub mod reader;

use std::fs;
use std::path::{Path, PathBuf};

use crate::bootstrap::{write_halt, write_prologue};
use crate::codegen::{CodeGenerator, GeneratorState};
pub use crate::config::{Bootstrap, LinePolicy, TranslateOptions};
pub use crate::error::{Result, VmError};
use crate::reader::{SourceFile, SourceReader};

/// Translate every command a reader yields into one program.
///
/// Commands are translated strictly in the order read. The first error
/// aborts the run and no partial output is returned.
pub fn translate_reader(mut reader: SourceReader, options: &TranslateOptions) -> Result<String> {
    let mut output = String::with_capacity(1024);
    let mut cgen = CodeGenerator::new(options);
    let mut state = GeneratorState::new();

    write_prologue(
        options.bootstrap,
        reader.has_entry(),
        options.annotate,
        &cgen,
        &mut state,
        &mut output,
    );

    let mut commands = 0usize;
    for cmd in reader.by_ref() {
        cgen.translate(&cmd?, &mut state, &mut output)?;
        commands += 1;
    }

    write_halt(options.annotate, &mut output);

    crate::info!(
        "{commands} commands, {} call sites, {} skipped lines",
        state.call_sites(),
        reader.skipped()
    );
    Ok(output)
}

/// Translate in-memory sources, each given as `(file stem, text)`.
pub fn translate_sources(
    sources: &[(&str, &str)],
    options: &TranslateOptions,
) -> Result<String> {
    let files = sources
        .iter()
        .map(|(stem, text)| SourceFile::from_text(*stem, *text))
        .collect();
    translate_reader(SourceReader::new(files, options.line_policy)?, options)
}

/// Translate a single VM source string with default options.
pub fn translate(source: &str, stem: &str) -> Result<String> {
    translate_sources(&[(stem, source)], &TranslateOptions::default())
}

/// Translate a `.vm` file or a directory of them.
pub fn translate_path(path: &Path, options: &TranslateOptions) -> Result<String> {
    let reader = SourceReader::open(path, options.line_policy)?;
    let asm = translate_reader(reader, options)?;
    crate::info!(
        "{} -> {} lines of assembly",
        path.display(),
        asm.lines().count()
    );
    Ok(asm)
}

/// Default output location.
///
/// - `Prog.vm` -> `Prog.asm`
/// - `dir/` -> `dir/dir.asm`
pub fn output_path(input: &Path) -> PathBuf {
    if input.is_dir() {
        let name = input
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());
        input.join(format!("{name}.asm"))
    } else {
        input.with_extension("asm")
    }
}

/// Write finished assembly to `path`.
pub fn write_output(path: &Path, asm: &str) -> Result<()> {
    fs::write(path, asm).map_err(|e| VmError::FileWrite {
        path: path.display().to_string(),
        source: e,
    })
}
