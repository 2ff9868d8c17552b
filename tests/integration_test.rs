//! End-to-end tests over real files and directories.

mod common;

use std::fs;
use std::path::Path;

use common::{Machine, SP};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vmtrans::reader::{SourceReader, discover};
use vmtrans::{
    Bootstrap, LinePolicy, TranslateOptions, VmError, output_path, translate_path, write_output,
};

fn program_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    for (name, text) in files {
        fs::write(dir.path().join(name), text).expect("write source");
    }
    dir
}

const SYS: &str = "\
// entry point
function Sys.init 0
push constant 4
call Main.double 1
call Alpha.inc 1
return
";

const MAIN: &str = "\
function Main.double 0
push argument 0
push argument 0
add
return
";

const ALPHA: &str = "\
function Alpha.inc 0
push argument 0
push constant 1
add   // trailing comment
return
";

// =============================================================================
// Discovery
// =============================================================================

#[test]
fn test_directory_puts_sys_first() {
    let dir = program_dir(&[
        ("Main.vm", MAIN),
        ("Sys.vm", SYS),
        ("Alpha.vm", ALPHA),
        ("notes.txt", "not vm"),
    ]);
    let stems: Vec<String> = discover(dir.path())
        .unwrap()
        .iter()
        .map(|f| f.stem().to_string())
        .collect();
    assert_eq!(stems, ["Sys", "Alpha", "Main"]);
}

#[test]
fn test_directory_without_sys_is_alphabetical() {
    let dir = program_dir(&[("Zed.vm", ""), ("Main.vm", "")]);
    let files = discover(dir.path()).unwrap();
    assert_eq!(files[0].stem(), "Main");
    assert!(!SourceReader::new(files, LinePolicy::Strict).unwrap().has_entry());
}

#[test]
fn test_empty_directory_is_error() {
    let dir = program_dir(&[("readme.md", "")]);
    assert!(matches!(
        discover(dir.path()),
        Err(VmError::NoVmFiles { .. })
    ));
}

#[test]
fn test_missing_input_is_fatal() {
    let result = translate_path(
        Path::new("no/such/Program.vm"),
        &TranslateOptions::default(),
    );
    assert!(matches!(result, Err(VmError::FileRead { .. })));
}

#[test]
fn test_non_vm_file_rejected() {
    let dir = program_dir(&[("Prog.asm", "@0")]);
    let result = translate_path(&dir.path().join("Prog.asm"), &TranslateOptions::default());
    assert!(matches!(result, Err(VmError::InvalidPath { .. })));
}

// =============================================================================
// Translation
// =============================================================================

#[test]
fn test_directory_program_runs() {
    let dir = program_dir(&[("Sys.vm", SYS), ("Main.vm", MAIN), ("Alpha.vm", ALPHA)]);
    let asm = translate_path(dir.path(), &TranslateOptions::default()).unwrap();

    let sys = asm.find("(Sys.init)").unwrap();
    let alpha = asm.find("(Alpha.inc)").unwrap();
    let main = asm.find("(Main.double)").unwrap();
    assert!(sys < alpha && alpha < main);
    assert!(asm.contains("// add\n"));

    let mut m = Machine::load(&asm).unwrap();
    m.run(100_000).unwrap();
    assert_eq!(m.ram[256], 9);
    assert_eq!(m.ram[SP], 257);
}

#[test]
fn test_single_file_output() {
    let dir = program_dir(&[("Simple.vm", "push constant 7\npush constant 8\nadd\n")]);
    let input = dir.path().join("Simple.vm");
    let opts = TranslateOptions::default().without_comments();
    let asm = translate_path(&input, &opts).unwrap();

    let expected = "\
@256\nD=A\n@SP\nM=D\n\
@7\nD=A\n@SP\nA=M\nM=D\n@SP\nM=M+1\n\
@8\nD=A\n@SP\nA=M\nM=D\n@SP\nM=M+1\n\
@SP\nAM=M-1\nD=M\nA=A-1\nM=D+M\n\
(__HALT)\n@__HALT\n0;JMP\n";
    assert_eq!(asm, expected);

    let out = output_path(&input);
    assert_eq!(out, dir.path().join("Simple.asm"));
    write_output(&out, &asm).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), expected);
}

#[test]
fn test_directory_output_path() {
    let dir = program_dir(&[("Sys.vm", SYS)]);
    let out = output_path(dir.path());
    let name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(out, dir.path().join(format!("{name}.asm")));
}

#[test]
fn test_strict_reports_file_and_line() {
    let dir = program_dir(&[("Sys.vm", SYS), ("Main.vm", "function Main.x 0\npush\n")]);
    let err = translate_path(dir.path(), &TranslateOptions::default()).unwrap_err();
    assert_eq!(err.location(), Some(("Main.vm", 2)));
    assert!(err.to_string().starts_with("Main.vm:2:"));
}

#[test]
fn test_lenient_skips_only_unrecognized_lines() {
    let dir = program_dir(&[("Prog.vm", "push constant 1\nfrobnicate 3\npush constant 2\nadd")]);
    let input = dir.path().join("Prog.vm");

    let opts = TranslateOptions::default().lenient();
    let asm = translate_path(&input, &opts).unwrap();
    let mut m = Machine::load(&asm).unwrap();
    m.run(10_000).unwrap();
    assert_eq!(m.ram[256], 3);

    fs::write(&input, "push constant 1\npush elsewhere 0\n").unwrap();
    assert!(matches!(
        translate_path(&input, &opts),
        Err(VmError::UnknownSegment { .. })
    ));
}

#[test]
fn test_comparison_labels_unique_across_files() {
    let dir = program_dir(&[
        ("A.vm", "push constant 1\npush constant 1\neq\n"),
        ("B.vm", "push constant 2\npush constant 3\neq\n"),
    ]);
    let asm = translate_path(
        dir.path(),
        &TranslateOptions::default().with_bootstrap(Bootstrap::Auto),
    )
    .unwrap();

    let labels: Vec<&str> = asm.lines().filter(|l| l.starts_with("(EQ_")).collect();
    assert_eq!(labels, ["(EQ_TRUE_0)", "(EQ_END_0)", "(EQ_TRUE_1)", "(EQ_END_1)"]);

    let mut m = Machine::load(&asm).unwrap();
    m.run(10_000).unwrap();
    assert_eq!(m.stack_from(256), [-1, 0]);
}
