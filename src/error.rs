//! Error types for VM translation.
//!
//! Parse and codegen errors carry the source file and line so messages read
//! `Main.vm:12: unknown segment: locl`.

use thiserror::Error;

/// Translation error with source context.
#[derive(Error, Debug)]
pub enum VmError {
    #[error("{file}:{line}: unknown command: {text}")]
    UnknownCommand {
        file: String,
        line: usize,
        text: String,
    },

    #[error("{file}:{line}: {command} expects {expected} argument(s), found {found}")]
    WrongArity {
        file: String,
        line: usize,
        command: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{file}:{line}: unknown segment: {segment}")]
    UnknownSegment {
        file: String,
        line: usize,
        segment: String,
    },

    #[error("{file}:{line}: invalid number: {value}")]
    InvalidNumber {
        file: String,
        line: usize,
        value: String,
    },

    #[error("{file}:{line}: index {index} out of range for {segment} (max {max})")]
    IndexOutOfRange {
        file: String,
        line: usize,
        segment: &'static str,
        index: u16,
        max: u16,
    },

    #[error("{file}:{line}: {count} arguments exceed the limit of {max}")]
    TooManyArguments {
        file: String,
        line: usize,
        count: u16,
        max: u16,
    },

    #[error("{file}:{line}: invalid identifier: {name}")]
    InvalidIdentifier {
        file: String,
        line: usize,
        name: String,
    },

    #[error("{file}:{line}: cannot pop to constant segment")]
    PopToConstant { file: String, line: usize },

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no .vm files found in directory: {path}")]
    NoVmFiles { path: String },

    #[error("not a .vm file or directory: {path}")]
    InvalidPath { path: String },
}

impl VmError {
    /// Whether the error describes a line that could not be classified at all.
    ///
    /// Only these may be skipped under [`LinePolicy::Lenient`](crate::config::LinePolicy).
    /// A recognized command with a bad segment or number is never skipped.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VmError::UnknownCommand { .. } | VmError::WrongArity { .. }
        )
    }

    /// Source position as `(file, line)`, if the error has one.
    pub fn location(&self) -> Option<(&str, usize)> {
        match self {
            VmError::UnknownCommand { file, line, .. }
            | VmError::WrongArity { file, line, .. }
            | VmError::UnknownSegment { file, line, .. }
            | VmError::InvalidNumber { file, line, .. }
            | VmError::IndexOutOfRange { file, line, .. }
            | VmError::TooManyArguments { file, line, .. }
            | VmError::InvalidIdentifier { file, line, .. }
            | VmError::PopToConstant { file, line } => Some((file, *line)),
            _ => None,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, VmError>;
