//! Source discovery and the lazy command stream.
//!
//! A [`SourceReader`] walks an ordered list of VM sources, opening each one
//! only after the previous is exhausted, and yields one [`SourceCommand`] per
//! meaningful line.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Cursor, Lines};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::command::VmCommand;
use crate::config::LinePolicy;
use crate::error::{Result, VmError};
use crate::parser::{LineRef, parse_line};

/// Stem of the source file holding the program entry point.
pub const ENTRY_FILE_STEM: &str = "Sys";

/// Function the bootstrap calls.
pub const ENTRY_FUNCTION: &str = "Sys.init";

/// Where a source's text comes from.
#[derive(Debug, Clone)]
enum Origin {
    Path(PathBuf),
    Memory(String),
}

/// One VM source unit.
#[derive(Debug, Clone)]
pub struct SourceFile {
    stem: String,
    origin: Origin,
}

impl SourceFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            stem,
            origin: Origin::Path(path),
        }
    }

    pub fn from_text(stem: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            origin: Origin::Memory(text.into()),
        }
    }

    /// File name without extension; scopes `static` symbols.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn is_entry(&self) -> bool {
        self.stem == ENTRY_FILE_STEM
    }

    /// Name used in diagnostics.
    pub fn display_name(&self) -> String {
        match &self.origin {
            Origin::Path(path) => path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Origin::Memory(_) => format!("{}.vm", self.stem),
        }
    }

    /// Ordering used for directory input: the entry file first, then by name.
    fn sort_key(&self) -> (bool, String) {
        (!self.is_entry(), self.display_name())
    }

    fn open(&self) -> Result<Lines<Box<dyn BufRead>>> {
        let reader: Box<dyn BufRead> = match &self.origin {
            Origin::Path(path) => {
                let file = File::open(path).map_err(|e| VmError::FileRead {
                    path: path.display().to_string(),
                    source: e,
                })?;
                Box::new(BufReader::new(file))
            }
            Origin::Memory(text) => Box::new(Cursor::new(text.clone())),
        };
        Ok(reader.lines())
    }

    fn check_readable(&self) -> Result<()> {
        match &self.origin {
            Origin::Path(path) => File::open(path).map(drop).map_err(|e| VmError::FileRead {
                path: path.display().to_string(),
                source: e,
            }),
            Origin::Memory(_) => Ok(()),
        }
    }
}

/// Resolve an input path to the ordered list of sources it names.
///
/// A directory yields every `.vm` file in it with `Sys.vm` first; a file
/// yields itself.
pub fn discover(path: &Path) -> Result<Vec<SourceFile>> {
    if path.is_dir() {
        let entries = fs::read_dir(path).map_err(|e| VmError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut files: Vec<SourceFile> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && is_vm_file(p))
            .map(SourceFile::from_path)
            .collect();

        if files.is_empty() {
            return Err(VmError::NoVmFiles {
                path: path.display().to_string(),
            });
        }

        files.sort_by_key(SourceFile::sort_key);
        Ok(files)
    } else if !path.exists() {
        Err(VmError::FileRead {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    } else if is_vm_file(path) {
        Ok(vec![SourceFile::from_path(path)])
    } else {
        Err(VmError::InvalidPath {
            path: path.display().to_string(),
        })
    }
}

fn is_vm_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "vm")
}

/// A decoded command and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCommand {
    pub command: VmCommand,
    /// Stem of the originating file.
    pub file: Rc<str>,
    /// 1-based line number within that file.
    pub line: usize,
}

struct OpenSource {
    stem: Rc<str>,
    name: String,
    lines: Lines<Box<dyn BufRead>>,
    line: usize,
}

/// Lazy, single-pass stream of commands across all sources.
///
/// Ends cleanly after the last line of the last source. After the first
/// error the stream is fused and yields nothing further.
pub struct SourceReader {
    pending: std::vec::IntoIter<SourceFile>,
    current: Option<OpenSource>,
    policy: LinePolicy,
    has_entry: bool,
    skipped: usize,
    failed: bool,
}

impl SourceReader {
    /// Build a reader over `sources`, in the order given.
    ///
    /// Every path-backed source is checked for readability up front so a
    /// missing file aborts before any command is produced.
    pub fn new(sources: Vec<SourceFile>, policy: LinePolicy) -> Result<Self> {
        for source in &sources {
            source.check_readable()?;
        }
        let has_entry = sources.iter().any(SourceFile::is_entry);

        Ok(Self {
            pending: sources.into_iter(),
            current: None,
            policy,
            has_entry,
            skipped: 0,
            failed: false,
        })
    }

    /// Discover sources under `path` and build a reader over them.
    pub fn open(path: &Path, policy: LinePolicy) -> Result<Self> {
        Self::new(discover(path)?, policy)
    }

    /// Whether any source is the entry-point file.
    pub fn has_entry(&self) -> bool {
        self.has_entry
    }

    /// Lines dropped so far under the lenient policy.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Open the next pending source; `None` once all are consumed.
    fn advance_file(&mut self) -> Option<Result<&mut OpenSource>> {
        let source = self.pending.next()?;
        let lines = match source.open() {
            Ok(lines) => lines,
            Err(e) => return Some(Err(e)),
        };
        crate::info!("translating {}", source.display_name());
        Some(Ok(self.current.insert(OpenSource {
            stem: Rc::from(source.stem()),
            name: source.display_name(),
            lines,
            line: 0,
        })))
    }

    fn fail(&mut self, err: VmError) -> Option<Result<SourceCommand>> {
        self.failed = true;
        self.current = None;
        Some(Err(err))
    }
}

impl Iterator for SourceReader {
    type Item = Result<SourceCommand>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let source = match self.current.as_mut() {
                Some(source) => source,
                None => match self.advance_file()? {
                    Ok(source) => source,
                    Err(e) => return self.fail(e),
                },
            };
            let Some(read) = source.lines.next() else {
                self.current = None;
                continue;
            };

            let text = match read {
                Ok(text) => text,
                Err(e) => {
                    let path = source.name.clone();
                    return self.fail(VmError::FileRead { path, source: e });
                }
            };
            source.line += 1;

            match parse_line(&text, LineRef::new(&source.name, source.line)) {
                Ok(None) => {}
                Ok(Some(command)) => {
                    return Some(Ok(SourceCommand {
                        command,
                        file: Rc::clone(&source.stem),
                        line: source.line,
                    }));
                }
                Err(e) if e.is_recoverable() && self.policy == LinePolicy::Lenient => {
                    crate::warn!("{e} (skipped)");
                    self.skipped += 1;
                }
                Err(e) => return self.fail(e),
            }
        }
    }
}
