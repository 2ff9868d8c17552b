//! Line-level tokenizer and classifier for VM source.
//!
//! Turns one raw source line into at most one [`VmCommand`]. Blank lines and
//! comments produce `Ok(None)`.

use crate::command::{ArithmeticOp, VmCommand};
use crate::error::{Result, VmError};
use crate::memory::{MAX_CALL_ARGS, Segment};

/// Position of the line being parsed, for error messages.
#[derive(Debug, Clone, Copy)]
pub struct LineRef<'a> {
    pub file: &'a str,
    pub line: usize,
}

impl<'a> LineRef<'a> {
    pub fn new(file: &'a str, line: usize) -> Self {
        Self { file, line }
    }
}

/// Drop a trailing `//` comment and surrounding whitespace.
pub fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => line[..pos].trim(),
        None => line.trim(),
    }
}

/// Parse a single VM line.
///
/// Unknown keywords and wrong operand counts are reported as recoverable
/// errors (see [`VmError::is_recoverable`]); bad segments, numbers,
/// indices and names are fatal.
pub fn parse_line(line: &str, at: LineRef<'_>) -> Result<Option<VmCommand>> {
    let text = strip_comment(line);
    if text.is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = text.split_whitespace().collect();
    let (keyword, operands) = (parts[0], &parts[1..]);

    if let Some(op) = ArithmeticOp::from_mnemonic(keyword) {
        expect_operands(op.mnemonic(), operands, 0, at)?;
        return Ok(Some(VmCommand::Arithmetic(op)));
    }

    let cmd = match keyword {
        "push" => {
            expect_operands("push", operands, 2, at)?;
            let (segment, index) = parse_access(operands, at)?;
            VmCommand::Push { segment, index }
        }
        "pop" => {
            expect_operands("pop", operands, 2, at)?;
            let (segment, index) = parse_access(operands, at)?;
            if segment == Segment::Constant {
                return Err(VmError::PopToConstant {
                    file: at.file.to_string(),
                    line: at.line,
                });
            }
            VmCommand::Pop { segment, index }
        }
        "label" => {
            expect_operands("label", operands, 1, at)?;
            VmCommand::Label(parse_identifier(operands[0], at)?)
        }
        "goto" => {
            expect_operands("goto", operands, 1, at)?;
            VmCommand::Goto(parse_identifier(operands[0], at)?)
        }
        "if-goto" => {
            expect_operands("if-goto", operands, 1, at)?;
            VmCommand::IfGoto(parse_identifier(operands[0], at)?)
        }
        "function" => {
            expect_operands("function", operands, 2, at)?;
            VmCommand::Function {
                name: parse_identifier(operands[0], at)?,
                locals: parse_number(operands[1], at)?,
            }
        }
        "call" => {
            expect_operands("call", operands, 2, at)?;
            let name = parse_identifier(operands[0], at)?;
            let args = parse_number(operands[1], at)?;
            if args > MAX_CALL_ARGS {
                return Err(VmError::TooManyArguments {
                    file: at.file.to_string(),
                    line: at.line,
                    count: args,
                    max: MAX_CALL_ARGS,
                });
            }
            VmCommand::Call { name, args }
        }
        "return" => {
            expect_operands("return", operands, 0, at)?;
            VmCommand::Return
        }
        _ => {
            return Err(VmError::UnknownCommand {
                file: at.file.to_string(),
                line: at.line,
                text: text.to_string(),
            });
        }
    };

    Ok(Some(cmd))
}

fn expect_operands(
    command: &'static str,
    operands: &[&str],
    expected: usize,
    at: LineRef<'_>,
) -> Result<()> {
    if operands.len() == expected {
        Ok(())
    } else {
        Err(VmError::WrongArity {
            file: at.file.to_string(),
            line: at.line,
            command,
            expected,
            found: operands.len(),
        })
    }
}

fn parse_access(operands: &[&str], at: LineRef<'_>) -> Result<(Segment, u16)> {
    let segment = Segment::from_name(operands[0]).ok_or_else(|| VmError::UnknownSegment {
        file: at.file.to_string(),
        line: at.line,
        segment: operands[0].to_string(),
    })?;
    let index = parse_number(operands[1], at)?;

    if let Some(max) = segment.max_index()
        && index > max
    {
        return Err(VmError::IndexOutOfRange {
            file: at.file.to_string(),
            line: at.line,
            segment: segment.name(),
            index,
            max,
        });
    }

    Ok((segment, index))
}

/// Letters, digits, `_`, `.` and `:`, not starting with a digit.
fn parse_identifier(s: &str, at: LineRef<'_>) -> Result<String> {
    let valid = s
        .chars()
        .next()
        .is_some_and(|c| !c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':'));
    if valid {
        Ok(s.to_string())
    } else {
        Err(VmError::InvalidIdentifier {
            file: at.file.to_string(),
            line: at.line,
            name: s.to_string(),
        })
    }
}

fn parse_number(s: &str, at: LineRef<'_>) -> Result<u16> {
    s.parse::<u16>().map_err(|_| VmError::InvalidNumber {
        file: at.file.to_string(),
        line: at.line,
        value: s.to_string(),
    })
}
