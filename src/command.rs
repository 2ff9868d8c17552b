//! Decoded VM commands.

use std::fmt;

use phf::phf_map;

use crate::memory::Segment;

/// Arithmetic and logical operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

static MNEMONICS: phf::Map<&'static str, ArithmeticOp> = phf_map! {
    "add" => ArithmeticOp::Add,
    "sub" => ArithmeticOp::Sub,
    "neg" => ArithmeticOp::Neg,
    "eq" => ArithmeticOp::Eq,
    "gt" => ArithmeticOp::Gt,
    "lt" => ArithmeticOp::Lt,
    "and" => ArithmeticOp::And,
    "or" => ArithmeticOp::Or,
    "not" => ArithmeticOp::Not,
};

impl ArithmeticOp {
    pub fn from_mnemonic(s: &str) -> Option<ArithmeticOp> {
        MNEMONICS.get(s).copied()
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        }
    }

    /// Number of stack cells consumed.
    pub const fn operands(self) -> usize {
        match self {
            ArithmeticOp::Neg | ArithmeticOp::Not => 1,
            _ => 2,
        }
    }
}

/// Command classification, independent of operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Arithmetic,
    Push,
    Pop,
    Label,
    Goto,
    IfGoto,
    Function,
    Call,
    Return,
}

/// One decoded VM instruction.
///
/// Operands live inside the variants, so which arguments exist is fixed by
/// the kind of command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmCommand {
    Arithmetic(ArithmeticOp),
    Push { segment: Segment, index: u16 },
    Pop { segment: Segment, index: u16 },
    Label(String),
    Goto(String),
    IfGoto(String),
    Function { name: String, locals: u16 },
    Call { name: String, args: u16 },
    Return,
}

impl VmCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            VmCommand::Arithmetic(_) => CommandKind::Arithmetic,
            VmCommand::Push { .. } => CommandKind::Push,
            VmCommand::Pop { .. } => CommandKind::Pop,
            VmCommand::Label(_) => CommandKind::Label,
            VmCommand::Goto(_) => CommandKind::Goto,
            VmCommand::IfGoto(_) => CommandKind::IfGoto,
            VmCommand::Function { .. } => CommandKind::Function,
            VmCommand::Call { .. } => CommandKind::Call,
            VmCommand::Return => CommandKind::Return,
        }
    }

    /// First argument: operator, segment name, label or function name.
    pub fn arg1(&self) -> Option<&str> {
        match self {
            VmCommand::Arithmetic(op) => Some(op.mnemonic()),
            VmCommand::Push { segment, .. } | VmCommand::Pop { segment, .. } => {
                Some(segment.name())
            }
            VmCommand::Label(name) | VmCommand::Goto(name) | VmCommand::IfGoto(name) => {
                Some(name)
            }
            VmCommand::Function { name, .. } | VmCommand::Call { name, .. } => Some(name),
            VmCommand::Return => None,
        }
    }

    /// Second argument: segment index, local count or argument count.
    pub fn arg2(&self) -> Option<u16> {
        match self {
            VmCommand::Push { index, .. } | VmCommand::Pop { index, .. } => Some(*index),
            VmCommand::Function { locals, .. } => Some(*locals),
            VmCommand::Call { args, .. } => Some(*args),
            _ => None,
        }
    }
}

impl fmt::Display for VmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmCommand::Arithmetic(op) => f.write_str(op.mnemonic()),
            VmCommand::Push { segment, index } => write!(f, "push {segment} {index}"),
            VmCommand::Pop { segment, index } => write!(f, "pop {segment} {index}"),
            VmCommand::Label(name) => write!(f, "label {name}"),
            VmCommand::Goto(name) => write!(f, "goto {name}"),
            VmCommand::IfGoto(name) => write!(f, "if-goto {name}"),
            VmCommand::Function { name, locals } => write!(f, "function {name} {locals}"),
            VmCommand::Call { name, args } => write!(f, "call {name} {args}"),
            VmCommand::Return => f.write_str("return"),
        }
    }
}
