//! Memory segment catalog and the Hack RAM layout it maps onto.
//!
//! Each segment resolves to one of four addressing modes. The call/return
//! frame layout also lives here so both code paths read the same constant.

use std::fmt;

use phf::phf_map;

/// Initial stack pointer value; RAM[256..2047] is the stack.
pub const STACK_BASE: u16 = 256;

/// RAM[5..12] backs the temp segment.
pub const TEMP_BASE: u16 = 5;

/// RAM[3..4] backs the pointer segment (aliases THIS and THAT).
pub const POINTER_BASE: u16 = 3;

/// Largest value an A-instruction can load.
pub const MAX_CONSTANT: u16 = 32767;

/// Cells pushed by `call` besides the arguments: return address + 4 saved bases.
pub const FRAME_SIZE: u16 = 5;

/// Largest `call` argument count; `args + FRAME_SIZE` is loaded as a constant.
pub const MAX_CALL_ARGS: u16 = MAX_CONSTANT - FRAME_SIZE;

/// Scratch registers used by pop and return.
pub const SCRATCH_ADDR: &str = "R13";
pub const SCRATCH_RET: &str = "R14";

/// Saved base registers in the order `return` restores them, walking down
/// from the frame base. `call` pushes them in the reverse of this order.
pub const FRAME_RESTORE_ORDER: [Register; 4] =
    [Register::That, Register::This, Register::Arg, Register::Lcl];

/// Fixed low-memory base registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Sp,
    Lcl,
    Arg,
    This,
    That,
}

impl Register {
    /// Predefined assembler symbol for this register.
    pub const fn symbol(self) -> &'static str {
        match self {
            Register::Sp => "SP",
            Register::Lcl => "LCL",
            Register::Arg => "ARG",
            Register::This => "THIS",
            Register::That => "THAT",
        }
    }
}

/// Named VM memory segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Temp,
    Pointer,
    Static,
}

/// How a segment index becomes an effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// No memory access: the index is the value.
    Literal,
    /// Base register value + index.
    Indirect(Register),
    /// Compile-time base address + index.
    Fixed(u16),
    /// One symbol per `(file, index)`.
    FileScoped,
}

static SEGMENTS: phf::Map<&'static str, Segment> = phf_map! {
    "constant" => Segment::Constant,
    "local" => Segment::Local,
    "argument" => Segment::Argument,
    "this" => Segment::This,
    "that" => Segment::That,
    "temp" => Segment::Temp,
    "pointer" => Segment::Pointer,
    "static" => Segment::Static,
};

impl Segment {
    pub const ALL: [Segment; 8] = [
        Segment::Constant,
        Segment::Local,
        Segment::Argument,
        Segment::This,
        Segment::That,
        Segment::Temp,
        Segment::Pointer,
        Segment::Static,
    ];

    /// Look up a segment by its VM name.
    pub fn from_name(name: &str) -> Option<Segment> {
        SEGMENTS.get(name).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Temp => "temp",
            Segment::Pointer => "pointer",
            Segment::Static => "static",
        }
    }

    pub const fn addressing(self) -> Addressing {
        match self {
            Segment::Constant => Addressing::Literal,
            Segment::Local => Addressing::Indirect(Register::Lcl),
            Segment::Argument => Addressing::Indirect(Register::Arg),
            Segment::This => Addressing::Indirect(Register::This),
            Segment::That => Addressing::Indirect(Register::That),
            Segment::Temp => Addressing::Fixed(TEMP_BASE),
            Segment::Pointer => Addressing::Fixed(POINTER_BASE),
            Segment::Static => Addressing::FileScoped,
        }
    }

    /// Highest valid index. Indices that are loaded as constants are capped at
    /// [`MAX_CONSTANT`]; `static` indices only name symbols.
    pub const fn max_index(self) -> Option<u16> {
        match self {
            Segment::Constant
            | Segment::Local
            | Segment::Argument
            | Segment::This
            | Segment::That => Some(MAX_CONSTANT),
            Segment::Temp => Some(7),
            Segment::Pointer => Some(1),
            Segment::Static => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Symbol backing `static index` in the file with the given stem.
///
/// The assembler allocates each distinct symbol its own RAM cell from 16 up.
pub fn static_symbol(file_stem: &str, index: u16) -> String {
    format!("{file_stem}.{index}")
}
