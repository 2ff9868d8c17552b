//! Program prologue and epilogue.
//!
//! The prologue sets SP to the stack origin and, when the program has an
//! entry file, calls `Sys.init` through the normal calling sequence. The
//! epilogue parks the CPU in a self-jump.

use crate::codegen::{Asm, CodeGenerator, GeneratorState};
use crate::config::Bootstrap;
use crate::memory::{Register, STACK_BASE};
use crate::reader::ENTRY_FUNCTION;

/// Label of the terminal self-jump.
pub const HALT_LABEL: &str = "__HALT";

/// Write SP initialization and, if requested, the entry-point call.
pub fn write_prologue(
    mode: Bootstrap,
    has_entry: bool,
    annotate: bool,
    cgen: &CodeGenerator,
    state: &mut GeneratorState,
    buf: &mut String,
) {
    if mode == Bootstrap::Never {
        return;
    }

    let mut asm = Asm::new(buf);
    if annotate {
        asm.comment(format_args!("bootstrap: SP = {STACK_BASE}"));
    }
    asm.at(STACK_BASE)
        .op("D=A")
        .at(Register::Sp.symbol())
        .op("M=D");

    if mode == Bootstrap::Always || has_entry {
        if annotate {
            asm.comment(format_args!("bootstrap: call {ENTRY_FUNCTION} 0"));
        }
        cgen.write_call(ENTRY_FUNCTION, 0, state, buf);
        // Sys.init should never return; if it does, stop instead of
        // falling into the first translated function.
        Asm::new(buf).jump(HALT_LABEL);
    }
}

/// Write the infinite loop that ends every program.
pub fn write_halt(annotate: bool, buf: &mut String) {
    let mut asm = Asm::new(buf);
    if annotate {
        asm.comment("halt");
    }
    asm.label(HALT_LABEL).jump(HALT_LABEL);
}
