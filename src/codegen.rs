//! Hack assembly generation for VM commands.
//!
//! Label counters live in [`GeneratorState`], which the caller owns and
//! passes to every call, so uniqueness holds across all files of a run.

use std::fmt::{self, Write};

use crate::command::{ArithmeticOp, VmCommand};
use crate::config::TranslateOptions;
use crate::error::{Result, VmError};
use crate::memory::{
    Addressing, FRAME_RESTORE_ORDER, FRAME_SIZE, Register, SCRATCH_ADDR, SCRATCH_RET, Segment,
    static_symbol,
};
use crate::reader::SourceCommand;

/// Program-wide counters for generated labels.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeneratorState {
    arithmetic_ops: usize,
    call_sites: usize,
}

impl GeneratorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arithmetic/logical commands translated so far.
    pub fn arithmetic_ops(&self) -> usize {
        self.arithmetic_ops
    }

    /// Call sites translated so far.
    pub fn call_sites(&self) -> usize {
        self.call_sites
    }

    fn next_arithmetic_id(&mut self) -> usize {
        let id = self.arithmetic_ops;
        self.arithmetic_ops += 1;
        id
    }

    fn next_call_site(&mut self) -> usize {
        let id = self.call_sites;
        self.call_sites += 1;
        id
    }
}

/// Appends assembly lines to a buffer.
///
/// Writes into a `String` cannot fail, so `fmt` results are discarded.
pub(crate) struct Asm<'a> {
    buf: &'a mut String,
}

impl<'a> Asm<'a> {
    pub(crate) fn new(buf: &'a mut String) -> Self {
        Self { buf }
    }

    /// A-instruction: `@target`.
    pub(crate) fn at(&mut self, target: impl fmt::Display) -> &mut Self {
        let _ = writeln!(self.buf, "@{target}");
        self
    }

    /// C-instruction, written verbatim.
    pub(crate) fn op(&mut self, instruction: &str) -> &mut Self {
        self.buf.push_str(instruction);
        self.buf.push('\n');
        self
    }

    /// Label declaration: `(name)`.
    pub(crate) fn label(&mut self, name: impl fmt::Display) -> &mut Self {
        let _ = writeln!(self.buf, "({name})");
        self
    }

    pub(crate) fn comment(&mut self, text: impl fmt::Display) -> &mut Self {
        let _ = writeln!(self.buf, "// {text}");
        self
    }

    /// *SP = D; SP++
    pub(crate) fn push_d(&mut self) -> &mut Self {
        self.at("SP").op("A=M").op("M=D").at("SP").op("M=M+1")
    }

    /// D = register value, then push it.
    pub(crate) fn push_register(&mut self, reg: Register) -> &mut Self {
        self.at(reg.symbol()).op("D=M").push_d()
    }

    /// SP--; D = *SP. Leaves A pointing at the vacated cell.
    fn pop_d(&mut self, zero: bool) -> &mut Self {
        self.at("SP").op("AM=M-1").op("D=M");
        if zero {
            self.op("M=0");
        }
        self
    }

    /// Jump to `target` unconditionally.
    pub(crate) fn jump(&mut self, target: impl fmt::Display) -> &mut Self {
        self.at(target).op("0;JMP")
    }
}

/// Return address label for the `site`-th call in the program.
pub fn return_label(callee: &str, site: usize) -> String {
    format!("{callee}$$ret.{site}")
}

/// Translates commands one at a time into Hack assembly.
///
/// Tracks the current file (for `static`) and function (for label scoping);
/// both are taken from the commands themselves.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    annotate: bool,
    zero_popped: bool,
    file: String,
    function: Option<String>,
}

impl CodeGenerator {
    pub fn new(options: &TranslateOptions) -> Self {
        Self {
            annotate: options.annotate,
            zero_popped: options.zero_popped,
            file: String::new(),
            function: None,
        }
    }

    /// Function whose body is currently being translated.
    pub fn current_function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Translate one command, appending its assembly to `buf`.
    pub fn translate(
        &mut self,
        cmd: &SourceCommand,
        state: &mut GeneratorState,
        buf: &mut String,
    ) -> Result<()> {
        if *cmd.file != *self.file {
            self.file = cmd.file.to_string();
            self.function = None;
        }

        if self.annotate {
            Asm::new(buf).comment(&cmd.command);
        }

        match &cmd.command {
            VmCommand::Arithmetic(op) => self.write_arithmetic(*op, state, buf),
            VmCommand::Push { segment, index } => self.write_push(*segment, *index, buf),
            VmCommand::Pop { segment, index } => self.write_pop(*segment, *index, cmd.line, buf)?,
            VmCommand::Label(name) => {
                let scoped = self.scoped_label(name);
                Asm::new(buf).label(scoped);
            }
            VmCommand::Goto(name) => {
                let scoped = self.scoped_label(name);
                Asm::new(buf).jump(scoped);
            }
            VmCommand::IfGoto(name) => {
                let scoped = self.scoped_label(name);
                Asm::new(buf)
                    .pop_d(self.zero_popped)
                    .at(scoped)
                    .op("D;JNE");
            }
            VmCommand::Function { name, locals } => self.write_function(name, *locals, buf),
            VmCommand::Call { name, args } => self.write_call(name, *args, state, buf),
            VmCommand::Return => self.write_return(buf),
        }

        Ok(())
    }

    fn write_arithmetic(&self, op: ArithmeticOp, state: &mut GeneratorState, buf: &mut String) {
        let id = state.next_arithmetic_id();
        let mut asm = Asm::new(buf);

        match op {
            ArithmeticOp::Neg => {
                asm.at("SP").op("A=M-1").op("M=-M");
            }
            ArithmeticOp::Not => {
                asm.at("SP").op("A=M-1").op("M=!M");
            }
            ArithmeticOp::Add | ArithmeticOp::Sub | ArithmeticOp::And | ArithmeticOp::Or => {
                let combine = match op {
                    ArithmeticOp::Add => "M=D+M",
                    ArithmeticOp::Sub => "M=M-D",
                    ArithmeticOp::And => "M=D&M",
                    _ => "M=D|M",
                };
                asm.pop_d(self.zero_popped).op("A=A-1").op(combine);
            }
            ArithmeticOp::Eq | ArithmeticOp::Gt | ArithmeticOp::Lt => {
                let (tag, jump) = match op {
                    ArithmeticOp::Eq => ("EQ", "D;JEQ"),
                    ArithmeticOp::Gt => ("GT", "D;JGT"),
                    _ => ("LT", "D;JLT"),
                };
                let on_true = format!("{tag}_TRUE_{id}");
                let done = format!("{tag}_END_{id}");

                asm.pop_d(self.zero_popped)
                    .op("A=A-1")
                    .op("D=M-D")
                    .at(&on_true)
                    .op(jump)
                    .at("SP")
                    .op("A=M-1")
                    .op("M=0")
                    .jump(&done)
                    .label(&on_true)
                    .at("SP")
                    .op("A=M-1")
                    .op("M=-1")
                    .label(&done);
            }
        }
    }

    fn write_push(&self, segment: Segment, index: u16, buf: &mut String) {
        let mut asm = Asm::new(buf);

        match segment.addressing() {
            Addressing::Literal => {
                asm.at(index).op("D=A");
            }
            Addressing::Indirect(base) => {
                asm.at(index)
                    .op("D=A")
                    .at(base.symbol())
                    .op("A=D+M")
                    .op("D=M");
            }
            Addressing::Fixed(base) => {
                asm.at(u32::from(base) + u32::from(index)).op("D=M");
            }
            Addressing::FileScoped => {
                asm.at(static_symbol(&self.file, index)).op("D=M");
            }
        }

        asm.push_d();
    }

    /// Fails only for the constant segment, which has no storage.
    fn write_pop(&self, segment: Segment, index: u16, line: usize, buf: &mut String) -> Result<()> {
        let mut asm = Asm::new(buf);

        match segment.addressing() {
            Addressing::Literal => {
                return Err(VmError::PopToConstant {
                    file: format!("{}.vm", self.file),
                    line,
                });
            }
            Addressing::Indirect(base) => {
                asm.at(index)
                    .op("D=A")
                    .at(base.symbol())
                    .op("D=D+M")
                    .at(SCRATCH_ADDR)
                    .op("M=D")
                    .pop_d(self.zero_popped)
                    .at(SCRATCH_ADDR)
                    .op("A=M")
                    .op("M=D");
            }
            Addressing::Fixed(base) => {
                asm.pop_d(self.zero_popped)
                    .at(u32::from(base) + u32::from(index))
                    .op("M=D");
            }
            Addressing::FileScoped => {
                asm.pop_d(self.zero_popped)
                    .at(static_symbol(&self.file, index))
                    .op("M=D");
            }
        }

        Ok(())
    }

    /// `LABEL` inside `Foo.bar` becomes `Foo.bar$LABEL`; outside any
    /// function the file stem is the scope. VM identifiers never contain
    /// `$`, so these cannot reach the `$$` namespace of [`return_label`].
    fn scoped_label(&self, name: &str) -> String {
        let scope = self.function.as_deref().unwrap_or(&self.file);
        format!("{scope}${name}")
    }

    fn write_function(&mut self, name: &str, locals: u16, buf: &mut String) {
        self.function = Some(name.to_string());

        let mut asm = Asm::new(buf);
        asm.label(name);
        for _ in 0..locals {
            asm.at("SP").op("A=M").op("M=0").at("SP").op("M=M+1");
        }
    }

    /// Emit the calling sequence for `call name args`.
    ///
    /// Frame layout after the call, from ARG upward:
    /// args..., return address, LCL, ARG, THIS, THAT, (LCL points here).
    pub fn write_call(&self, name: &str, args: u16, state: &mut GeneratorState, buf: &mut String) {
        let ret = return_label(name, state.next_call_site());
        let mut asm = Asm::new(buf);

        asm.at(&ret).op("D=A").push_d();
        for reg in FRAME_RESTORE_ORDER.iter().rev() {
            asm.push_register(*reg);
        }

        // ARG = SP - args - 5
        asm.at("SP")
            .op("D=M")
            .at(u32::from(args) + u32::from(FRAME_SIZE))
            .op("D=D-A")
            .at(Register::Arg.symbol())
            .op("M=D");

        // LCL = SP
        asm.at("SP").op("D=M").at(Register::Lcl.symbol()).op("M=D");

        asm.jump(name).label(&ret);
    }

    fn write_return(&self, buf: &mut String) {
        let mut asm = Asm::new(buf);

        // frame = LCL
        asm.at(Register::Lcl.symbol()).op("D=M").at(SCRATCH_ADDR).op("M=D");

        // return address = *(frame - 5), saved before *ARG is overwritten
        asm.at(FRAME_SIZE)
            .op("A=D-A")
            .op("D=M")
            .at(SCRATCH_RET)
            .op("M=D");

        // *ARG = pop(); SP = ARG + 1
        asm.pop_d(self.zero_popped)
            .at(Register::Arg.symbol())
            .op("A=M")
            .op("M=D")
            .at(Register::Arg.symbol())
            .op("D=M+1")
            .at("SP")
            .op("M=D");

        for reg in FRAME_RESTORE_ORDER {
            asm.at(SCRATCH_ADDR)
                .op("AM=M-1")
                .op("D=M")
                .at(reg.symbol())
                .op("M=D");
        }

        asm.at(SCRATCH_RET).op("A=M").op("0;JMP");
    }
}
