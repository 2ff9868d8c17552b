//! Minimal Hack CPU for executing generated assembly in tests.
//!
//! Assembles text the way the Hack assembler does (labels first, then
//! variables from RAM[16]) and runs it until the halt label is reached.

#![allow(dead_code)]

use std::collections::HashMap;

use vmtrans::bootstrap::HALT_LABEL;
use vmtrans::{TranslateOptions, translate_sources};

pub const SP: usize = 0;
pub const LCL: usize = 1;
pub const ARG: usize = 2;
pub const THIS: usize = 3;
pub const THAT: usize = 4;

const RAM_SIZE: usize = 32768;
const PREDEFINED: [(&str, u16); 7] = [
    ("SP", 0),
    ("LCL", 1),
    ("ARG", 2),
    ("THIS", 3),
    ("THAT", 4),
    ("R13", 13),
    ("R14", 14),
];

#[derive(Debug, Clone)]
enum Instr {
    A(u16),
    C {
        dest: String,
        comp: String,
        jump: String,
    },
}

pub struct Machine {
    pub ram: Vec<i16>,
    rom: Vec<Instr>,
    symbols: HashMap<String, u16>,
    halt: usize,
    pc: usize,
    a: i16,
    d: i16,
    pub steps: usize,
}

impl Machine {
    /// Assemble `asm`. Fails on duplicate labels or unknown instructions.
    pub fn load(asm: &str) -> Result<Self, String> {
        let lines: Vec<&str> = asm
            .lines()
            .map(|l| l.split("//").next().unwrap_or("").trim())
            .filter(|l| !l.is_empty())
            .collect();

        let mut symbols: HashMap<String, u16> = PREDEFINED
            .iter()
            .map(|(name, addr)| (name.to_string(), *addr))
            .collect();
        let mut address = 0u16;
        for line in &lines {
            if let Some(label) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
                if symbols.insert(label.to_string(), address).is_some() {
                    return Err(format!("duplicate label {label}"));
                }
            } else {
                address += 1;
            }
        }

        let mut next_var = 16u16;
        let mut rom = Vec::with_capacity(address as usize);
        for line in &lines {
            if line.starts_with('(') {
                continue;
            }
            if let Some(target) = line.strip_prefix('@') {
                let value = match target.parse::<u16>() {
                    Ok(n) => n,
                    Err(_) => *symbols.entry(target.to_string()).or_insert_with(|| {
                        next_var += 1;
                        next_var - 1
                    }),
                };
                rom.push(Instr::A(value));
            } else {
                let (dest, rest) = line.split_once('=').unwrap_or(("", line));
                let (comp, jump) = rest.split_once(';').unwrap_or((rest, ""));
                eval_comp(comp, 0, 0, 0).ok_or_else(|| format!("bad comp in {line}"))?;
                rom.push(Instr::C {
                    dest: dest.to_string(),
                    comp: comp.to_string(),
                    jump: jump.to_string(),
                });
            }
        }

        let halt = *symbols
            .get(HALT_LABEL)
            .ok_or_else(|| "program has no halt label".to_string())? as usize;

        Ok(Self {
            ram: vec![0; RAM_SIZE],
            rom,
            symbols,
            halt,
            pc: 0,
            a: 0,
            d: 0,
            steps: 0,
        })
    }

    /// Run until the halt loop or `max_steps` instructions.
    pub fn run(&mut self, max_steps: usize) -> Result<(), String> {
        while self.pc != self.halt {
            if self.steps >= max_steps {
                return Err(format!("no halt after {max_steps} steps (pc={})", self.pc));
            }
            self.step()?;
        }
        Ok(())
    }

    fn step(&mut self) -> Result<(), String> {
        let instr = self
            .rom
            .get(self.pc)
            .cloned()
            .ok_or_else(|| format!("pc {} out of program", self.pc))?;
        self.steps += 1;

        match instr {
            Instr::A(value) => {
                self.a = value as i16;
                self.pc += 1;
            }
            Instr::C { dest, comp, jump } => {
                let addr = self.a as u16 as usize;
                let m = self.ram[addr % RAM_SIZE];
                let out = eval_comp(&comp, self.a, self.d, m)
                    .ok_or_else(|| format!("bad comp {comp}"))?;
                let target = self.a as u16 as usize;

                if dest.contains('M') {
                    self.ram[addr % RAM_SIZE] = out;
                }
                if dest.contains('A') {
                    self.a = out;
                }
                if dest.contains('D') {
                    self.d = out;
                }

                let taken = match jump.as_str() {
                    "" => false,
                    "JGT" => out > 0,
                    "JEQ" => out == 0,
                    "JGE" => out >= 0,
                    "JLT" => out < 0,
                    "JNE" => out != 0,
                    "JLE" => out <= 0,
                    "JMP" => true,
                    other => return Err(format!("bad jump {other}")),
                };
                self.pc = if taken { target } else { self.pc + 1 };
            }
        }
        Ok(())
    }

    pub fn symbol(&self, name: &str) -> Option<u16> {
        self.symbols.get(name).copied()
    }

    pub fn sp(&self) -> usize {
        self.ram[SP] as usize
    }

    /// Value on top of the stack.
    pub fn top(&self) -> i16 {
        self.ram[self.sp() - 1]
    }

    /// Stack contents from `base` up to SP.
    pub fn stack_from(&self, base: usize) -> &[i16] {
        &self.ram[base..self.sp()]
    }

    pub fn frame(&self) -> [i16; 5] {
        [
            self.ram[SP],
            self.ram[LCL],
            self.ram[ARG],
            self.ram[THIS],
            self.ram[THAT],
        ]
    }
}

fn eval_comp(comp: &str, a: i16, d: i16, m: i16) -> Option<i16> {
    let v = match comp {
        "0" => 0,
        "1" => 1,
        "-1" => -1,
        "D" => d,
        "A" => a,
        "M" => m,
        "!D" => !d,
        "!A" => !a,
        "!M" => !m,
        "-D" => d.wrapping_neg(),
        "-A" => a.wrapping_neg(),
        "-M" => m.wrapping_neg(),
        "D+1" => d.wrapping_add(1),
        "A+1" => a.wrapping_add(1),
        "M+1" => m.wrapping_add(1),
        "D-1" => d.wrapping_sub(1),
        "A-1" => a.wrapping_sub(1),
        "M-1" => m.wrapping_sub(1),
        "D+A" | "A+D" => d.wrapping_add(a),
        "D+M" | "M+D" => d.wrapping_add(m),
        "D-A" => d.wrapping_sub(a),
        "D-M" => d.wrapping_sub(m),
        "A-D" => a.wrapping_sub(d),
        "M-D" => m.wrapping_sub(d),
        "D&A" | "A&D" => d & a,
        "D&M" | "M&D" => d & m,
        "D|A" | "A|D" => d | a,
        "D|M" | "M|D" => d | m,
        _ => return None,
    };
    Some(v)
}

/// Translate, assemble and run `sources`, with `setup` applied to RAM first.
pub fn execute_with(
    sources: &[(&str, &str)],
    options: &TranslateOptions,
    setup: impl FnOnce(&mut [i16]),
) -> Machine {
    let asm = translate_sources(sources, options).expect("translation failed");
    let mut machine = Machine::load(&asm).expect("assembly failed");
    setup(&mut machine.ram);
    machine.run(5_000_000).expect("program did not halt");
    machine
}

/// Translate and run a single file with default options.
pub fn execute(source: &str) -> Machine {
    execute_with(&[("Main", source)], &TranslateOptions::default(), |_| {})
}
