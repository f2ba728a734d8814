//! Universal Machine emulator core.
//!
//! The machine is a 32-bit register VM: eight general registers, a pool of
//! dynamically allocated word segments addressed by recycled ids, and a
//! self-modifying program segment (id 0). [`Machine`] owns all guest state
//! and runs the fetch-decode-execute loop; host byte streams are plumbed in
//! through [`ByteIo`] so embedders and tests control I/O.
//!
//! Every contract violation (bad opcode, out-of-range access, division by
//! zero, ...) surfaces as a [`VmError`] and is terminal: there is no
//! recovery and no exception propagation into the guest.

#![forbid(unsafe_code)]

mod decode;
mod error;
mod io;
mod loader;
mod segments;

pub use decode::{decode, Instruction};
pub use error::VmError;
pub use io::{BufferIo, ByteIo, StdByteIo};
pub use loader::{load_program, LoadError};
pub use segments::SegmentPool;

use tracing::debug;

/// Result of a single fetch-decode-execute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepExit {
    /// The instruction completed and the program counter advanced by one.
    Continue,
    /// The instruction installed the program counter itself (Load Program).
    Branch,
    /// The machine is halted: either this cycle executed Halt, or the
    /// machine was already halted and nothing ran.
    Halted,
}

/// Result of a bounded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// The slice completed because `max_insts` was reached.
    Completed { executed: u64 },
    /// The guest executed Halt.
    Halted { executed: u64 },
}

impl RunExit {
    /// Number of instructions executed in this slice.
    pub fn executed(&self) -> u64 {
        match *self {
            RunExit::Completed { executed } | RunExit::Halted { executed } => executed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecOutcome {
    Continue,
    Branch,
    Halt,
}

/// The Universal Machine.
///
/// All state starts zeroed except segment 0, which holds the program
/// installed by [`Machine::new`]. The machine is single-threaded and
/// synchronous; exactly one instruction is in flight at a time, and I/O
/// operations block until the host stream responds.
pub struct Machine {
    regs: [u32; 8],
    pool: SegmentPool,
    pc: u32,
    halted: bool,
    /// End-of-stream is sticky: once the input stream runs dry, every later
    /// Input yields `0xFFFF_FFFF` without consulting the stream again.
    input_eof: bool,
}

impl Machine {
    /// Creates a machine with `program` as segment 0, all registers zero,
    /// and `pc = 0`.
    pub fn new(program: Vec<u32>) -> Self {
        debug!(words = program.len(), "installing program segment");
        Self {
            regs: [0; 8],
            pool: SegmentPool::new(program),
            pc: 0,
            halted: false,
            input_eof: false,
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Register read. `index` must be in `0..8`.
    pub fn reg(&self, index: usize) -> u32 {
        self.regs[index]
    }

    /// Register write. `index` must be in `0..8`.
    pub fn set_reg(&mut self, index: usize, value: u32) {
        self.regs[index] = value;
    }

    pub fn pool(&self) -> &SegmentPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut SegmentPool {
        &mut self.pool
    }

    /// Executes one fetch-decode-execute cycle.
    ///
    /// On a halted machine this is a no-op reporting [`StepExit::Halted`].
    pub fn step(&mut self, io: &mut impl ByteIo) -> Result<StepExit, VmError> {
        if self.halted {
            return Ok(StepExit::Halted);
        }

        let len = self.pool.program_len();
        if self.pc >= len {
            return Err(VmError::PcOutOfRange { pc: self.pc, len });
        }
        let word = self.pool.read(0, self.pc)?;
        let inst = decode(word)?;

        match self.exec(inst, io)? {
            ExecOutcome::Continue => {
                self.pc += 1;
                Ok(StepExit::Continue)
            }
            ExecOutcome::Branch => Ok(StepExit::Branch),
            ExecOutcome::Halt => {
                self.halted = true;
                Ok(StepExit::Halted)
            }
        }
    }

    /// Runs until the guest halts, returning the number of instructions
    /// executed. Any fatal condition aborts the run with the error.
    pub fn run(&mut self, io: &mut impl ByteIo) -> Result<u64, VmError> {
        let mut executed = 0u64;
        while !self.halted {
            self.step(io)?;
            executed += 1;
        }
        debug!(executed, "machine halted");
        Ok(executed)
    }

    /// Runs at most `max_insts` instructions.
    pub fn run_slice(&mut self, io: &mut impl ByteIo, max_insts: u64) -> Result<RunExit, VmError> {
        let mut executed = 0u64;
        while executed < max_insts && !self.halted {
            self.step(io)?;
            executed += 1;
        }
        if self.halted {
            Ok(RunExit::Halted { executed })
        } else {
            Ok(RunExit::Completed { executed })
        }
    }

    fn exec(&mut self, inst: Instruction, io: &mut impl ByteIo) -> Result<ExecOutcome, VmError> {
        match inst {
            Instruction::CondMove { a, b, c } => {
                if self.regs[c] != 0 {
                    self.regs[a] = self.regs[b];
                }
            }
            Instruction::ArrayIndex { a, b, c } => {
                self.regs[a] = self.pool.read(self.regs[b], self.regs[c])?;
            }
            Instruction::ArrayWrite { a, b, c } => {
                self.pool.write(self.regs[a], self.regs[b], self.regs[c])?;
            }
            Instruction::Add { a, b, c } => {
                self.regs[a] = self.regs[b].wrapping_add(self.regs[c]);
            }
            Instruction::Mul { a, b, c } => {
                self.regs[a] = self.regs[b].wrapping_mul(self.regs[c]);
            }
            Instruction::Div { a, b, c } => {
                let divisor = self.regs[c];
                if divisor == 0 {
                    return Err(VmError::DivideByZero);
                }
                self.regs[a] = self.regs[b] / divisor;
            }
            Instruction::Nand { a, b, c } => {
                self.regs[a] = !(self.regs[b] & self.regs[c]);
            }
            Instruction::Halt => return Ok(ExecOutcome::Halt),
            Instruction::Alloc { b, c } => {
                let id = self.pool.alloc(self.regs[c]);
                self.regs[b] = id;
            }
            Instruction::Free { c } => {
                self.pool.free(self.regs[c])?;
            }
            Instruction::Output { c } => {
                let value = self.regs[c];
                if value > 0xFF {
                    return Err(VmError::OutputOutOfRange { value });
                }
                io.write_byte(value as u8)?;
            }
            Instruction::Input { c } => {
                self.regs[c] = if self.input_eof {
                    u32::MAX
                } else {
                    match io.read_byte()? {
                        Some(byte) => u32::from(byte),
                        None => {
                            self.input_eof = true;
                            u32::MAX
                        }
                    }
                };
            }
            Instruction::LoadProgram { b, c } => {
                let src = self.regs[b];
                // Copying segment 0 onto itself is a no-op, so the dominant
                // jump idiom (src = 0) skips the copy entirely.
                if src != 0 {
                    self.pool.replace_program(src)?;
                }
                self.pc = self.regs[c];
                return Ok(ExecOutcome::Branch);
            }
            Instruction::LoadImmediate { a, value } => {
                self.regs[a] = value;
            }
        }
        Ok(ExecOutcome::Continue)
    }
}
