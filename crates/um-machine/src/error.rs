use thiserror::Error;

/// Fatal machine failures.
///
/// The machine contract is minimal and sharply defined; any violation means
/// the guest program is malformed or misbehaving, so there is no recovery
/// path. Every variant carries enough context (ids, offsets, lengths) to
/// diagnose the guest bug from the diagnostic line alone.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("program counter {pc:#x} outside program segment of {len} words")]
    PcOutOfRange { pc: u32, len: u32 },

    #[error("invalid opcode {opcode}")]
    InvalidOpcode { opcode: u32 },

    #[error("access to inactive segment id {id:#x}")]
    InactiveSegment { id: u32 },

    #[error("offset {offset:#x} out of bounds for segment id {id:#x} of {len} words")]
    OffsetOutOfBounds { id: u32, offset: u32, len: u32 },

    #[error("attempt to free the program segment (id 0)")]
    FreeProgramSegment,

    #[error("attempt to free inactive segment id {id:#x}")]
    FreeInactiveSegment { id: u32 },

    #[error("division by zero")]
    DivideByZero,

    #[error("output value {value:#x} exceeds 255")]
    OutputOutOfRange { value: u32 },

    #[error("host i/o failure: {0}")]
    Io(#[from] std::io::Error),
}
