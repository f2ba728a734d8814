//! Host byte streams for the Output and Input operations.

use std::io::{self, Read, Write};

/// One-byte-at-a-time host I/O.
///
/// The engine is synchronous: both calls block until the host stream
/// responds. `read_byte` returns `Ok(None)` at end-of-stream; the engine
/// treats that as sticky and never calls again.
pub trait ByteIo {
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;
}

/// Process stdin/stdout as raw byte streams.
///
/// Output bytes go through the standard library's stdout buffering, so call
/// [`StdByteIo::flush`] before process exit.
pub struct StdByteIo {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl StdByteIo {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

impl Default for StdByteIo {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteIo for StdByteIo {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.stdin.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.stdout.write_all(&[byte])
    }
}

/// In-memory streams: scripted input bytes, captured output bytes.
///
/// Used by the machine tests and useful for embedders that feed a guest
/// program from a buffer.
#[derive(Debug, Default)]
pub struct BufferIo {
    input: Vec<u8>,
    cursor: usize,
    output: Vec<u8>,
}

impl BufferIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: input.into(),
            cursor: 0,
            output: Vec::new(),
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }
}

impl ByteIo for BufferIo {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        match self.input.get(self.cursor) {
            Some(&byte) => {
                self.cursor += 1;
                Ok(Some(byte))
            }
            None => Ok(None),
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }
}
