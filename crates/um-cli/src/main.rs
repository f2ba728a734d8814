#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use um_machine::{load_program, Machine, StdByteIo};

#[derive(Debug, Parser)]
#[command(
    name = "um",
    about = "Run a Universal Machine program image to completion"
)]
struct Args {
    /// Program image: a big-endian stream of 32-bit instruction words.
    program: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let program = load_program(&args.program)?;
    let mut machine = Machine::new(program);
    let mut io = StdByteIo::new();

    let result = machine.run(&mut io);

    // Deliver any buffered guest output before reporting the outcome; output
    // bytes must reach the stream in program order even on a fatal exit.
    io.flush().context("failed to flush output stream")?;

    let executed = result?;
    debug!(executed, "guest halted");
    Ok(())
}
