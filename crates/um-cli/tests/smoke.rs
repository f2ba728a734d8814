use std::path::PathBuf;
use std::process::Command;

fn op(opcode: u32, a: u32, b: u32, c: u32) -> u32 {
    (opcode << 28) | (a << 6) | (b << 3) | c
}

fn imm(a: u32, value: u32) -> u32 {
    (13 << 28) | (a << 25) | value
}

const HALT: u32 = 7 << 28;

/// Writes `words` big-endian as a program image under `dir`.
fn write_image(dir: &tempfile::TempDir, words: &[u32]) -> PathBuf {
    let path = dir.path().join("program.um");
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for word in words {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    std::fs::write(&path, bytes).expect("failed to write program image");
    path
}

fn um_command() -> Command {
    Command::new(env!("CARGO_BIN_EXE_um"))
}

#[test]
fn runs_program_and_streams_output() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let image = write_image(
        &dir,
        &[
            imm(1, u32::from(b'U')),
            op(10, 0, 0, 1),
            imm(1, u32::from(b'M')),
            op(10, 0, 0, 1),
            HALT,
        ],
    );

    let output = um_command()
        .arg(&image)
        .output()
        .expect("failed to run um binary");
    assert!(
        output.status.success(),
        "um exited with {}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(output.stdout, b"UM");
}

#[test]
fn fatal_guest_error_exits_nonzero_with_diagnostic() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let image = write_image(&dir, &[imm(1, 5), imm(2, 0), op(5, 3, 1, 2)]);

    let output = um_command()
        .arg(&image)
        .output()
        .expect("failed to run um binary");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("division by zero"),
        "diagnostic did not name the failure:\n{stderr}"
    );
}

#[test]
fn truncated_image_is_rejected_before_execution() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("truncated.um");
    std::fs::write(&path, [0xD4, 0x00, 0x00, 0x41, 0x70]).expect("failed to write image");

    let output = um_command()
        .arg(&path)
        .output()
        .expect("failed to run um binary");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty(), "nothing should have executed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("multiple of 4"),
        "diagnostic did not mention the image size:\n{stderr}"
    );
}

#[test]
fn missing_argument_prints_usage() {
    let output = um_command().output().expect("failed to run um binary");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Usage"),
        "expected a usage message:\n{stderr}"
    );
}

#[test]
fn guest_reads_stdin_bytes() {
    use std::io::Write;
    use std::process::Stdio;

    let dir = tempfile::tempdir().expect("failed to create temp dir");
    // Echo one byte from stdin, then halt.
    let image = write_image(&dir, &[op(11, 0, 0, 1), op(10, 0, 0, 1), HALT]);

    let mut child = um_command()
        .arg(&image)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn um binary");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(b"x")
        .expect("failed to write guest input");
    let output = child.wait_with_output().expect("failed to wait for um");

    assert!(
        output.status.success(),
        "um exited with {}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(output.stdout, b"x");
}
