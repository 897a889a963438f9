//! Line reader (spec §6): newline-terminated reads with a fixed maximum length.
//!
//! Used both for commands read from stdin and for a task's captured stdout/
//! stderr. A line longer than `max_len` is truncated at `max_len` bytes; any
//! residue up to the next newline is discarded rather than buffered, so a
//! child that writes an unbounded line without a newline cannot grow memory
//! without bound (spec §4.2's edge case).

use std::io::{self, Read};

/// Read the next line from `reader`, stripped of its trailing newline.
///
/// Returns `Ok(None)` on EOF with no data read at all. Returns `Ok(Some(line))`
/// once a newline is seen or EOF is reached after at least one byte was read
/// (matching `fgets`/`read_line`-style "last line without a trailing newline"
/// behavior).
pub fn read_line_bounded<R: Read>(reader: &mut R, max_len: usize) -> io::Result<Option<Vec<u8>>> {
    let mut line = Vec::with_capacity(max_len.min(256));
    let mut saw_any = false;
    let mut byte = [0u8; 1];

    loop {
        let n = reader.read(&mut byte)?;
        if n == 0 {
            return Ok(if saw_any { Some(line) } else { None });
        }
        saw_any = true;

        if byte[0] == b'\n' {
            return Ok(Some(line));
        }

        if line.len() < max_len {
            line.push(byte[0]);
        }
        // Past max_len: silently discard the residue until the next newline or EOF.
    }
}
