//! Minimal FASTA writer (spec.md S6: "FASTA writing... deliberately out of
//! scope" as a *parsing* concern, but still the CLI's only output format, so
//! the binaries need something to call). Grounded on the line-wrapping-free
//! style `original_source/indelsim/indel_simulator.py`'s `_save_multiple_files`
//! / `_save_single_file` produce (one header, one unwrapped sequence line).

use std::io::{self, Write};

/// Write `(name, sequence)` pairs as FASTA records: `>name` followed by one
/// unwrapped sequence line, to `sink`.
pub fn write_fasta<'a, W: Write>(
    sink: &mut W,
    records: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> io::Result<()> {
    for (name, sequence) in records {
        writeln!(sink, ">{name}")?;
        writeln!(sink, "{sequence}")?;
    }
    Ok(())
}
