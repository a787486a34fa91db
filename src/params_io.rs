//! Plain-text parameter persistence.
//!
//! The format is the flattened parameter vector, one scalar per line, in
//! [`Params::params`] order. Restoring requires a model with the same architecture: the
//! scalar count must match exactly.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::layer::Params;
use crate::{Error, Result};

pub fn write_params<W: Write>(params: &[f32], mut out: W) -> Result<()> {
    for p in params {
        // `{}` on f32 prints the shortest string that parses back to the same value.
        writeln!(out, "{p}")?;
    }
    out.flush()?;
    Ok(())
}

/// Parse one scalar per line. Blank lines are ignored.
pub fn read_params<R: BufRead>(input: R) -> Result<Vec<f32>> {
    let mut params = Vec::new();
    for (lineno, line) in input.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: f32 = trimmed.parse().map_err(|e| {
            Error::InvalidData(format!("line {}: invalid scalar {trimmed:?}: {e}", lineno + 1))
        })?;
        params.push(value);
    }
    Ok(params)
}

pub fn save_params<M, P>(model: &M, path: P) -> Result<()>
where
    M: Params + ?Sized,
    P: AsRef<Path>,
{
    let p = path.as_ref();
    let file =
        File::create(p).map_err(|e| Error::Io(format!("failed to create {}: {e}", p.display())))?;
    write_params(&model.params(), BufWriter::new(file))?;
    log::info!("saved {} parameters to {}", model.num_params(), p.display());
    Ok(())
}

/// Read parameters from `path` into `model`.
pub fn load_params<M, P>(model: &mut M, path: P) -> Result<()>
where
    M: Params + ?Sized,
    P: AsRef<Path>,
{
    let p = path.as_ref();
    let file =
        File::open(p).map_err(|e| Error::Io(format!("failed to open {}: {e}", p.display())))?;
    let params = read_params(BufReader::new(file))?;
    model.set_params(&params)?;
    log::info!("loaded {} parameters from {}", params.len(), p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip_is_exact() {
        let params = vec![0.1_f32, -2.5, 1e-7, 123456.79, 0.0, -0.0];
        let mut buf = Vec::new();
        write_params(&params, &mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text.lines().count(), params.len());

        let back = read_params(buf.as_slice()).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn read_reports_bad_line() {
        let err = read_params("1.0\n\nnope\n".as_bytes()).unwrap_err();
        match err {
            Error::InvalidData(msg) => assert!(msg.contains("line 3"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
