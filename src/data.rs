//! Sample ingestion and labeled datasets.
//!
//! Samples are CSV rows of exactly three numeric fields, `ball_x,ball_y,paddle_y`. Loading
//! is lenient per row: a malformed row is logged and counted, and the load continues.
//! Only a file with no valid rows at all is an error.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::agent::{NUM_ACTIONS, heuristic_action, states_to_matrix};
use crate::env::{STATE_DIM, State};
use crate::tensor::Matrix;
use crate::{Error, Result};

/// Row counts from a CSV load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub accepted: usize,
    /// Non-blank rows dropped for a wrong field count or a non-numeric field.
    pub rejected: usize,
}

/// Unlabeled input samples, one [`State`] per CSV row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Samples {
    states: Vec<State>,
}

impl Samples {
    pub fn from_states(states: Vec<State>) -> Self {
        Self { states }
    }

    /// Parse samples from CSV text. Fields are trimmed and may be quoted.
    ///
    /// Returns `Error::InvalidData` if no row is valid.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<(Self, LoadReport)> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let mut states = Vec::new();
        let mut report = LoadReport::default();

        for record in rdr.records() {
            let parsed = match record {
                Ok(record) if record.iter().all(str::is_empty) => continue,
                Ok(record) => {
                    parse_record(&record).map_err(|reason| (record_line(&record), reason))
                }
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => Err((err.position().map(|p| p.line()), err.to_string())),
            };
            match parsed {
                Ok(state) => {
                    states.push(state);
                    report.accepted += 1;
                }
                Err((line, reason)) => {
                    match line {
                        Some(line) => log::warn!("skipping line {line}: {reason}"),
                        None => log::warn!("skipping row: {reason}"),
                    }
                    report.rejected += 1;
                }
            }
        }

        if states.is_empty() {
            return Err(Error::InvalidData(format!(
                "no valid samples ({} rows rejected)",
                report.rejected
            )));
        }
        Ok((Self { states }, report))
    }

    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<(Self, LoadReport)> {
        let p = path.as_ref();
        let file =
            File::open(p).map_err(|e| Error::Io(format!("failed to open {}: {e}", p.display())))?;
        let (samples, report) = Self::from_csv_reader(BufReader::new(file))?;
        log::info!(
            "loaded {} samples from {} ({} rejected)",
            report.accepted,
            p.display(),
            report.rejected
        );
        Ok((samples, report))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Input matrix of shape `[len, STATE_DIM]`.
    pub fn to_matrix(&self) -> Matrix {
        states_to_matrix(&self.states)
    }
}

fn record_line(record: &StringRecord) -> Option<u64> {
    record.position().map(|p| p.line())
}

fn parse_record(record: &StringRecord) -> std::result::Result<State, String> {
    if record.len() != STATE_DIM {
        return Err(format!(
            "expected {STATE_DIM} values per row, got {}",
            record.len()
        ));
    }

    let mut v = [0.0_f32; STATE_DIM];
    for (slot, field) in v.iter_mut().zip(record) {
        *slot = match field.parse::<f32>() {
            Ok(x) if x.is_finite() => x,
            _ => return Err(format!("invalid value {field:?}")),
        };
    }
    Ok(State::new(v[0], v[1], v[2]))
}

/// A supervised dataset: inputs `X` of shape `[n, in]` and targets `Y` of shape `[n, out]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Matrix,
    targets: Matrix,
}

impl Dataset {
    /// Pair inputs with targets. Row counts must match and be non-zero.
    pub fn new(inputs: Matrix, targets: Matrix) -> Result<Self> {
        if inputs.rows() != targets.rows() {
            return Err(Error::InvalidData(format!(
                "inputs/targets length mismatch: {} vs {}",
                inputs.rows(),
                targets.rows()
            )));
        }
        if inputs.rows() == 0 {
            return Err(Error::InvalidData("dataset must not be empty".to_owned()));
        }
        if inputs.cols() == 0 || targets.cols() == 0 {
            return Err(Error::InvalidData(
                "input and target dims must be > 0".to_owned(),
            ));
        }
        Ok(Self { inputs, targets })
    }

    /// Label each sample with the one-hot encoding of [`heuristic_action`].
    pub fn labeled(samples: &Samples) -> Result<Self> {
        let mut targets = Matrix::zeros([samples.len(), NUM_ACTIONS]);
        for (row, s) in targets
            .as_mut_slice()
            .chunks_exact_mut(NUM_ACTIONS)
            .zip(samples.states())
        {
            row.copy_from_slice(&heuristic_action(s).one_hot());
        }
        Self::new(samples.to_matrix(), targets)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inputs.rows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inputs.rows() == 0
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.inputs.cols()
    }

    #[inline]
    pub fn target_dim(&self) -> usize {
        self.targets.cols()
    }

    pub fn inputs(&self) -> &Matrix {
        &self.inputs
    }

    pub fn targets(&self) -> &Matrix {
        &self.targets
    }
}
