//! Provenance records: one `.txt` block and one `.jsonl` line per threshold.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use num_complex::Complex64;
use serde::Serialize;
use tracing::{debug, warn};

use cqs_core::{CirculantModel, CqsError, CqsResult, RecordSink, StateInput, ThresholdOutcome};

/// Largest dimension for which `κ(C)` is computed from a dense SVD.
pub const MAX_CONDITION_DIM: usize = 1024;

/// Per-run values shared by every record.
#[derive(Debug, Clone)]
pub struct RecordContext {
    pub coefficient_map: BTreeMap<i64, Complex64>,
    pub preparation: String,
    /// Dense `b`, when it can be evaluated.
    pub b: Option<Vec<Complex64>>,
    pub condition_number: Option<f64>,
}

impl RecordContext {
    pub fn new(model: &CirculantModel, state: &StateInput) -> Self {
        let b = match state.to_dense() {
            Ok(dense) => Some(dense.amplitudes().to_vec()),
            Err(e) => {
                warn!("b has no dense form, solutions are not recorded: {e}");
                None
            }
        };
        let dim = state.dim();
        let condition_number = if dim <= MAX_CONDITION_DIM {
            model.condition_number(dim).ok()
        } else {
            debug!(dim, "skipping condition number");
            None
        };
        Self {
            coefficient_map: model.coefficient_map(),
            preparation: state.descriptor(),
            b,
            condition_number,
        }
    }
}

/// Everything recorded for one threshold.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentRecord {
    pub timestamp: DateTime<Utc>,
    pub coefficient_map: BTreeMap<i64, Complex64>,
    pub preparation: String,
    pub w: Vec<Vec<f64>>,
    pub r: Vec<f64>,
    pub threshold: u32,
    pub ansatz: Vec<i64>,
    pub coefficients: Vec<Complex64>,
    /// `x = Σ_t α_t Q^{a_t} b`.
    pub solution: Option<Vec<Complex64>>,
    /// `None` when not computed; serialised as `null` when infinite.
    pub condition_number: Option<f64>,
    pub loss: f64,
    pub access: String,
    pub shots: Option<u32>,
}

impl ExperimentRecord {
    pub fn from_outcome(outcome: &ThresholdOutcome, context: &RecordContext) -> CqsResult<Self> {
        let solution = context
            .b
            .as_deref()
            .map(|b| outcome.solution(b))
            .transpose()?;
        Ok(Self {
            timestamp: Utc::now(),
            coefficient_map: context.coefficient_map.clone(),
            preparation: context.preparation.clone(),
            w: outcome.system.w_rows(),
            r: outcome.system.r_vec(),
            threshold: outcome.threshold,
            ansatz: outcome.ansatz.as_slice().to_vec(),
            coefficients: outcome.result.coefficients.clone(),
            solution,
            condition_number: context.condition_number,
            loss: outcome.result.loss,
            access: outcome.access_mode.clone(),
            shots: outcome.shots,
        })
    }

    /// Human-readable block.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let coeffs = format_map(&self.coefficient_map);
        let _ = writeln!(out, "{coeffs}-{}\n", self.threshold);
        let _ = writeln!(out, "C_coeff\n{coeffs}\n");
        let _ = writeln!(out, "U_b\n{}\n", self.preparation);
        let _ = writeln!(out, "W");
        for row in &self.w {
            let _ = writeln!(out, "{}", format_reals(row));
        }
        let _ = writeln!(out, "\nr\n{}\n", format_reals(&self.r));
        let _ = writeln!(out, "Threshold T\n{}\n", self.threshold);
        let _ = writeln!(out, "alpha\n{}\n", format_complexes(&self.coefficients));
        if let Some(x) = &self.solution {
            let _ = writeln!(out, "x\n{}\n", format_complexes(x));
        }
        match self.condition_number {
            Some(kappa) => {
                let _ = writeln!(out, "kappa\n{kappa}\n");
            }
            None => {
                let _ = writeln!(out, "kappa\nnot computed\n");
            }
        }
        let _ = writeln!(out, "loss\n{}\n", self.loss);
        let _ = writeln!(out, "access\n{}\n", self.access);
        match self.shots {
            Some(shots) => {
                let _ = writeln!(out, "shots\n{shots}\n");
            }
            None => {
                let _ = writeln!(out, "shots\n-\n");
            }
        }
        out
    }
}

fn format_complex(c: &Complex64) -> String {
    format!("{:.8}{:+.8}i", c.re, c.im)
}

fn format_complexes(values: &[Complex64]) -> String {
    let body: Vec<String> = values.iter().map(format_complex).collect();
    format!("[{}]", body.join(", "))
}

fn format_reals(values: &[f64]) -> String {
    let body: Vec<String> = values.iter().map(|v| format!("{v:.8}")).collect();
    format!("[{}]", body.join(", "))
}

fn format_map(map: &BTreeMap<i64, Complex64>) -> String {
    let body: Vec<String> = map
        .iter()
        .map(|(p, c)| format!("{p}: {}", format_complex(c)))
        .collect();
    format!("{{{}}}", body.join(", "))
}

/// Return the default record directory (`~/.cqs/records`).
pub fn default_record_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".cqs").join("records"))
}

/// Default file stem, e.g. `cqs_20240101120000`.
pub fn default_record_name() -> String {
    format!("cqs_{}", Utc::now().format("%Y%m%d%H%M%S"))
}

/// Appends records to `<dir>/<name>.txt` and `<dir>/<name>.jsonl`.
pub struct RecordWriter {
    txt: PathBuf,
    jsonl: PathBuf,
    context: RecordContext,
    written: usize,
}

impl RecordWriter {
    pub fn create(dir: &Path, name: &str, context: RecordContext) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create record directory: {}", dir.display()))?;
        }
        Ok(Self {
            txt: dir.join(format!("{name}.txt")),
            jsonl: dir.join(format!("{name}.jsonl")),
            context,
            written: 0,
        })
    }

    pub fn text_path(&self) -> &Path {
        &self.txt
    }

    pub fn json_path(&self) -> &Path {
        &self.jsonl
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn append(path: &Path, contents: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(contents.as_bytes())
    }
}

impl RecordSink for RecordWriter {
    fn record(&mut self, outcome: &ThresholdOutcome) -> CqsResult<()> {
        let record = ExperimentRecord::from_outcome(outcome, &self.context)?;
        let line = serde_json::to_string(&record)
            .map_err(|e| CqsError::Sink(format!("failed to serialise record: {e}")))?;

        Self::append(&self.txt, &record.to_text())
            .map_err(|e| CqsError::Sink(format!("{}: {e}", self.txt.display())))?;
        Self::append(&self.jsonl, &format!("{line}\n"))
            .map_err(|e| CqsError::Sink(format!("{}: {e}", self.jsonl.display())))?;

        self.written += 1;
        debug!(threshold = record.threshold, path = %self.jsonl.display(), "record written");
        Ok(())
    }
}
