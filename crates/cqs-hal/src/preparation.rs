//! State-preparation descriptions and their dense evaluation.
//!
//! A [`StatePreparation`] describes the unitary `U_b` with `U_b|0…0⟩ = |b⟩`.
//! Backends receive it inside every Hadamard test; the classical overlap
//! modes evaluate it to a dense statevector once.
//!
//! Qubit order is little-endian: qubit 0 is the least significant bit of the
//! basis-state index.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};

/// Largest register the dense evaluator accepts.
pub const MAX_DENSE_QUBITS: u32 = 24;

/// One gate of a preparation circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "lowercase")]
pub enum PrepGate {
    H { qubit: u32 },
    X { qubit: u32 },
    Y { qubit: u32 },
    Z { qubit: u32 },
    S { qubit: u32 },
    Sdg { qubit: u32 },
    T { qubit: u32 },
    Rx { qubit: u32, theta: f64 },
    Ry { qubit: u32, theta: f64 },
    Rz { qubit: u32, theta: f64 },
    P { qubit: u32, theta: f64 },
    Cx { control: u32, target: u32 },
    Cz { control: u32, target: u32 },
    Ccx { controls: [u32; 2], target: u32 },
    Swap { a: u32, b: u32 },
}

impl PrepGate {
    /// Qubits the gate acts on.
    pub fn qubits(&self) -> Vec<u32> {
        match *self {
            PrepGate::H { qubit }
            | PrepGate::X { qubit }
            | PrepGate::Y { qubit }
            | PrepGate::Z { qubit }
            | PrepGate::S { qubit }
            | PrepGate::Sdg { qubit }
            | PrepGate::T { qubit }
            | PrepGate::Rx { qubit, .. }
            | PrepGate::Ry { qubit, .. }
            | PrepGate::Rz { qubit, .. }
            | PrepGate::P { qubit, .. } => vec![qubit],
            PrepGate::Cx { control, target } | PrepGate::Cz { control, target } => {
                vec![control, target]
            }
            PrepGate::Ccx { controls, target } => vec![controls[0], controls[1], target],
            PrepGate::Swap { a, b } => vec![a, b],
        }
    }

    /// Build a single-qubit gate from a layered-ansatz entry such as
    /// `("Ry", Some(0.3))`.
    ///
    /// `"I"` yields `None`: identities are dropped.
    pub fn from_layer_entry(name: &str, angle: Option<f64>, qubit: u32) -> HalResult<Option<Self>> {
        let needs_angle = |angle: Option<f64>| {
            angle.ok_or_else(|| {
                HalError::InvalidPreparation(format!("gate '{name}' on qubit {qubit} needs an angle"))
            })
        };
        let gate = match name.to_ascii_lowercase().as_str() {
            "i" | "id" => return Ok(None),
            "h" => PrepGate::H { qubit },
            "x" => PrepGate::X { qubit },
            "y" => PrepGate::Y { qubit },
            "z" => PrepGate::Z { qubit },
            "s" => PrepGate::S { qubit },
            "t" => PrepGate::T { qubit },
            "rx" => PrepGate::Rx { qubit, theta: needs_angle(angle)? },
            "ry" => PrepGate::Ry { qubit, theta: needs_angle(angle)? },
            "rz" => PrepGate::Rz { qubit, theta: needs_angle(angle)? },
            other => {
                return Err(HalError::InvalidPreparation(format!(
                    "unknown layer gate '{other}'"
                )));
            }
        };
        Ok(Some(gate))
    }
}

impl fmt::Display for PrepGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrepGate::H { qubit } => write!(f, "h q[{qubit}]"),
            PrepGate::X { qubit } => write!(f, "x q[{qubit}]"),
            PrepGate::Y { qubit } => write!(f, "y q[{qubit}]"),
            PrepGate::Z { qubit } => write!(f, "z q[{qubit}]"),
            PrepGate::S { qubit } => write!(f, "s q[{qubit}]"),
            PrepGate::Sdg { qubit } => write!(f, "sdg q[{qubit}]"),
            PrepGate::T { qubit } => write!(f, "t q[{qubit}]"),
            PrepGate::Rx { qubit, theta } => write!(f, "rx({theta}) q[{qubit}]"),
            PrepGate::Ry { qubit, theta } => write!(f, "ry({theta}) q[{qubit}]"),
            PrepGate::Rz { qubit, theta } => write!(f, "rz({theta}) q[{qubit}]"),
            PrepGate::P { qubit, theta } => write!(f, "p({theta}) q[{qubit}]"),
            PrepGate::Cx { control, target } => write!(f, "cx q[{control}], q[{target}]"),
            PrepGate::Cz { control, target } => write!(f, "cz q[{control}], q[{target}]"),
            PrepGate::Ccx { controls, target } => {
                write!(f, "ccx q[{}], q[{}], q[{target}]", controls[0], controls[1])
            }
            PrepGate::Swap { a, b } => write!(f, "swap q[{a}], q[{b}]"),
        }
    }
}

/// Description of the unitary preparing the right-hand side `|b⟩`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatePreparation {
    /// Explicit amplitudes (an arbitrary state-preparation oracle).
    Amplitudes { amplitudes: Vec<Complex64> },
    /// A gate list applied to `|0…0⟩`.
    Circuit { num_qubits: u32, gates: Vec<PrepGate> },
    /// Hadamard on every qubit.
    Uniform { num_qubits: u32 },
}

impl StatePreparation {
    /// Uniform superposition over `2^num_qubits` basis states.
    pub fn uniform(num_qubits: u32) -> Self {
        StatePreparation::Uniform { num_qubits }
    }

    /// Build a circuit from layers of single-qubit gates, one entry per
    /// qubit per layer (entry `i` acts on qubit `i`).
    pub fn from_layers(layers: &[Vec<(String, Option<f64>)>]) -> HalResult<Self> {
        let num_qubits = layers.first().map_or(0, Vec::len) as u32;
        if num_qubits == 0 {
            return Err(HalError::InvalidPreparation("empty layer list".into()));
        }
        let mut gates = Vec::new();
        for (depth, layer) in layers.iter().enumerate() {
            if layer.len() as u32 != num_qubits {
                return Err(HalError::InvalidPreparation(format!(
                    "layer {depth} has {} entries, expected {num_qubits}",
                    layer.len()
                )));
            }
            for (qubit, (name, angle)) in layer.iter().enumerate() {
                if let Some(gate) = PrepGate::from_layer_entry(name, *angle, qubit as u32)? {
                    gates.push(gate);
                }
            }
        }
        Ok(StatePreparation::Circuit { num_qubits, gates })
    }

    /// Register width, if the state lives on a qubit register.
    ///
    /// Amplitude vectors whose length is not a power of two have no width.
    pub fn num_qubits(&self) -> Option<u32> {
        match self {
            StatePreparation::Amplitudes { amplitudes } => {
                let n = amplitudes.len();
                (n.is_power_of_two()).then(|| n.trailing_zeros())
            }
            StatePreparation::Circuit { num_qubits, .. }
            | StatePreparation::Uniform { num_qubits } => Some(*num_qubits),
        }
    }

    /// Dimension of the prepared vector.
    ///
    /// Saturates at `usize::MAX` for registers too wide to index; such
    /// preparations fail [`validate`](Self::validate).
    pub fn dim(&self) -> usize {
        match self {
            StatePreparation::Amplitudes { amplitudes } => amplitudes.len(),
            StatePreparation::Circuit { num_qubits, .. }
            | StatePreparation::Uniform { num_qubits } => {
                1usize.checked_shl(*num_qubits).unwrap_or(usize::MAX)
            }
        }
    }

    /// Check the register width and gate operands without evaluating.
    pub fn validate(&self) -> HalResult<()> {
        match self {
            StatePreparation::Amplitudes { amplitudes } => {
                if amplitudes.is_empty() {
                    return Err(HalError::InvalidPreparation("no amplitudes".into()));
                }
            }
            StatePreparation::Uniform { num_qubits } => check_width(*num_qubits)?,
            StatePreparation::Circuit { num_qubits, gates } => {
                check_width(*num_qubits)?;
                for gate in gates {
                    let qubits = gate.qubits();
                    if let Some(q) = qubits.iter().find(|&&q| q >= *num_qubits) {
                        return Err(HalError::InvalidPreparation(format!(
                            "gate '{gate}' references qubit {q} of a {num_qubits}-qubit register"
                        )));
                    }
                    let mut sorted = qubits.clone();
                    sorted.sort_unstable();
                    sorted.dedup();
                    if sorted.len() != qubits.len() {
                        return Err(HalError::InvalidPreparation(format!(
                            "gate '{gate}' repeats a qubit"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Evaluate the preparation to its dense statevector.
    pub fn statevector(&self) -> HalResult<Vec<Complex64>> {
        self.validate()?;
        match self {
            StatePreparation::Amplitudes { amplitudes } => Ok(amplitudes.clone()),
            StatePreparation::Uniform { num_qubits } => {
                let dim = 1usize << num_qubits;
                let a = Complex64::new(1.0 / (dim as f64).sqrt(), 0.0);
                Ok(vec![a; dim])
            }
            StatePreparation::Circuit { num_qubits, gates } => {
                let mut sv = Statevector::new(*num_qubits as usize);
                for gate in gates {
                    sv.apply(gate);
                }
                Ok(sv.into_amplitudes())
            }
        }
    }

    /// Short human-readable description for provenance records.
    pub fn descriptor(&self) -> String {
        match self {
            StatePreparation::Amplitudes { amplitudes } => {
                let body: Vec<String> = amplitudes
                    .iter()
                    .map(|a| format!("{:.6}{:+.6}i", a.re, a.im))
                    .collect();
                format!("amplitudes[{}]", body.join(", "))
            }
            StatePreparation::Uniform { num_qubits } => format!("uniform({num_qubits})"),
            StatePreparation::Circuit { num_qubits, gates } => {
                let body: Vec<String> = gates.iter().map(ToString::to_string).collect();
                format!("qubit q[{num_qubits}]; {}", body.join("; "))
            }
        }
    }
}

fn check_width(num_qubits: u32) -> HalResult<()> {
    if num_qubits == 0 {
        return Err(HalError::InvalidPreparation("register has no qubits".into()));
    }
    if num_qubits > MAX_DENSE_QUBITS {
        return Err(HalError::PreparationTooLarge(format!(
            "{num_qubits} qubits exceeds the dense limit of {MAX_DENSE_QUBITS}"
        )));
    }
    Ok(())
}

/// Dense statevector used to evaluate preparation circuits.
pub(crate) struct Statevector {
    amplitudes: Vec<Complex64>,
}

impl Statevector {
    /// `|0…0⟩` on `num_qubits` qubits.
    pub(crate) fn new(num_qubits: usize) -> Self {
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self { amplitudes }
    }

    pub(crate) fn into_amplitudes(self) -> Vec<Complex64> {
        self.amplitudes
    }

    pub(crate) fn apply(&mut self, gate: &PrepGate) {
        match *gate {
            PrepGate::H { qubit } => self.apply_h(qubit as usize),
            PrepGate::X { qubit } => self.apply_x(qubit as usize),
            PrepGate::Y { qubit } => self.apply_y(qubit as usize),
            PrepGate::Z { qubit } => self.apply_phase(qubit as usize, PI),
            PrepGate::S { qubit } => self.apply_phase(qubit as usize, PI / 2.0),
            PrepGate::Sdg { qubit } => self.apply_phase(qubit as usize, -PI / 2.0),
            PrepGate::T { qubit } => self.apply_phase(qubit as usize, PI / 4.0),
            PrepGate::Rx { qubit, theta } => self.apply_rx(qubit as usize, theta),
            PrepGate::Ry { qubit, theta } => self.apply_ry(qubit as usize, theta),
            PrepGate::Rz { qubit, theta } => self.apply_rz(qubit as usize, theta),
            PrepGate::P { qubit, theta } => self.apply_phase(qubit as usize, theta),
            PrepGate::Cx { control, target } => {
                self.apply_controlled_x(1 << control, target as usize);
            }
            PrepGate::Cz { control, target } => {
                let mask = (1usize << control) | (1usize << target);
                for (i, a) in self.amplitudes.iter_mut().enumerate() {
                    if i & mask == mask {
                        *a = -*a;
                    }
                }
            }
            PrepGate::Ccx { controls, target } => {
                self.apply_controlled_x((1 << controls[0]) | (1 << controls[1]), target as usize);
            }
            PrepGate::Swap { a, b } => {
                let (ma, mb) = (1usize << a, 1usize << b);
                for i in 0..self.amplitudes.len() {
                    if i & ma != 0 && i & mb == 0 {
                        self.amplitudes.swap(i, (i & !ma) | mb);
                    }
                }
            }
        }
    }

    /// Visit every `(|…0…⟩, |…1…⟩)` amplitude pair of `qubit`.
    fn for_each_pair(&mut self, qubit: usize, mut f: impl FnMut(Complex64, Complex64) -> (Complex64, Complex64)) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let (a, b) = f(self.amplitudes[i], self.amplitudes[j]);
                self.amplitudes[i] = a;
                self.amplitudes[j] = b;
            }
        }
    }

    fn apply_x(&mut self, qubit: usize) {
        self.for_each_pair(qubit, |a, b| (b, a));
    }

    fn apply_y(&mut self, qubit: usize) {
        let i = Complex64::i();
        self.for_each_pair(qubit, |a, b| (-i * b, i * a));
    }

    fn apply_h(&mut self, qubit: usize) {
        self.for_each_pair(qubit, |a, b| (FRAC_1_SQRT_2 * (a + b), FRAC_1_SQRT_2 * (a - b)));
    }

    fn apply_phase(&mut self, qubit: usize, theta: f64) {
        let phase = Complex64::from_polar(1.0, theta);
        self.for_each_pair(qubit, |a, b| (a, phase * b));
    }

    fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let c = (theta / 2.0).cos();
        let neg_i_s = Complex64::new(0.0, -(theta / 2.0).sin());
        self.for_each_pair(qubit, |a, b| (c * a + neg_i_s * b, neg_i_s * a + c * b));
    }

    fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        self.for_each_pair(qubit, |a, b| (c * a - s * b, s * a + c * b));
    }

    fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        self.for_each_pair(qubit, |a, b| (phase_0 * a, phase_1 * b));
    }

    fn apply_controlled_x(&mut self, ctrl_mask: usize, target: usize) {
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & ctrl_mask == ctrl_mask && i & tgt_mask == 0 {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }
}
