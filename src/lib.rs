// [[file:../fs-lattice.note::7c3348bd][7c3348bd]]
//! Finnis-Sinclair type many-body potential evaluated by explicit summation
//! over periodic lattice images.
//!
//! The energy of a reference atom i is
//!
//! ```text
//! E_i = ε Σ_j' (a/r_ij)^n - ε c sqrt(ρ_i),    ρ_i = Σ_j (a/r_ij)^m
//! ```
//!
//! where the pair sum runs over every periodic image of every neighbor, and
//! the density sum additionally includes the periodic self images of atom i.
//!
//! # Literature
//!
//! - M.W. Finnis & J.E. Sinclair: A simple empirical N-body potential for
//! transition metals; Phil. Mag. A 50, 45-55 (1984)
//!
//! - A.P. Sutton & J. Chen: Long-range Finnis-Sinclair potentials;
//! Phil. Mag. Lett. 61, 139-146 (1990)
// 7c3348bd ends here

// [[file:../fs-lattice.note::0e5fd4ba][0e5fd4ba]]
#![allow(non_snake_case)]

use gut::prelude::*;
use serde::{Deserialize, Serialize};
use vecfx::*;

type Array3 = [f64; 3];
// 0e5fd4ba ends here

// [[file:../fs-lattice.note::d3f144cf][d3f144cf]]
mod crystal;
mod harmonic;
mod lattice;
mod potential;
mod shells;
// d3f144cf ends here

// [[file:../fs-lattice.note::e4eb4548][e4eb4548]]
/* Sutton-Chen parameters, Phil. Mag. Lett. 61, 139 (1990), Table 1.

   metal      n    m     ε (eV)        c         a (Å)
   Ni         9    6   1.5707E-2    39.432     3.52
   Cu         9    6   1.2382E-2    39.432     3.61
   Rh        12    6   4.9371E-3   144.41      3.80
   Pb        10    7   5.5765E-3    45.778     4.95
   Ag        12    6   2.5415E-3   144.41      4.09
   Pt        10    8   1.9833E-2    34.408     3.92
   Au        10    8   1.2793E-2    34.408     4.08
   Al         7    6   3.3147E-2    16.399     4.05

a is the fcc lattice constant. All presets use a cutoff of 2a, which
includes the first five fcc neighbor shells.
*/

/// Parameters for the Finnis-Sinclair potential
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsParameters {
    /// exponent of the repulsive pair term
    pub n: f64,
    /// exponent of the density term
    pub m: f64,
    /// energy scale
    pub epsilon: f64,
    /// length scale
    pub a: f64,
    /// many-body coupling constant
    pub c: f64,
    /// cutoff radius, used for both the pair and the density sums
    pub cutoff: f64,
}

impl FsParameters {
    fn sutton_chen(n: f64, m: f64, epsilon: f64, c: f64, a: f64) -> Self {
        Self {
            n,
            m,
            epsilon,
            a,
            c,
            cutoff: 2.0 * a,
        }
    }

    /// Sutton-Chen nickel
    pub fn nickel() -> Self {
        Self::sutton_chen(9.0, 6.0, 1.5707E-2, 39.432, 3.52)
    }

    /// Sutton-Chen copper
    pub fn copper() -> Self {
        Self::sutton_chen(9.0, 6.0, 1.2382E-2, 39.432, 3.61)
    }

    /// Sutton-Chen rhodium
    pub fn rhodium() -> Self {
        Self::sutton_chen(12.0, 6.0, 4.9371E-3, 144.41, 3.80)
    }

    /// Sutton-Chen lead
    pub fn lead() -> Self {
        Self::sutton_chen(10.0, 7.0, 5.5765E-3, 45.778, 4.95)
    }

    /// Sutton-Chen silver
    pub fn silver() -> Self {
        Self::sutton_chen(12.0, 6.0, 2.5415E-3, 144.41, 4.09)
    }

    /// Sutton-Chen platinum
    pub fn platinum() -> Self {
        Self::sutton_chen(10.0, 8.0, 1.9833E-2, 34.408, 3.92)
    }

    /// Sutton-Chen gold
    pub fn gold() -> Self {
        Self::sutton_chen(10.0, 8.0, 1.2793E-2, 34.408, 4.08)
    }

    /// Sutton-Chen aluminium
    pub fn aluminium() -> Self {
        Self::sutton_chen(7.0, 6.0, 3.3147E-2, 16.399, 4.05)
    }

    /// Reject parameter sets that can only produce NaN or Inf.
    pub fn validate(&self) -> Result<()> {
        let Self { n, m, epsilon, a, c, cutoff } = *self;
        if ![n, m, epsilon, a, c, cutoff].iter().all(|x| x.is_finite()) {
            bail!("non-finite potential parameters: {self:?}");
        }
        if n <= 0.0 || m <= 0.0 {
            bail!("exponents must be positive: n = {n}, m = {m}");
        }
        if a <= 0.0 {
            bail!("invalid length scale: a = {a}");
        }
        if cutoff <= 0.0 {
            bail!("invalid cutoff radius: {cutoff}");
        }
        Ok(())
    }

    /// Read parameters from a json document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Read parameters from a json file.
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("read potential parameters from {}", path.display());
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }
}
// e4eb4548 ends here

// [[file:../fs-lattice.note::f3f6875a][f3f6875a]]
pub use crate::crystal::*;
pub use crate::harmonic::*;
pub use crate::lattice::*;
pub use crate::potential::*;
pub use crate::shells::*;
// f3f6875a ends here

// [[file:../fs-lattice.note::64208fb2][64208fb2]]
#[test]
fn test_parameters_json() -> Result<()> {
    let params = FsParameters::copper();
    let s = serde_json::to_string(&params)?;
    let read = FsParameters::from_json_str(&s)?;
    assert_eq!(read, params);
    assert_eq!(read.cutoff, 2.0 * 3.61);

    let s = r#"{"n": 12, "m": 6, "epsilon": 1.0, "a": 1.0, "c": 1.0, "cutoff": 2.5}"#;
    let params = FsParameters::from_json_str(s)?;
    assert_eq!(params.n, 12.0);
    assert_eq!(params.cutoff, 2.5);

    // missing cutoff
    let s = r#"{"n": 12, "m": 6, "epsilon": 1.0, "a": 1.0, "c": 1.0}"#;
    assert!(FsParameters::from_json_str(s).is_err());
    // negative cutoff
    let s = r#"{"n": 12, "m": 6, "epsilon": 1.0, "a": 1.0, "c": 1.0, "cutoff": -1.0}"#;
    assert!(FsParameters::from_json_str(s).is_err());

    Ok(())
}
// 64208fb2 ends here
