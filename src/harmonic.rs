// [[file:../fs-lattice.note::aac92ca6][aac92ca6]]
//! Harmonic approximation of the lattice free energy from the normal modes
//! of the force constant matrix.
// aac92ca6 ends here

// [[file:../fs-lattice.note::a41c07e2][a41c07e2]]
use super::*;

use vecfx::nalgebra::{DMatrix, SymmetricEigen};
// a41c07e2 ends here

// [[file:../fs-lattice.note::5d2e90b7][5d2e90b7]]
/// Force constant matrix d²E/dx_i dx_j of `crystal`, from central
/// differences of the analytic gradient with step `delta`.
pub fn force_constants(crystal: &Crystal, potential: &mut FinnisSinclair, delta: f64) -> DMatrix<f64> {
    let n = crystal.natoms();
    let mut fc = DMatrix::zeros(3 * n, 3 * n);

    for i in 0..n {
        for k in 0..3 {
            let mut d = [0.0; 3];
            d[k] = delta;
            let mut plus = crystal.clone();
            plus.displace(i, d);
            d[k] = -delta;
            let mut minus = crystal.clone();
            minus.displace(i, d);

            let gp = plus.compute(potential).gradient;
            let gm = minus.compute(potential).gradient;
            let col = 3 * i + k;
            for (row, (p, m)) in gp.as_flat().iter().zip(gm.as_flat()).enumerate() {
                fc[(row, col)] = (p - m) / (2.0 * delta);
            }
        }
    }

    (&fc + fc.transpose()) * 0.5
}
// 5d2e90b7 ends here

// [[file:../fs-lattice.note::9b6f14c3][9b6f14c3]]
/// Normal modes of a crystal around its perfect lattice, for unit masses
/// and k_B = 1.
#[derive(Debug, Clone)]
pub struct HarmonicCrystal {
    natoms: usize,
    // total energy of the perfect lattice
    lattice_energy: f64,
    // eigenvalues of the force constant matrix, translations removed
    eigenvalues: Vec<f64>,
}

impl HarmonicCrystal {
    /// Diagonalize the force constants of the perfect lattice of `crystal`.
    pub fn new(crystal: &Crystal, potential: &mut FinnisSinclair, delta: f64) -> Result<Self> {
        if !(delta > 0.0) {
            bail!("invalid finite difference step: {delta}");
        }
        let perfect = crystal.perfect();
        let natoms = perfect.natoms();
        let lattice_energy = perfect.compute(potential).energy;

        let fc = force_constants(&perfect, potential, delta);
        let mut eigenvalues: Vec<f64> = SymmetricEigen::new(fc).eigenvalues.iter().copied().collect();
        eigenvalues.sort_by(|a, b| a.abs().total_cmp(&b.abs()));

        // three uniform translations
        let scale = eigenvalues.iter().fold(0.0f64, |acc, x| acc.max(x.abs()));
        let tol = 1e-6 * scale.max(1.0);
        let nzero = 3.min(eigenvalues.len());
        let translations: Vec<_> = eigenvalues.drain(..nzero).collect();
        if translations.iter().any(|x| x.abs() > tol) {
            warn!("translational modes are not zero: {translations:?}");
        }
        if let Some(x) = eigenvalues.iter().find(|&&x| x <= 0.0) {
            bail!("unstable lattice: force constant eigenvalue {x}");
        }
        eigenvalues.sort_by(|a, b| a.total_cmp(b));
        debug!("{} normal modes for {natoms} atoms", eigenvalues.len());

        Ok(Self {
            natoms,
            lattice_energy,
            eigenvalues,
        })
    }

    pub fn natoms(&self) -> usize {
        self.natoms
    }

    /// Total energy of the perfect lattice.
    pub fn lattice_energy(&self) -> f64 {
        self.lattice_energy
    }

    /// Eigenvalues of the retained modes in ascending order.
    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    /// Angular frequencies of the retained modes.
    pub fn frequencies(&self) -> Vec<f64> {
        self.eigenvalues.iter().map(|x| x.sqrt()).collect()
    }

    /// Classical harmonic free energy at `temperature`:
    ///
    /// ```text
    /// A = U_lat + T/2 Σ ln(λ / 2πT)
    /// ```
    pub fn free_energy(&self, temperature: f64) -> Result<f64> {
        if !(temperature > 0.0) {
            bail!("invalid temperature: {temperature}");
        }
        let t = temperature;
        let s: f64 = self
            .eigenvalues
            .iter()
            .map(|x| (x / (2.0 * std::f64::consts::PI * t)).ln())
            .sum();
        Ok(self.lattice_energy + 0.5 * t * s)
    }
}
// 9b6f14c3 ends here

// [[file:../fs-lattice.note::3e8d51fa][3e8d51fa]]
#[test]
fn test_force_constants() -> Result<()> {
    let crystal = Crystal::fcc(3.61, [1, 1, 1])?;
    let mut pot = FinnisSinclair::new(FsParameters::copper(), crystal.primitive_vectors())?;
    let fc = force_constants(&crystal, &mut pot, 1e-4);
    assert_eq!(fc.nrows(), 12);

    // symmetric, and rows sum to zero per direction
    for i in 0..12 {
        for j in 0..12 {
            assert_eq!(fc[(i, j)], fc[(j, i)]);
        }
        for k in 0..3 {
            let s: f64 = (0..4).map(|a| fc[(i, 3 * a + k)]).sum();
            assert!(s.abs() < 1e-5, "row {i}: {s}");
        }
    }
    // on-site terms are positive in a stable lattice
    for i in 0..12 {
        assert!(fc[(i, i)] > 0.0);
    }

    Ok(())
}

#[test]
fn test_harmonic_free_energy() -> Result<()> {
    use approx::assert_relative_eq;

    let mut crystal = Crystal::fcc(3.61, [1, 1, 1])?;
    let mut pot = FinnisSinclair::new(FsParameters::copper(), crystal.primitive_vectors())?;
    let lattice_energy = crystal.lattice_energy(&pot);

    // the reference is the perfect lattice, whatever the atoms do
    crystal.displace(2, [0.05, -0.02, 0.01]);
    let harmonic = HarmonicCrystal::new(&crystal, &mut pot, 1e-4)?;
    assert_eq!(harmonic.natoms(), 4);
    assert_eq!(harmonic.eigenvalues().len(), 9);
    assert_relative_eq!(harmonic.lattice_energy(), 4.0 * lattice_energy, max_relative = 1e-12);
    assert!(harmonic.eigenvalues().windows(2).all(|w| w[0] <= w[1]));

    let t = 0.02;
    let a = harmonic.free_energy(t)?;
    let omega = harmonic.frequencies();
    let expected = harmonic.lattice_energy()
        + t * omega.iter().map(|w| w.ln()).sum::<f64>()
        - 0.5 * t * 9.0 * (2.0 * std::f64::consts::PI * t).ln();
    assert_relative_eq!(a, expected, max_relative = 1e-10);

    // the entropy -dA/dT of a classical oscillator grows with temperature
    let s1 = -(harmonic.free_energy(0.0201)? - harmonic.free_energy(0.0199)?) / 0.0002;
    let s2 = -(harmonic.free_energy(0.0401)? - harmonic.free_energy(0.0399)?) / 0.0002;
    assert!(s2 > s1);

    assert!(harmonic.free_energy(0.0).is_err());
    assert!(HarmonicCrystal::new(&crystal, &mut pot, 0.0).is_err());

    Ok(())
}
// 3e8d51fa ends here
