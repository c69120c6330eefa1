// [[file:../fs-lattice.note::06b15382][06b15382]]
use super::*;

use std::collections::HashSet;
// 06b15382 ends here

// [[file:../fs-lattice.note::73ce8449][73ce8449]]
/// Energy, virial and gradient summed over all atoms of a crystal.
#[derive(Debug, Clone, Default)]
pub struct Computed {
    pub energy: f64,
    pub virial: f64,
    /// dE/dx of every atom
    pub gradient: Vec<Array3>,
}

impl Computed {
    /// Forces, i.e. the negative gradient.
    pub fn forces(&self) -> Vec<Array3> {
        self.gradient.iter().map(|g| [-g[0], -g[1], -g[2]]).collect()
    }

    /// Static pressure `-dE/dV` of a crystal with volume `volume`.
    pub fn pressure(&self, volume: f64) -> f64 {
        -self.virial / (3.0 * volume)
    }
}
// 73ce8449 ends here

// [[file:../fs-lattice.note::2cae189a][2cae189a]]
/// Atoms on a periodic lattice: a simulation cell, the ideal lattice sites
/// and the atoms occupying them.
///
/// The cell vectors also serve as primitive vectors for the periodic image
/// summation of the potential.
#[derive(Debug, Clone)]
pub struct Crystal {
    cell: PeriodicCell,
    sites: LatticeSites,
    atoms: Vec<LatticeAtom>,
}

impl Crystal {
    pub fn new(cell: PeriodicCell, sites: LatticeSites, atoms: Vec<LatticeAtom>) -> Result<Self> {
        if atoms.is_empty() {
            bail!("crystal without atoms");
        }
        let nsites = sites.len();
        if let Some(a) = atoms.iter().find(|a| a.site >= nsites) {
            bail!("atom {a:?} refers to a missing site; {nsites} sites defined");
        }
        let leaves: HashSet<_> = atoms.iter().map(|a| a.leaf).collect();
        if leaves.len() != atoms.len() {
            bail!("leaf indices are not unique");
        }

        Ok(Self { cell, sites, atoms })
    }

    /// Cubic crystal with lattice constant `a`, replicating the conventional
    /// cell with fractional `basis` `cells` times along each axis.
    pub fn from_basis(basis: &[Array3], a: f64, cells: [usize; 3]) -> Result<Self> {
        if !(a > 0.0) || cells.iter().any(|&n| n == 0) {
            bail!("invalid lattice: a = {a}, cells = {cells:?}");
        }

        let [nx, ny, nz] = cells;
        let mut sites = vec![];
        for ix in 0..nx {
            for iy in 0..ny {
                for iz in 0..nz {
                    for b in basis {
                        let p = [
                            a * (ix as f64 + b[0]),
                            a * (iy as f64 + b[1]),
                            a * (iz as f64 + b[2]),
                        ];
                        sites.push(p);
                    }
                }
            }
        }
        let atoms = sites
            .iter()
            .enumerate()
            .map(|(i, &position)| LatticeAtom { position, site: i, leaf: i })
            .collect();
        let cell = PeriodicCell::orthorhombic([a * nx as f64, a * ny as f64, a * nz as f64])?;
        debug!("crystal with {} atoms in {cells:?} cells", sites.len());

        Self::new(cell, LatticeSites::new(&sites), atoms)
    }

    pub fn simple_cubic(a: f64, cells: [usize; 3]) -> Result<Self> {
        Self::from_basis(&[[0.0, 0.0, 0.0]], a, cells)
    }

    pub fn bcc(a: f64, cells: [usize; 3]) -> Result<Self> {
        Self::from_basis(&[[0.0, 0.0, 0.0], [0.5, 0.5, 0.5]], a, cells)
    }

    pub fn fcc(a: f64, cells: [usize; 3]) -> Result<Self> {
        let basis = [[0.0, 0.0, 0.0], [0.0, 0.5, 0.5], [0.5, 0.0, 0.5], [0.5, 0.5, 0.0]];
        Self::from_basis(&basis, a, cells)
    }

    pub fn natoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn atoms(&self) -> &[LatticeAtom] {
        &self.atoms
    }

    pub fn sites(&self) -> &LatticeSites {
        &self.sites
    }

    pub fn cell(&self) -> &PeriodicCell {
        &self.cell
    }

    /// Primitive vectors for the image summation.
    pub fn primitive_vectors(&self) -> [Array3; 3] {
        self.cell.vectors()
    }

    pub fn volume(&self) -> f64 {
        self.cell.volume()
    }

    pub fn positions(&self) -> Vec<Array3> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// Move atom `i` by `delta`.
    pub fn displace(&mut self, i: usize, delta: Array3) {
        for k in 0..3 {
            self.atoms[i].position[k] += delta[k];
        }
    }

    /// The same crystal with every atom on its lattice site.
    pub fn perfect(&self) -> Self {
        let mut crystal = self.clone();
        for a in crystal.atoms.iter_mut() {
            a.position = self.sites.lattice_position(a.site).into();
        }
        crystal
    }

    /// Uniformly rescale positions, lattice sites and cell by `s`.
    pub fn scaled(&self, s: f64) -> Self {
        let mut atoms = self.atoms.clone();
        for a in atoms.iter_mut() {
            a.position.iter_mut().for_each(|x| *x *= s);
        }
        Self {
            cell: self.cell.scaled(s),
            sites: self.sites.scaled(s),
            atoms,
        }
    }

    /// Neighbor set of atom `i`: atom `i` first, then all other atoms in
    /// order.
    pub fn neighbor_set(&self, i: usize) -> Vec<LatticeAtom> {
        let mut set = Vec::with_capacity(self.atoms.len());
        set.push(self.atoms[i]);
        set.extend(self.atoms.iter().enumerate().filter(|&(j, _)| j != i).map(|(_, a)| *a));
        set
    }
}

// index of the k-th entry in the neighbor set of atom i
fn global_index(i: usize, k: usize) -> usize {
    match k {
        0 => i,
        k if k <= i => k - 1,
        k => k,
    }
}
// 2cae189a ends here

// [[file:../fs-lattice.note::6e9e164f][6e9e164f]]
impl Crystal {
    fn accumulate(&self, parts: impl Iterator<Item = (f64, f64, Vec<Vector3f>)>) -> Computed {
        let n = self.natoms();
        let mut computed = Computed {
            gradient: vec![[0.0; 3]; n],
            ..Default::default()
        };
        for (i, (e, v, g)) in parts.enumerate() {
            computed.energy += e;
            computed.virial += v;
            for (k, gk) in g.iter().enumerate() {
                let gi = &mut computed.gradient[global_index(i, k)];
                for x in 0..3 {
                    gi[x] += gk[x];
                }
            }
        }
        debug!("crystal energy = {}, virial = {}", computed.energy, computed.virial);

        computed
    }

    /// Total energy, virial and gradient, one reference atom at a time.
    pub fn compute(&self, potential: &mut FinnisSinclair) -> Computed {
        let parts = (0..self.natoms()).map(|i| {
            let set = self.neighbor_set(i);
            let e = potential.energy(&set, &self.sites, &self.cell);
            let v = potential.virial(&set, &self.sites, &self.cell);
            let g = potential.gradient(&set, &self.sites, &self.cell).to_vec();
            (e, v, g)
        });
        self.accumulate(parts)
    }

    /// Same as [`compute`](Self::compute), with reference atoms distributed
    /// over threads. Every worker owns its scratch arrays.
    pub fn compute_parallel(&self, potential: &FinnisSinclair) -> Computed {
        let parts: Vec<_> = (0..self.natoms())
            .into_par_iter()
            .map_init(Workspace::default, |workspace, i| {
                let set = self.neighbor_set(i);
                let e = potential.energy(&set, &self.sites, &self.cell);
                let v = potential.virial(&set, &self.sites, &self.cell);
                let g = potential.gradient_with(&set, &self.sites, &self.cell, workspace).to_vec();
                (e, v, g)
            })
            .collect();
        self.accumulate(parts.into_iter())
    }

    /// Static lattice energy per atom, with every atom on its site.
    pub fn lattice_energy(&self, potential: &FinnisSinclair) -> f64 {
        let perfect = self.perfect();
        let energy: f64 = (0..self.natoms())
            .map(|i| potential.energy(&perfect.neighbor_set(i), &perfect.sites, &perfect.cell))
            .sum();
        energy / self.natoms() as f64
    }
}
// 6e9e164f ends here

// [[file:../fs-lattice.note::45a24270][45a24270]]
#[cfg(test)]
fn thermal_displacements(crystal: &mut Crystal, amplitude: f64) {
    for i in 0..crystal.natoms() {
        let x = i as f64;
        let d = [
            amplitude * (7.0 * x + 1.0).sin(),
            amplitude * (3.0 * x + 2.0).cos(),
            amplitude * (5.0 * x + 0.5).sin(),
        ];
        crystal.displace(i, d);
    }
}

#[cfg(test)]
fn reduced_parameters() -> FsParameters {
    // cutoff between the third (1.96) and fourth (2.26) neighbor shell of
    // an fcc lattice with a = 1.6
    FsParameters {
        n: 12.0,
        m: 6.0,
        epsilon: 1.0,
        a: 1.0,
        c: 2.0,
        cutoff: 2.0,
    }
}

#[test]
fn test_global_index() {
    // neighbor set of atom 2 in a 4 atom crystal: [2, 0, 1, 3]
    let mapped: Vec<_> = (0..4).map(|k| global_index(2, k)).collect();
    assert_eq!(mapped, [2, 0, 1, 3]);
    let mapped: Vec<_> = (0..4).map(|k| global_index(0, k)).collect();
    assert_eq!(mapped, [0, 1, 2, 3]);
}

#[test]
fn test_crystal_construction() -> Result<()> {
    let crystal = Crystal::fcc(1.5, [2, 1, 3])?;
    assert_eq!(crystal.natoms(), 4 * 6);
    approx::assert_relative_eq!(crystal.volume(), 1.5f64.powi(3) * 6.0, max_relative = 1e-12);
    assert_eq!(Crystal::bcc(1.0, [2, 2, 2])?.natoms(), 16);
    assert_eq!(Crystal::simple_cubic(1.0, [3, 3, 3])?.natoms(), 27);

    let set = crystal.neighbor_set(5);
    assert_eq!(set.len(), crystal.natoms());
    assert_eq!(set[0].leaf, 5);
    assert!(set[1..].iter().all(|a| a.leaf != 5));

    assert!(Crystal::fcc(0.0, [1, 1, 1]).is_err());
    assert!(Crystal::fcc(1.0, [1, 0, 1]).is_err());

    let cell = PeriodicCell::orthorhombic([1.0; 3])?;
    let sites = LatticeSites::new(&[[0.0; 3]]);
    let a = LatticeAtom { position: [0.0; 3], site: 0, leaf: 0 };
    assert!(Crystal::new(cell.clone(), sites.clone(), vec![a, a]).is_err());
    let b = LatticeAtom { site: 1, ..a };
    assert!(Crystal::new(cell.clone(), sites.clone(), vec![b]).is_err());
    assert!(Crystal::new(cell, sites, vec![]).is_err());

    Ok(())
}

#[test]
fn test_fcc_lattice_sum() -> Result<()> {
    let params = FsParameters::copper();
    let a = params.a;

    // direct sum over fcc lattice vectors, in units of a/2
    let mut pair = 0.0;
    let mut rho = 0.0;
    for i in -4i32..=4 {
        for j in -4i32..=4 {
            for k in -4i32..=4 {
                let s = i * i + j * j + k * k;
                if s == 0 || s > 16 || (i + j + k) % 2 != 0 {
                    continue;
                }
                let x = 2.0 / (s as f64).sqrt();
                pair += 0.5 * x.powf(params.n);
                rho += x.powf(params.m);
            }
        }
    }
    let expected = params.epsilon * (pair - params.c * rho.sqrt());

    // the same lattice energy from differently sized periodic cells
    for cells in [[1, 1, 1], [2, 2, 2], [1, 2, 1]] {
        let crystal = Crystal::fcc(a, cells)?;
        let pot = FinnisSinclair::new(params, crystal.primitive_vectors())?;
        let e = crystal.lattice_energy(&pot);
        approx::assert_relative_eq!(e, expected, max_relative = 1e-10);
    }

    Ok(())
}

#[test]
fn test_crystal_compute() -> Result<()> {
    let mut crystal = Crystal::fcc(1.6, [1, 1, 1])?;

    // perfect lattice: no forces
    let mut pot = FinnisSinclair::new(reduced_parameters(), crystal.primitive_vectors())?;
    let computed = crystal.compute(&mut pot);
    for g in computed.gradient.iter() {
        for x in g {
            assert!(x.abs() < 1e-10);
        }
    }
    approx::assert_relative_eq!(computed.energy / 4.0, crystal.lattice_energy(&pot), max_relative = 1e-12);

    thermal_displacements(&mut crystal, 0.04);
    let computed = crystal.compute(&mut pot);
    // no net force
    for x in 0..3 {
        let total: f64 = computed.gradient.iter().map(|g| g[x]).sum();
        assert!(total.abs() < 1e-10);
    }
    let forces = computed.forces();
    assert_eq!(forces[1][2], -computed.gradient[1][2]);

    // threads give the same sums
    let parallel = crystal.compute_parallel(&pot);
    assert_eq!(parallel.energy, computed.energy);
    assert_eq!(parallel.virial, computed.virial);
    assert_eq!(parallel.gradient, computed.gradient);

    // gradient of the total energy
    let h = 1e-6;
    for i in 0..crystal.natoms() {
        for k in 0..3 {
            let mut delta = [0.0; 3];
            delta[k] = h;
            let mut plus = crystal.clone();
            plus.displace(i, delta);
            delta[k] = -h;
            let mut minus = crystal.clone();
            minus.displace(i, delta);
            let fd = (plus.compute(&mut pot).energy - minus.compute(&mut pot).energy) / (2.0 * h);
            approx::assert_relative_eq!(computed.gradient[i][k], fd, epsilon = 1e-6, max_relative = 1e-6);
        }
    }

    Ok(())
}

#[test]
fn test_crystal_virial() -> Result<()> {
    let params = reduced_parameters();
    let mut crystal = Crystal::fcc(1.6, [2, 1, 1])?;
    thermal_displacements(&mut crystal, 0.03);

    let mut pot = FinnisSinclair::new(params, crystal.primitive_vectors())?;
    let computed = crystal.compute(&mut pot);

    let energy_scaled = |s: f64| -> Result<f64> {
        let scaled = crystal.scaled(s);
        let mut pot = FinnisSinclair::new(params, scaled.primitive_vectors())?;
        Ok(scaled.compute(&mut pot).energy)
    };
    let h = 1e-6;
    let fd = (energy_scaled(1.0 + h)? - energy_scaled(1.0 - h)?) / (2.0 * h);
    approx::assert_relative_eq!(computed.virial, fd, epsilon = 1e-6, max_relative = 1e-6);

    // pressure from the volume derivative
    let v = crystal.volume();
    let p = computed.pressure(v);
    approx::assert_relative_eq!(p, -fd / (3.0 * v), epsilon = 1e-6, max_relative = 1e-6);

    Ok(())
}
// 45a24270 ends here
