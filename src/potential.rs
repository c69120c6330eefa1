// [[file:../fs-lattice.note::f9141783][f9141783]]
use super::*;
// f9141783 ends here

// [[file:../fs-lattice.note::016ed104][016ed104]]
/// Decides whether the pair term between two leaf indices is counted from
/// the side of the first one.
pub type PairOrder = fn(usize, usize) -> bool;

/// Count a pair only from the atom with the lower leaf index.
pub fn lowest_leaf_first(i: usize, j: usize) -> bool {
    i < j
}

/// How the gradient scratch arrays are kept between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScratchMode {
    /// Keep the arrays owned by the potential and grow them on demand.
    #[default]
    Retained,
    /// Allocate fresh arrays for every call.
    PerCall,
}

/// Scratch arrays for the gradient evaluation.
///
/// One workspace serves one evaluation at a time. Threads sharing a
/// potential should each own a workspace and call
/// [`FinnisSinclair::gradient_with`].
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    gradient: Vec<Vector3f>,
    // gradient of the density with respect to each neighbor
    rhograd: Vec<Vector3f>,
}

impl Workspace {
    /// Grow to `n` entries if needed, and zero everything.
    fn reset(&mut self, n: usize) {
        if self.gradient.len() < n {
            self.gradient.resize(n, Vector3f::zeros());
            self.rhograd.resize(n, Vector3f::zeros());
        }
        self.gradient.iter_mut().for_each(|g| *g = Vector3f::zeros());
        self.rhograd.iter_mut().for_each(|g| *g = Vector3f::zeros());
    }

    /// Number of allocated entries.
    pub fn capacity(&self) -> usize {
        self.gradient.len()
    }
}
// 016ed104 ends here

// [[file:../fs-lattice.note::84054ebe][84054ebe]]
/// A single contribution visited in the image summation.
enum Term {
    /// Periodic image of the reference atom itself, at distance `l`.
    SelfImage { l: f64 },
    /// Image of neighbor `j`.
    Pair {
        j: usize,
        // configuration displacement of the image
        dr: Vector3f,
        r: f64,
        // lattice distance of the image, decides the cutoff
        R: f64,
        // pair term is owned by the reference atom
        ordered: bool,
    },
}
// 84054ebe ends here

// [[file:../fs-lattice.note::8674269a][8674269a]]
/// Finnis-Sinclair potential of a crystal, summed explicitly over periodic
/// images of the repeat cell.
#[derive(Debug, Clone)]
pub struct FinnisSinclair {
    params: FsParameters,
    // primitive vectors of the periodic repeat cell
    a0: [Array3; 3],
    rc_pair: f64,
    rc_density: f64,
    shells: ImageShells,
    pair_order: PairOrder,
    scratch: ScratchMode,
    workspace: Workspace,
}

impl FinnisSinclair {
    /// Construct the potential for parameters `params` and the periodic
    /// repeat cell spanned by `a0`.
    pub fn new(params: FsParameters, a0: [Array3; 3]) -> Result<Self> {
        params.validate()?;
        let shells = ImageShells::new(params.cutoff, &a0)?;

        Ok(Self {
            params,
            a0,
            rc_pair: params.cutoff,
            rc_density: params.cutoff,
            shells,
            pair_order: lowest_leaf_first,
            scratch: ScratchMode::default(),
            workspace: Workspace::default(),
        })
    }

    /// Set how gradient scratch arrays are kept.
    pub fn with_scratch_mode(mut self, mode: ScratchMode) -> Self {
        self.scratch = mode;
        self.workspace = Workspace::default();
        self
    }

    /// Replace the predicate deciding which atom owns a pair term.
    pub fn with_pair_order(mut self, order: PairOrder) -> Self {
        self.pair_order = order;
        self
    }

    /// Set the cutoff of both the pair and the density sums.
    pub fn set_range(&mut self, rc: f64) -> Result<()> {
        self.update_ranges(rc, rc)
    }

    /// Set the cutoff of the pair sum.
    pub fn set_pair_range(&mut self, rc: f64) -> Result<()> {
        self.update_ranges(rc, self.rc_density)
    }

    /// Set the cutoff of the density sum.
    pub fn set_density_range(&mut self, rc: f64) -> Result<()> {
        self.update_ranges(self.rc_pair, rc)
    }

    fn update_ranges(&mut self, rc_pair: f64, rc_density: f64) -> Result<()> {
        if !(rc_pair > 0.0 && rc_density > 0.0) {
            bail!("invalid cutoff: pair = {rc_pair}, density = {rc_density}");
        }
        self.shells = ImageShells::new(rc_pair.max(rc_density), &self.a0)?;
        self.rc_pair = rc_pair;
        self.rc_density = rc_density;
        debug!("cutoff: pair = {rc_pair}, density = {rc_density}");
        Ok(())
    }

    pub fn params(&self) -> &FsParameters {
        &self.params
    }

    pub fn pair_range(&self) -> f64 {
        self.rc_pair
    }

    pub fn density_range(&self) -> f64 {
        self.rc_density
    }

    pub fn shells(&self) -> &ImageShells {
        &self.shells
    }

    pub fn scratch_mode(&self) -> ScratchMode {
        self.scratch
    }
}
// 8674269a ends here

// [[file:../fs-lattice.note::e78c8b9d][e78c8b9d]]
impl FinnisSinclair {
    // pair repulsion
    fn v(&self, r: f64) -> f64 {
        self.params.epsilon * (self.params.a / r).powf(self.params.n)
    }

    // dv/dr
    fn dvdr(&self, r: f64) -> f64 {
        let FsParameters { n, a, epsilon, .. } = self.params;
        -epsilon * n / a * (a / r).powf(n + 1.0)
    }

    // density contribution
    fn phi(&self, r: f64) -> f64 {
        (self.params.a / r).powf(self.params.m)
    }

    // dphi/dr
    fn dphidr(&self, r: f64) -> f64 {
        let FsParameters { m, a, .. } = self.params;
        -m / a * (a / r).powf(m + 1.0)
    }

    // embedding energy -εc sqrt(ρ)
    fn embedding(&self, rho: f64) -> f64 {
        -self.params.epsilon * self.params.c * rho.sqrt()
    }

    // dF/dρ, zero for an empty environment
    fn embedding_derivative(&self, rho: f64) -> f64 {
        if rho > 0.0 {
            -self.params.epsilon * self.params.c / (2.0 * rho.sqrt())
        } else {
            0.0
        }
    }

    /// Visit every self image and every neighbor image within range of
    /// `atoms[0]`.
    ///
    /// Self images are visited once per call, the zero translation
    /// excluded. Neighbors sharing the leaf index of the reference atom are
    /// its own images and are skipped. The cutoff of a neighbor image is
    /// decided on its lattice distance.
    fn traverse<A, C, B>(&self, atoms: &[A], lattice: &C, boundary: &B, mut visit: impl FnMut(Term))
    where
        A: Atom,
        C: CoordinateDefinition + ?Sized,
        B: Boundary + ?Sized,
    {
        assert!(!atoms.is_empty(), "empty neighbor set");
        let rc_max = self.rc_pair.max(self.rc_density);
        let translations = self.shells.translations();

        for t in translations {
            let l = t.norm();
            if l > 0.0 && l <= rc_max {
                visit(Term::SelfImage { l });
            }
        }

        let leaf0 = atoms[0].leaf_index();
        let r0 = atoms[0].position();
        let R0 = lattice.lattice_position(atoms[0].site_index());
        for (j, atom) in atoms.iter().enumerate().skip(1) {
            let leaf = atom.leaf_index();
            if leaf == leaf0 {
                continue;
            }
            let dr = r0 - atom.position();
            let dR = R0 - lattice.lattice_position(atom.site_index());
            let (dr, dR) = correct_to_lattice_image(dr, dR, boundary);
            let ordered = (self.pair_order)(leaf0, leaf);
            for t in translations {
                let R = (dR + t).norm();
                if R > rc_max {
                    continue;
                }
                let dr = dr + t;
                let r = dr.norm();
                visit(Term::Pair { j, dr, r, R, ordered });
            }
        }
    }
}
// e78c8b9d ends here

// [[file:../fs-lattice.note::ab327414][ab327414]]
impl FinnisSinclair {
    /// Total density at the reference atom `atoms[0]`.
    pub fn density<A, C, B>(&self, atoms: &[A], lattice: &C, boundary: &B) -> f64
    where
        A: Atom,
        C: CoordinateDefinition + ?Sized,
        B: Boundary + ?Sized,
    {
        let mut rho = 0.0;
        self.traverse(atoms, lattice, boundary, |term| match term {
            Term::SelfImage { l } if l <= self.rc_density => rho += self.phi(l),
            Term::Pair { r, R, .. } if R <= self.rc_density => rho += self.phi(r),
            _ => {}
        });
        rho
    }

    /// Energy of the reference atom `atoms[0]` in the environment of
    /// `atoms[1..]`.
    ///
    /// Pair terms with a neighbor are only counted when the reference atom
    /// owns the pair, so that summing over all reference atoms counts each
    /// pair once. Pair terms with its own periodic images are counted half.
    pub fn energy<A, C, B>(&self, atoms: &[A], lattice: &C, boundary: &B) -> f64
    where
        A: Atom,
        C: CoordinateDefinition + ?Sized,
        B: Boundary + ?Sized,
    {
        let mut e_pair = 0.0;
        let mut rho = 0.0;
        self.traverse(atoms, lattice, boundary, |term| match term {
            Term::SelfImage { l } => {
                if l <= self.rc_pair {
                    e_pair += 0.5 * self.v(l);
                }
                if l <= self.rc_density {
                    rho += self.phi(l);
                }
            }
            Term::Pair { r, R, ordered, .. } => {
                if ordered && R <= self.rc_pair {
                    e_pair += self.v(r);
                }
                if R <= self.rc_density {
                    rho += self.phi(r);
                }
            }
        });

        e_pair + self.embedding(rho)
    }

    /// Virial `Σ r dU/dr` of the energy of the reference atom `atoms[0]`.
    pub fn virial<A, C, B>(&self, atoms: &[A], lattice: &C, boundary: &B) -> f64
    where
        A: Atom,
        C: CoordinateDefinition + ?Sized,
        B: Boundary + ?Sized,
    {
        let mut vir_pair = 0.0;
        let mut vir_nb = 0.0;
        let mut rho = 0.0;
        self.traverse(atoms, lattice, boundary, |term| match term {
            Term::SelfImage { l } => {
                if l <= self.rc_pair {
                    vir_pair += 0.5 * self.dvdr(l) * l;
                }
                // no 1/2 here: the density of the reference atom sees each
                // self image once
                if l <= self.rc_density {
                    rho += self.phi(l);
                    vir_nb += self.dphidr(l) * l;
                }
            }
            Term::Pair { r, R, ordered, .. } => {
                if ordered && R <= self.rc_pair {
                    vir_pair += self.dvdr(r) * r;
                }
                if R <= self.rc_density {
                    rho += self.phi(r);
                    vir_nb += self.dphidr(r) * r;
                }
            }
        });

        vir_pair + vir_nb * self.embedding_derivative(rho)
    }
}
// ab327414 ends here

// [[file:../fs-lattice.note::97e3c8fc][97e3c8fc]]
impl FinnisSinclair {
    /// Gradient of the energy of `atoms[0]` with respect to the position of
    /// every atom in `atoms`, using the scratch arrays of the potential.
    ///
    /// Entry 0 is the negative sum of all other entries.
    pub fn gradient<A, C, B>(&mut self, atoms: &[A], lattice: &C, boundary: &B) -> &[Vector3f]
    where
        A: Atom,
        C: CoordinateDefinition + ?Sized,
        B: Boundary + ?Sized,
    {
        let mut workspace = match self.scratch {
            ScratchMode::Retained => std::mem::take(&mut self.workspace),
            ScratchMode::PerCall => Workspace::default(),
        };
        self.accumulate_gradient(atoms, lattice, boundary, &mut workspace);
        self.workspace = workspace;
        &self.workspace.gradient[..atoms.len()]
    }

    /// Same as [`gradient`](Self::gradient), with caller owned scratch arrays.
    pub fn gradient_with<'w, A, C, B>(&self, atoms: &[A], lattice: &C, boundary: &B, workspace: &'w mut Workspace) -> &'w [Vector3f]
    where
        A: Atom,
        C: CoordinateDefinition + ?Sized,
        B: Boundary + ?Sized,
    {
        self.accumulate_gradient(atoms, lattice, boundary, workspace);
        &workspace.gradient[..atoms.len()]
    }

    fn accumulate_gradient<A, C, B>(&self, atoms: &[A], lattice: &C, boundary: &B, workspace: &mut Workspace)
    where
        A: Atom,
        C: CoordinateDefinition + ?Sized,
        B: Boundary + ?Sized,
    {
        let n = atoms.len();
        workspace.reset(n);
        let Workspace { gradient, rhograd } = workspace;

        // pass 1: pair gradients, density and its gradient
        let mut rho = 0.0;
        self.traverse(atoms, lattice, boundary, |term| match term {
            Term::SelfImage { l } => {
                if l <= self.rc_density {
                    rho += self.phi(l);
                }
            }
            Term::Pair { j, dr, r, R, ordered } => {
                if ordered && R <= self.rc_pair {
                    gradient[j] -= (self.dvdr(r) / r) * dr;
                }
                if R <= self.rc_density {
                    rho += self.phi(r);
                    rhograd[j] -= (self.dphidr(r) / r) * dr;
                }
            }
        });

        // pass 2: chain rule through the embedding function
        let dfdrho = self.embedding_derivative(rho);
        for j in 1..n {
            gradient[j] += dfdrho * rhograd[j];
        }

        let sum: Vector3f = gradient[1..n].iter().sum();
        gradient[0] = -sum;
    }
}
// 97e3c8fc ends here

// [[file:../fs-lattice.note::dabefff1][dabefff1]]
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// No periodic reduction at all.
    struct OpenBoundary;

    impl Boundary for OpenBoundary {
        fn nearest_image(&self, dr: Vector3f) -> Vector3f {
            dr
        }
    }

    fn reduced(n: f64, m: f64, c: f64, cutoff: f64) -> FsParameters {
        FsParameters {
            n,
            m,
            epsilon: 1.0,
            a: 1.0,
            c,
            cutoff,
        }
    }

    fn cubic(l: f64) -> [Array3; 3] {
        [[l, 0.0, 0.0], [0.0, l, 0.0], [0.0, 0.0, l]]
    }

    fn atom(position: Array3, site: usize, leaf: usize) -> LatticeAtom {
        LatticeAtom { position, site, leaf }
    }

    // four atom fcc cell with some thermal displacements
    fn fcc_cell() -> (Vec<LatticeAtom>, LatticeSites, PeriodicCell) {
        let l = 1.6;
        let sites = [[0.0, 0.0, 0.0], [0.0, 0.5 * l, 0.5 * l], [0.5 * l, 0.0, 0.5 * l], [0.5 * l, 0.5 * l, 0.0]];
        let displacements = [[0.03, -0.02, 0.01], [-0.01, 0.04, 0.02], [0.02, 0.01, -0.05], [-0.04, -0.03, 0.02]];
        let atoms = sites
            .iter()
            .zip(displacements.iter())
            .enumerate()
            .map(|(i, (p, d))| atom([p[0] + d[0], p[1] + d[1], p[2] + d[2]], i, i))
            .collect();
        let cell = PeriodicCell::new(cubic(l)).unwrap();
        (atoms, LatticeSites::new(&sites), cell)
    }

    // neighbor set of atom i: atom i first, then all others
    fn neighbor_set(atoms: &[LatticeAtom], i: usize) -> Vec<LatticeAtom> {
        let mut set = vec![atoms[i]];
        set.extend(atoms.iter().enumerate().filter(|&(j, _)| j != i).map(|(_, a)| *a));
        set
    }

    #[test]
    fn test_two_atom_direct_summation() -> Result<()> {
        let l = 2.0;
        let rc = 2.5 * l;
        let params = reduced(12.0, 6.0, 1.0, rc);
        let pot = FinnisSinclair::new(params, cubic(l))?;
        assert_eq!(pot.shells().n_shells(), [3, 3, 3]);

        let sites = [[0.0; 3], [0.5 * l, 0.0, 0.0]];
        let lattice = LatticeSites::new(&sites);
        let atoms = [atom(sites[0], 0, 0), atom(sites[1], 1, 1)];

        // direct summation over the same images
        let mut e_pair = 0.0;
        let mut rho = 0.0;
        for ix in -3..=3 {
            for iy in -3..=3 {
                for iz in -3..=3 {
                    let t = [ix as f64 * l, iy as f64 * l, iz as f64 * l];
                    let lij = (t[0] * t[0] + t[1] * t[1] + t[2] * t[2]).sqrt();
                    if lij > 0.0 && lij <= rc {
                        e_pair += 0.5 * lij.powi(-12);
                        rho += lij.powi(-6);
                    }
                    let x = t[0] - 0.5 * l;
                    let r = (x * x + t[1] * t[1] + t[2] * t[2]).sqrt();
                    if r <= rc {
                        e_pair += r.powi(-12);
                        rho += r.powi(-6);
                    }
                }
            }
        }
        let expected = e_pair - rho.sqrt();

        let energy = pot.energy(&atoms, &lattice, &OpenBoundary);
        assert_relative_eq!(pot.density(&atoms, &lattice, &OpenBoundary), rho, max_relative = 1e-12);
        assert_relative_eq!(energy, expected, max_relative = 1e-12);

        // the periodic cell picks the other image of the neighbor, which
        // spans the same set of images within the cutoff
        let cell = PeriodicCell::new(cubic(l))?;
        assert_relative_eq!(pot.energy(&atoms, &lattice, &cell), expected, max_relative = 1e-12);

        // unchanged inputs, unchanged result
        assert_eq!(pot.energy(&atoms, &lattice, &OpenBoundary), energy);

        Ok(())
    }

    #[test]
    fn test_self_image_exclusion() -> Result<()> {
        let lattice = LatticeSites::new(&[[0.0; 3]]);
        let a = atom([0.0; 3], 0, 5);
        let atoms = [a, a];

        // zero shell only
        let mut pot = FinnisSinclair::new(reduced(12.0, 6.0, 1.0, 0.4), cubic(1.0))?;
        assert_eq!(pot.shells().n_shells(), [0, 0, 0]);
        assert_eq!(pot.energy(&atoms, &lattice, &OpenBoundary), 0.0);
        assert_eq!(pot.virial(&atoms, &lattice, &OpenBoundary), 0.0);
        let g = pot.gradient(&atoms, &lattice, &OpenBoundary);
        assert!(g.iter().all(|g| g.norm() == 0.0));

        // with self images: finite, and the same as the lone atom
        pot.set_range(1.5)?;
        let e = pot.energy(&atoms, &lattice, &OpenBoundary);
        assert!(e.is_finite());
        assert_eq!(e, pot.energy(&atoms[..1], &lattice, &OpenBoundary));
        // 6 nearest and 12 next nearest self images
        let rho = 6.0 + 12.0 * 2f64.sqrt().powi(-6);
        let expected = 0.5 * (6.0 + 12.0 * 2f64.sqrt().powi(-12)) - rho.sqrt();
        assert_relative_eq!(e, expected, max_relative = 1e-12);

        Ok(())
    }

    #[test]
    fn test_pair_counted_once() -> Result<()> {
        // pair terms only
        let pot = FinnisSinclair::new(reduced(12.0, 6.0, 0.0, 1.5), cubic(100.0))?;
        let lattice = LatticeSites::new(&[[0.0; 3], [1.1, 0.0, 0.0]]);
        let ai = atom([0.0; 3], 0, 3);
        let aj = atom([1.1, 0.0, 0.0], 1, 7);

        let e_ij = pot.energy(&[ai, aj], &lattice, &OpenBoundary);
        let e_ji = pot.energy(&[aj, ai], &lattice, &OpenBoundary);
        assert_relative_eq!(e_ij, 1.1f64.powi(-12), max_relative = 1e-12);
        assert_eq!(e_ji, 0.0);

        // the density sees the neighbor from both sides
        let rho_ij = pot.density(&[ai, aj], &lattice, &OpenBoundary);
        let rho_ji = pot.density(&[aj, ai], &lattice, &OpenBoundary);
        assert_eq!(rho_ij, rho_ji);

        // a custom order moves ownership to the other atom
        let pot = pot.with_pair_order(|i, j| i > j);
        assert_eq!(pot.energy(&[ai, aj], &lattice, &OpenBoundary), 0.0);
        assert_relative_eq!(pot.energy(&[aj, ai], &lattice, &OpenBoundary), e_ij, max_relative = 1e-12);

        assert!(lowest_leaf_first(0, 1));
        assert!(!lowest_leaf_first(1, 0));
        assert!(!lowest_leaf_first(1, 1));

        Ok(())
    }

    #[test]
    fn test_cutoff_inclusive() -> Result<()> {
        let pot = FinnisSinclair::new(reduced(12.0, 6.0, 0.0, 2.0), cubic(100.0))?;
        assert_eq!(pot.shells().n_shells(), [0, 0, 0]);

        let lattice = LatticeSites::new(&[[0.0; 3], [2.0, 0.0, 0.0]]);
        let atoms = [atom([0.0; 3], 0, 0), atom([2.0, 0.0, 0.0], 1, 1)];
        assert_relative_eq!(pot.energy(&atoms, &lattice, &OpenBoundary), 0.5f64.powi(12), max_relative = 1e-12);

        let lattice = LatticeSites::new(&[[0.0; 3], [2.0 + 1e-9, 0.0, 0.0]]);
        let atoms = [atom([0.0; 3], 0, 0), atom([2.0 + 1e-9, 0.0, 0.0], 1, 1)];
        assert_eq!(pot.energy(&atoms, &lattice, &OpenBoundary), 0.0);

        Ok(())
    }

    #[test]
    fn test_gradient_conservation() -> Result<()> {
        let (atoms, lattice, cell) = fcc_cell();
        let mut pot = FinnisSinclair::new(reduced(12.0, 6.0, 2.0, 2.0), cell.vectors())?;
        for i in 0..atoms.len() {
            let set = neighbor_set(&atoms, i);
            let g = pot.gradient(&set, &lattice, &cell);
            assert_eq!(g.len(), set.len());
            let total: Vector3f = g.iter().sum();
            assert!(total.norm() < 1e-10, "net force {total:?}");
        }

        Ok(())
    }

    #[test]
    fn test_gradient_finite_difference() -> Result<()> {
        let (atoms, lattice, cell) = fcc_cell();
        let mut pot = FinnisSinclair::new(reduced(12.0, 6.0, 2.0, 2.0), cell.vectors())?;
        let set = neighbor_set(&atoms, 1);
        let g = pot.gradient(&set, &lattice, &cell).to_vec();

        let h = 1e-6;
        for j in 0..set.len() {
            for k in 0..3 {
                let mut plus = set.clone();
                plus[j].position[k] += h;
                let mut minus = set.clone();
                minus[j].position[k] -= h;
                let fd = (pot.energy(&plus, &lattice, &cell) - pot.energy(&minus, &lattice, &cell)) / (2.0 * h);
                assert_relative_eq!(g[j][k], fd, epsilon = 1e-6, max_relative = 1e-6);
            }
        }

        Ok(())
    }

    #[test]
    fn test_virial_finite_difference() -> Result<()> {
        let (atoms, lattice, cell) = fcc_cell();
        let params = reduced(12.0, 6.0, 2.0, 2.0);
        let pot = FinnisSinclair::new(params, cell.vectors())?;

        // energy of the uniformly rescaled crystal
        let energy_scaled = |s: f64, i: usize| -> Result<f64> {
            let cell = cell.scaled(s);
            let pot = FinnisSinclair::new(params, cell.vectors())?;
            let lattice = lattice.scaled(s);
            let mut set = neighbor_set(&atoms, i);
            for a in set.iter_mut() {
                a.position.iter_mut().for_each(|x| *x *= s);
            }
            Ok(pot.energy(&set, &lattice, &cell))
        };

        let h = 1e-6;
        for i in 0..atoms.len() {
            let set = neighbor_set(&atoms, i);
            let virial = pot.virial(&set, &lattice, &cell);
            let fd = (energy_scaled(1.0 + h, i)? - energy_scaled(1.0 - h, i)?) / (2.0 * h);
            assert_relative_eq!(virial, fd, epsilon = 1e-6, max_relative = 1e-6);
        }

        Ok(())
    }

    #[test]
    fn test_separate_ranges() -> Result<()> {
        let (atoms, lattice, cell) = fcc_cell();
        let mut pot = FinnisSinclair::new(reduced(12.0, 6.0, 1.0, 2.0), cell.vectors())?;
        let set = neighbor_set(&atoms, 0);
        let rho = pot.density(&set, &lattice, &cell);

        // a shorter pair range leaves the density alone
        pot.set_pair_range(1.2)?;
        assert_eq!(pot.pair_range(), 1.2);
        assert_eq!(pot.density_range(), 2.0);
        assert_relative_eq!(pot.density(&set, &lattice, &cell), rho, max_relative = 1e-12);

        pot.set_density_range(1.2)?;
        assert!(pot.density(&set, &lattice, &cell) < rho);

        assert!(pot.set_range(0.0).is_err());
        assert!(pot.set_density_range(-1.0).is_err());
        assert_eq!(pot.density_range(), 1.2);

        Ok(())
    }

    #[test]
    fn test_workspace_reuse() -> Result<()> {
        let (atoms, lattice, cell) = fcc_cell();
        let params = reduced(12.0, 6.0, 2.0, 2.0);
        let mut pot = FinnisSinclair::new(params, cell.vectors())?;

        let full = neighbor_set(&atoms, 2);
        let g_full = pot.gradient(&full, &lattice, &cell).to_vec();
        // calling twice gives the same result
        assert_eq!(pot.gradient(&full, &lattice, &cell), &g_full[..]);

        // a smaller set after a larger one must not see stale entries
        let small = &full[..2];
        let g_small = pot.gradient(small, &lattice, &cell).to_vec();
        let mut fresh = FinnisSinclair::new(params, cell.vectors())?;
        assert_eq!(fresh.gradient(small, &lattice, &cell), &g_small[..]);

        // per call scratch and caller owned scratch agree
        let mut per_call = FinnisSinclair::new(params, cell.vectors())?.with_scratch_mode(ScratchMode::PerCall);
        assert_eq!(per_call.scratch_mode(), ScratchMode::PerCall);
        assert_eq!(per_call.gradient(&full, &lattice, &cell), &g_full[..]);
        let mut workspace = Workspace::default();
        assert_eq!(pot.gradient_with(&full, &lattice, &cell, &mut workspace), &g_full[..]);
        assert_eq!(workspace.capacity(), full.len());
        assert_eq!(pot.gradient_with(small, &lattice, &cell, &mut workspace), &g_small[..]);
        assert_eq!(workspace.capacity(), full.len());

        Ok(())
    }

    #[test]
    fn test_invalid_construction() {
        let params = reduced(12.0, 6.0, 1.0, 2.0);
        assert!(FinnisSinclair::new(params, cubic(0.0)).is_err());
        assert!(FinnisSinclair::new(reduced(12.0, 6.0, 1.0, 0.0), cubic(1.0)).is_err());
        assert!(FinnisSinclair::new(reduced(-1.0, 6.0, 1.0, 2.0), cubic(1.0)).is_err());
    }
}
// dabefff1 ends here
