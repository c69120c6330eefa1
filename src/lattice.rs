// [[file:../fs-lattice.note::95ad2348][95ad2348]]
use super::*;

use vecfx::nalgebra::Matrix3;
// 95ad2348 ends here

// [[file:../fs-lattice.note::4e67c6fb][4e67c6fb]]
/// An atom as seen by the potential.
pub trait Atom {
    /// Current Cartesian position.
    fn position(&self) -> Vector3f;

    /// Globally unique index used to order pairs.
    fn leaf_index(&self) -> usize;

    /// Index of the lattice site the atom belongs to.
    fn site_index(&self) -> usize;
}

/// Maps a lattice site to its ideal position.
pub trait CoordinateDefinition {
    fn lattice_position(&self, site: usize) -> Vector3f;
}

/// Periodic reduction of displacement vectors.
pub trait Boundary {
    /// Return the minimum image of displacement `dr`.
    fn nearest_image(&self, dr: Vector3f) -> Vector3f;
}
// 4e67c6fb ends here

// [[file:../fs-lattice.note::ec24799d][ec24799d]]
/// Plain atom record: a position, its lattice site and a leaf index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeAtom {
    pub position: Array3,
    pub site: usize,
    pub leaf: usize,
}

impl Atom for LatticeAtom {
    fn position(&self) -> Vector3f {
        self.position.into()
    }

    fn leaf_index(&self) -> usize {
        self.leaf
    }

    fn site_index(&self) -> usize {
        self.site
    }
}

impl<A: Atom> Atom for &A {
    fn position(&self) -> Vector3f {
        (*self).position()
    }

    fn leaf_index(&self) -> usize {
        (*self).leaf_index()
    }

    fn site_index(&self) -> usize {
        (*self).site_index()
    }
}

/// Ideal lattice positions, indexed by site.
#[derive(Debug, Clone, Default)]
pub struct LatticeSites {
    sites: Vec<Vector3f>,
}

impl LatticeSites {
    pub fn new(sites: &[Array3]) -> Self {
        let sites = sites.iter().map(|&p| p.into()).collect();
        Self { sites }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vector3f> {
        self.sites.iter()
    }

    /// Uniformly rescale all sites by `s`.
    pub fn scaled(&self, s: f64) -> Self {
        let sites = self.sites.iter().map(|p| p * s).collect();
        Self { sites }
    }
}

impl CoordinateDefinition for LatticeSites {
    fn lattice_position(&self, site: usize) -> Vector3f {
        self.sites[site]
    }
}
// ec24799d ends here

// [[file:../fs-lattice.note::6a79d4b8][6a79d4b8]]
/// Periodic simulation cell spanned by three cell vectors.
///
/// Displacements are reduced in fractional coordinates, which is the
/// minimum image for orthorhombic cells.
#[derive(Debug, Clone)]
pub struct PeriodicCell {
    // cell vectors as columns
    matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl PeriodicCell {
    /// Construct from three cell vectors.
    pub fn new(vectors: [Array3; 3]) -> Result<Self> {
        let [a, b, c] = vectors;
        let matrix = Matrix3::from_columns(&[Vector3f::from(a), Vector3f::from(b), Vector3f::from(c)]);
        let inverse = match matrix.try_inverse() {
            Some(inv) if inv.iter().all(|x| x.is_finite()) => inv,
            _ => bail!("singular cell vectors: {vectors:?}"),
        };

        Ok(Self { matrix, inverse })
    }

    /// Orthorhombic cell with edge lengths `lengths`.
    pub fn orthorhombic(lengths: Array3) -> Result<Self> {
        let [a, b, c] = lengths;
        Self::new([[a, 0.0, 0.0], [0.0, b, 0.0], [0.0, 0.0, c]])
    }

    /// The three cell vectors.
    pub fn vectors(&self) -> [Array3; 3] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(1, 0)], m[(2, 0)]],
            [m[(0, 1)], m[(1, 1)], m[(2, 1)]],
            [m[(0, 2)], m[(1, 2)], m[(2, 2)]],
        ]
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// Uniformly rescale the cell by `s`.
    pub fn scaled(&self, s: f64) -> Self {
        Self {
            matrix: self.matrix * s,
            inverse: self.inverse / s,
        }
    }
}

impl Boundary for PeriodicCell {
    fn nearest_image(&self, dr: Vector3f) -> Vector3f {
        let mut f = self.inverse * dr;
        for x in f.iter_mut() {
            *x -= x.round();
        }
        self.matrix * f
    }
}
// 6a79d4b8 ends here

// [[file:../fs-lattice.note::bde4506a][bde4506a]]
/// Move a configuration displacement `dr` onto the periodic image selected
/// for the lattice displacement `dR`.
///
/// The boundary reduces `dR` only; the same lattice translation is removed
/// from `dr`, so an atom that wandered far from its site keeps the image of
/// its site rather than the image nearest to its instantaneous position.
pub fn correct_to_lattice_image<B: Boundary + ?Sized>(dr: Vector3f, dR: Vector3f, boundary: &B) -> (Vector3f, Vector3f) {
    let dR_reduced = boundary.nearest_image(dR);
    let shift = dR - dR_reduced;
    (dr - shift, dR_reduced)
}
// bde4506a ends here

// [[file:../fs-lattice.note::3a281675][3a281675]]
#[test]
fn test_periodic_cell() -> Result<()> {
    use approx::assert_relative_eq;

    let cell = PeriodicCell::orthorhombic([2.0, 3.0, 4.0])?;
    assert_relative_eq!(cell.volume(), 24.0, epsilon = 1e-12);

    let d = cell.nearest_image([1.9, -2.0, 0.5].into());
    assert_relative_eq!(d[0], -0.1, epsilon = 1e-12);
    assert_relative_eq!(d[1], 1.0, epsilon = 1e-12);
    assert_relative_eq!(d[2], 0.5, epsilon = 1e-12);

    // far images
    let d = cell.nearest_image([10.2, 0.0, -16.0].into());
    assert_relative_eq!(d[0], 0.2, epsilon = 1e-12);
    assert_relative_eq!(d[2], 0.0, epsilon = 1e-12);

    let cell2 = cell.scaled(2.0);
    assert_relative_eq!(cell2.volume(), 192.0, epsilon = 1e-9);
    assert_eq!(cell2.vectors()[1], [0.0, 6.0, 0.0]);

    assert!(PeriodicCell::new([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]).is_err());

    Ok(())
}

#[test]
fn test_correct_to_lattice_image() -> Result<()> {
    use approx::assert_relative_eq;

    let cell = PeriodicCell::orthorhombic([4.0, 4.0, 4.0])?;

    // sites 3.0 apart along x: the lattice image is at -1.0
    let dR: Vector3f = [3.0, 0.0, 0.0].into();
    // atom 0 moved -0.6 and atom 1 moved +0.6: the instantaneous separation
    // 1.8 is already a minimum image, but the lattice image wins
    let dr: Vector3f = [1.8, 0.0, 0.0].into();
    let (dr_c, dR_c) = correct_to_lattice_image(dr, dR, &cell);
    assert_relative_eq!(dR_c[0], -1.0, epsilon = 1e-12);
    assert_relative_eq!(dr_c[0], -2.2, epsilon = 1e-12);
    // thermal part is untouched
    assert_relative_eq!((dr_c - dR_c).norm(), (dr - dR).norm(), epsilon = 1e-12);

    // nothing to correct within the cell
    let dR: Vector3f = [1.0, -1.0, 0.5].into();
    let dr: Vector3f = [1.1, -0.9, 0.4].into();
    let (dr_c, _) = correct_to_lattice_image(dr, dR, &cell);
    assert_relative_eq!((dr_c - dr).norm(), 0.0, epsilon = 1e-12);

    Ok(())
}
// 3a281675 ends here
