// [[file:../fs-lattice.note::3b3957aa][3b3957aa]]
use super::*;
// 3b3957aa ends here

// [[file:../fs-lattice.note::bd332eed][bd332eed]]
/// Periodic translations within range of a cutoff radius, enumerated over a
/// symmetric box of integer shells along the three primitive vectors.
#[derive(Debug, Clone)]
pub struct ImageShells {
    n_shells: [i32; 3],
    // translation vectors, zero shell included
    translations: Vec<Vector3f>,
}

/// Number of image shells on each side of the zero shell required to cover
/// `cutoff` for the primitive vectors `a0`.
///
/// The 0.49999 offset is a half-cell tolerance: an image whose cell center
/// lies just beyond the cutoff is still enumerated.
pub fn shell_half_widths(cutoff: f64, a0: &[Array3; 3]) -> [i32; 3] {
    let mut n = [0; 3];
    for k in 0..3 {
        n[k] = (cutoff / a0[k][k] - 0.49999).ceil() as i32;
    }
    n
}

impl ImageShells {
    /// Enumerate all translations `nx a0[0] + ny a0[1] + nz a0[2]` for the
    /// shell half-widths derived from `cutoff`.
    pub fn new(cutoff: f64, a0: &[Array3; 3]) -> Result<Self> {
        if !(cutoff > 0.0) {
            bail!("invalid cutoff radius for image shells: {cutoff}");
        }
        for (k, v) in a0.iter().enumerate() {
            if !v.iter().all(|x| x.is_finite()) || !(v[k] > 0.0) {
                bail!("degenerate primitive vector a0[{k}]: {v:?}");
            }
        }

        let n_shells = shell_half_widths(cutoff, a0);
        debug_assert!(n_shells.iter().all(|&n| n >= 0));
        let [v0, v1, v2]: [Vector3f; 3] = [a0[0].into(), a0[1].into(), a0[2].into()];

        let [nx, ny, nz] = n_shells;
        let mut translations = Vec::with_capacity(((2 * nx + 1) * (2 * ny + 1) * (2 * nz + 1)) as usize);
        for ix in -nx..=nx {
            for iy in -ny..=ny {
                for iz in -nz..=nz {
                    let t = ix as f64 * v0 + iy as f64 * v1 + iz as f64 * v2;
                    translations.push(t);
                }
            }
        }
        debug!("image shells: {n_shells:?}, {} translations", translations.len());

        Ok(Self { n_shells, translations })
    }

    /// Shell half-widths along each primitive vector.
    pub fn n_shells(&self) -> [i32; 3] {
        self.n_shells
    }

    /// All periodic translations, including the zero vector.
    pub fn translations(&self) -> &[Vector3f] {
        &self.translations
    }

    /// Number of translations.
    pub fn len(&self) -> usize {
        self.translations.len()
    }
}
// bd332eed ends here

// [[file:../fs-lattice.note::e1bdec63][e1bdec63]]
#[test]
fn test_shell_half_widths() {
    let l = 1.7;
    let a0 = [[l, 0.0, 0.0], [0.0, l, 0.0], [0.0, 0.0, l]];
    // ceil(2.5 - 0.49999) = 3
    assert_eq!(shell_half_widths(2.5 * l, &a0), [3, 3, 3]);
    // ceil(2.0 - 0.49999) = 2
    assert_eq!(shell_half_widths(2.0 * l, &a0), [2, 2, 2]);
    // ceil(0.5 - 0.49999) = 1: half a cell still reaches the first shell
    assert_eq!(shell_half_widths(0.5 * l, &a0), [1, 1, 1]);
    // tiny cutoff: zero shell only
    assert_eq!(shell_half_widths(0.4 * l, &a0), [0, 0, 0]);

    let a0 = [[1.0, 0.0, 0.0], [0.5, 2.0, 0.0], [0.0, 0.0, 4.0]];
    assert_eq!(shell_half_widths(2.5, &a0), [3, 1, 1]);
}

#[test]
fn test_image_shells() -> Result<()> {
    let a0 = [[2.0, 0.0, 0.0], [0.3, 1.5, 0.0], [0.2, 0.1, 3.0]];
    let shells = ImageShells::new(4.0, &a0)?;
    let [nx, ny, nz] = shells.n_shells();
    assert_eq!([nx, ny, nz], [2, 3, 1]);
    assert_eq!(shells.len(), 5 * 7 * 3);

    // the zero shell is always present
    let translations = shells.translations();
    assert_eq!(translations.iter().filter(|t| t.norm() == 0.0).count(), 1);

    // symmetric about zero
    for t in translations {
        let found = translations.iter().any(|u| (t + u).norm() < 1e-12);
        assert!(found, "missing inversion image of {t:?}");
    }

    // degenerate input
    let a0 = [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    assert!(ImageShells::new(2.0, &a0).is_err());
    let a0 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    assert!(ImageShells::new(0.0, &a0).is_err());
    assert!(ImageShells::new(f64::NAN, &a0).is_err());

    Ok(())
}
// e1bdec63 ends here
