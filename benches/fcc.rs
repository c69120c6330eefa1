// [[file:../fs-lattice.note::c81f3e09][c81f3e09]]
use gut::prelude::*;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fs_lattice::*;

fn init() -> Result<(Crystal, FinnisSinclair)> {
    let params = FsParameters::copper();
    let mut crystal = Crystal::fcc(params.a, [2, 2, 2])?;
    for i in 0..crystal.natoms() {
        let x = i as f64;
        crystal.displace(i, [0.05 * x.sin(), 0.05 * x.cos(), -0.05 * (2.0 * x).sin()]);
    }
    let pot = FinnisSinclair::new(params, crystal.primitive_vectors())?;

    Ok((crystal, pot))
}

fn copper(crystal: &Crystal, pot: &mut FinnisSinclair) {
    let _computed = crystal.compute(pot);
}

fn copper_neighbor_set(crystal: &Crystal, pot: &mut FinnisSinclair) {
    let set = crystal.neighbor_set(0);
    let _energy = pot.energy(&set, crystal.sites(), crystal.cell());
    let _gradient = pot.gradient(&set, crystal.sites(), crystal.cell());
}

fn criterion_benchmark(c: &mut Criterion) {
    let (crystal, mut pot) = init().unwrap();
    c.bench_function("fcc copper", |b| b.iter(|| black_box(copper(&crystal, &mut pot))));
    c.bench_function("fcc copper parallel", |b| b.iter(|| black_box(crystal.compute_parallel(&pot))));
    c.bench_function("fcc copper single atom", |b| {
        b.iter(|| black_box(copper_neighbor_set(&crystal, &mut pot)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
// c81f3e09 ends here
