use criterion::{black_box, criterion_group, criterion_main, Criterion};

use okvs_core::{Block, Matrix};
use okvs_paxos::{DenseType, Paxos, PaxosParam};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

fn criterion_benchmark(c: &mut Criterion) {
    let n = 1 << 14;
    let mut rng = ChaCha12Rng::seed_from_u64(0);
    let keys: Vec<Block> = (0..n).map(|_| rng.gen::<[u8; 16]>().into()).collect();
    let values = Matrix::from_vec(n, 1, Block::random_vec(&mut rng, n));

    let params = PaxosParam::new(n, 3, 40, DenseType::Gf128);
    let paxos = Paxos::<u32>::new(n, params, Block::ZERO).unwrap();
    let structure = paxos.encode(&keys, &values).unwrap();

    c.bench_function("Paxos::encode/16384", |bench| {
        bench.iter(|| {
            let d = paxos.encode(black_box(&keys), black_box(&values)).unwrap();
            black_box(d);
        });
    });

    c.bench_function("Paxos::decode/16384", |bench| {
        bench.iter(|| {
            let v = paxos
                .decode(black_box(&keys), black_box(&structure))
                .unwrap();
            black_box(v);
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
