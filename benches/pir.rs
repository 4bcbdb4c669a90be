use criterion::{black_box, criterion_group, criterion_main, Criterion};
use she::pir::partition;
use she::prelude::*;

const S: u32 = 32;
const L: u32 = 8;
const ENTRIES: usize = 256;
const RECORD_WIDTH: usize = 256;

fn records() -> Plaintext {
    Plaintext::from_rows((0..ENTRIES).map(|i| BitArray::binary(i.wrapping_mul(0x9E37), RECORD_WIDTH)))
        .unwrap()
}

fn criterion_encrypt(c: &mut Criterion) {
    let sk = SecretKey::generate(S, L).unwrap();
    let pk = sk.public_key();
    let message = BitArray::binary(0xA5, L as usize);

    c.bench_function("keygen", |b| b.iter(|| SecretKey::generate(S, L).unwrap()));

    let mut ciphertext = None;
    c.bench_function("encrypt", |b| {
        b.iter(|| ciphertext = Some(Ciphertext::encrypt(&pk, &sk, black_box(&message)).unwrap()))
    });
    let ciphertext = ciphertext.unwrap();

    c.bench_function("decrypt", |b| b.iter(|| ciphertext.decrypt(&sk)));
}

fn criterion_operators(c: &mut Criterion) {
    let sk = SecretKey::generate(S, L).unwrap();
    let pk = sk.public_key();
    let indices = Plaintext::index_table(ENTRIES, L as usize);
    let data = records();

    // The queried index doesn't change the cost
    let query = Ciphertext::encrypt(&pk, &sk, &BitArray::binary(42, L as usize)).unwrap();

    let mut gamma = None;
    c.bench_function("sumprod", |b| {
        b.iter(|| gamma = Some(sumprod(&pk, &query, &indices).unwrap()))
    });
    let gamma = gamma.unwrap();

    c.bench_function("dot", |b| b.iter(|| dot(&pk, &gamma, &data).unwrap()));

    let answers: FilledCiphertextArray = (0..8)
        .map(|i| Ciphertext::encrypt(&pk, &sk, &BitArray::binary(i, RECORD_WIDTH)).unwrap())
        .collect();
    c.bench_function("xor", |b| b.iter(|| xor(&pk, &answers, RECORD_WIDTH).unwrap()));
}

fn criterion_sharded(c: &mut Criterion) {
    let client = PirClient::new(SecretKey::generate(S, L).unwrap(), ENTRIES).unwrap();
    let query = client.query(200).unwrap();

    for count in [1, 4] {
        let server = PirServer::with_shards(client.public_key().clone(), records(), count).unwrap();
        c.bench_function(&format!("answer {count} shards"), |b| {
            b.iter(|| server.answer(&query).unwrap())
        });
    }

    let data = records();
    c.bench_function("partition", |b| {
        b.iter(|| partition(&data, L as usize, 4).unwrap())
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().measurement_time(core::time::Duration::from_secs(10));
    targets = criterion_encrypt, criterion_operators, criterion_sharded
);
criterion_main!(benches);
