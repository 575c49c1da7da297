use bencher::{benchmark_group, benchmark_main, Bencher};

use adaptive_histogram::{deserialize, serialize, AdaptiveStorage};

fn u8_storage() -> AdaptiveStorage {
    let mut storage = AdaptiveStorage::new(4096);
    for i in 0 .. 4096 {
        storage.increase(i).unwrap();
    }
    storage
}

fn big_storage() -> AdaptiveStorage {
    let mut storage = u8_storage();
    for _ in 0 .. 70 {
        let copy = storage.clone();
        storage += &copy;
    }
    storage
}

fn weighted_storage() -> AdaptiveStorage {
    let mut storage = u8_storage();
    storage.increase_weighted(0, 0.5).unwrap();
    storage
}

fn encode_u8(bencher: &mut Bencher) { _bench_encode(bencher, u8_storage()); }
fn encode_big(bencher: &mut Bencher) { _bench_encode(bencher, big_storage()); }
fn encode_weighted(bencher: &mut Bencher) { _bench_encode(bencher, weighted_storage()); }
fn decode_u8(bencher: &mut Bencher) { _bench_decode(bencher, u8_storage()); }
fn decode_big(bencher: &mut Bencher) { _bench_decode(bencher, big_storage()); }
fn decode_weighted(bencher: &mut Bencher) { _bench_decode(bencher, weighted_storage()); }

fn _bench_encode(bencher: &mut Bencher, storage: AdaptiveStorage) {
    bencher.bytes = serialize(&storage).len() as u64;
    bencher.iter(|| {
        bencher::black_box(serialize(&storage));
    });
}

fn _bench_decode(bencher: &mut Bencher, storage: AdaptiveStorage) {
    let bytes = serialize(&storage);
    bencher.bytes = bytes.len() as u64;
    bencher.iter(|| {
        bencher::black_box(deserialize(&bytes).unwrap());
    });
}

benchmark_group!(
    encode,
    encode_u8,
    encode_big,
    encode_weighted,
);

benchmark_group!(
    decode,
    decode_u8,
    decode_big,
    decode_weighted,
);

benchmark_main!(encode, decode);
