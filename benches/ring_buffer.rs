use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use ringlog::{frame, Eviction, RingBuffer};

const CHUNK: usize = 1024;
const OPS_PER_ITER: u64 = 1_000;

/// Steady-state write/read traffic through a ring that never grows.
fn bench_write_read_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");
    group.throughput(Throughput::Bytes(OPS_PER_ITER * CHUNK as u64));

    group.bench_function("write_read_cycle_64k", |b| {
        let mut rb = RingBuffer::with_limits(64 << 10, 64 << 10, 1024);
        let chunk = vec![0xA5u8; CHUNK];
        let mut out = vec![0u8; CHUNK];
        b.iter(|| {
            for _ in 0..OPS_PER_ITER {
                rb.write(black_box(&chunk));
                black_box(rb.read(&mut out).unwrap());
            }
        })
    });

    group.finish();
}

/// Same traffic with the cursors parked just before the wrap point, so
/// every operation takes the two-segment copy path.
fn bench_wraparound(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");
    group.throughput(Throughput::Bytes(OPS_PER_ITER * CHUNK as u64));

    group.bench_function("wraparound_64k", |b| {
        let cap = 64 << 10;
        let mut rb = RingBuffer::with_limits(cap, cap, 1024);
        // Park the cursors half a chunk before the end of the backing store.
        let offset = cap - CHUNK / 2;
        rb.write(&vec![0u8; offset]);
        rb.consume(offset);

        let chunk = vec![0x5Au8; CHUNK];
        let mut out = vec![0u8; CHUNK];
        b.iter(|| {
            for _ in 0..OPS_PER_ITER {
                rb.write(black_box(&chunk));
                black_box(rb.read(&mut out).unwrap());
            }
        })
    });

    group.finish();
}

/// Growth path: a small ring absorbing a burst that multiplies its
/// capacity, including the relocation copies.
fn bench_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");
    let total = 256 * CHUNK;
    group.throughput(Throughput::Bytes(total as u64));

    group.bench_function("grow_1k_to_256k", |b| {
        let chunk = vec![1u8; CHUNK];
        b.iter_batched(
            || RingBuffer::with_limits(1 << 10, 1 << 30, 64 << 10),
            |mut rb| {
                for _ in 0..256 {
                    rb.write(black_box(&chunk));
                }
                black_box(rb.len());
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

/// Capped ring in record-eviction steady state: every write pushes out an
/// old record.
fn bench_record_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");
    let payload = vec![7u8; 120];
    group.throughput(Throughput::Bytes(OPS_PER_ITER * payload.len() as u64));

    group.bench_function("record_evict_churn", |b| {
        let mut rb = RingBuffer::with_limits(4 << 10, 4 << 10, 1024);
        b.iter(|| {
            for _ in 0..OPS_PER_ITER {
                frame::write_record(&mut rb, black_box(&payload)).unwrap();
            }
        })
    });

    group.finish();
}

/// Single-byte API, the tightest loop the ring supports.
fn bench_byte_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");
    group.throughput(Throughput::Elements(OPS_PER_ITER));

    group.bench_function("write_read_byte", |b| {
        let mut rb = RingBuffer::with_limits(4 << 10, 4 << 10, 1024);
        b.iter(|| {
            for i in 0..OPS_PER_ITER {
                rb.write_byte(black_box(i as u8));
                black_box(rb.read_byte().unwrap());
            }
        })
    });

    group.finish();
}

/// Byte-eviction steady state on a full capped ring.
fn bench_byte_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");
    group.throughput(Throughput::Bytes(OPS_PER_ITER * CHUNK as u64));

    group.bench_function("byte_evict_churn", |b| {
        let mut rb = RingBuffer::with_limits(4 << 10, 4 << 10, 1024);
        let chunk = vec![9u8; CHUNK];
        rb.write(&chunk);
        rb.write(&chunk);
        rb.write(&chunk);
        rb.write(&chunk);
        b.iter(|| {
            for _ in 0..OPS_PER_ITER {
                black_box(rb.write_evicting(black_box(&chunk), Eviction::Bytes));
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_write_read_cycle,
    bench_wraparound,
    bench_growth,
    bench_record_eviction,
    bench_byte_ops,
    bench_byte_eviction,
);

criterion_main!(benches);
