use criterion::{black_box, criterion_group, criterion_main, Criterion};
use linkwire::queue::ReceiveQueue;
use linkwire::{Identifier, RawMessage};

fn add_get_round_trip(c: &mut Criterion) {
    let queue = ReceiveQueue::new(1024).unwrap();
    let from = Identifier::path("bench-peer");

    c.bench_function("queue add+get round trip", |b| {
        b.iter(|| {
            queue.add(RawMessage::from_slice(1, b"payload"), from.clone()).unwrap();
            black_box(queue.get(0, &[], None));
        });
    });
}

fn add_with_selector_scan(c: &mut Criterion) {
    let queue = ReceiveQueue::new(1024).unwrap();
    let from = Identifier::path("bench-peer");
    for req_id in 0..31 {
        queue.add(RawMessage::new(req_id), from.clone()).unwrap();
    }
    queue.add(RawMessage::new(31), from.clone()).unwrap();

    c.bench_function("queue selector scan over 32 entries", |b| {
        b.iter(|| {
            let found = queue.get(0, &[31], None);
            if let Some(entry) = found {
                // Put it back at the tail so the next iteration scans the
                // same depth again.
                queue.add(entry.message, entry.from).unwrap();
            }
            black_box(());
        });
    });
}

criterion_group!(benches, add_get_round_trip, add_with_selector_scan);
criterion_main!(benches);
