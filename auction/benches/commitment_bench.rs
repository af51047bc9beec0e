// Commitment and reveal benchmarks for the sealed-bid auction.
//
// Covers `blind` on its own and a full reveal pass over a bidder with many
// sealed slots, which is dominated by re-hashing every disclosed pair.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use sealed_auction::commitment::blind;
use sealed_auction::{Address, Auction, AuctionConfig, ManualClock};

fn bench_blind(c: &mut Criterion) {
    c.bench_function("commitment/blind", |b| {
        b.iter(|| blind(5_000_000_000_000_000_000, false));
    });
}

fn bench_reveal(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/reveal");

    for slots in [1usize, 16, 256] {
        group.throughput(Throughput::Elements(slots as u64));
        group.bench_with_input(BenchmarkId::from_parameter(slots), &slots, |b, &slots| {
            let amounts: Vec<u128> = (1..=slots as u128).collect();
            let fake = vec![false; slots];
            let bidder = Address::new("bench-bidder");

            b.iter_batched(
                || {
                    let clock = ManualClock::new(0);
                    let mut auction =
                        Auction::new(AuctionConfig::new("bench-bene"), clock.clone()).unwrap();
                    for amount in &amounts {
                        auction
                            .place_bid(&bidder, *amount, blind(*amount, false))
                            .unwrap();
                    }
                    clock.advance(60);
                    auction
                },
                |mut auction| auction.reveal(&bidder, &amounts, &fake).unwrap(),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_blind, bench_reveal);
criterion_main!(benches);
