//! # Ledger Benchmarks
//!
//! Chain validation and reconciliation cost as chains grow.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gl_01_ledger::Ledger;
use gl_02_chain_sync::synchronise_chain;
use shared_types::Block;

fn mined_chain(blocks: usize) -> Vec<Block> {
    let mut ledger = Ledger::new();
    for i in 0..blocks {
        let tx = ledger.create_new_transaction(i as u64, "A", "B");
        ledger
            .add_transaction_to_pending_transactions(tx)
            .expect("pool accepts transaction");
        ledger.mine_block().expect("mining succeeds");
    }
    ledger.chain().to_vec()
}

fn bench_chain_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain-validation");
    for blocks in [2usize, 8] {
        let chain = mined_chain(blocks);
        group.bench_with_input(BenchmarkId::from_parameter(chain.len()), &chain, |b, chain| {
            b.iter(|| gl_01_ledger::is_chain_valid(black_box(chain)))
        });
    }
    group.finish();
}

fn bench_reconciliation(c: &mut Criterion) {
    let chain = mined_chain(8);
    c.bench_function("reconcile-longer-chain", |b| {
        b.iter(|| {
            let mut local = Ledger::new();
            synchronise_chain(&mut local, black_box(chain.clone()), Vec::new())
        })
    });
}

criterion_group!(benches, bench_chain_validation, bench_reconciliation);
criterion_main!(benches);
