use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bsq_parser::{BlockParser, TxParser};
use bsq_store::{DaoStateReader, StateStore};
use bsq_types::{BlockHash, GenesisConfig, RawBlock, RawTx, RawTxOutput, TxId, TxInput};

fn output(tx_id: &str, index: u32, value: u64, height: u32) -> RawTxOutput {
    RawTxOutput {
        index,
        value,
        tx_id: TxId::new(tx_id),
        pub_key_script: None,
        address: None,
        op_return_data: None,
        block_height: height,
    }
}

fn genesis() -> GenesisConfig {
    GenesisConfig {
        tx_id: TxId::new("genesis"),
        block_height: 1,
        total_supply: 1_000_000,
    }
}

/// A store holding a genesis tx with 1000 outputs.
fn store_with_genesis() -> StateStore {
    let store = StateStore::new(genesis());
    let genesis_tx = RawTx {
        id: TxId::new("genesis"),
        block_height: 1,
        block_hash: BlockHash::new("h1"),
        time: 0,
        inputs: vec![],
        outputs: (0..1000).map(|i| output("genesis", i, 1_000, 1)).collect(),
    };
    let block = RawBlock {
        height: 1,
        time: 0,
        hash: BlockHash::new("h1"),
        previous_block_hash: BlockHash::default(),
        txs: vec![genesis_tx],
    };
    BlockParser::new(genesis())
        .apply(&store, &block)
        .expect("genesis block");
    store
}

fn transfer(i: u32) -> RawTx {
    let id = format!("t{i}");
    RawTx {
        id: TxId::new(id.clone()),
        block_height: 2,
        block_hash: BlockHash::new("h2"),
        time: 0,
        inputs: vec![TxInput::new("genesis", i)],
        outputs: vec![output(&id, 0, 600, 2), output(&id, 1, 400, 2)],
    }
}

fn classify_bench(c: &mut Criterion) {
    let store = store_with_genesis();
    let parser = TxParser::new(genesis());
    let tx = transfer(0);

    c.bench_function("classify_transfer", |b| {
        let state = store.read();
        b.iter(|| parser.classify(black_box(&tx), 2, &*state))
    });
}

fn parse_block_bench(c: &mut Criterion) {
    let block = RawBlock {
        height: 2,
        time: 0,
        hash: BlockHash::new("h2"),
        previous_block_hash: BlockHash::new("h1"),
        txs: (0..1000).map(transfer).collect(),
    };
    let parser = BlockParser::new(genesis());

    c.bench_function("parse_block_1000_transfers", |b| {
        b.iter_with_setup(store_with_genesis, |store| {
            parser.apply(&store, black_box(&block)).expect("parse");
            assert_eq!(store.read().chain_height(), 2);
        })
    });
}

criterion_group!(benches, classify_bench, parse_block_bench);
criterion_main!(benches);
