//! Node level tests: parse executor, full node serving and lite node sync,
//! all on top of the in-memory network.

use std::sync::Arc;
use std::time::Duration;

use bsq_messages::{
    GetBlocksRequest, GetBlocksResponse, NetworkEnvelope, NewBlockBroadcastMessage,
};
use bsq_network::{CloseConnectionReason, NetworkEvent};
use bsq_node::{
    load_raw_blocks, save_raw_blocks, BatchEvent, FullNode, LiteNode, NodeError, NodeMetrics,
    ParseExecutor, ShutdownController,
};
use bsq_nullables::{NullNetwork, SendBehaviour};
use bsq_parser::{BlockParser, ParseError};
use bsq_store::{DaoStateReader, StateStore};
use bsq_types::{BlockHash, GenesisConfig, RawBlock, RawTx, RawTxOutput, TxId, TxInput, TxType};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const GENESIS_HEIGHT: u32 = 100;

fn genesis() -> GenesisConfig {
    GenesisConfig {
        tx_id: TxId::new("genesis"),
        block_height: GENESIS_HEIGHT,
        total_supply: 10_000,
    }
}

fn hash(height: u32) -> BlockHash {
    BlockHash::new(format!("hash{height}"))
}

fn raw_tx(id: &str, height: u32, inputs: &[(&str, u32)], values: &[u64]) -> RawTx {
    RawTx {
        id: TxId::new(id),
        block_height: height,
        block_hash: hash(height),
        time: 0,
        inputs: inputs.iter().map(|(t, i)| TxInput::new(*t, *i)).collect(),
        outputs: values
            .iter()
            .enumerate()
            .map(|(i, value)| RawTxOutput {
                index: i as u32,
                value: *value,
                tx_id: TxId::new(id),
                pub_key_script: None,
                address: None,
                op_return_data: None,
                block_height: height,
            })
            .collect(),
    }
}

fn raw_block(height: u32, txs: Vec<RawTx>) -> RawBlock {
    RawBlock {
        height,
        time: 1_000 + u64::from(height),
        hash: hash(height),
        previous_block_hash: hash(height - 1),
        txs,
    }
}

/// Genesis at 100, a BSQ transfer at 101, empty blocks up to `tip`.
fn chain(tip: u32) -> Vec<RawBlock> {
    let mut blocks = vec![
        raw_block(
            GENESIS_HEIGHT,
            vec![raw_tx("genesis", GENESIS_HEIGHT, &[("btc", 0)], &[6_000, 4_000])],
        ),
        raw_block(
            101,
            vec![raw_tx("transfer", 101, &[("genesis", 0)], &[5_000, 1_000])],
        ),
    ];
    for height in 102..=tip {
        blocks.push(raw_block(height, vec![]));
    }
    blocks
}

struct Parts {
    store: Arc<StateStore>,
    executor: ParseExecutor,
    metrics: Arc<NodeMetrics>,
}

fn parts() -> Parts {
    bsq_utils::init_tracing();
    let store = Arc::new(StateStore::new(genesis()));
    let metrics = Arc::new(NodeMetrics::new().unwrap());
    let executor = ParseExecutor::spawn(
        Arc::clone(&store),
        Arc::new(BlockParser::new(genesis())),
        Arc::clone(&metrics),
    );
    Parts {
        store,
        executor,
        metrics,
    }
}

fn full_node(network: &Arc<NullNetwork>) -> Arc<FullNode<NullNetwork>> {
    let p = parts();
    Arc::new(FullNode::new(p.store, p.executor, Arc::clone(network), p.metrics))
}

fn lite_node(network: &Arc<NullNetwork>) -> Arc<LiteNode<NullNetwork>> {
    let p = parts();
    Arc::new(LiteNode::new(p.store, p.executor, Arc::clone(network), p.metrics))
}

/// Wait until the lite node has sent a request and return its nonce and height.
async fn next_request(network: &NullNetwork, already_seen: usize) -> GetBlocksRequest {
    for _ in 0..200 {
        let requests: Vec<GetBlocksRequest> = network
            .sent()
            .into_iter()
            .filter_map(|(_, m)| match m {
                NetworkEnvelope::GetBlocksRequest(r) => Some(r),
                _ => None,
            })
            .collect();
        if requests.len() > already_seen {
            return requests[already_seen].clone();
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("lite node never sent a get blocks request");
}

fn response_from(full: &FullNode<NullNetwork>, request: &GetBlocksRequest) -> GetBlocksResponse {
    let state = full.store().read();
    GetBlocksResponse {
        blocks: state
            .blocks_from_height(request.from_block_height)
            .iter()
            .map(RawBlock::from_block)
            .collect(),
        request_nonce: request.nonce,
    }
}

// ---------------------------------------------------------------------------
// Parse executor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn executor_applies_blocks_in_submission_order() {
    let p = parts();
    let applied = p.executor.parse_blocks_to_end(chain(104)).await.unwrap();
    assert_eq!(applied, 5);

    let state = p.store.read();
    assert_eq!(state.chain_height(), 104);
    assert_eq!(state.tx_type(&TxId::new("transfer")), Some(TxType::TransferBsq));
    assert_eq!(p.metrics.blocks_applied.get(), 5);
    assert_eq!(p.metrics.chain_height.get(), 104);
}

#[tokio::test]
async fn batch_stops_at_first_rejected_block() {
    let p = parts();
    let mut blocks = chain(102);
    blocks.insert(2, raw_block(101, vec![]));

    let mut events = p.executor.parse_blocks(blocks).await.unwrap();
    let mut parsed = Vec::new();
    let finished = loop {
        match events.recv().await.unwrap() {
            BatchEvent::Parsed(block) => parsed.push(block.height),
            BatchEvent::Finished(result) => break result,
        }
    };

    assert_eq!(parsed, vec![100, 101]);
    assert!(finished.is_err());
    assert_eq!(p.store.read().chain_height(), 101);
    assert_eq!(p.metrics.blocks_rejected.get(), 1);
}

#[tokio::test]
async fn executor_rejects_already_parsed_block() {
    let p = parts();
    p.executor.parse_blocks_to_end(chain(101)).await.unwrap();

    let again = p.executor.parse_block(raw_block(101, vec![])).await;
    assert!(matches!(
        again,
        Err(NodeError::Parse(ParseError::BlockAlreadyParsed { height: 101 }))
    ));
}

#[tokio::test]
async fn stopped_executor_reports_it() {
    let p = parts();
    p.executor.stop();
    tokio::task::yield_now().await;
    let result = p.executor.parse_block(raw_block(GENESIS_HEIGHT, vec![])).await;
    assert!(matches!(result, Err(NodeError::ExecutorStopped)));
}

// ---------------------------------------------------------------------------
// Full node
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_node_serves_blocks_from_requested_height() {
    let network = Arc::new(NullNetwork::new());
    let full = full_node(&network);
    full.apply_raw_blocks(chain(104)).await.unwrap();

    let connection = NullNetwork::connection(7);
    full.on_get_blocks_request(
        GetBlocksRequest {
            from_block_height: 103,
            nonce: 99,
        },
        connection.clone(),
    )
    .await;

    let sent = network.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, connection);
    let NetworkEnvelope::GetBlocksResponse(response) = &sent[0].1 else {
        panic!("expected a response, got {:?}", sent[0].1);
    };
    assert_eq!(response.request_nonce, 99);
    assert_eq!(response.first_height(), Some(103));
    assert_eq!(response.last_height(), Some(104));
    assert!(network.closed().is_empty());
}

#[tokio::test]
async fn full_node_broadcasts_new_blocks_to_peers() {
    let network = Arc::new(NullNetwork::new());
    let full = full_node(&network);
    full.add_peer(NullNetwork::connection(1));
    full.add_peer(NullNetwork::connection(2));

    full.apply_raw_block(chain(100).remove(0)).await.unwrap();

    let sent = network.sent();
    assert_eq!(sent.len(), 2);
    for (_, message) in &sent {
        match message {
            NetworkEnvelope::NewBlockBroadcast(m) => assert_eq!(m.block.height, 100),
            other => panic!("unexpected message {other:?}"),
        }
    }
}

#[tokio::test]
async fn stalled_peer_does_not_hold_up_block_application() {
    let network = Arc::new(NullNetwork::with_behaviour(SendBehaviour::Hang));
    let p = parts();
    let full = FullNode::new(p.store, p.executor, Arc::clone(&network), p.metrics)
        .with_broadcast_timeout(Duration::from_millis(50));
    let stalled = NullNetwork::connection(4);
    full.add_peer(stalled.clone());

    let applied = tokio::time::timeout(
        Duration::from_secs(5),
        full.apply_raw_block(chain(100).remove(0)),
    )
    .await
    .expect("block application must not wait on a stalled peer")
    .unwrap();

    assert_eq!(applied.height, GENESIS_HEIGHT);
    assert_eq!(
        network.closed(),
        vec![(stalled, CloseConnectionReason::SendMsgTimeout)]
    );
    assert!(full.peers().is_empty());
}

#[tokio::test]
async fn failed_response_closes_the_connection() {
    let network = Arc::new(NullNetwork::with_behaviour(SendBehaviour::Fail));
    let full = full_node(&network);
    let connection = NullNetwork::connection(3);
    full.add_peer(connection.clone());

    full.on_get_blocks_request(
        GetBlocksRequest {
            from_block_height: GENESIS_HEIGHT,
            nonce: 1,
        },
        connection.clone(),
    )
    .await;

    assert_eq!(
        network.closed(),
        vec![(connection, CloseConnectionReason::SendMsgFailure)]
    );
    assert!(full.peers().is_empty());
}

#[tokio::test]
async fn full_node_tracks_peers_from_events() {
    let network = Arc::new(NullNetwork::new());
    let full = full_node(&network);
    full.handle_event(NetworkEvent::Connected(NullNetwork::connection(2)))
        .await;
    full.handle_event(NetworkEvent::Connected(NullNetwork::connection(1)))
        .await;
    let ids: Vec<u64> = full.peers().iter().map(|c| c.id.0).collect();
    assert_eq!(ids, vec![1, 2]);

    full.handle_event(NetworkEvent::Disconnected(NullNetwork::connection(2)))
        .await;
    assert_eq!(full.peers().len(), 1);
}

// ---------------------------------------------------------------------------
// Lite node
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lite_node_syncs_from_full_node() {
    let full_network = Arc::new(NullNetwork::new());
    let full = full_node(&full_network);
    full.apply_raw_blocks(chain(104)).await.unwrap();

    let network = Arc::new(NullNetwork::new());
    let lite = lite_node(&network);
    assert_eq!(lite.next_height(), GENESIS_HEIGHT);

    let connection = NullNetwork::connection(1);
    let sync = {
        let lite = Arc::clone(&lite);
        let connection = connection.clone();
        tokio::spawn(async move { lite.sync_from(&connection).await })
    };

    let request = next_request(&network, 0).await;
    assert_eq!(request.from_block_height, GENESIS_HEIGHT);
    assert!(lite.pending().resolve(response_from(&full, &request)));

    assert_eq!(sync.await.unwrap().unwrap(), 5);
    assert_eq!(lite.next_height(), 105);
    let state = lite.store().read();
    assert_eq!(state.tx_type(&TxId::new("transfer")), Some(TxType::TransferBsq));
    assert_eq!(
        state.blocks().iter().map(|b| &b.hash).collect::<Vec<_>>(),
        full.store().read().blocks().iter().map(|b| &b.hash).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn lite_node_applies_connecting_broadcast() {
    let network = Arc::new(NullNetwork::new());
    let lite = lite_node(&network);
    let connection = NullNetwork::connection(1);
    let blocks = chain(101);

    for block in blocks {
        lite.on_new_block(&connection, NewBlockBroadcastMessage { block })
            .await
            .unwrap();
    }
    assert_eq!(lite.next_height(), 102);
    assert!(network.sent().is_empty());

    // already known
    lite.on_new_block(
        &connection,
        NewBlockBroadcastMessage {
            block: chain(101).remove(1),
        },
    )
    .await
    .unwrap();
    assert_eq!(lite.next_height(), 102);
}

#[tokio::test]
async fn lite_node_requests_missing_blocks_on_gap() {
    let full_network = Arc::new(NullNetwork::new());
    let full = full_node(&full_network);
    full.apply_raw_blocks(chain(103)).await.unwrap();

    let network = Arc::new(NullNetwork::new());
    let lite = lite_node(&network);
    let connection = NullNetwork::connection(1);

    let gap = {
        let lite = Arc::clone(&lite);
        let connection = connection.clone();
        tokio::spawn(async move {
            lite.on_new_block(
                &connection,
                NewBlockBroadcastMessage {
                    block: raw_block(103, vec![]),
                },
            )
            .await
        })
    };

    let request = next_request(&network, 0).await;
    assert_eq!(request.from_block_height, GENESIS_HEIGHT);
    lite.pending().resolve(response_from(&full, &request));

    gap.await.unwrap().unwrap();
    assert_eq!(lite.next_height(), 104);
}

#[tokio::test]
async fn lite_node_event_loop_syncs_on_first_connection() {
    let full_network = Arc::new(NullNetwork::new());
    let full = full_node(&full_network);
    full.apply_raw_blocks(chain(102)).await.unwrap();

    let network = Arc::new(NullNetwork::new());
    let lite = lite_node(&network);
    let shutdown = ShutdownController::new();
    let (events_tx, events_rx) = mpsc::channel(16);
    let running = tokio::spawn(Arc::clone(&lite).run(events_rx, shutdown.subscribe()));

    let connection = NullNetwork::connection(1);
    events_tx
        .send(NetworkEvent::Connected(connection.clone()))
        .await
        .unwrap();
    let request = next_request(&network, 0).await;
    events_tx
        .send(NetworkEvent::Message {
            connection: connection.clone(),
            message: NetworkEnvelope::GetBlocksResponse(response_from(&full, &request)),
        })
        .await
        .unwrap();

    for _ in 0..200 {
        if lite.next_height() == 103 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(lite.next_height(), 103);
    assert_eq!(lite.full_node(), Some(connection));

    shutdown.shutdown();
    running.await.unwrap();
}

#[tokio::test]
async fn hanging_full_node_times_out_the_sync() {
    let network = Arc::new(NullNetwork::with_behaviour(SendBehaviour::Hang));
    let lite = lite_node(&network);
    let result = tokio::time::timeout(
        Duration::from_millis(200),
        lite.sync_from(&NullNetwork::connection(1)),
    )
    .await;
    // The request timeout is two minutes; the sync must still be waiting.
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Replay files
// ---------------------------------------------------------------------------

#[test]
fn replay_file_round_trips_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blocks.json");
    let blocks = chain(103);
    save_raw_blocks(&path, &blocks).unwrap();
    assert_eq!(load_raw_blocks(&path).unwrap(), blocks);
}

#[test]
fn malformed_replay_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blocks.json");
    std::fs::write(&path, "{ not blocks").unwrap();
    assert!(matches!(load_raw_blocks(&path), Err(NodeError::Replay(_))));
}
