//! End-to-end tests for the map-point index: block replay, ownership
//! transfers, and reorg rewind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use orin_mappoint_index::index::{MapPointIndex, UndoProvider};
use orin_mappoint_index::payload;
use orin_mappoint_index::runtime::{BlockSource, IndexRuntime};
use orin_types::{
    Address, Amount, Block, BlockIndexEntry, BlockUndo, Hash256, OutPoint, Script, Transaction,
    TxIn, TxOut, TxUndo,
};

fn addr(b: u8) -> Address {
    Address::from_key_hash(&[b; 20])
}

fn p2pkh(owner: u8) -> Script {
    Script::pay_to_address(&addr(owner)).unwrap()
}

/// A creation transaction: map-point payload plus a spendable output to the
/// owner. `salt` makes the txid unique.
fn creation_tx(owner: u8, lat: i64, lon: i64, salt: u64) -> Transaction {
    Transaction::new(
        vec![TxIn::new(OutPoint::new(Hash256::from_low_u64(salt), 0))],
        vec![
            TxOut::new(
                Amount::ZERO,
                Script::op_return(payload::build_payload(lat, lon).as_bytes()),
            ),
            TxOut::new(Amount::from_coins(1), p2pkh(owner)),
        ],
    )
}

/// A transfer transaction: transfer payload plus a spendable output to the
/// new owner. The undo entry must prove the spender owned the point.
fn transfer_tx(origin: Hash256, new_owner: u8, salt: u64) -> Transaction {
    Transaction::new(
        vec![TxIn::new(OutPoint::new(Hash256::from_low_u64(salt), 0))],
        vec![
            TxOut::new(
                Amount::ZERO,
                Script::op_return(payload::build_transfer_payload(&origin).as_bytes()),
            ),
            TxOut::new(Amount::from_coins(1), p2pkh(new_owner)),
        ],
    )
}

fn spent_by(owner: u8) -> TxUndo {
    TxUndo {
        spent_outputs: vec![TxOut::new(Amount::from_coins(1), p2pkh(owner))],
    }
}

/// In-memory chain serving blocks and undo data to the index.
#[derive(Default)]
struct TestChain {
    blocks: Mutex<Vec<(Block, BlockIndexEntry)>>,
    undos: Mutex<HashMap<Hash256, BlockUndo>>,
}

impl TestChain {
    /// Append a block of (tx, undo) pairs; a coinbase is prepended.
    fn push_block(&self, txs: Vec<(Transaction, TxUndo)>) -> BlockIndexEntry {
        let mut blocks = self.blocks.lock().unwrap();
        let height = blocks.len() as u32;
        let hash = Hash256::from_low_u64(0xB10C_0000 + height as u64);
        let prev_hash = blocks
            .last()
            .map(|(_, e)| e.hash)
            .unwrap_or(Hash256::ZERO);

        let coinbase = Transaction::new(
            vec![TxIn::new(OutPoint::NULL)],
            vec![TxOut::new(Amount::from_coins(50), p2pkh(200))],
        );
        let mut transactions = vec![coinbase];
        let mut tx_undos = Vec::new();
        for (tx, undo) in txs {
            transactions.push(tx);
            tx_undos.push(undo);
        }

        let block = Block {
            hash,
            prev_hash,
            time: 1_700_000_000 + height as u64,
            transactions,
        };
        let entry = BlockIndexEntry {
            hash,
            height,
            time: block.time,
        };
        self.undos.lock().unwrap().insert(hash, BlockUndo { tx_undos });
        blocks.push((block, entry));
        entry
    }

    fn entry(&self, height: u32) -> BlockIndexEntry {
        self.blocks.lock().unwrap()[height as usize].1
    }

    fn block(&self, height: u32) -> Block {
        self.blocks.lock().unwrap()[height as usize].0.clone()
    }
}

impl UndoProvider for TestChain {
    fn block_undo(&self, block_hash: &Hash256) -> Option<BlockUndo> {
        self.undos.lock().unwrap().get(block_hash).cloned()
    }
}

impl BlockSource for TestChain {
    fn tip(&self) -> Option<BlockIndexEntry> {
        self.blocks.lock().unwrap().last().map(|(_, e)| *e)
    }

    fn entry_at_height(&self, height: u32) -> Option<BlockIndexEntry> {
        self.blocks.lock().unwrap().get(height as usize).map(|(_, e)| *e)
    }

    fn block_at_height(&self, height: u32) -> Option<Block> {
        self.blocks
            .lock()
            .unwrap()
            .get(height as usize)
            .map(|(b, _)| b.clone())
    }
}

fn open_index() -> (tempfile::TempDir, MapPointIndex) {
    let dir = tempfile::tempdir().unwrap();
    let index = MapPointIndex::open(dir.path(), 10 * 1024 * 1024).unwrap();
    (dir, index)
}

fn replay(index: &MapPointIndex, chain: &TestChain, heights: std::ops::RangeInclusive<u32>) {
    for h in heights {
        assert!(index.write_block(&chain.block(h), &chain.entry(h), chain));
    }
}

/// Snapshot of the logical index state, for replay-equivalence checks.
fn state_of(index: &MapPointIndex) -> Vec<(Hash256, u32, Address, Address, Vec<Hash256>)> {
    let mut points = index.points_in_height_range(0, u32::MAX).unwrap();
    points.sort_by_key(|p| p.origin_txid);
    points
        .into_iter()
        .map(|p| {
            let transfers = index
                .get_transfers(&p.origin_txid)
                .unwrap()
                .into_iter()
                .map(|t| t.transfer_txid)
                .collect();
            (p.origin_txid, p.height, p.origin_owner, p.current_owner, transfers)
        })
        .collect()
}

#[test]
fn creation_is_indexed_with_owner() {
    let (_dir, index) = open_index();
    let chain = TestChain::default();
    chain.push_block(vec![]);
    let tx = creation_tx(1, 55_751_244, 37_618_423, 100);
    let txid = tx.txid();
    chain.push_block(vec![(tx, spent_by(1))]);
    replay(&index, &chain, 0..=1);

    let info = index.get_point(&txid).unwrap().unwrap();
    assert_eq!(info.height, 1);
    assert_eq!(info.origin_owner, addr(1));
    assert_eq!(info.current_owner, addr(1));
    assert_eq!(info.encoded_lat, 55_751_244);
    assert_eq!(info.encoded_lon, 37_618_423);

    let owned = index.points_for_owner(&[addr(1)], 0, u32::MAX).unwrap();
    assert_eq!(owned.len(), 1);
}

#[test]
fn coinbase_cannot_create_a_point() {
    let (_dir, index) = open_index();
    let chain = TestChain::default();
    // A coinbase carrying a valid payload is prepended automatically; add
    // the payload to the coinbase by constructing the block manually is not
    // possible through push_block, so craft a coinbase-shaped tx instead.
    let rogue = Transaction::new(
        vec![TxIn::new(OutPoint::NULL)],
        vec![
            TxOut::new(
                Amount::ZERO,
                Script::op_return(payload::build_payload(1, 2).as_bytes()),
            ),
            TxOut::new(Amount::from_coins(1), p2pkh(1)),
        ],
    );
    let txid = rogue.txid();
    chain.push_block(vec![(rogue, TxUndo::default())]);
    replay(&index, &chain, 0..=0);
    assert!(index.get_point(&txid).unwrap().is_none());
}

#[test]
fn transfer_requires_owner_input() {
    let (_dir, index) = open_index();
    let chain = TestChain::default();
    chain.push_block(vec![]);
    let creation = creation_tx(1, 5, 6, 100);
    let origin = creation.txid();
    chain.push_block(vec![(creation, spent_by(1))]);

    // Spender proves ownership of addr(2)'s coin, not the point owner's.
    let theft = transfer_tx(origin, 3, 101);
    chain.push_block(vec![(theft, spent_by(2))]);
    replay(&index, &chain, 0..=2);

    let info = index.get_point(&origin).unwrap().unwrap();
    assert_eq!(info.current_owner, addr(1));
    assert!(info.transfers.is_empty());
}

#[test]
fn transfer_to_same_owner_is_ignored() {
    let (_dir, index) = open_index();
    let chain = TestChain::default();
    chain.push_block(vec![]);
    let creation = creation_tx(1, 5, 6, 100);
    let origin = creation.txid();
    chain.push_block(vec![(creation, spent_by(1))]);
    chain.push_block(vec![(transfer_tx(origin, 1, 101), spent_by(1))]);
    replay(&index, &chain, 0..=2);

    let info = index.get_point(&origin).unwrap().unwrap();
    assert_eq!(info.current_owner, addr(1));
    assert!(info.transfers.is_empty());
}

#[test]
fn transfer_updates_owner_and_history() {
    let (_dir, index) = open_index();
    let chain = TestChain::default();
    chain.push_block(vec![]);
    let creation = creation_tx(1, 5, 6, 100);
    let origin = creation.txid();
    chain.push_block(vec![(creation, spent_by(1))]);
    let transfer = transfer_tx(origin, 2, 101);
    let transfer_txid = transfer.txid();
    chain.push_block(vec![(transfer, spent_by(1))]);
    replay(&index, &chain, 0..=2);

    let info = index.get_point(&origin).unwrap().unwrap();
    assert_eq!(info.origin_owner, addr(1));
    assert_eq!(info.current_owner, addr(2));
    assert_eq!(info.transfers.len(), 1);
    assert_eq!(info.transfers[0].transfer_txid, transfer_txid);
    assert_eq!(info.transfers[0].new_owner, addr(2));

    // Owner index moved with the transfer.
    assert!(index.points_for_owner(&[addr(1)], 0, u32::MAX).unwrap().is_empty());
    assert_eq!(index.points_for_owner(&[addr(2)], 0, u32::MAX).unwrap().len(), 1);
}

#[test]
fn same_block_creation_and_transfer() {
    let (_dir, index) = open_index();
    let chain = TestChain::default();
    chain.push_block(vec![]);
    let creation = creation_tx(1, 5, 6, 100);
    let origin = creation.txid();
    let transfer = transfer_tx(origin, 2, 101);
    chain.push_block(vec![(creation, spent_by(1)), (transfer, spent_by(1))]);
    replay(&index, &chain, 0..=1);

    let info = index.get_point(&origin).unwrap().unwrap();
    assert_eq!(info.current_owner, addr(2));
    assert_eq!(info.transfers.len(), 1);
}

#[test]
fn replaying_an_indexed_block_is_a_no_op() {
    let (_dir, index) = open_index();
    let chain = TestChain::default();
    chain.push_block(vec![]);
    let creation = creation_tx(1, 5, 6, 100);
    chain.push_block(vec![(creation, spent_by(1))]);
    replay(&index, &chain, 0..=1);
    let before = state_of(&index);

    assert!(index.write_block(&chain.block(1), &chain.entry(1), &chain));
    assert_eq!(state_of(&index), before);
}

#[test]
fn non_contiguous_block_is_rejected() {
    let (_dir, index) = open_index();
    let chain = TestChain::default();
    chain.push_block(vec![]);
    chain.push_block(vec![]);
    chain.push_block(vec![]);
    replay(&index, &chain, 0..=0);

    assert!(!index.write_block(&chain.block(2), &chain.entry(2), &chain));
}

/// Scenario: three transfers, rewind two blocks. The point survives with
/// the owner it had after the first transfer and two transfer records gone.
#[test]
fn rewind_rolls_back_transfer_chain() {
    let (_dir, index) = open_index();
    let chain = TestChain::default();
    chain.push_block(vec![]);
    let creation = creation_tx(1, 5, 6, 100);
    let origin = creation.txid();
    chain.push_block(vec![(creation, spent_by(1))]);
    chain.push_block(vec![(transfer_tx(origin, 2, 101), spent_by(1))]);
    chain.push_block(vec![(transfer_tx(origin, 3, 102), spent_by(2))]);
    chain.push_block(vec![(transfer_tx(origin, 4, 103), spent_by(3))]);
    replay(&index, &chain, 0..=4);

    assert_eq!(index.get_point(&origin).unwrap().unwrap().current_owner, addr(4));

    assert!(index.rewind(&chain.entry(4), &chain.entry(2)));

    let info = index.get_point(&origin).unwrap().unwrap();
    assert_eq!(info.current_owner, addr(2));
    assert_eq!(info.transfers.len(), 1);
    assert_eq!(
        index.points_for_owner(&[addr(2)], 0, u32::MAX).unwrap().len(),
        1
    );
    assert!(index.points_for_owner(&[addr(4)], 0, u32::MAX).unwrap().is_empty());
}

/// Fully rewinding every transfer restores the origin owner on every
/// surviving point.
#[test]
fn full_rewind_restores_origin_owner() {
    let (_dir, index) = open_index();
    let chain = TestChain::default();
    chain.push_block(vec![]);
    let creation = creation_tx(1, 5, 6, 100);
    let origin = creation.txid();
    chain.push_block(vec![(creation, spent_by(1))]);
    chain.push_block(vec![(transfer_tx(origin, 2, 101), spent_by(1))]);
    chain.push_block(vec![(transfer_tx(origin, 3, 102), spent_by(2))]);
    replay(&index, &chain, 0..=3);

    assert!(index.rewind(&chain.entry(3), &chain.entry(1)));

    let info = index.get_point(&origin).unwrap().unwrap();
    assert_eq!(info.current_owner, info.origin_owner);
    assert!(info.transfers.is_empty());
}

/// Rewinding past a point's creation removes the point and all its
/// transfers.
#[test]
fn rewind_erases_points_and_their_transfers() {
    let (_dir, index) = open_index();
    let chain = TestChain::default();
    chain.push_block(vec![]);
    let creation = creation_tx(1, 5, 6, 100);
    let origin = creation.txid();
    chain.push_block(vec![(creation, spent_by(1))]);
    chain.push_block(vec![(transfer_tx(origin, 2, 101), spent_by(1))]);
    replay(&index, &chain, 0..=2);

    assert!(index.rewind(&chain.entry(2), &chain.entry(0)));

    assert!(index.get_point(&origin).unwrap().is_none());
    assert!(index.get_transfers(&origin).unwrap().is_empty());
    assert!(index.points_in_height_range(0, u32::MAX).unwrap().is_empty());
}

/// Replay-equivalence: indexing blocks then rewinding to height h produces
/// the same logical state as indexing only blocks up to h from scratch.
#[test]
fn rewind_matches_fresh_replay() {
    let chain = TestChain::default();
    chain.push_block(vec![]);
    let c1 = creation_tx(1, 5, 6, 100);
    let o1 = c1.txid();
    chain.push_block(vec![(c1, spent_by(1))]);
    let c2 = creation_tx(2, 7, 8, 110);
    let o2 = c2.txid();
    chain.push_block(vec![(c2, spent_by(2)), (transfer_tx(o1, 3, 111), spent_by(1))]);
    chain.push_block(vec![(transfer_tx(o2, 4, 120), spent_by(2))]);
    chain.push_block(vec![(transfer_tx(o1, 5, 130), spent_by(3))]);

    let (_dir_a, full) = open_index();
    replay(&full, &chain, 0..=4);
    assert!(full.rewind(&chain.entry(4), &chain.entry(2)));

    let (_dir_b, fresh) = open_index();
    replay(&fresh, &chain, 0..=2);

    assert_eq!(state_of(&full), state_of(&fresh));
}

#[test]
fn runtime_syncs_and_rebuilds() {
    let (_dir, index) = open_index();
    let chain = Arc::new(TestChain::default());
    chain.push_block(vec![]);
    let creation = creation_tx(1, 5, 6, 100);
    let origin = creation.txid();
    chain.push_block(vec![(creation, spent_by(1))]);

    let source: Arc<dyn BlockSource> = chain.clone();
    let undo: Arc<dyn UndoProvider> = chain.clone();
    let runtime = IndexRuntime::new(Arc::new(index), source, undo);
    assert!(runtime.sync_to_tip());
    assert!(runtime.index().get_point(&origin).unwrap().is_some());

    // A second sync is a no-op; rebuild wipes and replays.
    assert!(runtime.sync_to_tip());
    assert!(runtime.rebuild());
    assert!(runtime.index().get_point(&origin).unwrap().is_some());
}
