use ledger_core::{
    chain::{verify_chain, Ledger},
    constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF, REWARD_AMOUNT, REWARD_SENDER},
    pow, Transaction,
};
use rand::Rng;
use std::sync::atomic::AtomicBool;

#[test]
fn stage_then_seal_scenario() {
    let mut ledger = Ledger::new();
    let genesis_hash = ledger.last_block().hash();

    ledger.stage_transaction("A", "B", 10);
    let block = ledger.seal_block(42, None).clone();

    assert_eq!(block.index, 2);
    assert_eq!(block.transactions, vec![Transaction::new("A", "B", 10)]);
    assert_eq!(block.previous_hash, genesis_hash);
    assert!(ledger.pending().is_empty());
    assert_eq!(ledger.chain().len(), 2);
}

#[test]
fn every_block_links_to_its_predecessor() {
    let mut rng = rand::thread_rng();
    let mut ledger = Ledger::new();
    let rounds = 50;

    for round in 0..rounds {
        for _ in 0..rng.gen_range(0..4) {
            ledger.stage_transaction(
                format!("user-{}", rng.gen_range(0..10)),
                format!("user-{}", rng.gen_range(0..10)),
                rng.gen_range(-100..100),
            );
        }
        ledger.seal_block(round, None);
    }

    let chain = ledger.chain();
    assert_eq!(chain.len(), rounds as usize + 1);
    assert_eq!(chain[0].previous_hash, GENESIS_PREVIOUS_HASH);
    assert_eq!(chain[0].proof, GENESIS_PROOF);
    for k in 1..chain.len() {
        assert_eq!(chain[k].index, k as u64 + 1);
        assert_eq!(chain[k].previous_hash, chain[k - 1].hash());
    }
    assert!(verify_chain(chain).is_ok());
}

#[test]
fn tampering_is_detected() {
    let mut ledger = Ledger::new();
    ledger.stage_transaction("A", "B", 10);
    ledger.seal_block(1, None);
    ledger.seal_block(2, None);

    let mut blocks = ledger.chain().to_vec();
    blocks[1].transactions[0].amount = 1_000;
    assert!(verify_chain(&blocks).is_err());
}

#[test]
fn mining_round_credits_reward_to_next_block() {
    let mut ledger = Ledger::new();
    let cancel = AtomicBool::new(false);

    let block_string = ledger.last_block().canonical_string();
    let proof = pow::proof_of_work(&block_string, 2, &cancel).expect("proof");
    assert!(pow::valid_proof_with_difficulty(&block_string, proof, 2));

    let previous_hash = ledger.last_block().hash();
    let sealed = ledger.seal_block(proof, Some(previous_hash)).clone();
    ledger.stage_transaction(REWARD_SENDER, "miner", REWARD_AMOUNT);

    assert!(sealed.transactions.is_empty());
    assert_eq!(
        ledger.pending(),
        &[Transaction::new(REWARD_SENDER, "miner", REWARD_AMOUNT)]
    );

    let next = ledger.seal_block(0, None);
    assert_eq!(next.transactions.len(), 1);
    assert_eq!(next.transactions[0].recipient, "miner");
}
