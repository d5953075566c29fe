//! End-to-end scenarios driving both contracts through the chain.

use bundlr_bundlers::{BundlersConfig, Response as BundlersResponse};
use bundlr_simulation::{
    Call, Chain, ChainConfig, ChainQuery, ChainResponse, Deployments, MembershipWorkload,
    Receipt, TokenAction, TokenGenesis, TransactionLog, WorkloadConfig, World,
};
use bundlr_test_helpers::{addr, TEST_TICKER};
use bundlr_types::{Address, Amount, BlockCount, BlockHeight, EvidenceId, Url};
use bundlr_validators::{
    EpochConfig, Evidence, Outcome, Response as ValidatorsResponse, ValidatorsConfig, Vote,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing_test::traced_test;

const BALANCE: u128 = 1_000;

fn validator_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("v{i:02}")).collect()
}

fn config() -> ChainConfig {
    let deployments = Deployments {
        token: addr("token"),
        bundlers: addr("bundlers"),
        validators: addr("validators"),
    };

    let mut balances = BTreeMap::new();
    for name in ["alice", "bob", "mallory", "owner"] {
        balances.insert(addr(name), Amount(BALANCE));
    }
    for name in validator_names(16) {
        balances.insert(addr(&name), Amount(BALANCE));
    }
    let token = TokenGenesis {
        ticker: TEST_TICKER.to_string(),
        balances,
    };

    let bundlers = BundlersConfig::new(addr("owner"), addr("token"), Amount(1))
        .with_withdraw_delay(BlockCount(3))
        .with_validators_contract(addr("validators"));
    let validators =
        ValidatorsConfig::new(addr("bundler"), addr("bundlers"), addr("token"), Amount(10))
            .with_epoch(EpochConfig::default().with_duration(BlockCount(5)));

    ChainConfig::new(deployments, token, bundlers, validators)
}

fn approve(spender: &str) -> Call {
    Call::Token(TokenAction::Approve {
        spender: addr(spender),
        amount: Amount(BALANCE),
    })
}

fn bundlers(action: bundlr_bundlers::Action) -> Call {
    Call::Bundlers(action)
}

fn validators(action: bundlr_validators::Action) -> Call {
    Call::Validators(action)
}

fn join_validator(name: &str) -> Call {
    validators(bundlr_validators::Action::Join {
        stake: Amount(10),
        url: Url::parse(&format!("https://{name}.example")).unwrap(),
    })
}

fn evidence(id: &str, accused: &str) -> Evidence {
    Evidence {
        id: EvidenceId::from(id),
        size: 1_024,
        fee: "1500".to_string(),
        currency: "AR".to_string(),
        block: "120000".to_string(),
        validator: addr(accused),
        signature: "c2lnbmF0dXJl".to_string(),
    }
}

fn balance(world: &World, name: &str) -> Amount {
    bundlr_core::TokenLedger::balance_of(&world.ledger, &addr(name))
}

fn expect_ok(receipt: &Receipt) -> Option<ChainResponse> {
    match &receipt.result {
        Ok(response) => response.clone(),
        Err(error) => panic!("transaction {} rejected: {error}", receipt.id),
    }
}

fn expect_err(receipt: &Receipt) -> String {
    match &receipt.result {
        Ok(response) => panic!("transaction {} accepted: {response:?}", receipt.id),
        Err(error) => error.clone(),
    }
}

/// Approve and join `names` as validators in a single block.
fn join_validators(chain: &mut Chain, names: &[String]) {
    for name in names {
        chain.submit(addr(name), approve("validators"));
        chain.submit(addr(name), join_validator(name));
    }
    for receipt in chain.mine().unwrap() {
        expect_ok(receipt);
    }
}

fn total_stake<P: Clone>(members: &bundlr_membership::MembershipEngine<P>) -> Amount {
    members.iter().map(|(_, member)| member.stake).sum()
}

// ═══════════════════════════════════════════════════════════════════════════
// Bundler pool
// ═══════════════════════════════════════════════════════════════════════════

#[traced_test]
#[test]
fn test_bundler_join_needs_allowance() {
    let mut chain = Chain::new(config()).unwrap();

    let rejected = chain
        .execute(addr("alice"), bundlers(bundlr_bundlers::Action::Join))
        .unwrap();
    assert!(expect_err(&rejected).contains("Could not lock stake"));
    assert!(chain.world().bundlers.bundlers().is_empty());

    chain.execute(addr("alice"), approve("bundlers")).unwrap();
    let joined = chain
        .execute(addr("alice"), bundlers(bundlr_bundlers::Action::Join))
        .unwrap();
    assert_eq!(
        expect_ok(&joined),
        Some(ChainResponse::Bundlers(BundlersResponse::Stake(Amount(1))))
    );

    let listed = chain
        .query(
            &ChainQuery::Bundlers(bundlr_bundlers::Query::Bundlers),
            None,
        )
        .unwrap();
    let listed = match listed {
        ChainResponse::Bundlers(BundlersResponse::Bundlers(listed)) => listed,
        other => panic!("unexpected response {other:?}"),
    };
    assert_eq!(listed.get(&addr("alice")), Some(&None));
    assert_eq!(balance(chain.world(), "bundlers"), Amount(1));
    assert_eq!(balance(chain.world(), "alice"), Amount(BALANCE - 1));

    let again = chain
        .execute(addr("alice"), bundlers(bundlr_bundlers::Action::Join))
        .unwrap();
    assert!(expect_err(&again).contains("already a member"));
}

#[traced_test]
#[test]
fn test_bundler_withdraw_waits_for_delay() {
    let mut chain = Chain::new(config()).unwrap();
    chain.execute(addr("alice"), approve("bundlers")).unwrap();
    chain
        .execute(addr("alice"), bundlers(bundlr_bundlers::Action::Join))
        .unwrap();

    // Leave at height 3, delay 3.
    let left = chain
        .execute(addr("alice"), bundlers(bundlr_bundlers::Action::Leave))
        .unwrap();
    assert_eq!(
        expect_ok(&left),
        Some(ChainResponse::Bundlers(BundlersResponse::ExitHeight(BlockHeight(6))))
    );

    let early = chain
        .execute(addr("alice"), bundlers(bundlr_bundlers::Action::Withdraw))
        .unwrap();
    assert_eq!(early.height, BlockHeight(4));
    assert!(expect_err(&early).contains("may withdraw at Block(6)"));

    chain.mine_until(BlockHeight(5)).unwrap();
    let withdrawn = chain
        .execute(addr("alice"), bundlers(bundlr_bundlers::Action::Withdraw))
        .unwrap();
    assert_eq!(withdrawn.height, BlockHeight(6));
    expect_ok(&withdrawn);

    assert!(chain.world().bundlers.bundlers().is_empty());
    assert_eq!(balance(chain.world(), "alice"), Amount(BALANCE));
    assert_eq!(balance(chain.world(), "bundlers"), Amount::ZERO);
}

#[traced_test]
#[test]
fn test_historical_queries_see_past_membership() {
    let mut chain = Chain::new(config()).unwrap();
    chain.execute(addr("alice"), approve("bundlers")).unwrap();
    chain
        .execute(addr("alice"), bundlers(bundlr_bundlers::Action::Join))
        .unwrap();
    chain
        .execute(addr("alice"), bundlers(bundlr_bundlers::Action::Leave))
        .unwrap();

    let at = |height: u64| {
        chain
            .world_at(BlockHeight(height))
            .unwrap()
            .bundlers
            .bundlers()
            .get(&addr("alice"))
            .cloned()
    };
    assert_eq!(at(1), None);
    assert_eq!(at(2), Some(None));
    assert_eq!(at(3), Some(Some(BlockHeight(6))));
}

// ═══════════════════════════════════════════════════════════════════════════
// Validator committee
// ═══════════════════════════════════════════════════════════════════════════

#[traced_test]
#[test]
fn test_sixteen_validators_over_two_epochs() {
    let mut chain = Chain::new(config()).unwrap();
    let names = validator_names(16);
    join_validators(&mut chain, &names);
    assert_eq!(chain.world().validators.members().active_count(), 16);

    chain.mine_until(BlockHeight(4)).unwrap();
    let first = chain
        .execute(addr("alice"), validators(bundlr_validators::Action::UpdateEpoch))
        .unwrap();
    let Some(ChainResponse::Validators(ValidatorsResponse::Epoch(epoch))) = expect_ok(&first)
    else {
        panic!("expected an epoch");
    };
    assert_eq!(epoch.seq, 1);
    assert_eq!(epoch.height, BlockHeight(5));
    assert_eq!(epoch.anchor, chain.anchor());

    let nominated = chain.world().validators.nominated_validators();
    assert_eq!(nominated.len(), 10);
    let mut sorted = nominated.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted, nominated);
    for member in &nominated {
        assert!(chain.world().validators.members().is_active(member));
    }

    let too_soon = chain
        .execute(addr("alice"), validators(bundlr_validators::Action::UpdateEpoch))
        .unwrap();
    assert!(expect_err(&too_soon).contains("Next epoch starts at Block(10)"));

    chain.mine_until(BlockHeight(9)).unwrap();
    let second = chain
        .execute(addr("bob"), validators(bundlr_validators::Action::UpdateEpoch))
        .unwrap();
    expect_ok(&second);
    assert_eq!(chain.world().validators.epoch().seq, 2);
    assert_eq!(chain.world().validators.nominated_validators().len(), 10);
}

#[traced_test]
#[test]
fn test_small_committee_nominates_everyone() {
    let mut chain = Chain::new(config()).unwrap();
    let names = validator_names(4);
    join_validators(&mut chain, &names);
    chain.mine_until(BlockHeight(4)).unwrap();
    chain
        .execute(addr("alice"), validators(bundlr_validators::Action::UpdateEpoch))
        .unwrap();

    let expected: Vec<Address> = names.iter().map(|n| addr(n)).collect();
    assert_eq!(chain.world().validators.nominated_validators(), expected);
}

#[traced_test]
#[test]
fn test_slash_flows_from_committee_to_bundler_pool() {
    let mut chain = Chain::new(config()).unwrap();
    chain.execute(addr("mallory"), approve("bundlers")).unwrap();
    chain
        .execute(addr("mallory"), bundlers(bundlr_bundlers::Action::Join))
        .unwrap();
    join_validators(&mut chain, &validator_names(3));

    let proposed = chain
        .execute(
            addr("v00"),
            validators(bundlr_validators::Action::ProposeSlash {
                evidence: evidence("tx-lost", "mallory"),
            }),
        )
        .unwrap();
    expect_ok(&proposed);

    let duplicate = chain
        .execute(
            addr("v01"),
            validators(bundlr_validators::Action::ProposeSlash {
                evidence: evidence("tx-lost", "mallory"),
            }),
        )
        .unwrap();
    assert!(expect_err(&duplicate).contains("already proposed"));

    for voter in ["v00", "v01"] {
        let receipt = chain
            .execute(
                addr(voter),
                validators(bundlr_validators::Action::VoteSlash {
                    id: EvidenceId::from("tx-lost"),
                    vote: Vote::For,
                }),
            )
            .unwrap();
        expect_ok(&receipt);
    }

    let proposal = chain
        .world()
        .validators
        .proposal(&EvidenceId::from("tx-lost"))
        .cloned()
        .unwrap();
    assert_eq!(proposal.outcome(), Some(Outcome::Slashed));
    let closed_at = proposal.closed_at().unwrap();

    let late = chain
        .execute(
            addr("v02"),
            validators(bundlr_validators::Action::VoteSlash {
                id: EvidenceId::from("tx-lost"),
                vote: Vote::Against,
            }),
        )
        .unwrap();
    assert!(expect_err(&late).contains("is closed"));

    let verdicts = chain.world().validators.slash_verdicts();
    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].accused, addr("mallory"));
    assert_eq!(verdicts[0].height, closed_at);

    // Only the pool's admission list may sync.
    let outsider = chain
        .execute(addr("bob"), bundlers(bundlr_bundlers::Action::SyncSlash))
        .unwrap();
    assert!(expect_err(&outsider).contains("not allowed"));

    let synced = chain
        .execute(addr("owner"), bundlers(bundlr_bundlers::Action::SyncSlash))
        .unwrap();
    let Some(ChainResponse::Bundlers(BundlersResponse::Slashed(forfeitures))) =
        expect_ok(&synced)
    else {
        panic!("expected forfeitures");
    };
    assert_eq!(forfeitures.len(), 1);
    assert_eq!(forfeitures[0].address, addr("mallory"));
    assert_eq!(forfeitures[0].amount, Amount(1));
    assert!(forfeitures[0].removed);

    let world = chain.world();
    assert!(!world.bundlers.bundlers().contains_key(&addr("mallory")));
    assert_eq!(world.bundlers.members().forfeited(), Amount(1));
    assert_eq!(balance(world, "mallory"), Amount(BALANCE - 1));
    assert_eq!(balance(world, "bundlers"), Amount(1));

    let resync = chain
        .execute(addr("owner"), bundlers(bundlr_bundlers::Action::SyncSlash))
        .unwrap();
    assert_eq!(
        expect_ok(&resync),
        Some(ChainResponse::Bundlers(BundlersResponse::Slashed(Vec::new())))
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Determinism and invariants
// ═══════════════════════════════════════════════════════════════════════════

fn simulate(seed: u64, blocks: u64) -> Chain {
    let config = config();
    let accounts: Vec<Address> = ["alice", "bob", "mallory"]
        .into_iter()
        .map(String::from)
        .chain(validator_names(12))
        .map(|name| addr(&name))
        .collect();
    let mut workload = MembershipWorkload::new(
        WorkloadConfig::new(accounts, addr("owner"))
            .with_batch_size(12)
            .with_slash_ratio(0.3),
        config.deployments.clone(),
    );

    let mut chain = Chain::new(config).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for _ in 0..blocks {
        for tx in workload.generate_batch(&mut rng) {
            chain.submit_transaction(tx);
        }
        chain.mine().unwrap();
    }
    chain
}

#[traced_test]
#[test]
fn test_replay_reproduces_state() {
    let chain = simulate(42, 40);
    let log = chain.log();

    // Through JSON, as the replay binary reads it.
    let encoded = serde_json::to_string(&log).unwrap();
    let decoded: TransactionLog = serde_json::from_str(&encoded).unwrap();
    assert_eq!(log, decoded);

    let replayed = Chain::replay(config(), &decoded).unwrap();
    assert_eq!(replayed.height(), chain.height());
    assert_eq!(replayed.anchor(), chain.anchor());
    assert_eq!(replayed.world(), chain.world());
    assert_eq!(replayed.receipts(), chain.receipts());
    assert_eq!(
        replayed.world_at(BlockHeight(20)).unwrap(),
        chain.world_at(BlockHeight(20)).unwrap()
    );
}

#[traced_test]
#[test]
fn test_different_seeds_diverge() {
    let a = simulate(1, 10);
    let b = simulate(2, 10);
    assert_ne!(a.anchor(), b.anchor());
}

#[traced_test]
#[test]
fn test_workload_preserves_token_invariants() {
    let chain = simulate(7, 60);
    let genesis_supply = chain.world_at(BlockHeight::GENESIS).unwrap().ledger.total_supply();
    assert!(chain.receipts().iter().any(|r| r.is_success()));

    for height in 0..=chain.height().0 {
        let world = chain.world_at(BlockHeight(height)).unwrap();
        assert_eq!(world.ledger.total_supply(), genesis_supply);

        // Forfeited stake is retained by default, so custody covers it.
        let pool = world.bundlers.members();
        assert_eq!(
            balance(world, "bundlers"),
            total_stake(pool).saturating_add(pool.forfeited())
        );
        let committee = world.validators.members();
        assert_eq!(
            balance(world, "validators"),
            total_stake(committee).saturating_add(committee.forfeited())
        );

        let nominated = world.validators.nominated_validators();
        assert!(nominated.len() <= 10);
        assert!(nominated.iter().all(|v| committee.is_active(v)));
    }
}

#[test]
fn test_genesis_toml_starts_chain() {
    let genesis = r#"
        [deployments]
        token = "token"
        bundlers = "bundlers"
        validators = "validators"

        [token]
        ticker = "BND"
        balances = { alice = "5" }

        [bundlers]
        owner = "owner"
        validatorsContract = "validators"
        pool = { token = "token", stake = { flat = "1" } }

        [validators]
        bundler = "bundler"
        bundlersContract = "bundlers"
        pool = { token = "token", stake = { minimum = "10" } }
    "#;
    let chain = Chain::new(ChainConfig::from_toml(genesis).unwrap()).unwrap();
    assert_eq!(balance(chain.world(), "alice"), Amount(5));
    assert_eq!(
        chain
            .query(
                &ChainQuery::Validators(bundlr_validators::Query::EpochDuration),
                None
            )
            .unwrap(),
        ChainResponse::Validators(ValidatorsResponse::Duration(BlockCount(100)))
    );
}
