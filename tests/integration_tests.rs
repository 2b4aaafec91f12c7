use escrow_engine::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};
use std::thread;

fn admin() -> AccountId {
    AccountId::new("root")
}

fn approver() -> AccountId {
    AccountId::new("ops")
}

/// Marketplace with a unique "gen-art" collection (piece #1 owned by
/// alice), a fungible "passes" collection (alice holds 20 of type 7),
/// native payments, and the given base fee rate.
fn market(fee_bps: u32) -> ListingLedger<InMemoryCustodian> {
    let mut custodian = InMemoryCustodian::new();
    custodian
        .register_collection(ContractId::new("gen-art"), AssetKind::Unique)
        .unwrap();
    custodian
        .register_collection(ContractId::new("passes"), AssetKind::FungibleById)
        .unwrap();
    custodian
        .mint_unique(&ContractId::new("gen-art"), 1, AccountId::new("alice"))
        .unwrap();
    custodian
        .mint_fungible(&ContractId::new("passes"), 7, AccountId::new("alice"), 20)
        .unwrap();

    let roles = RoleRegistry::with_admin(admin());
    let fees = FeeConfig::new(fee_bps, AccountId::new("treasury")).unwrap();
    let mut ledger = ListingLedger::new(custodian, roles, fees);

    ledger
        .add_tradeable_asset(&admin(), ContractId::new("gen-art"), AssetKind::Unique)
        .unwrap();
    ledger
        .add_tradeable_asset(&admin(), ContractId::new("passes"), AssetKind::FungibleById)
        .unwrap();
    ledger
        .add_payment_token(&admin(), TokenCode::native())
        .unwrap();
    ledger.grant_approver(&admin(), approver()).unwrap();
    ledger
}

/// Full lifecycle of a unique asset: list at 100 with a 1% fee, settle
/// with an exact payment, verify the split and final ownership.
#[test]
fn unique_sale_lifecycle() {
    let mut ledger = market(100);
    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    let art = ContractId::new("gen-art");
    let native = TokenCode::native();

    let id = ledger.list(&alice, &art, 1, 1, dec!(100), &native).unwrap();

    // Engine, not the seller, holds custody while active.
    assert_eq!(
        ledger.custodian().owner_of(&art, 1).unwrap(),
        *ledger.engine_account()
    );

    ledger.deposit(&native, &bob, dec!(100));
    let settlement = ledger.settle(&approver(), id, &bob, dec!(100)).unwrap();

    assert_eq!(settlement.total_due, dec!(100));
    assert_eq!(settlement.fee, dec!(1));
    assert_eq!(settlement.proceeds, dec!(99));

    assert_eq!(ledger.custodian().owner_of(&art, 1).unwrap(), bob);
    assert_eq!(ledger.vault().balance(&native, &alice), dec!(99));
    assert_eq!(
        ledger.vault().balance(&native, &AccountId::new("treasury")),
        dec!(1)
    );

    let listing = ledger.listing(id).unwrap();
    assert_eq!(listing.state(), ListingState::Settled);
    assert_eq!(listing.buyer().unwrap(), &bob);
}

/// Fungible sale: quantity 5 at unit price 10 with a 2.5% fee.
/// floor(50 * 250 / 10000) = 1, proceeds 49.
#[test]
fn fungible_sale_fee_floors() {
    let mut ledger = market(250);
    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    let passes = ContractId::new("passes");
    let native = TokenCode::native();

    let id = ledger.list(&alice, &passes, 7, 5, dec!(10), &native).unwrap();
    assert_eq!(
        ledger
            .custodian()
            .balance_of(&passes, 7, ledger.engine_account()),
        5
    );
    assert_eq!(ledger.custodian().balance_of(&passes, 7, &alice), 15);

    ledger.deposit(&native, &bob, dec!(50));
    let settlement = ledger.settle(&approver(), id, &bob, dec!(50)).unwrap();

    assert_eq!(settlement.fee, dec!(1));
    assert_eq!(settlement.proceeds, dec!(49));
    assert_eq!(ledger.custodian().balance_of(&passes, 7, &bob), 5);
    assert_eq!(
        ledger
            .custodian()
            .balance_of(&passes, 7, ledger.engine_account()),
        0
    );
}

/// Cancelling a settled listing fails with NotActive and changes nothing.
#[test]
fn cancel_after_settle_fails() {
    let mut ledger = market(100);
    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    let native = TokenCode::native();

    let id = ledger
        .list(&alice, &ContractId::new("gen-art"), 1, 1, dec!(100), &native)
        .unwrap();
    ledger.deposit(&native, &bob, dec!(100));
    ledger.settle(&approver(), id, &bob, dec!(100)).unwrap();

    let events_before = ledger.events().len();
    let result = ledger.cancel(&alice, id);
    assert_eq!(result, Err(MarketError::NotActive { id }));

    // Engine state unchanged: buyer still owns the piece, no new events.
    assert_eq!(
        ledger.custodian().owner_of(&ContractId::new("gen-art"), 1).unwrap(),
        bob
    );
    assert_eq!(ledger.events().len(), events_before);
}

/// Settling without the Approver role fails and moves nothing.
#[test]
fn settle_requires_approver_role() {
    let mut ledger = market(100);
    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    let native = TokenCode::native();

    let id = ledger
        .list(&alice, &ContractId::new("gen-art"), 1, 1, dec!(100), &native)
        .unwrap();
    ledger.deposit(&native, &bob, dec!(100));

    let result = ledger.settle(&AccountId::new("mallory"), id, &bob, dec!(100));
    assert!(matches!(result, Err(MarketError::PermissionDenied { .. })));

    assert!(ledger.listing(id).unwrap().is_active());
    assert_eq!(ledger.vault().balance(&native, &bob), dec!(100));
    assert_eq!(
        ledger.custodian().owner_of(&ContractId::new("gen-art"), 1).unwrap(),
        *ledger.engine_account()
    );
}

/// A rejected list consumes no listing id.
#[test]
fn rejected_list_consumes_no_id() {
    let mut ledger = market(100);
    let alice = AccountId::new("alice");

    let result = ledger.list(
        &alice,
        &ContractId::new("gen-art"),
        1,
        1,
        dec!(100),
        &TokenCode::new("SHADY"),
    );
    assert!(matches!(result, Err(MarketError::NotAllowlisted { .. })));
    assert_eq!(ledger.next_listing_id(), 0);

    // The next successful list gets id 0.
    let id = ledger
        .list(
            &alice,
            &ContractId::new("gen-art"),
            1,
            1,
            dec!(100),
            &TokenCode::native(),
        )
        .unwrap();
    assert_eq!(id, 0);
}

/// Two threads race to settle the same listing: exactly one succeeds,
/// the other observes NotActive, and custody moves exactly once.
#[test]
fn concurrent_settles_resolve_to_one_winner() {
    let mut ledger = market(100);
    let alice = AccountId::new("alice");
    let native = TokenCode::native();

    let id = ledger
        .list(&alice, &ContractId::new("gen-art"), 1, 1, dec!(100), &native)
        .unwrap();
    ledger.deposit(&native, &AccountId::new("buyer-1"), dec!(100));
    ledger.deposit(&native, &AccountId::new("buyer-2"), dec!(100));

    let shared = Arc::new(Mutex::new(ledger));
    let mut handles = Vec::new();
    for buyer in ["buyer-1", "buyer-2"] {
        let shared = Arc::clone(&shared);
        handles.push(thread::spawn(move || {
            let mut ledger = shared.lock().unwrap();
            ledger.settle(&approver(), id, &AccountId::new(buyer), dec!(100))
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(MarketError::NotActive { .. }))));

    let ledger = shared.lock().unwrap();
    let winner = ledger.listing(id).unwrap().buyer().unwrap().clone();
    assert_eq!(
        ledger.custodian().owner_of(&ContractId::new("gen-art"), 1).unwrap(),
        winner
    );
    // Exactly one payment was pulled: one buyer is empty, one is whole.
    let b1 = ledger.vault().balance(&native, &AccountId::new("buyer-1"));
    let b2 = ledger.vault().balance(&native, &AccountId::new("buyer-2"));
    assert_eq!(b1 + b2, dec!(100));
}

/// Cancel and settle race the same way: one winner, one NotActive.
#[test]
fn concurrent_cancel_and_settle_resolve_to_one_winner() {
    let mut ledger = market(100);
    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    let native = TokenCode::native();

    let id = ledger
        .list(&alice, &ContractId::new("gen-art"), 1, 1, dec!(100), &native)
        .unwrap();
    ledger.deposit(&native, &bob, dec!(100));

    let shared = Arc::new(Mutex::new(ledger));
    let canceller = {
        let shared = Arc::clone(&shared);
        let alice = alice.clone();
        thread::spawn(move || shared.lock().unwrap().cancel(&alice, id))
    };
    let settler = {
        let shared = Arc::clone(&shared);
        thread::spawn(move || {
            shared
                .lock()
                .unwrap()
                .settle(&approver(), id, &AccountId::new("bob"), dec!(100))
                .map(|_| ())
        })
    };

    let outcomes = [canceller.join().unwrap(), settler.join().unwrap()];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(MarketError::NotActive { .. }))));

    let ledger = shared.lock().unwrap();
    let owner = ledger
        .custodian()
        .owner_of(&ContractId::new("gen-art"), 1)
        .unwrap();
    match ledger.listing(id).unwrap().state() {
        ListingState::Cancelled => assert_eq!(owner, alice),
        ListingState::Settled => assert_eq!(owner, bob),
        ListingState::Active => panic!("race left the listing active"),
    }
}

/// Paused engine rejects the whole trade surface but admin operations
/// still work.
#[test]
fn pause_blocks_trading_only() {
    let mut ledger = market(100);
    let alice = AccountId::new("alice");
    let native = TokenCode::native();

    let id = ledger
        .list(&alice, &ContractId::new("gen-art"), 1, 1, dec!(100), &native)
        .unwrap();
    ledger.pause(&admin()).unwrap();

    assert_eq!(
        ledger.list(&alice, &ContractId::new("passes"), 7, 5, dec!(10), &native),
        Err(MarketError::SystemPaused)
    );
    assert_eq!(ledger.cancel(&alice, id), Err(MarketError::SystemPaused));
    assert_eq!(
        ledger
            .settle(&approver(), id, &AccountId::new("bob"), dec!(100))
            .map(|_| ()),
        Err(MarketError::SystemPaused)
    );

    // Admin surface unaffected.
    ledger.set_base_fee_rate(&admin(), 300).unwrap();
    ledger.unpause(&admin()).unwrap();
    ledger.cancel(&alice, id).unwrap();
}

/// The event log reconstructs the full history in order.
#[test]
fn event_log_tracks_history() {
    let mut ledger = market(100);
    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    let native = TokenCode::native();

    let first = ledger
        .list(&alice, &ContractId::new("gen-art"), 1, 1, dec!(100), &native)
        .unwrap();
    let second = ledger
        .list(&alice, &ContractId::new("passes"), 7, 3, dec!(10), &native)
        .unwrap();
    ledger.deposit(&native, &bob, dec!(100));
    ledger.settle(&approver(), first, &bob, dec!(100)).unwrap();
    ledger.cancel(&alice, second).unwrap();

    let records = ledger.events().records();
    // Dense, strictly increasing sequence numbers.
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.seq, i as u64);
    }

    let trade_events: Vec<&MarketEvent> = records
        .iter()
        .map(|r| &r.event)
        .filter(|e| {
            matches!(
                e,
                MarketEvent::Listed { .. }
                    | MarketEvent::ListingSettled { .. }
                    | MarketEvent::ListingCancelled { .. }
            )
        })
        .collect();
    assert_eq!(trade_events.len(), 4);
    assert!(matches!(
        trade_events[2],
        MarketEvent::ListingSettled { listing_id, fee, .. }
            if *listing_id == first && *fee == dec!(1)
    ));
    assert!(matches!(
        trade_events[3],
        MarketEvent::ListingCancelled { listing_id, .. } if *listing_id == second
    ));
}

/// Settlement JSON carries the split for downstream indexers.
#[test]
fn settlement_event_serializes() {
    let mut ledger = market(100);
    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    let native = TokenCode::native();

    let id = ledger
        .list(&alice, &ContractId::new("gen-art"), 1, 1, dec!(100), &native)
        .unwrap();
    ledger.deposit(&native, &bob, dec!(100));
    ledger.settle(&approver(), id, &bob, dec!(100)).unwrap();

    let record = ledger.events().records().last().unwrap();
    let json = serde_json::to_string(record).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["event"]["type"], "listing_settled");
    assert_eq!(parsed["event"]["buyer"], "bob");
    assert_eq!(parsed["event"]["fee"], "1");
    assert_eq!(parsed["event"]["proceeds"], "99");
}

/// Vault money is conserved across a settlement: what the buyer paid
/// equals what the seller and collector received.
#[test]
fn settlement_conserves_payment() {
    let mut ledger = market(777);
    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    let native = TokenCode::native();

    let id = ledger
        .list(&alice, &ContractId::new("passes"), 7, 13, dec!(17), &native)
        .unwrap();
    let total = dec!(221); // 13 * 17
    ledger.deposit(&native, &bob, total);
    let settlement = ledger.settle(&approver(), id, &bob, total).unwrap();

    assert_eq!(settlement.fee + settlement.proceeds, total);
    let seller_got = ledger.vault().balance(&native, &alice);
    let collector_got = ledger.vault().balance(&native, &AccountId::new("treasury"));
    assert_eq!(seller_got + collector_got, total);
    assert_eq!(ledger.vault().balance(&native, &bob), Decimal::ZERO);
}
