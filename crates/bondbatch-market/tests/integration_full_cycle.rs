//! Integration test: full window lifecycle
//!
//! OPEN → ORDERS → CLOSE → CLAIMS
//!
//! Follows collateral and bonded tokens through fees, matching and
//! settlement, and checks the event stream observers see.

use std::sync::Arc;

use bondbatch_curve::BancorFormula;
use bondbatch_ingress::{AssetLedger, InMemoryLedger, ManualClock};
use bondbatch_market::BatchedMarketMaker;
use bondbatch_types::{
    constants::{PCT_BASE, PPM},
    *,
};

fn dai() -> CollateralAsset {
    CollateralAsset::token("DAI")
}

#[test]
fn buy_and_sell_through_one_window() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let (buyer, seller) = (AccountId::new(), AccountId::new());
    let mut ledger = InMemoryLedger::new();
    ledger.register_token("DAI");
    let mut config = MarketConfig::new(AccountId::new(), AccountId::new());
    config.window_size = 10;
    config.buy_fee_pct = PCT_BASE / 100;
    config.sell_fee_pct = PCT_BASE / 50;
    let (reserve, beneficiary) = (config.reserve, config.beneficiary);
    ledger.deposit(reserve, &dai(), 10_000).unwrap();
    ledger.deposit(buyer, &dai(), 1_010).unwrap();
    ledger.mint(seller, 1_000).unwrap();

    let clock = Arc::new(ManualClock::new(0));
    let mut market =
        BatchedMarketMaker::new(config, ledger, BancorFormula, Arc::clone(&clock)).unwrap();
    market.open().unwrap();
    // Supply 100_000, balance 10_000, ratio 0.5: static price 0.2.
    market
        .add_collateral(dai(), CollateralConfig::new(99_000, 0, PPM / 2))
        .unwrap();
    market.drain_events();

    // --- Orders ---
    clock.set(4);
    let bought = market.open_buy_order(buyer, &dai(), 1_010).unwrap();
    assert_eq!((bought.gross, bought.fee, bought.net), (1_010, 10, 1_000));
    assert_eq!(bought.key, BatchKey::new(WindowId(0), dai()));
    let sold = market.open_sell_order(seller, &dai(), 1_000).unwrap();
    assert_eq!((sold.gross, sold.fee, sold.net), (1_000, 0, 1_000));

    let ledger = market.ledger();
    assert_eq!(ledger.balance_of(buyer, &dai()), 0);
    assert_eq!(ledger.balance_of(beneficiary, &dai()), 10);
    assert_eq!(ledger.balance_of(reserve, &dai()), 11_000);
    assert_eq!(ledger.spendable_balance_of(seller), 0);

    let kinds: Vec<_> = market.drain_events().iter().map(MarketEvent::kind).collect();
    assert_eq!(
        kinds,
        [
            "NEW_WINDOW",
            "NEW_BATCH",
            "BUY_ORDER_OPENED",
            "PRICING_UPDATED",
            "SELL_ORDER_OPENED",
            "PRICING_UPDATED"
        ]
    );

    // 1000 tokens at 0.2 are matched against 200 DAI of buy demand.
    let totals = market.batch(WindowId(0), &dai()).unwrap().batch.totals;
    assert_eq!(totals.buy_spend, 1_000);
    assert_eq!(totals.sell_return, 200);
    assert!(totals.buy_return > 1_000);
    market.audit().unwrap();

    // --- Claims ---
    clock.set(10);
    let minted = market.claim_buy_order(buyer, WindowId(0), &dai()).unwrap();
    assert_eq!(minted.share, totals.buy_return);
    let paid = market.claim_sell_order(seller, WindowId(0), &dai()).unwrap();
    assert_eq!((paid.share, paid.fee, paid.payout), (200, 4, 196));

    let ledger = market.ledger();
    assert_eq!(ledger.spendable_balance_of(buyer), totals.buy_return);
    assert_eq!(ledger.balance_of(seller, &dai()), 196);
    assert_eq!(ledger.balance_of(beneficiary, &dai()), 14);
    assert_eq!(ledger.balance_of(reserve, &dai()), 10_800);
    assert_eq!(market.tokens_to_be_minted(), 0);
    assert_eq!(market.collaterals_to_be_claimed(&dai()), 0);
    market.audit().unwrap();

    let events = market.drain_events();
    assert!(matches!(
        events.as_slice(),
        [
            MarketEvent::BuyOrderReturned { .. },
            MarketEvent::SellOrderReturned {
                fee: 4,
                value: 196,
                ..
            }
        ]
    ));
    for event in &events {
        let json = serde_json::to_string(event).unwrap();
        let back: MarketEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, event);
    }
}

#[test]
fn next_window_prices_from_settled_state() {
    let buyer = AccountId::new();
    let mut ledger = InMemoryLedger::new();
    ledger.register_token("DAI");
    let mut config = MarketConfig::new(AccountId::new(), AccountId::new());
    config.window_size = 1;
    ledger.deposit(config.reserve, &dai(), 100).unwrap();
    ledger.deposit(buyer, &dai(), 20).unwrap();

    let clock = Arc::new(ManualClock::new(0));
    let mut market =
        BatchedMarketMaker::new(config, ledger, BancorFormula, Arc::clone(&clock)).unwrap();
    market.open().unwrap();
    market
        .add_collateral(dai(), CollateralConfig::new(1_000, 0, PPM / 2))
        .unwrap();

    market.open_buy_order(buyer, &dai(), 10).unwrap();
    let first = market.batch(WindowId(0), &dai()).unwrap().batch;

    // Window 1 opens before anyone claims: unminted tokens already count
    // toward supply, and the new collateral toward the balance.
    clock.advance(1);
    market.open_buy_order(buyer, &dai(), 10).unwrap();
    let meta = market.meta_batch(WindowId(1)).unwrap();
    assert_eq!(meta.real_supply, first.totals.buy_return);
    let second = market.batch(WindowId(1), &dai()).unwrap().batch.snapshot();
    assert_eq!(second.supply, 1_000 + first.totals.buy_return);
    assert_eq!(second.balance, 110);
    assert!(
        market.static_price_ppm(WindowId(1), &dai()).unwrap()
            > market.static_price_ppm(WindowId(0), &dai()).unwrap()
    );

    clock.advance(1);
    let a = market.claim_buy_order(buyer, WindowId(0), &dai()).unwrap();
    let b = market.claim_buy_order(buyer, WindowId(1), &dai()).unwrap();
    // The second window bought at a higher price.
    assert!(b.share < a.share);
    assert_eq!(
        market.ledger().spendable_balance_of(buyer),
        a.share + b.share
    );
    market.audit().unwrap();
}
