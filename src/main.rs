//! escrow-engine CLI
//!
//! Drive the marketplace engine from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Execute a trade script from a JSON file
//! escrow-engine run --input script.json
//!
//! # Output as JSON
//! escrow-engine run --input script.json --format json
//!
//! # Generate a random script for testing
//! escrow-engine generate --sellers 10 --trades 30
//!
//! # Run a small built-in end-to-end scenario
//! escrow-engine demo
//! ```

use escrow_engine::core::account::AccountId;
use escrow_engine::core::asset::{AssetKind, ContractId, TokenCode};
use escrow_engine::core::listing::ListingState;
use escrow_engine::sim::scenario::{
    generate_random_script, run_script, CollectionSpec, DepositSpec, MintSpec, ScenarioConfig,
    TradeAction, TradeScript, SCRIPT_COLLECTOR,
};
use rust_decimal_macros::dec;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"escrow-engine — custodial marketplace escrow and settlement engine

USAGE:
    escrow-engine <COMMAND> [OPTIONS]

COMMANDS:
    run         Execute a trade script against a fresh engine
    generate    Generate a random trade script (for testing)
    demo        Run a small built-in end-to-end scenario
    help        Show this message

OPTIONS (run):
    --input <FILE>      Path to JSON trade script
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --sellers <N>       Number of sellers (default: 10)
    --buyers <N>        Number of buyers (default: 10)
    --trades <N>        Number of trade actions (default: 30)
    --fee-bps <N>       Base fee rate in basis points (default: 250)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    escrow-engine run --input script.json
    escrow-engine run --input script.json --format json
    escrow-engine generate --sellers 20 --trades 60 --output script.json
    escrow-engine demo"#
    );
}

/// JSON output schema for a script run.
#[derive(serde::Serialize)]
struct RunOutput {
    listed: usize,
    cancelled: usize,
    settled: usize,
    rejected: usize,
    events: usize,
    listings: Vec<ListingOutput>,
}

#[derive(serde::Serialize)]
struct ListingOutput {
    id: u64,
    seller: String,
    contract: String,
    asset_id: u64,
    quantity: u64,
    unit_price: String,
    state: String,
    buyer: Option<String>,
}

fn load_script(path: &str) -> TradeScript {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });

    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "fee_bps": 250,
  "collections": [ {{ "contract": "gen-art", "kind": "unique" }} ],
  "mints": [ {{ "contract": "gen-art", "asset_id": 1, "owner": "alice", "quantity": 1 }} ],
  "deposits": [ {{ "token": "NATIVE", "account": "bob", "amount": "1000" }} ],
  "actions": [
    {{ "op": "list", "seller": "alice", "contract": "gen-art", "asset_id": 1,
       "quantity": 1, "unit_price": "100", "payment_token": "NATIVE" }},
    {{ "op": "settle", "listing_id": 0, "buyer": "bob", "payment": "100" }}
  ]
}}"#
        );
        process::exit(1);
    })
}

fn cmd_run(args: &[String]) {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let script = load_script(&path);
    let (ledger, stats) = run_script(&script).unwrap_or_else(|e| {
        eprintln!("Script setup failed: {}", e);
        process::exit(1);
    });

    if format == "json" {
        let listings: Vec<ListingOutput> = (0..ledger.next_listing_id())
            .filter_map(|id| ledger.listing(id))
            .map(|l| ListingOutput {
                id: l.id(),
                seller: l.seller().to_string(),
                contract: l.contract().to_string(),
                asset_id: l.asset_id(),
                quantity: l.quantity(),
                unit_price: l.unit_price().to_string(),
                state: l.state().to_string(),
                buyer: l.buyer().map(|b| b.to_string()),
            })
            .collect();

        let output = RunOutput {
            listed: stats.listed,
            cancelled: stats.cancelled,
            settled: stats.settled,
            rejected: stats.rejected,
            events: ledger.events().len(),
            listings,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    } else {
        println!("=== Script Run ===");
        println!("Listed:    {}", stats.listed);
        println!("Cancelled: {}", stats.cancelled);
        println!("Settled:   {}", stats.settled);
        println!("Rejected:  {}", stats.rejected);
        println!("Events:    {}", ledger.events().len());

        println!("\n--- Listings ---");
        for id in 0..ledger.next_listing_id() {
            if let Some(l) = ledger.listing(id) {
                let buyer = l
                    .buyer()
                    .map(|b| format!(" -> {}", b))
                    .unwrap_or_default();
                println!(
                    "  #{:<4} {:<10} {} x {}#{} at {} [{}]{}",
                    l.id(),
                    l.seller(),
                    l.quantity(),
                    l.contract(),
                    l.asset_id(),
                    l.unit_price(),
                    l.state(),
                    buyer
                );
            }
        }

        let collector = AccountId::new(SCRIPT_COLLECTOR);
        let native = TokenCode::native();
        println!(
            "\nFee collector balance: {} {}",
            ledger.vault().balance(&native, &collector),
            native
        );
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = ScenarioConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--sellers" => {
                i += 1;
                config.seller_count = parse_number(args.get(i), "--sellers");
            }
            "--buyers" => {
                i += 1;
                config.buyer_count = parse_number(args.get(i), "--buyers");
            }
            "--trades" => {
                i += 1;
                config.trade_count = parse_number(args.get(i), "--trades");
            }
            "--fee-bps" => {
                i += 1;
                config.fee_bps = parse_number(args.get(i), "--fee-bps") as u32;
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let script = generate_random_script(&config);
    let json = serde_json::to_string_pretty(&script).unwrap();

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} actions across {} sellers → {}",
            script.actions.len(),
            config.seller_count,
            path
        );
    } else {
        println!("{}", json);
    }
}

fn parse_number(arg: Option<&String>, flag: &str) -> usize {
    arg.and_then(|s| s.parse().ok()).unwrap_or_else(|| {
        eprintln!("{} requires a number", flag);
        process::exit(1);
    })
}

fn cmd_demo() {
    let script = TradeScript {
        fee_bps: 100,
        collections: vec![
            CollectionSpec {
                contract: ContractId::new("gen-art"),
                kind: AssetKind::Unique,
            },
            CollectionSpec {
                contract: ContractId::new("passes"),
                kind: AssetKind::FungibleById,
            },
        ],
        mints: vec![
            MintSpec {
                contract: ContractId::new("gen-art"),
                asset_id: 1,
                owner: AccountId::new("alice"),
                quantity: 1,
            },
            MintSpec {
                contract: ContractId::new("passes"),
                asset_id: 7,
                owner: AccountId::new("alice"),
                quantity: 10,
            },
        ],
        deposits: vec![DepositSpec {
            token: TokenCode::native(),
            account: AccountId::new("bob"),
            amount: dec!(1000),
        }],
        actions: vec![
            TradeAction::List {
                seller: AccountId::new("alice"),
                contract: ContractId::new("gen-art"),
                asset_id: 1,
                quantity: 1,
                unit_price: dec!(100),
                payment_token: TokenCode::native(),
            },
            TradeAction::List {
                seller: AccountId::new("alice"),
                contract: ContractId::new("passes"),
                asset_id: 7,
                quantity: 5,
                unit_price: dec!(10),
                payment_token: TokenCode::native(),
            },
            TradeAction::Settle {
                listing_id: 0,
                buyer: AccountId::new("bob"),
                payment: dec!(100),
            },
            TradeAction::Cancel {
                caller: AccountId::new("alice"),
                listing_id: 1,
            },
        ],
    };

    let (ledger, stats) = run_script(&script).unwrap_or_else(|e| {
        eprintln!("Demo failed: {}", e);
        process::exit(1);
    });

    println!("=== Demo ===");
    println!(
        "alice listed a unique art piece at 100 and 5 passes at 10 each;"
    );
    println!("bob bought the art piece; alice reclaimed the passes.\n");
    println!(
        "Settled: {}  Cancelled: {}  Rejected: {}",
        stats.settled, stats.cancelled, stats.rejected
    );

    let art = ledger.listing(0).unwrap();
    assert_eq!(art.state(), ListingState::Settled);
    println!(
        "\nListing #0 ({}#{}) is {} to {}",
        art.contract(),
        art.asset_id(),
        art.state(),
        art.buyer().unwrap()
    );

    let native = TokenCode::native();
    println!(
        "alice proceeds: {} {}",
        ledger.vault().balance(&native, &AccountId::new("alice")),
        native
    );
    println!(
        "treasury fee:   {} {}",
        ledger
            .vault()
            .balance(&native, &AccountId::new(SCRIPT_COLLECTOR)),
        native
    );

    println!("\n--- Event log ---");
    for record in ledger.events().records() {
        println!("  [{}] {:?}", record.seq, record.event);
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "run" => cmd_run(rest),
        "generate" => cmd_generate(rest),
        "demo" => cmd_demo(),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
