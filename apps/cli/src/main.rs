#![deny(warnings)]

//! Headless CLI for validating the static tables and running the
//! simulation for a fixed number of ticks.

use anyhow::Result;
use market_core::{commodity_def, validate_tables, CommodityId};
use market_engine::{EventKind, MarketEngine, SaveData};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    seed: Option<u32>,
    ticks: u64,
    save_path: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        seed: None,
        ticks: 252,
        save_path: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--ticks" => {
                if let Some(t) = it.next().and_then(|s| s.parse().ok()) {
                    args.ticks = t;
                }
            }
            "--save" => args.save_path = it.next(),
            _ => {}
        }
    }
    args
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(seed = ?args.seed, ticks = args.ticks, "starting CLI");

    validate_tables()?;
    println!("Tables OK | commodities: {}", CommodityId::ALL.len());

    let mut engine = match args.seed {
        Some(seed) => MarketEngine::new(seed),
        None => MarketEngine::from_entropy(),
    };
    engine.bus_mut().on(EventKind::PhaseUnlocked, |event| {
        info!(?event, "progression");
    });

    // A simple autopilot so a headless run produces activity: harvest and
    // flip the cheapest commodity every tick.
    for _ in 0..args.ticks {
        engine.harvest(CommodityId::Email);
        engine.sell_all(CommodityId::Email);
        engine.tick();
    }

    let snapshot = engine.snapshot();
    println!(
        "KPI | ticks: {} | cash: ${:.2} | lifetime: ${:.2} | phases: {:?} | rating: {} | news: {}",
        snapshot.tick,
        snapshot.cash,
        snapshot.lifetime_earnings,
        snapshot.unlocked_phases,
        snapshot.rating.label(),
        if snapshot.news.is_empty() {
            "-"
        } else {
            snapshot.news.as_str()
        }
    );
    for id in CommodityId::ALL {
        let def = commodity_def(id);
        if let Some(market) = engine.market(id) {
            println!(
                "{:>5} | price: ${:.4} | base: ${:.4} | trend: {:?}",
                id.ticker(),
                market.price,
                def.base_price,
                market.trend().direction
            );
        }
    }

    if let Some(path) = args.save_path {
        let json = engine.save().to_json()?;
        std::fs::write(&path, json)?;
        println!("Saved to {path}");
        let restored = MarketEngine::restore(SaveData::from_json(&std::fs::read_to_string(
            &path,
        )?)?)?;
        info!(tick = restored.tick_count(), "save verified");
    }

    Ok(())
}
