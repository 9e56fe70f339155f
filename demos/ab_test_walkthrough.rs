//! A/B Test Walkthrough
//!
//! Demonstrates the experiment lifecycle through the JSON request bodies an
//! HTTP layer would receive.
//!
//! Run with: cargo run --example ab_test_walkthrough
//! (set `RUST_LOG=abtest_store=debug` to see every recorded event)

use std::sync::Arc;

use abtest_store::api::ExperimentApi;
use abtest_store::config::{IdStrategy, StoreConfig};
use abtest_store::AbTestStore;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== A/B Test Walkthrough ===\n");

    let config = StoreConfig {
        id_strategy: IdStrategy::Sequential {
            prefix: "exp-".to_string(),
        },
        initial_capacity: 16,
    };
    let api = ExperimentApi::new(Arc::new(AbTestStore::with_config(config)?));

    // -------------------------------------------------------------------------
    // 1. Create the experiment
    // -------------------------------------------------------------------------
    println!("1. Creating experiment...");
    let exp = api.create_json(
        r#"{"name":"cta-test","variants":["A","B"],"primary_metric":"conversion_rate","owner":"growth"}"#,
    )?;
    println!("   Experiment ID: {}", exp.id);
    println!("   Variants: {:?}", exp.ranking());

    // -------------------------------------------------------------------------
    // 2. Record events
    // -------------------------------------------------------------------------
    println!("\n2. Recording events...");
    api.record_event_json(&exp.id, r#"{"variant":"A","event_type":"impression"}"#)?;
    api.record_event_json(
        &exp.id,
        r#"{"variant":"B","event_type":"conversion","value":12.5}"#,
    )?;

    match api.record_event_json(&exp.id, r#"{"variant":"Z","event_type":"impression"}"#) {
        Ok(_) => println!("   Unexpected success for unknown variant"),
        Err(err) => println!("   Rejected ({}): {err}", err.status_code()),
    }

    // -------------------------------------------------------------------------
    // 3. Finalize
    // -------------------------------------------------------------------------
    println!("\n3. Finalizing...");
    api.finalize_json(
        &exp.id,
        r#"{"winning_variant":"B","summary":"Variant B outperformed A by 15%"}"#,
    )?;

    // Ignored: metrics are frozen now.
    api.record_event_json(&exp.id, r#"{"variant":"A","event_type":"impression"}"#)?;

    // -------------------------------------------------------------------------
    // 4. Read the result
    // -------------------------------------------------------------------------
    println!("\n4. Final snapshot:");
    let snapshot = api.get(&exp.id)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    println!("\n=== Done ===");
    Ok(())
}
