//! Rebate CLI
//!
//! Loads a fixture set, saves each selected order through the engine and prints its receipt.
//!
//! Use `-f` to load a fixture set by name
//! Use `-o` to process a single order
//! Use `-c` to enter a coupon code before saving

use std::io::{self, Write};

use anyhow::Result;
use clap::Parser;
use rebate::{
    cli::{CliArgs, init_tracing},
    fixtures::Fixture,
    receipt::Receipt,
};
use tracing::info;

/// Rebate CLI
pub fn main() -> Result<()> {
    let args = CliArgs::parse();

    init_tracing(&args.logging)?;

    let fixture = Fixture::from_set(&args.fixture)?;

    let order_keys: Vec<String> = match &args.order {
        Some(key) => vec![key.clone()],
        None => fixture
            .order_keys()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    let mut orders = order_keys
        .iter()
        .map(|key| -> Result<_> { Ok((key.as_str(), fixture.order(key)?)) })
        .collect::<Result<Vec<_>>>()?;

    let engine = fixture.into_engine();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for (key, order) in &mut orders {
        if let Some(code) = &args.coupon {
            order.set_coupon_code(Some(code.clone()));
        }

        let outcome = engine.save(order, args.force)?;

        info!(
            order = %key,
            created = outcome.report.created.len(),
            updated = outcome.report.updated.len(),
            removed = outcome.report.removed.len(),
            "order saved"
        );

        writeln!(handle, "\nOrder: {key}")?;

        if let Some(credit) = &outcome.redeemed {
            writeln!(handle, "Coupon: {} ({})", credit.label(), credit.amount())?;
        }

        Receipt::from_order(order, engine.catalog())?.write_to(&mut handle)?;
    }

    Ok(())
}
