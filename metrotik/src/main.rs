//! Scripted walk through a rider's session.
//!
//! Buys tickets with and without funds and rides on them, then deactivates
//! the account, printing what the rider would see after each step.

use anyhow::Context;
use chrono::{Duration, Utc};
use metrotik::{Config, MetrotikSession, Money};
use metrotik_core::environment::SystemClock;
use std::rc::Rc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Metrotik: Monorail Ticketing ===");
    println!(
        "Rider: {} <{}>",
        config.rider.holder().full_name(),
        config.rider.email
    );

    let mut session = MetrotikSession::new(config, Rc::new(SystemClock));
    tick(&session, "Session opened");

    let bought = session.request_zone_ticket_purchase(2)?;
    tick(&session, &format!("Buy a 2 zone ticket with no funds: {}", outcome(bought)));

    session.add_funds(Money::from_dollars(10))?;
    tick(&session, "Add $10.00");

    let bought = session.request_zone_ticket_purchase(2)?;
    tick(&session, &format!("Buy a 2 zone ticket: {}", outcome(bought)));

    let travelled = session.request_zone_travel(2)?;
    tick(&session, &format!("Travel 2 zones: {}", outcome(travelled)));

    let travelled = session.request_zone_travel(1)?;
    tick(&session, &format!("Travel 1 zone without a ticket: {}", outcome(travelled)));

    session.add_funds(Money::from_dollars(10))?;
    let bought = session.request_timed_ticket_purchase(Utc::now() - Duration::seconds(1))?;
    tick(&session, &format!("Add $10.00 and buy a timed ticket: {}", outcome(bought)));

    let travelled = session.request_zone_travel(7)?;
    tick(&session, &format!("Travel 7 zones on the timed ticket: {}", outcome(travelled)));

    session.deactivate_account()?;
    tick(&session, "Deactivate the account");

    let history = serde_json::to_string_pretty(&session.purchase_history())
        .context("failed to serialize purchase history")?;
    println!("\nPurchase history:\n{history}");

    Ok(())
}

const fn outcome(ok: bool) -> &'static str {
    if ok { "succeeded" } else { "failed" }
}

fn tick(session: &MetrotikSession, step: &str) {
    println!("\n> {step}");
    for notification in session.drain_notifications() {
        println!("  {notification}");
    }
    println!("Your current balance is: {}", session.account_balance());
    println!("Your account is currently: {}", session.account_status());
    println!("You are currently at zone: {}", session.current_zone());
}
