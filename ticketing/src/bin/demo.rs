//! Momenta walkthrough.
//!
//! Runs the full claim lifecycle in-process and prints each step:
//! - an event with five VIP seats
//! - two customers each booking three of them (bookings do not hold seats)
//! - a mobile-money claim rejected for a missing number, then resubmitted
//! - both claims approved, the second clamped to the seats left
//! - a refund that returns seats to the ledger
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin demo
//! ```

use chrono::NaiveDate;
use momenta::{
    aggregates::{NewEvent, SequentialReferences, TicketingEnvironment},
    config::Config,
    notification::{self, ConsoleNotifier, EmailTemplates, NotificationWorker},
    Actor, Customer, TicketingService, TicketingStore, Tier, UserId,
};
use momenta_core::environment::SystemClock;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,momenta=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n🎫 ============================================");
    println!("   Momenta - Payment Claim Walkthrough");
    println!("============================================\n");

    let config = Config::default();
    let (outbox, receiver) = notification::channel();
    let worker = NotificationWorker::new(
        receiver,
        ConsoleNotifier::new().with_body(),
        EmailTemplates::new(config.email.clone()),
    );
    let worker = tokio::spawn(worker.run());

    let env = TicketingEnvironment::from_config(&config.booking, Arc::new(SystemClock), Arc::new(outbox))
        .with_references(Arc::new(SequentialReferences::starting_at(1)));
    let service = TicketingService::new(TicketingStore::new(env), config.payments.clone());

    // ========== Event ==========
    let music = service.register_category("Music & Concerts").await?;
    println!("📂 category {} ({})", music.name, music.slug);
    let event = service
        .register_event(NewEvent {
            category: music.slug.clone(),
            title: "Lusaka Jazz Night".to_string(),
            description: "An evening of live jazz".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap_or_default(),
            time: None,
            location: "Mulungushi Conference Centre".to_string(),
            organizer_name: "Nalisa Events".to_string(),
            organizer_phone: "0977000000".to_string(),
            vip_seats: 5,
            gold_seats: 20,
            standard_seats: 100,
        })
        .await?;
    println!("📋 {} on {}: {} VIP seats", event.title, event.date, event.inventory.remaining(Tier::Vip));

    // ========== Bookings ==========
    let alice = Customer::new(UserId::new(), "alice", Some("alice@example.com".to_string()));
    let bwalya = Customer::new(UserId::new(), "bwalya", Some("bwalya@example.com".to_string()));

    let first = service.create_booking(alice, event.id, "vip", 3).await?;
    println!("✓ alice booked {} x VIP, total {} ({})", first.quantity, first.total_price, first.reference());
    let second = service.create_booking(bwalya, event.id, "vip", 3).await?;
    println!("✓ bwalya booked {} x VIP, total {} ({})", second.quantity, second.total_price, second.reference());

    // ========== Claims ==========
    match service.submit_claim(first.id, "airtel", None, None, None).await {
        Ok(_) => println!("✗ claim without a number was accepted"),
        Err(error) => println!("⚠ {error}"),
    }
    let first_claim = service
        .submit_claim(first.id, "airtel", None, Some("0977123456".to_string()), None)
        .await?;
    println!("✓ alice's claim {} is {}", first_claim.transaction_reference, first_claim.status());

    let second_claim = service
        .submit_claim(second.id, "bank", None, None, Some("DEP-20250301-88".to_string()))
        .await?;
    println!("✓ bwalya's claim {} is {}", second_claim.transaction_reference, second_claim.status());

    // ========== Review ==========
    let admin = Actor::admin("nalisa");
    let approved = service.approve(first_claim.id, &admin).await?;
    println!("✓ approved {}", approved.transaction_reference);
    let approved = service.approve(second_claim.id, &admin).await?;
    println!("✓ approved {}", approved.transaction_reference);
    for note in approved.notes() {
        println!("    · {}", note.message);
    }

    let summary = service.sales_summary(event.id).await?;
    println!(
        "📊 confirmed {} tickets for {}, {} seats left",
        summary.confirmed_tickets, summary.confirmed_revenue, summary.seats_remaining
    );

    // ========== Refund ==========
    let refunded = service.refund(first_claim.id, &admin).await?;
    println!("↩ refunded {}", refunded.transaction_reference);
    let event = service.event(event.id).await?;
    println!("📋 VIP seats left: {}", event.inventory.remaining(Tier::Vip));

    // Dropping the service closes the outbox; wait for pending emails
    drop(service);
    let stats = worker.await?;
    println!("\n✉ notifications: {} delivered, {} failed, {} skipped", stats.delivered, stats.failed, stats.skipped);
    Ok(())
}
