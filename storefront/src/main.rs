//! Event Horizon storefront demo.
//!
//! Walks one purchase end to end against the configured catalog: browse,
//! sign in, open an event page, buy two VIP tickets, then show the wallet and
//! the organizer dashboard.

use anyhow::Context;
use horizon_core::environment::SystemClock;
use horizon_storefront::{
    AuthStub, Catalog, Config, DashboardSummary, EventPage, GenAiHypeProvider, ProfilePage,
    PurchaseEnvironment, Route, Wallet, authorize, catalog::ALL_CATEGORIES,
    config::DEFAULT_LOG_FILTER, moments,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_EVENT_ID: &str = "1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        catalog = ?config.catalog_path,
        payment_delay_ms = config.purchase.payment_delay.as_millis(),
        hype_enabled = config.genai.api_key.is_some(),
        "Configuration loaded"
    );

    let catalog = Catalog::from_config(&config).context("failed to load catalog")?;
    let clock = Arc::new(SystemClock);

    // Browse
    println!("Categories: {}", catalog.categories().join(" | "));
    for event in catalog.search("", ALL_CATEGORIES) {
        println!(
            "  [{}] {} · {} {} · {} · from {} · {}% sold",
            event.id,
            event.title,
            event.date,
            event.time,
            event.location,
            event.price,
            event.sold_percent()
        );
    }

    println!(
        "{}: {} moments",
        moments::ARCHIVE_LABEL,
        moments().len()
    );

    // Restricted routes need a session
    if let Err(error) = authorize(&Route::MyTickets, None) {
        println!("Before sign-in: {error}");
    }
    let session = AuthStub::demo_sign_in(clock.as_ref());
    println!("Signed in as {} <{}>", session.user.name, session.user.email);
    let card = ProfilePage::open(Some(&session))?.member_card();
    println!("Member {} · {} · since {}", card.member_id, card.name, card.joined);

    // Event page with its purchase flow
    let environment = PurchaseEnvironment::simulated(clock.clone(), &config.purchase);
    let hype = GenAiHypeProvider::shared(&config.genai);
    let mut page = EventPage::open(&catalog, DEMO_EVENT_ID, environment, hype)?;
    println!("\n{}\n  {}", page.event().title, page.hype().text());

    if let Some(text) = page.hype_settled().await {
        println!("  {} ({:?})", text.text, text.source);
    }

    let flow = page.flow();
    flow.select_tier("vip").await?;
    flow.set_quantity(2).await?;
    let selection = flow.view().await;
    println!(
        "Selected {} × {} at {} each: {}",
        selection.quantity, selection.tier_name, selection.unit_price, selection.total
    );

    let wait = config.purchase.payment_timeout + config.purchase.payment_delay;
    let view = flow.submit_and_wait(wait).await?;
    println!("Stage: {:?}", view.stage);

    let mut wallet = Wallet::demo(&catalog);
    if let Some(receipt) = view.receipt {
        println!(
            "Order {} confirmed: {} ({})",
            receipt.order_id, receipt.total, receipt.transaction_id
        );
        if let Some(ticket) = wallet.record(&catalog, receipt) {
            println!("Ticket {} · {}", ticket.ticket_id, ticket.seat);
        }
    } else if let Some(error) = view.last_error {
        println!("Payment failed: {error}");
    }

    flow.close(config.purchase.shutdown_timeout).await?;
    page.close();

    // My tickets
    println!("\nUpcoming tickets:");
    for ticket in wallet.upcoming(Some(&session))? {
        println!("  {} · {} · {} {}", ticket.ticket_id, ticket.event_title, ticket.date, ticket.time);
    }

    // Organizer dashboard
    let summary = DashboardSummary::build(&catalog, Some(&session))?;
    println!(
        "\nDashboard: revenue {} · {} attendees · {} active events",
        summary.gross_revenue, summary.attendees, summary.active_events
    );
    for row in &summary.capacity {
        println!("  {:<24} {:>5}/{:<5} {:>3}%", row.title, row.sold, row.capacity, row.percent);
    }
    for day in &summary.weekly_sales {
        println!("  {} {}", day.day, day.amount);
    }

    Ok(())
}
