//! # Event Horizon Storefront
//!
//! A ticketing storefront over a static, in-memory catalog.
//!
//! - [`catalog`]: events and ticket tiers, search and categories
//! - [`money`]: paise-exact amounts, tier multipliers, pricing and `₹` formatting
//! - [`purchase`]: the purchase flow (`Selecting → Processing → Confirmed`,
//!   with a `Failed` branch) running on a `horizon-runtime` store
//! - [`hype`]: optional AI-written descriptions with a static fallback
//! - [`page`]: the event page that hosts a purchase flow and its hype text
//! - [`session`], [`dashboard`], [`wallet`]: sign-in stub, organizer
//!   aggregates and the ticket wallet
//! - [`profile`], [`moments`]: the profile page and the public photo gallery
//!
//! ## Example
//!
//! ```no_run
//! use horizon_core::environment::SystemClock;
//! use horizon_storefront::{Catalog, PurchaseEnvironment, PurchaseFlow, config::PurchaseConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::reference();
//! let event = catalog.event("1").cloned().ok_or("missing event")?;
//! let env = PurchaseEnvironment::simulated(Arc::new(SystemClock), &PurchaseConfig::default());
//!
//! let flow = PurchaseFlow::new(event, catalog.shared_tiers(), env)?;
//! flow.select_tier("vip").await?;
//! flow.set_quantity(2).await?;
//! assert_eq!(flow.total().await.to_string(), "₹22,500");
//!
//! let view = flow.submit_and_wait(Duration::from_secs(5)).await?;
//! println!("{:?}", view.receipt);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod hype;
pub mod money;
pub mod moments;
pub mod page;
pub mod profile;
pub mod purchase;
pub mod session;
pub mod wallet;

pub use catalog::{Catalog, CatalogError, Event, TicketTier};
pub use config::{Config, ConfigError};
pub use dashboard::DashboardSummary;
pub use hype::{GenAiHypeProvider, HypeSource, HypeText, HypeTextProvider, StaticHypeProvider};
pub use money::{Money, Multiplier};
pub use moments::{Moment, moments};
pub use page::{EventPage, HypeSlot};
pub use profile::{ProfileError, ProfilePage, ProfileTab};
pub use purchase::{
    FlowError, PaymentProcessor, PurchaseAction, PurchaseEnvironment, PurchaseFlow, PurchaseStage,
    PurchaseView, Quantity, Receipt, SimulatedPaymentProcessor,
};
pub use session::{AccessError, AuthStub, Route, Session, User, authorize};
pub use wallet::{TicketStatus, Wallet, WalletTicket};
