//! Browse demo: seed an in-memory store, page through it, search and sort
//!
//! ```sh
//! RUST_LOG=marketplace=debug cargo run --example browse
//! ```

use anyhow::Result;
use marketplace::prelude::*;
use tracing_subscriber::EnvFilter;

const SEED: &[(&str, &str, &str)] = &[
    ("Vintage Gaming Console", "Works great, two controllers included", "120"),
    ("Designer Handbag", "Barely used leather bag", "340"),
    ("Big Box", "Sturdy cardboard box for moving", "3.50"),
    ("Road Bike", "Aluminium frame, 54cm", "450"),
    ("Desk Lamp", "Brass lamp with a green shade", "25"),
];

fn print_listings(title: &str, controller: &ListingQueryController<InMemoryListingStore>) {
    println!("\n{} ({})", title, controller.summary());
    for listing in controller.view() {
        println!("  {:<24} {:>8.2}  {}", listing.title, listing.price, listing.id);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = MarketplaceConfig {
        page_size: 2,
        ..MarketplaceConfig::default()
    };

    let auth = InMemoryAuthProvider::new();
    let mut identity = auth.identity_stream();
    tokio::spawn(async move {
        use tokio_stream::StreamExt;
        while let Some(user) = identity.next().await {
            match user {
                Some(user) => tracing::info!(uid = %user.uid, "login state: signed in"),
                None => tracing::info!("login state: signed out"),
            }
        }
    });

    let alice = auth.sign_up("alice@example.com", "correct horse").await?;

    let store = Arc::new(InMemoryListingStore::new());
    let service = ListingService::with_limits(store.clone(), config.limits);
    for (title, description, price) in SEED {
        service
            .create(Some(&alice), &ListingDraft::new(*title, *description, *price))
            .await?;
    }

    let controller = ListingQueryController::new(store.clone(), &config);
    controller.load_initial().await?;
    print_listings("First page", &controller);

    while controller.load_more().await? == LoadOutcome::Applied {
        print_listings("After load more", &controller);
    }

    controller.set_sort_order(SortOrder::PriceDescending);
    print_listings("Sorted by price, high to low", &controller);
    controller.set_sort_order(SortOrder::None);

    controller.search("LAMP").await?;
    print_listings("Search", &controller);

    if let Some(lamp) = controller.view().first() {
        controller.delete_listing(Some(&alice), &lamp.id).await?;
        print_listings("Search after delete", &controller);
    }

    controller.clear_search().await?;
    print_listings("Cleared", &controller);

    auth.sign_out().await?;
    Ok(())
}
