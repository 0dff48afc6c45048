//! Macro-generated test suite for `ListingQueryController` over a store.
//!
//! The factory's store is wrapped in a [`RecordingStore`](super::RecordingStore)
//! so tests can count store calls and hold responses to force interleavings.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use marketplace::storage::InMemoryListingStore;
//!
//! query_controller_tests!(InMemoryListingStore::with_clock(test_clock()));
//! ```
//!
//! # Generated Tests
//!
//! ## Browsing
//! - `test_paginates_whole_collection`: ceil(M/N) fetches, every listing once
//! - `test_abc_scenario`: three listings, page size two, then search
//! - `test_sort_round_trip`: sorting reorders the view only
//! - `test_search_ignores_case` / `test_clear_search_returns_to_first_page`
//!
//! ## Ownership
//! - `test_non_owner_delete_never_reaches_store`
//! - `test_owner_delete_reloads_first_page` / `test_delete_while_searching_reruns_search`
//!
//! ## Concurrency
//! - `test_duplicate_load_more_is_skipped`
//! - `test_load_more_after_search_is_discarded`
//! - `test_search_superseded_by_clear_is_discarded`
//! - `test_duplicate_search_is_skipped`
//! - `test_delete_supersedes_running_search`

/// Generate the controller behaviour suite.
///
/// `$factory` must evaluate to a fresh, empty `ListingStore + 'static` whose
/// clock advances between inserts. It is re-evaluated for each test.
#[macro_export]
macro_rules! query_controller_tests {
    ($factory:expr) => {
        mod query_controller_contract_tests {
            use super::*;
            use marketplace::controller::{ListingQueryController, LoadOutcome, Mode, SkipReason};
            use marketplace::core::auth::User;
            use marketplace::core::error::MarketError;
            use marketplace::core::query::SortOrder;
            use marketplace::core::store::ListingStore;
            use std::collections::HashSet;
            use std::sync::Arc;

            async fn recording() -> Arc<RecordingStore<impl ListingStore + 'static>> {
                Arc::new(RecordingStore::new($factory))
            }

            // ==================================================================
            // Browsing
            // ==================================================================

            #[tokio::test]
            async fn test_paginates_whole_collection() {
                let store = recording().await;
                seed(store.inner(), 7, "alice").await;
                let controller = ListingQueryController::with_page_size(store.clone(), 3);

                assert_eq!(controller.load_initial().await.unwrap(), LoadOutcome::Applied);
                while controller.load_more().await.unwrap() == LoadOutcome::Applied {}

                assert_eq!(store.calls("list_ordered_page"), 3);
                assert!(!controller.has_more());
                assert!(controller.is_at_end());

                let page = controller.page();
                assert_eq!(page.len(), 7);
                let unique: HashSet<_> = ids(&page).into_iter().collect();
                assert_eq!(unique.len(), 7);
                assert_eq!(page, store.inner().list_all().await.unwrap());
            }

            #[tokio::test]
            async fn test_abc_scenario() {
                let store = recording().await;
                // oldest first, so A is the newest
                store.inner().insert(new_listing("Chair", 40.0, "alice")).await.unwrap();
                store.inner().insert(new_listing("Big Box", 3.5, "alice")).await.unwrap();
                store.inner().insert(new_listing("Lamp", 25.0, "alice")).await.unwrap();
                let controller = ListingQueryController::with_page_size(store.clone(), 2);

                controller.load_initial().await.unwrap();
                assert_eq!(titles(&controller.view()), vec!["Lamp", "Big Box"]);
                assert!(controller.has_more());

                assert_eq!(controller.load_more().await.unwrap(), LoadOutcome::Applied);
                assert_eq!(titles(&controller.view()), vec!["Lamp", "Big Box", "Chair"]);
                assert!(!controller.has_more());

                controller.search("b").await.unwrap();
                assert_eq!(titles(&controller.view()), vec!["Big Box"]);
                assert_eq!(controller.mode(), Mode::Searching);
            }

            #[tokio::test]
            async fn test_sort_round_trip() {
                let store = recording().await;
                for (title, price) in [("mid", 20.0), ("cheap", 5.0), ("dear", 90.0), ("also-mid", 20.0)] {
                    store.inner().insert(new_listing(title, price, "alice")).await.unwrap();
                }
                let controller = ListingQueryController::with_page_size(store.clone(), 10);
                controller.load_initial().await.unwrap();
                let fetched = titles(&controller.view());
                store.reset_calls();

                controller.set_sort_order(SortOrder::PriceDescending);
                assert_eq!(titles(&controller.view()), vec!["dear", "also-mid", "mid", "cheap"]);

                controller.set_sort_order(SortOrder::PriceAscending);
                assert_eq!(titles(&controller.view()), vec!["cheap", "also-mid", "mid", "dear"]);

                controller.set_sort_order(SortOrder::None);
                assert_eq!(titles(&controller.view()), fetched);
                assert_eq!(store.total_calls(), 0);
            }

            #[tokio::test]
            async fn test_search_ignores_case() {
                let store = recording().await;
                seed(store.inner(), 3, "alice").await;
                store
                    .inner()
                    .insert(marketplace::core::listing::NewListing {
                        title: "Console".to_string(),
                        description: "Vintage GAMING console, two pads".to_string(),
                        price: 120.0,
                        owner_id: "bob".to_string(),
                    })
                    .await
                    .unwrap();
                let controller = ListingQueryController::with_page_size(store.clone(), 2);

                for term in ["gaming", "Gaming", "  GAMING  "] {
                    assert_eq!(controller.search(term).await.unwrap(), LoadOutcome::Applied);
                    assert_eq!(titles(&controller.view()), vec!["Console"]);
                }
                assert_eq!(controller.search_term(), "GAMING");
                assert_eq!(controller.summary(), "Found 1 listing for \"GAMING\"");
                assert_eq!(store.calls("list_all"), 3);
            }

            #[tokio::test]
            async fn test_clear_search_returns_to_first_page() {
                let store = recording().await;
                seed(store.inner(), 8, "alice").await;
                let controller = ListingQueryController::with_page_size(store.clone(), 2);

                controller.load_initial().await.unwrap();
                let first_page = ids(&controller.page());
                controller.load_more().await.unwrap();
                controller.load_more().await.unwrap();
                assert_eq!(controller.page().len(), 6);

                controller.search("item-0").await.unwrap();
                assert_eq!(controller.page().len(), 1);

                assert_eq!(controller.clear_search().await.unwrap(), LoadOutcome::Applied);
                assert_eq!(controller.mode(), Mode::Paginated);
                assert_eq!(controller.search_term(), "");
                assert_eq!(ids(&controller.page()), first_page);
                assert!(controller.has_more());
            }

            // ==================================================================
            // Ownership
            // ==================================================================

            #[tokio::test]
            async fn test_non_owner_delete_never_reaches_store() {
                let store = recording().await;
                let listing_ids = seed(store.inner(), 2, "alice").await;
                let controller = ListingQueryController::with_page_size(store.clone(), 5);
                controller.load_initial().await.unwrap();
                store.reset_calls();

                let bob = User::new("bob");
                let result = controller.delete_listing(Some(&bob), &listing_ids[0]).await;
                assert!(matches!(result, Err(MarketError::UnauthorizedEdit { .. })));

                let result = controller.delete_listing(None, &listing_ids[0]).await;
                assert!(matches!(result, Err(MarketError::Unauthenticated)));

                assert_eq!(store.total_calls(), 0);
                assert_eq!(controller.page().len(), 2);
            }

            #[tokio::test]
            async fn test_owner_delete_reloads_first_page() {
                let store = recording().await;
                let listing_ids = seed(store.inner(), 3, "alice").await;
                let controller = ListingQueryController::with_page_size(store.clone(), 2);
                controller.load_initial().await.unwrap();
                controller.load_more().await.unwrap();

                let alice = User::new("alice");
                controller.delete_listing(Some(&alice), &listing_ids[2]).await.unwrap();

                assert_eq!(store.calls("delete"), 1);
                assert_eq!(titles(&controller.page()), vec!["item-1", "item-0"]);
                assert!(store.inner().get_by_id(&listing_ids[2]).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_delete_while_searching_reruns_search() {
                let store = recording().await;
                let listing_ids = seed(store.inner(), 3, "alice").await;
                let controller = ListingQueryController::with_page_size(store.clone(), 2);

                controller.search("item").await.unwrap();
                assert_eq!(controller.page().len(), 3);

                let alice = User::new("alice");
                controller.delete_listing(Some(&alice), &listing_ids[0]).await.unwrap();

                assert_eq!(controller.mode(), Mode::Searching);
                assert_eq!(controller.search_term(), "item");
                assert_eq!(titles(&controller.page()), vec!["item-2", "item-1"]);
                assert_eq!(store.calls("list_all"), 2);
                assert_eq!(store.calls("list_ordered_page"), 0);
            }

            // ==================================================================
            // Concurrency
            // ==================================================================

            #[tokio::test]
            async fn test_duplicate_load_more_is_skipped() {
                let store = recording().await;
                seed(store.inner(), 5, "alice").await;
                let controller = Arc::new(ListingQueryController::with_page_size(store.clone(), 2));
                controller.load_initial().await.unwrap();

                store.page_gate.hold();
                let first = tokio::spawn({
                    let controller = controller.clone();
                    async move { controller.load_more().await }
                });
                store.page_gate.wait_for(1).await;
                assert!(controller.is_loading_more());
                assert!(!controller.can_load_more());

                assert_eq!(
                    controller.load_more().await.unwrap(),
                    LoadOutcome::Skipped(SkipReason::InFlight)
                );

                store.page_gate.release(1);
                assert_eq!(first.await.unwrap().unwrap(), LoadOutcome::Applied);
                assert_eq!(store.calls("list_ordered_page"), 2);
                assert_eq!(titles(&controller.page()), vec!["item-4", "item-3", "item-2", "item-1"]);
                assert!(!controller.is_loading_more());
            }

            #[tokio::test]
            async fn test_load_more_after_search_is_discarded() {
                let store = recording().await;
                seed(store.inner(), 5, "alice").await;
                let controller = Arc::new(ListingQueryController::with_page_size(store.clone(), 2));
                controller.load_initial().await.unwrap();

                store.page_gate.hold();
                let pending = tokio::spawn({
                    let controller = controller.clone();
                    async move { controller.load_more().await }
                });
                store.page_gate.wait_for(1).await;

                assert_eq!(controller.search("item-0").await.unwrap(), LoadOutcome::Applied);

                store.page_gate.release(1);
                assert_eq!(pending.await.unwrap().unwrap(), LoadOutcome::Discarded);

                assert_eq!(controller.mode(), Mode::Searching);
                assert_eq!(titles(&controller.page()), vec!["item-0"]);
                assert!(!controller.has_more());
            }

            #[tokio::test]
            async fn test_search_superseded_by_clear_is_discarded() {
                let store = recording().await;
                seed(store.inner(), 3, "alice").await;
                let controller = Arc::new(ListingQueryController::with_page_size(store.clone(), 2));

                store.scan_gate.hold();
                let pending = tokio::spawn({
                    let controller = controller.clone();
                    async move { controller.search("item-1").await }
                });
                store.scan_gate.wait_for(1).await;
                assert!(controller.is_searching());
                assert_eq!(controller.mode(), Mode::Searching);

                assert_eq!(controller.clear_search().await.unwrap(), LoadOutcome::Applied);
                assert!(!controller.is_searching());

                store.scan_gate.release(1);
                assert_eq!(pending.await.unwrap().unwrap(), LoadOutcome::Discarded);

                assert_eq!(controller.mode(), Mode::Paginated);
                assert_eq!(titles(&controller.page()), vec!["item-2", "item-1"]);
                assert!(controller.has_more());
            }

            #[tokio::test]
            async fn test_duplicate_search_is_skipped() {
                let store = recording().await;
                seed(store.inner(), 3, "alice").await;
                let controller = Arc::new(ListingQueryController::with_page_size(store.clone(), 2));

                store.scan_gate.hold();
                let first = tokio::spawn({
                    let controller = controller.clone();
                    async move { controller.search("item").await }
                });
                store.scan_gate.wait_for(1).await;

                assert_eq!(
                    controller.search("item-1").await.unwrap(),
                    LoadOutcome::Skipped(SkipReason::InFlight)
                );
                assert_eq!(controller.search_term(), "item");

                store.scan_gate.release(1);
                assert_eq!(first.await.unwrap().unwrap(), LoadOutcome::Applied);
                assert_eq!(store.calls("list_all"), 1);
                assert_eq!(controller.page().len(), 3);
                assert!(!controller.is_searching());
            }

            #[tokio::test]
            async fn test_delete_supersedes_running_search() {
                let store = recording().await;
                let listing_ids = seed(store.inner(), 3, "alice").await;
                let controller = Arc::new(ListingQueryController::with_page_size(store.clone(), 2));
                controller.search("item").await.unwrap();

                store.scan_gate.hold();
                let running = tokio::spawn({
                    let controller = controller.clone();
                    async move { controller.search("item").await }
                });
                store.scan_gate.wait_for(1).await;

                let deleted = listing_ids[2].clone();
                let delete = tokio::spawn({
                    let controller = controller.clone();
                    let deleted = deleted.clone();
                    async move {
                        let alice = User::new("alice");
                        controller.delete_listing(Some(&alice), &deleted).await
                    }
                });
                store.scan_gate.wait_for(2).await;
                assert_eq!(store.calls("delete"), 1);

                store.scan_gate.release(2);
                assert_eq!(running.await.unwrap().unwrap(), LoadOutcome::Discarded);
                assert_eq!(delete.await.unwrap().unwrap(), LoadOutcome::Applied);

                assert_eq!(controller.mode(), Mode::Searching);
                assert_eq!(titles(&controller.page()), vec!["item-1", "item-0"]);
                assert!(!ids(&controller.page()).contains(&deleted));
                assert!(!controller.is_searching());
            }
        }
    };
}
