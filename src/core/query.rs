//! Page results, price sorting and keyword search helpers

use crate::core::cursor::Cursor;
use crate::core::listing::Listing;
use serde::{Deserialize, Serialize};

/// One page of listings in feed order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    /// The listings of this page
    pub items: Vec<Listing>,

    /// Position of the last item, or `None` if the page is empty
    pub next_cursor: Option<Cursor>,
}

impl ListingPage {
    /// Build a page, deriving the cursor from its last item
    pub fn from_items(items: Vec<Listing>) -> Self {
        let next_cursor = items.last().map(Cursor::after);
        Self { items, next_cursor }
    }

    /// A short page is treated as the last one.
    ///
    /// There is no count query, so a page that comes back exactly full always
    /// claims more data may follow.
    pub fn is_full(&self, page_size: usize) -> bool {
        self.items.len() == page_size
    }
}

/// Presentation order of the fetched listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Fetch order (newest first)
    #[default]
    None,
    PriceDescending,
    PriceAscending,
}

impl SortOrder {
    /// Parse from the select-box values `none`, `high-to-low`, `low-to-high`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(SortOrder::None),
            "high-to-low" => Some(SortOrder::PriceDescending),
            "low-to-high" => Some(SortOrder::PriceAscending),
            _ => None,
        }
    }

    /// Sorted copy of `listings`; the input is never reordered.
    ///
    /// The sort is stable, so listings with equal prices keep fetch order.
    pub fn apply(self, listings: &[Listing]) -> Vec<Listing> {
        let mut view = listings.to_vec();
        match self {
            SortOrder::None => {}
            SortOrder::PriceDescending => view.sort_by(|a, b| b.price.total_cmp(&a.price)),
            SortOrder::PriceAscending => view.sort_by(|a, b| a.price.total_cmp(&b.price)),
        }
        view
    }
}

/// Keep listings whose title or description contains `term`, ignoring case.
///
/// Input order is preserved.
pub fn filter_by_term(listings: Vec<Listing>, term: &str) -> Vec<Listing> {
    let needle = term.to_lowercase();
    listings
        .into_iter()
        .filter(|listing| listing.matches_lowercase(&needle))
        .collect()
}
