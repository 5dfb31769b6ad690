//! Catalog read models
//!
//! Produced by the record store and cached by the storefront. The cached JSON
//! for a key always has the shape of the type returned by its producer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Game entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub platform: String,
    pub price: Decimal,
    pub released_at: NaiveDate,
    /// Product id on the key marketplace (used for reservations)
    pub marketplace_product_id: String,
    #[serde(default)]
    pub cover_url: Option<String>,
}

impl Game {
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            slug: self.slug.clone(),
            name: self.name.clone(),
            price: self.price,
            cover_url: self.cover_url.clone(),
        }
    }
}

/// Card shown in listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub slug: String,
    pub name: String,
    pub price: Decimal,
    pub cover_url: Option<String>,
}

/// Genre with its number of games
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreCount {
    pub genre: String,
    pub count: u64,
}

/// Home page aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub best_sellers: Vec<GameSummary>,
    pub new_releases: Vec<GameSummary>,
    pub genres: Vec<GenreCount>,
}
