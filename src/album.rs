use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Identifier assigned by a store when an album is created. Ids start at 1 and are never reused.
pub type AlbumId = u64;

pub const DEFAULT_TAX: f64 = 0.1;

/// An album as it lives in a store.
///
/// `created_at` and `updated_at` are maintained by the persisted store only and are left out of
/// the JSON representation when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub artist: String,
    pub price: f64,
    pub tax: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Album {
    /// Replaces every caller-controlled field, keeping the id and timestamps.
    pub fn apply(&mut self, album: NewAlbum) {
        self.title = album.title;
        self.artist = album.artist;
        self.price = album.price;
        self.tax = album.tax;
    }
}

/// The caller-controlled part of an album, used for both create and update.
///
/// Unknown fields, `id` included, are ignored when decoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAlbum {
    pub title: String,
    pub artist: String,
    pub price: f64,
    #[serde(default = "default_tax")]
    pub tax: f64,
}

fn default_tax() -> f64 {
    DEFAULT_TAX
}

impl NewAlbum {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, price: f64) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            price,
            tax: DEFAULT_TAX,
        }
    }

    pub fn with_tax(mut self, tax: f64) -> Self {
        self.tax = tax;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.artist.trim().is_empty() {
            return Err(ValidationError::EmptyArtist);
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError::InvalidPrice(self.price));
        }
        if !self.tax.is_finite() || self.tax < 0.0 {
            return Err(ValidationError::InvalidTax(self.tax));
        }
        Ok(())
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("artist must not be empty")]
    EmptyArtist,
    #[error("price must be a non-negative number, got {0}")]
    InvalidPrice(f64),
    #[error("tax must be a non-negative number, got {0}")]
    InvalidTax(f64),
}

/// The catalog both stores start with when seeding is enabled.
pub fn seed_albums() -> Vec<NewAlbum> {
    vec![
        NewAlbum::new("Hammerhead", "THE OFFSPRING", 25.05),
        NewAlbum::new("Shake It Off", "Taylor Swift", 23.14),
        NewAlbum::new("mysterious love", "Miho Komatsu", 18.88),
    ]
}
