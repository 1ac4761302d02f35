//! Feature encoding for the nearest-neighbour model.
//!
//! Every book becomes a fixed-width row laid out in the exact column order the
//! model was trained with. The column set is resolved once, when the schema is
//! built, so a book never changes the layout of the matrix it is encoded into.

use crate::{
    error::{ApiError, Result},
    models::Book,
};
use ndarray::{Array2, ArrayViewMut1};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Category used for books without a language code.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

const AVERAGE_RATING: &str = "average_rating";
const RATINGS_COUNT: &str = "ratings_count";
const NUM_PAGES: &str = "num_pages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingBand {
    ZeroToOne,
    OneToTwo,
    TwoToThree,
    ThreeToFour,
    FourToFive,
}

impl RatingBand {
    pub const ALL: [RatingBand; 5] = [
        RatingBand::ZeroToOne,
        RatingBand::OneToTwo,
        RatingBand::TwoToThree,
        RatingBand::ThreeToFour,
        RatingBand::FourToFive,
    ];

    /// Upper edges are inclusive: 1.0 is `0-1`, 4.0 is `3-4`. Anything at or
    /// below 1 lands in `0-1`, anything above 4 (and NaN) in `4-5`. The trained
    /// model's columns depend on this exact policy.
    pub fn from_rating(rating: f64) -> Self {
        if rating <= 1.0 {
            RatingBand::ZeroToOne
        } else if rating <= 2.0 {
            RatingBand::OneToTwo
        } else if rating <= 3.0 {
            RatingBand::TwoToThree
        } else if rating <= 4.0 {
            RatingBand::ThreeToFour
        } else {
            RatingBand::FourToFive
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RatingBand::ZeroToOne => "0-1",
            RatingBand::OneToTwo => "1-2",
            RatingBand::TwoToThree => "2-3",
            RatingBand::ThreeToFour => "3-4",
            RatingBand::FourToFive => "4-5",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|band| band.label() == label)
    }

    fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RatingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a schema column holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureColumn {
    Rating(RatingBand),
    Language(String),
    AverageRating,
    RatingsCount,
    NumPages,
}

impl FeatureColumn {
    /// Numeric names first, then band labels; every other name is a language
    /// indicator.
    pub fn parse(name: &str) -> Self {
        match name {
            AVERAGE_RATING => FeatureColumn::AverageRating,
            RATINGS_COUNT => FeatureColumn::RatingsCount,
            NUM_PAGES => FeatureColumn::NumPages,
            other => match RatingBand::from_label(other) {
                Some(band) => FeatureColumn::Rating(band),
                None => FeatureColumn::Language(other.to_string()),
            },
        }
    }
}

/// Ordered column layout fixed at training time.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Vec<String>,
    bands: [Option<usize>; 5],
    languages: HashMap<String, usize>,
    average_rating: Option<usize>,
    ratings_count: Option<usize>,
    num_pages: Option<usize>,
}

impl FeatureSchema {
    pub fn new<S: AsRef<str>>(feature_columns: &[S]) -> Result<Self> {
        if feature_columns.is_empty() {
            return Err(ApiError::ModelLoadError(
                "feature schema has no columns".to_string(),
            ));
        }

        let mut schema = Self {
            names: Vec::with_capacity(feature_columns.len()),
            bands: [None; 5],
            languages: HashMap::new(),
            average_rating: None,
            ratings_count: None,
            num_pages: None,
        };

        for (index, name) in feature_columns.iter().map(AsRef::as_ref).enumerate() {
            if schema.names.iter().any(|existing| existing == name) {
                return Err(ApiError::ModelLoadError(format!(
                    "duplicate feature column '{}'",
                    name
                )));
            }

            match FeatureColumn::parse(name) {
                FeatureColumn::Rating(band) => schema.bands[band.ordinal()] = Some(index),
                FeatureColumn::Language(code) => {
                    schema.languages.insert(code, index);
                }
                FeatureColumn::AverageRating => schema.average_rating = Some(index),
                FeatureColumn::RatingsCount => schema.ratings_count = Some(index),
                FeatureColumn::NumPages => schema.num_pages = Some(index),
            }
            schema.names.push(name.to_string());
        }

        Ok(schema)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn band_column(&self, band: RatingBand) -> Option<usize> {
        self.bands[band.ordinal()]
    }

    /// Column of a language indicator. A missing code maps to the
    /// `unknown` category; a code the model never saw has no column.
    pub fn language_column(&self, code: Option<&str>) -> Option<usize> {
        self.languages
            .get(code.unwrap_or(UNKNOWN_LANGUAGE))
            .copied()
    }
}

/// Encodes catalog rows into the schema's column order.
#[derive(Debug, Clone, Copy)]
pub struct FeatureEncoder<'a> {
    schema: &'a FeatureSchema,
}

impl<'a> FeatureEncoder<'a> {
    pub fn new(schema: &'a FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn width(&self) -> usize {
        self.schema.len()
    }

    /// Encodes the whole catalog, one row per book in catalog order.
    ///
    /// Categories outside the schema are dropped and schema columns no book
    /// uses stay zero. Neither case is an error.
    pub fn encode(&self, catalog: &[Book]) -> Array2<f64> {
        let mut features = Array2::zeros((catalog.len(), self.width()));
        let mut unseen = 0usize;

        for (book, row) in catalog.iter().zip(features.rows_mut()) {
            if !self.encode_into(book, row) {
                unseen += 1;
            }
        }

        if unseen > 0 {
            debug!(
                "{} of {} books carry a language outside the feature schema",
                unseen,
                catalog.len()
            );
        }

        features
    }

    /// Writes one book into a zeroed row. Returns false when its language had
    /// no column.
    fn encode_into(&self, book: &Book, mut row: ArrayViewMut1<'_, f64>) -> bool {
        let band = RatingBand::from_rating(book.average_rating);
        if let Some(column) = self.schema.band_column(band) {
            row[column] = 1.0;
        }

        let language = self.schema.language_column(book.language_code.as_deref());
        if let Some(column) = language {
            row[column] = 1.0;
        }

        if let Some(column) = self.schema.average_rating {
            row[column] = book.average_rating;
        }
        if let Some(column) = self.schema.ratings_count {
            row[column] = book.ratings_count as f64;
        }
        if let Some(column) = self.schema.num_pages {
            row[column] = book.num_pages.unwrap_or(0) as f64;
        }

        language.is_some()
    }
}
