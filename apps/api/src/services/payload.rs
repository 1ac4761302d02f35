use crate::{
    error::{ApiError, Result},
    ml::{FeatureSchema, NeighborIndex, StandardScaler},
    models::Book,
};
use serde::Deserialize;
use std::{collections::HashMap, fs::File, io::BufReader, io::Read, path::Path};
use tracing::{info, warn};

/// On-disk layout written by the training job.
#[derive(Debug, Deserialize)]
struct RawPayload {
    model: NeighborIndex,
    scaler: StandardScaler,
    #[serde(alias = "features_columns")]
    feature_columns: Vec<String>,
    #[serde(alias = "df")]
    catalog: Vec<Book>,
    #[serde(default)]
    title_to_index: Option<HashMap<String, usize>>,
}

/// Everything the recommender needs, loaded once and never mutated.
///
/// Construction checks that the fitted index, the scaler and the feature
/// schema agree on width, and that the index covers every catalog row.
#[derive(Debug)]
pub struct ModelPayload {
    model: NeighborIndex,
    scaler: StandardScaler,
    schema: FeatureSchema,
    catalog: Vec<Book>,
    title_to_index: HashMap<String, usize>,
}

impl ModelPayload {
    pub fn new(
        model: NeighborIndex,
        scaler: StandardScaler,
        feature_columns: &[String],
        catalog: Vec<Book>,
        title_to_index: Option<HashMap<String, usize>>,
    ) -> Result<Self> {
        let schema = FeatureSchema::new(feature_columns)?;
        scaler.validate()?;

        if scaler.width() != schema.len() {
            return Err(ApiError::ModelLoadError(format!(
                "scaler expects {} features but the schema has {}",
                scaler.width(),
                schema.len()
            )));
        }
        if model.dim() != schema.len() {
            return Err(ApiError::ModelLoadError(format!(
                "neighbour index was fitted on {} features but the schema has {}",
                model.dim(),
                schema.len()
            )));
        }
        if model.len() != catalog.len() {
            return Err(ApiError::ModelLoadError(format!(
                "neighbour index holds {} rows but the catalog has {}",
                model.len(),
                catalog.len()
            )));
        }

        let title_to_index = match title_to_index {
            Some(index) => {
                if let Some((title, row)) = index.iter().find(|(_, row)| **row >= catalog.len()) {
                    return Err(ApiError::ModelLoadError(format!(
                        "title '{}' points at row {} outside the catalog",
                        title, row
                    )));
                }
                index
            }
            None => build_title_index(&catalog),
        };

        Ok(Self {
            model,
            scaler,
            schema,
            catalog,
            title_to_index,
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: RawPayload = serde_json::from_reader(reader)
            .map_err(|e| ApiError::ModelLoadError(format!("malformed payload: {}", e)))?;

        Self::new(
            raw.model,
            raw.scaler,
            &raw.feature_columns,
            raw.catalog,
            raw.title_to_index,
        )
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ApiError::ModelLoadError(format!("cannot open {}: {}", path.display(), e))
        })?;

        let payload = Self::from_reader(BufReader::new(file))?;
        info!(
            "Loaded recommender payload from {}: {} books, {} features",
            path.display(),
            payload.len(),
            payload.schema.len()
        );
        Ok(payload)
    }

    pub fn model(&self) -> &NeighborIndex {
        &self.model
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn catalog(&self) -> &[Book] {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn book(&self, row: usize) -> Option<&Book> {
        self.catalog.get(row)
    }

    /// Row of a title known verbatim.
    pub fn row_for_title(&self, title: &str) -> Option<usize> {
        self.title_to_index.get(title).copied()
    }
}

/// Title to row, built in catalog order so a repeated title maps to its last
/// occurrence.
fn build_title_index(catalog: &[Book]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(catalog.len());
    let mut duplicates = 0usize;

    for (row, book) in catalog.iter().enumerate() {
        if index.insert(book.title.clone(), row).is_some() {
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        warn!(
            "{} catalog titles are repeated; exact lookups resolve to the last occurrence",
            duplicates
        );
    }

    index
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::ml::FeatureEncoder;
    use ndarray::{Array1, Array2};
    use serde_json::json;

    #[test]
    fn test_title_index_derived_when_absent() {
        let payload = dune_payload();

        assert_eq!(payload.len(), 3);
        assert_eq!(payload.row_for_title("Dune Messiah"), Some(1));
        assert_eq!(payload.row_for_title("dune"), None);
    }

    #[test]
    fn test_repeated_title_maps_to_last_row() {
        let mut catalog = dune_catalog();
        catalog.push(Book::new("Dune", 3.1, 12, Some(90), None));
        let payload = payload_for(catalog, &feature_columns());

        assert_eq!(payload.row_for_title("Dune"), Some(3));
    }

    #[test]
    fn test_rejects_width_disagreement() {
        let columns = feature_columns();
        let scaler =
            StandardScaler::new(Array1::zeros(columns.len() - 1), Array1::ones(columns.len() - 1))
                .unwrap();
        let model = NeighborIndex::fit(Array2::zeros((3, columns.len())));

        let err = ModelPayload::new(model, scaler, &columns, dune_catalog(), None).unwrap_err();
        assert!(matches!(err, ApiError::ModelLoadError(_)));
    }

    #[test]
    fn test_rejects_index_row_count_disagreement() {
        let columns = feature_columns();
        let scaler =
            StandardScaler::new(Array1::zeros(columns.len()), Array1::ones(columns.len())).unwrap();
        let model = NeighborIndex::fit(Array2::zeros((2, columns.len())));

        assert!(ModelPayload::new(model, scaler, &columns, dune_catalog(), None).is_err());
    }

    #[test]
    fn test_rejects_title_index_out_of_range() {
        let columns = feature_columns();
        let scaler =
            StandardScaler::new(Array1::zeros(columns.len()), Array1::ones(columns.len())).unwrap();
        let model = NeighborIndex::fit(Array2::zeros((3, columns.len())));
        let titles = HashMap::from([("Dune".to_string(), 7)]);

        assert!(ModelPayload::new(model, scaler, &columns, dune_catalog(), Some(titles)).is_err());
    }

    #[test]
    fn test_from_reader_round_trip() {
        let fitted = dune_payload();
        let document = json!({
            "model": fitted.model(),
            "scaler": fitted.scaler(),
            "features_columns": feature_columns(),
            "catalog": fitted.catalog(),
            "title_to_index": { "Dune": 0, "Dune Messiah": 1, "Foundation": 2 }
        });
        let bytes = serde_json::to_vec(&document).unwrap();

        let payload = ModelPayload::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(payload.len(), 3);
        assert_eq!(payload.schema().names(), feature_columns().as_slice());
        assert_eq!(payload.model(), fitted.model());
        assert_eq!(payload.row_for_title("Foundation"), Some(2));
    }

    #[test]
    fn test_loaded_payload_keeps_self_distance_zero() {
        let catalog = vec![
            Book::new("Dune", 4.2, 500, Some(600), Some("eng")),
            Book::new("Dune Messiah", 4.0, 300, Some(400), Some("eng")),
            Book::new("Foundation", 4.5, 800, Some(300), Some("eng")),
            Book::new("Emma", 3.9, 1200, Some(474), None),
            Book::new("Obscure Pamphlet", 0.7, 3, None, None),
        ];
        let fitted = payload_for(catalog, &feature_columns());
        let document = json!({
            "model": fitted.model(),
            "scaler": fitted.scaler(),
            "feature_columns": feature_columns(),
            "catalog": fitted.catalog(),
        });
        let bytes = serde_json::to_vec(&document).unwrap();

        let payload = ModelPayload::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(payload.scaler(), fitted.scaler());

        let features = FeatureEncoder::new(payload.schema()).encode(payload.catalog());
        let normalized = payload.scaler().transform(&features).unwrap();
        for row in 0..payload.len() {
            let found = payload.model().neighbors(&normalized, row, 2).unwrap();
            assert!(
                found.iter().any(|n| n.row == row && n.distance == 0.0),
                "row {} lost its zero self distance: {:?}",
                row,
                found
            );
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = ModelPayload::load("/nonexistent/recommender.json").unwrap_err();
        assert!(matches!(err, ApiError::ModelLoadError(_)));
    }

    #[test]
    fn test_malformed_payload() {
        let err = ModelPayload::from_reader(&b"{\"model\": 1}"[..]).unwrap_err();
        assert!(matches!(err, ApiError::ModelLoadError(_)));
    }
}
