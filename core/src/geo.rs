//! Boundary geometry reference set.
//!
//! Loaded once per process from a GeoJSON FeatureCollection. Each feature
//! gets a `State_Name` property holding the canonical key of its raw
//! `NAME_1`, so a choropleth can join on `properties.State_Name`.

use crate::{
    error::{PulseError, PulseResult},
    normalize::canonicalize,
    types::GeoKey,
};
use serde_json::{json, Map, Value as Json};
use std::collections::HashMap;

/// Raw name property in the boundary file.
pub const NAME_PROPERTY: &str = "NAME_1";
/// Property added to every feature with its canonical key.
pub const KEY_PROPERTY: &str = "State_Name";
/// Join path handed to the renderer.
pub const FEATURE_ID_KEY: &str = "properties.State_Name";

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub key: GeoKey,
    pub raw_name: Option<String>,
    /// Position in the collection's `features` array.
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct BoundarySet {
    collection: Json,
    features: Vec<BoundaryFeature>,
    by_key: HashMap<GeoKey, usize>,
}

impl BoundarySet {
    pub fn empty() -> Self {
        Self {
            collection: json!({ "type": "FeatureCollection", "features": [] }),
            features: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn from_json(text: &str) -> PulseResult<Self> {
        let collection: Json = serde_json::from_str(text)?;
        Self::from_value(collection)
    }

    pub fn from_value(mut collection: Json) -> PulseResult<Self> {
        let raw_features = collection
            .get_mut("features")
            .and_then(Json::as_array_mut)
            .ok_or_else(|| PulseError::InvalidBoundaries("missing 'features' array".into()))?;

        let mut features = Vec::with_capacity(raw_features.len());
        let mut by_key = HashMap::new();

        for (index, feature) in raw_features.iter_mut().enumerate() {
            let obj = feature.as_object_mut().ok_or_else(|| {
                PulseError::InvalidBoundaries(format!("feature {index} is not an object"))
            })?;
            let props = obj
                .entry("properties")
                .or_insert_with(|| Json::Object(Map::new()));
            if !props.is_object() {
                *props = Json::Object(Map::new());
            }
            let Some(props) = props.as_object_mut() else {
                return Err(PulseError::InvalidBoundaries(format!(
                    "feature {index} has unusable properties"
                )));
            };

            let raw_name = props
                .get(NAME_PROPERTY)
                .and_then(Json::as_str)
                .map(str::to_string);
            let key = canonicalize(raw_name.as_deref());
            props.insert(KEY_PROPERTY.into(), Json::String(key.clone()));

            if !key.is_empty() {
                if by_key.contains_key(&key) {
                    log::warn!("duplicate boundary key '{key}' at feature {index}; keeping first");
                } else {
                    by_key.insert(key.clone(), index);
                }
            }
            features.push(BoundaryFeature { key, raw_name, index });
        }

        log::debug!("loaded {} boundary features", features.len());
        Ok(Self {
            collection,
            features,
            by_key,
        })
    }

    pub fn load(path: &str) -> PulseResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// `load`, degrading to an empty collection when the file is unusable.
    pub fn load_or_empty(path: &str) -> Self {
        match Self::load(path) {
            Ok(set) => set,
            Err(e) => {
                log::error!("Failed to load GeoJSON data from {path}: {e}");
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature(&self, key: &str) -> Option<&BoundaryFeature> {
        self.by_key.get(key).map(|&i| &self.features[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Geometry of the feature joined to `key`.
    pub fn geometry(&self, key: &str) -> Option<&Json> {
        let feature = self.feature(key)?;
        self.collection["features"][feature.index].get("geometry")
    }

    /// The collection with `State_Name` filled in on every feature.
    pub fn feature_collection(&self) -> &Json {
        &self.collection
    }

    /// Keys from `keys` with no matching feature, in input order.
    pub fn unmatched<'a, I>(&self, keys: I) -> Vec<GeoKey>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter()
            .filter(|k| !self.contains(k))
            .map(str::to_string)
            .collect()
    }
}
