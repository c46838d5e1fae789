//! Corpus-independent feature matrices.
//!
//! A [`FeatureMatrix`] maps every known segment symbol to its feature values.
//! It is built once per project, may be edited (segments and features added),
//! and is attached to a [`crate::corpus::Corpus`] by reference.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::Value;

use crate::error::{PhonoError, Result};
use crate::segment::{BOUNDARY, EMPTY, FeatureSchema, FeatureValues};

const SYMBOL_FIELD: &str = "symbol";
const SPECIFIED_VALUES: [&str; 3] = ["+", "-", "."];
const FALLBACK_DEFAULT: &str = "n";

#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    name: String,
    features: BTreeSet<String>,
    possible_values: BTreeSet<String>,
    matrix: BTreeMap<String, FeatureValues>,
    default_value: String,
    schema: Option<FeatureSchema>,
}

impl FeatureMatrix {
    pub fn new(name: impl Into<String>) -> Self {
        let mut matrix = BTreeMap::new();
        matrix.insert(BOUNDARY.to_string(), FeatureValues::from([(BOUNDARY.to_string(), String::new())]));
        matrix.insert(EMPTY.to_string(), FeatureValues::from([("*".to_string(), String::new())]));
        Self {
            name: name.into(),
            features: BTreeSet::new(),
            possible_values: BTreeSet::new(),
            matrix,
            default_value: FALLBACK_DEFAULT.to_string(),
            schema: None,
        }
    }

    /// Builds a matrix from per-segment records, each holding a `symbol` field
    /// plus one entry per feature. The feature set is the union over all records.
    pub fn from_records<I, R, K, V>(name: impl Into<String>, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fm = Self::new(name);
        for record in records {
            let mut symbol = None;
            let mut values = FeatureValues::new();
            for (k, v) in record {
                let (k, v) = (k.into(), v.into());
                if k == SYMBOL_FIELD {
                    symbol = Some(v);
                } else {
                    values.insert(k, v);
                }
            }
            let symbol = symbol.ok_or_else(|| {
                PhonoError::InvalidArgument(format!("feature record without a '{}' field", SYMBOL_FIELD))
            })?;
            fm.features.extend(values.keys().cloned());
            fm.possible_values.extend(values.values().cloned());
            fm.matrix.insert(symbol, values);
        }
        fm.schema = FeatureSchema::detect(fm.features.iter().map(String::as_str));
        Ok(fm)
    }

    /// Same as [`FeatureMatrix::from_records`] for a JSON array of flat objects.
    pub fn from_json(name: impl Into<String>, json: &Value) -> Result<Self> {
        let records = json
            .as_array()
            .ok_or_else(|| PhonoError::InvalidArgument("feature records must be a JSON array".into()))?;
        let mut converted = Vec::with_capacity(records.len());
        for record in records {
            let object = record
                .as_object()
                .ok_or_else(|| PhonoError::InvalidArgument("feature record must be a JSON object".into()))?;
            let fields: HashMap<String, String> = object
                .iter()
                .map(|(k, v)| (k.clone(), v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())))
                .collect();
            converted.push(fields);
        }
        Self::from_records(name, converted)
    }

    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = Some(schema);
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn schema(&self) -> Option<FeatureSchema> {
        self.schema
    }
    /// Sorted list of the feature names in use.
    pub fn features(&self) -> Vec<String> {
        self.features.iter().cloned().collect()
    }
    pub fn possible_values(&self) -> &BTreeSet<String> {
        &self.possible_values
    }
    pub fn default_value(&self) -> &str {
        &self.default_value
    }
    /// Symbols with a feature specification, including the reserved entries.
    pub fn segments(&self) -> Vec<String> {
        self.matrix.keys().cloned().collect()
    }
    pub fn get(&self, symbol: &str) -> Option<&FeatureValues> {
        self.matrix.get(symbol)
    }
    pub fn value(&self, symbol: &str, feature: &str) -> Option<&str> {
        self.matrix.get(symbol).and_then(|v| v.get(feature)).map(String::as_str)
    }
    pub fn contains(&self, symbol: &str) -> bool {
        self.matrix.contains_key(symbol)
    }
    pub fn remove_segment(&mut self, symbol: &str) -> Option<FeatureValues> {
        self.matrix.remove(symbol)
    }
    pub fn len(&self) -> usize {
        self.matrix.len()
    }
    /// True while no segment beyond the reserved `#` and empty entries is specified.
    pub fn is_empty(&self) -> bool {
        self.matrix.keys().all(|s| s == BOUNDARY || s == EMPTY)
    }

    /// Fills every missing feature of every segment with the default value.
    pub fn validate(&mut self) {
        if let Some(v) = self.possible_values.iter().find(|v| !SPECIFIED_VALUES.contains(&v.as_str())) {
            self.default_value = v.clone();
        }
        let default_value = self.default_value.clone();
        let mut filled = false;
        for values in self.matrix.values_mut() {
            for f in &self.features {
                if !values.contains_key(f) {
                    values.insert(f.clone(), default_value.clone());
                    filled = true;
                }
            }
        }
        if filled {
            self.possible_values.insert(default_value);
        }
    }

    pub fn add_segment(&mut self, symbol: impl Into<String>, feature_spec: FeatureValues) -> Result<()> {
        let symbol = symbol.into();
        if let Some(f) = feature_spec.keys().find(|f| !self.features.contains(*f)) {
            return Err(PhonoError::UndefinedFeature { segment: symbol, feature: f.clone() });
        }
        self.possible_values.extend(feature_spec.values().cloned());
        self.matrix.insert(symbol, feature_spec);
        Ok(())
    }

    pub fn add_feature(&mut self, feature: impl Into<String>) {
        self.features.insert(feature.into());
        if self.schema.is_none() {
            self.schema = FeatureSchema::detect(self.features.iter().map(String::as_str));
        }
        self.validate();
    }

    /// The symbol followed by its values in feature-name order, for display.
    pub fn seg_to_feat_line(&self, symbol: &str) -> Result<Vec<String>> {
        let values = self
            .matrix
            .get(symbol)
            .ok_or_else(|| PhonoError::SegmentNotFound(symbol.to_string()))?;
        let mut line = vec![symbol.to_string()];
        for f in &self.features {
            let v = values
                .get(f)
                .ok_or_else(|| PhonoError::UndefinedFeature { segment: symbol.to_string(), feature: f.clone() })?;
            line.push(v.clone());
        }
        Ok(line)
    }
}

impl PartialEq for FeatureMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.matrix == other.matrix
    }
}
