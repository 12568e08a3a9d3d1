//! Dense, bounded, checkpointable parameter vector.

use crate::error::TreeError;
use crate::model::bounds::{Bounds, DefaultBounds};
use crate::model::listener::ModelState;
use crate::model::ChangeType;
use serde::{Deserialize, Serialize};

/// A named vector of `f64` values with fixed bounds and one checkpoint.
///
/// Values written through [Parameter::set_value] are checked against the
/// bounds; writes report which [ChangeType] happened so the owner can
/// forward it to its listeners.
///
/// Serializes id, values and bounds; the checkpoint is not serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterRecord", into = "ParameterRecord")]
pub struct Parameter {
    id: String,
    values: Vec<f64>,
    stored_values: Vec<f64>,
    has_checkpoint: bool,
    bounds: DefaultBounds,
}

/// Serialized form of a [Parameter]; infinite bounds are written as `null`.
#[derive(Serialize, Deserialize)]
struct ParameterRecord {
    id: String,
    values: Vec<f64>,
    #[serde(default)]
    lower: Vec<Option<f64>>,
    #[serde(default)]
    upper: Vec<Option<f64>>,
}

impl From<Parameter> for ParameterRecord {
    fn from(parameter: Parameter) -> Self {
        let finite = |bound: f64| bound.is_finite().then_some(bound);
        let bounds = &parameter.bounds;
        ParameterRecord {
            lower: (0..bounds.dimension()).map(|i| finite(bounds.lower(i))).collect(),
            upper: (0..bounds.dimension()).map(|i| finite(bounds.upper(i))).collect(),
            id: parameter.id,
            values: parameter.values,
        }
    }
}

impl TryFrom<ParameterRecord> for Parameter {
    type Error = TreeError;

    /// Missing bounds mean unbounded.
    fn try_from(record: ParameterRecord) -> Result<Self, Self::Error> {
        let dimension = record.values.len();
        let mut parameter = Parameter::new(record.id, record.values);
        if record.lower.is_empty() && record.upper.is_empty() {
            return Ok(parameter);
        }
        if record.lower.len() != dimension {
            return Err(TreeError::size_mismatch("parameter lower bounds", dimension, record.lower.len()));
        }
        if record.upper.len() != dimension {
            return Err(TreeError::size_mismatch("parameter upper bounds", dimension, record.upper.len()));
        }

        let mut bounds = DefaultBounds::unbounded(0);
        for (lower, upper) in record.lower.into_iter().zip(record.upper) {
            bounds.push(lower.unwrap_or(f64::NEG_INFINITY), upper.unwrap_or(f64::INFINITY));
        }
        parameter.bounds = bounds;
        Ok(parameter)
    }
}

impl Parameter {
    /// Creates an unbounded parameter from initial values.
    pub fn new(id: impl Into<String>, values: Vec<f64>) -> Self {
        let bounds = DefaultBounds::unbounded(values.len());
        Parameter {
            id: id.into(),
            values,
            stored_values: Vec::new(),
            has_checkpoint: false,
            bounds,
        }
    }

    /// Creates an unbounded parameter with `dimension` copies of `value`.
    pub fn filled(id: impl Into<String>, dimension: usize, value: f64) -> Self {
        Self::new(id, vec![value; dimension])
    }

    /// Repeats the single value (and its bounds) of a one-dimensional
    /// parameter `dimension` times.
    pub fn expand(self, dimension: usize) -> Result<Self, TreeError> {
        if self.values.len() != 1 {
            return Err(TreeError::size_mismatch("expanded parameter", 1, self.values.len()));
        }
        let (lower, upper) = (self.bounds.lower(0), self.bounds.upper(0));
        Ok(Parameter::filled(self.id, dimension, self.values[0]).with_bounds(lower, upper))
    }

    /// Applies the same interval `[lower, upper]` to every dimension.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = DefaultBounds::uniform(self.values.len(), lower, upper);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn bounds(&self) -> &DefaultBounds {
        &self.bounds
    }

    /// Returns the value of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    pub fn value(&self, i: usize) -> f64 {
        self.values[i]
    }

    /// Sets dimension `i` to `value`.
    ///
    /// # Errors
    /// `InvalidArgument` if `i` is out of range or `value` violates the bounds of `i`.
    pub fn set_value(&mut self, i: usize, value: f64) -> Result<ChangeType, TreeError> {
        if i >= self.values.len() {
            return Err(TreeError::invalid_argument(format!(
                "dimension {} out of range for parameter '{}' of dimension {}",
                i,
                self.id,
                self.values.len()
            )));
        }
        if !self.bounds.is_within(i, value, 0.0) {
            return Err(TreeError::invalid_argument(format!(
                "value {} outside bounds [{}, {}] of parameter '{}'",
                value,
                self.bounds.lower(i),
                self.bounds.upper(i),
                self.id
            )));
        }
        self.values[i] = value;
        Ok(ChangeType::ValueChanged)
    }

    /// Replaces all values at once.
    ///
    /// # Errors
    /// `SizeMismatch` if `values` does not have this parameter's dimension.
    pub fn set_all(&mut self, values: &[f64]) -> Result<ChangeType, TreeError> {
        if values.len() != self.values.len() {
            return Err(TreeError::size_mismatch("parameter values", self.values.len(), values.len()));
        }
        self.values.copy_from_slice(values);
        Ok(ChangeType::AllValuesChanged)
    }

    /// Mutable access to the raw values, bypassing the bounds.
    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

impl ModelState for Parameter {
    fn store_state(&mut self) -> Result<(), TreeError> {
        self.stored_values.clone_from(&self.values);
        self.has_checkpoint = true;
        Ok(())
    }

    fn restore_state(&mut self) -> Result<(), TreeError> {
        if !self.has_checkpoint {
            return Err(TreeError::invalid_state(format!(
                "restore of parameter '{}' without prior store",
                self.id
            )));
        }
        std::mem::swap(&mut self.values, &mut self.stored_values);
        self.has_checkpoint = false;
        Ok(())
    }

    fn accept_state(&mut self) {
        self.has_checkpoint = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_write() {
        let mut rates = Parameter::filled("rates", 3, 1.0).with_bounds(0.0, f64::INFINITY);
        assert_eq!(rates.set_value(1, 2.5), Ok(ChangeType::ValueChanged));
        assert!(rates.set_value(1, -0.1).is_err());
        assert!(rates.set_value(3, 1.0).is_err());
        assert_eq!(rates.values(), &[1.0, 2.5, 1.0]);
    }

    #[test]
    fn test_expand_keeps_bounds() {
        let rate = Parameter::filled("rate", 1, 0.5).with_bounds(0.0, 1.0);
        let mut rates = rate.expand(4).unwrap();
        assert_eq!(rates.values(), &[0.5; 4]);
        assert!(rates.set_value(3, 1.5).is_err());
        assert!(rates.expand(8).is_err());
    }

    #[test]
    fn test_store_restore() {
        let mut p = Parameter::new("p", vec![1.0, 2.0]);
        p.store_state().unwrap();
        p.set_all(&[3.0, 4.0]).unwrap();
        p.restore_state().unwrap();
        assert_eq!(p.values(), &[1.0, 2.0]);
        assert!(p.restore_state().unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_bounds_survive_serde() {
        let plain = Parameter::new("p", vec![1.0, 2.0, 3.0]);
        let mut read: Parameter = serde_json::from_str(&serde_json::to_string(&plain).unwrap()).unwrap();
        assert_eq!(read.set_value(1, 5.0), Ok(ChangeType::ValueChanged));
        assert_eq!(read.values(), &[1.0, 5.0, 3.0]);

        let rates = Parameter::filled("rates", 2, 1.0).with_bounds(0.0, f64::INFINITY);
        let json = serde_json::to_string(&rates).unwrap();
        assert_eq!(json, r#"{"id":"rates","values":[1.0,1.0],"lower":[0.0,0.0],"upper":[null,null]}"#);
        let mut read: Parameter = serde_json::from_str(&json).unwrap();
        assert_eq!(read, rates);
        assert!(read.set_value(0, -1.0).is_err());
    }

    #[test]
    fn test_deserialize_without_bounds() {
        let mut read: Parameter = serde_json::from_str(r#"{"id":"x","values":[0.5]}"#).unwrap();
        assert_eq!(read.set_value(0, -7.0), Ok(ChangeType::ValueChanged));

        let uneven = r#"{"id":"x","values":[0.5,1.5],"lower":[0.0],"upper":[1.0,2.0]}"#;
        assert!(serde_json::from_str::<Parameter>(uneven).is_err());
    }
}
