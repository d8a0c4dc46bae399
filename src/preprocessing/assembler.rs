//! Feature vector assembly

use crate::error::{Result, VgSalesError};
use ndarray::Array1;

use super::encoder::EncodedColumns;
use super::schema::{FeatureSchema, NumericFields, NUMERIC_FEATURES};

/// Model-ready input row, ordered by [`FeatureSchema`]
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatureVector {
    values: Array1<f64>,
}

impl EncodedFeatureVector {
    pub(crate) fn from_values(values: Vec<f64>) -> Self {
        Self {
            values: Array1::from_vec(values),
        }
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Concatenates numeric inputs and one-hot columns in schema order
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    schema: FeatureSchema,
}

impl FeatureAssembler {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn assemble(
        &self,
        numeric: &NumericFields,
        encoded: &EncodedColumns,
    ) -> Result<EncodedFeatureVector> {
        if encoded.len() != self.schema.onehot_len() {
            return Err(VgSalesError::Shape {
                expected: self.schema.onehot_len(),
                actual: encoded.len(),
            });
        }

        let mut values = Vec::with_capacity(self.schema.len());
        values.extend_from_slice(&numeric.values());
        values.extend_from_slice(&encoded.values);
        debug_assert_eq!(values.len(), NUMERIC_FEATURES.len() + encoded.len());

        Ok(EncodedFeatureVector::from_values(values))
    }
}
