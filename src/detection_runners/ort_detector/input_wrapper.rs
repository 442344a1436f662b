//! File/code adapted from https://github.com/jamjamjon/usls

use anyhow::Result;
use ndarray::{Array, ArrayView2, Axis, IxDyn};

/// Model input or output tensor, wrapper over [`Array<f32, IxDyn>`]
#[derive(Debug, Clone, Default)]
pub struct X(pub Array<f32, IxDyn>);

impl From<Array<f32, IxDyn>> for X {
    fn from(x: Array<f32, IxDyn>) -> Self {
        Self(x)
    }
}

impl From<Vec<f32>> for X {
    fn from(x: Vec<f32>) -> Self {
        Self(Array::from_vec(x).into_dyn().into_owned())
    }
}

impl std::ops::Deref for X {
    type Target = Array<f32, IxDyn>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl X {
    pub fn from_shape_vec(shape: &[usize], xs: Vec<f32>) -> Result<Self> {
        Ok(Self::from(Array::from_shape_vec(shape, xs)?))
    }

    pub fn ndim(&self) -> usize {
        self.0.ndim()
    }

    /// Prepends a batch axis of length 1.
    pub fn insert_batch_axis(self) -> Self {
        Self(self.0.insert_axis(Axis(0)))
    }

    /// The `index`-th batch entry as a 2-D view.
    pub fn batch_view2(&self, index: usize) -> Result<ArrayView2<'_, f32>> {
        if self.ndim() != 3 {
            anyhow::bail!("Expected a 3-D (batch, rows, columns) tensor, got shape {:?}", self.shape());
        }
        if index >= self.shape()[0] {
            anyhow::bail!("Batch index {} out of range for shape {:?}", index, self.shape());
        }
        Ok(self.0.index_axis(Axis(0), index).into_dimensionality()?)
    }
}
