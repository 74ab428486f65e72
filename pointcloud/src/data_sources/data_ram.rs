/*
* Licensed to Elasticsearch B.V. under one or more contributor
* license agreements. See the NOTICE file distributed with
* this work for additional information regarding copyright
* ownership. Elasticsearch B.V. licenses this file to you under
* the Apache License, Version 2.0 (the "License"); you may
* not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*  http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing,
* software distributed under the License is distributed on an
* "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
* KIND, either express or implied.  See the License for the
* specific language governing permissions and limitations
* under the License.
*/

use ndarray::ArrayView2;

use crate::base_traits::*;
use crate::pc_errors::{PointCloudError, PointCloudResult};
use crate::PointIndex;

/// A row-major `f32` buffer with a dimension. Immutable once built.
#[derive(Debug, Clone)]
pub struct DataRam {
    name: String,
    data: Vec<f32>,
    dim: usize,
}

impl DataRam {
    /// Consumes your buffer and dimension and gives a dimensioned cloud.
    pub fn new(data: Vec<f32>, dim: usize) -> PointCloudResult<DataRam> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(PointCloudError::dimension_mismatch(dim, data.len()));
        }
        Ok(DataRam {
            name: "RAM".to_string(),
            data,
            dim,
        })
    }

    /// Copies a list of rows. All rows need the same, non-zero, length.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> PointCloudResult<DataRam> {
        let dim = match rows.first() {
            Some(row) => row.as_ref().len(),
            None => return Err(PointCloudError::dimension_mismatch(0, 0)),
        };
        let mut data = Vec::with_capacity(dim * rows.len());
        for row in rows {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(PointCloudError::dimension_mismatch(dim, row.len()));
            }
            data.extend_from_slice(row);
        }
        DataRam::new(data, dim)
    }

    /// Copies an ndarray matrix, one point per row.
    pub fn from_array(array: ArrayView2<f32>) -> PointCloudResult<DataRam> {
        let dim = array.ncols();
        let data: Vec<f32> = array.iter().cloned().collect();
        DataRam::new(data, dim)
    }

    /// Renames the source, the name shows up in access errors.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> DataRam {
        self.name = name.into();
        self
    }

    /// The raw row-major buffer
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl PointCloud for DataRam {
    #[inline]
    fn dim(&self) -> usize {
        self.dim
    }
    #[inline]
    fn len(&self) -> usize {
        self.data.len() / self.dim
    }
    #[inline]
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    #[inline]
    fn point(&self, i: PointIndex) -> PointCloudResult<&[f32]> {
        match self.data.get(self.dim * i..self.dim * i + self.dim) {
            None => Err(PointCloudError::data_access(i, self.name.clone())),
            Some(x) => Ok(x),
        }
    }
}
