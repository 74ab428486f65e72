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

//! The errors that can occur when a tree is built, queried, or used to span a graph.
//! Data access errors are floated up from `PointCloud` as that's the i/o layer.

use log::error;
use pointcloud::pc_errors::{ParsingError, PointCloudError};
use std::error::Error;
use std::fmt;
use std::io;

/// Helper type for a call that could go wrong.
pub type IndexResult<T> = Result<T, IndexError>;

/// Error type for the spatial index and everything built on it.
#[derive(Debug)]
pub enum IndexError {
    /// Unable to retrieve some data point, or the data was malformed
    PointCloudError(PointCloudError),
    /// The parameters given cannot produce a valid tree or spanning tree
    InvalidConfiguration(String),
    /// A query or solver argument was out of range
    InvalidArgument(String),
    /// A structural invariant broke. This is a bug, not a user error.
    InternalError(String),
    /// An allocation failed. Logged at error level when created.
    OutOfMemory {
        /// What we were doing when we ran out
        operation: &'static str,
    },
    /// IO error when opening files
    IoError(io::Error),
    /// Parsing error when loading a config
    ParsingError(ParsingError),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            IndexError::IoError(ref e) => write!(f, "{}", e),
            IndexError::ParsingError(ref e) => write!(f, "{}", e),
            IndexError::PointCloudError(ref e) => write!(f, "{}", e),
            IndexError::InvalidConfiguration(ref msg) => {
                write!(f, "invalid configuration: {}", msg)
            }
            IndexError::InvalidArgument(ref msg) => write!(f, "invalid argument: {}", msg),
            IndexError::InternalError(ref msg) => write!(f, "internal error: {}", msg),
            IndexError::OutOfMemory { operation } => {
                write!(f, "ran out of memory during {}", operation)
            }
        }
    }
}

impl Error for IndexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            IndexError::IoError(ref e) => Some(e),
            IndexError::ParsingError(ref e) => Some(e),
            IndexError::PointCloudError(ref e) => Some(e),
            IndexError::InvalidConfiguration(..) => None,
            IndexError::InvalidArgument(..) => None,
            IndexError::InternalError(..) => None,
            IndexError::OutOfMemory { .. } => None,
        }
    }
}

impl From<PointCloudError> for IndexError {
    fn from(err: PointCloudError) -> Self {
        match err {
            PointCloudError::IoError(e) => IndexError::IoError(e),
            PointCloudError::ParsingError(e) => IndexError::ParsingError(e),
            e => IndexError::PointCloudError(e),
        }
    }
}

impl From<io::Error> for IndexError {
    fn from(err: io::Error) -> Self {
        IndexError::IoError(err)
    }
}

impl From<ParsingError> for IndexError {
    fn from(err: ParsingError) -> Self {
        IndexError::ParsingError(err)
    }
}

impl From<IndexError> for io::Error {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::IoError(e) => e,
            e => io::Error::new(io::ErrorKind::Other, Box::new(e)),
        }
    }
}

impl IndexError {
    /// Logs the failed allocation and wraps it up.
    pub fn out_of_memory(operation: &'static str) -> IndexError {
        error!("ran out of memory during {}", operation);
        IndexError::OutOfMemory { operation }
    }

    /// Shorthand for `InvalidArgument`
    pub fn invalid_argument<S: Into<String>>(msg: S) -> IndexError {
        IndexError::InvalidArgument(msg.into())
    }

    /// Shorthand for `InvalidConfiguration`
    pub fn invalid_configuration<S: Into<String>>(msg: S) -> IndexError {
        IndexError::InvalidConfiguration(msg.into())
    }

    /// Shorthand for `InternalError`
    pub fn internal<S: Into<String>>(msg: S) -> IndexError {
        IndexError::InternalError(msg.into())
    }
}

/// Allocates a vector of `len` copies of `value`, reporting allocation failure instead of aborting.
pub(crate) fn try_filled<T: Clone>(
    len: usize,
    value: T,
    operation: &'static str,
) -> IndexResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| IndexError::out_of_memory(operation))?;
    v.resize(len, value);
    Ok(v)
}

/// An empty vector with room for `capacity` elements.
pub(crate) fn try_with_capacity<T>(capacity: usize, operation: &'static str) -> IndexResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity)
        .map_err(|_| IndexError::out_of_memory(operation))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_allocation_is_reported() {
        let res: IndexResult<Vec<u64>> = try_with_capacity(usize::MAX / 2, "a test");
        match res {
            Err(IndexError::OutOfMemory { operation }) => assert_eq!(operation, "a test"),
            other => panic!("expected out of memory, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn point_cloud_io_errors_stay_io_errors() {
        let err: IndexError =
            PointCloudError::IoError(io::Error::new(io::ErrorKind::NotFound, "gone")).into();
        assert!(matches!(err, IndexError::IoError(_)));
        let err: IndexError = PointCloudError::data_access(3, "RAM".to_string()).into();
        assert!(matches!(err, IndexError::PointCloudError(_)));
    }
}
