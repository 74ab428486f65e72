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

//! Helper functions for loading point clouds from CSV files and yaml configs.

use std::path::{Path, PathBuf};

mod csv_loaders;
pub use csv_loaders::*;
mod yaml_loaders;
pub use yaml_loaders::*;

/// Resolves a data path from a config file. Relative paths are taken relative to the
/// directory the config lives in.
pub fn resolve_data_path(data_path: &str, config_path: &Path) -> PathBuf {
    let path = Path::new(data_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        match config_path.parent() {
            Some(parent) => parent.join(path),
            None => path.to_path_buf(),
        }
    }
}
