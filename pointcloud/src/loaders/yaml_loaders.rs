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

use std::fs;
use std::path::Path;
use yaml_rust::{Yaml, YamlLoader};

use super::*;
use crate::base_traits::PointCloud;
use crate::data_sources::DataRam;
use crate::distances::Minkowski;
use crate::pc_errors::*;

/// Reads the first document of a yaml file.
pub fn load_yaml<P: AsRef<Path>>(path: P) -> PointCloudResult<Yaml> {
    let config = fs::read_to_string(&path)?;
    let mut docs = YamlLoader::load_from_str(&config).map_err(|e| {
        PointCloudError::ParsingError(ParsingError::MalformedYamlError {
            file_name: path.as_ref().to_string_lossy().to_string(),
            field: e.to_string(),
        })
    })?;
    if docs.is_empty() {
        Ok(Yaml::Null)
    } else {
        Ok(docs.swap_remove(0))
    }
}

fn missing(path: &Path, field: &str) -> PointCloudError {
    PointCloudError::ParsingError(ParsingError::MissingYamlError {
        file_name: path.to_string_lossy().to_string(),
        field: field.to_string(),
    })
}

/// Given a yaml file on disk, it builds a point cloud. Minimal example below.
/// ```yaml
/// ---
/// data_path: points.csv
/// data_dim: 3
/// count: 1000
/// has_headers: false
/// ```
/// `data_dim` and `count` are optional and only checked when present.
pub fn ram_from_yaml<P: AsRef<Path>>(path: P) -> PointCloudResult<DataRam> {
    let path = path.as_ref();
    let params = load_yaml(path)?;

    let data_path = params["data_path"]
        .as_str()
        .ok_or_else(|| missing(path, "data_path"))?;
    let has_headers = params["has_headers"].as_bool().unwrap_or(false);
    let ram = ram_from_csv(resolve_data_path(data_path, path), has_headers)?;

    if let Some(data_dim) = params["data_dim"].as_i64() {
        if data_dim as usize != ram.dim() {
            return Err(PointCloudError::dimension_mismatch(
                data_dim as usize,
                ram.dim(),
            ));
        }
    }
    if let Some(count) = params["count"].as_i64() {
        if count as usize != ram.len() {
            return Err(PointCloudError::ParsingError(
                ParsingError::MalformedYamlError {
                    file_name: path.to_string_lossy().to_string(),
                    field: format!("count: {} but the data has {} points", count, ram.len()),
                },
            ));
        }
    }
    Ok(ram)
}

/// Reads the metric out of a yaml file. Defaults to euclidean.
/// ```yaml
/// ---
/// metric: minkowski
/// p: 3.0
/// ```
pub fn metric_from_yaml<P: AsRef<Path>>(path: P) -> PointCloudResult<Minkowski> {
    let params = load_yaml(path)?;
    metric_from_params(&params)
}

/// Reads the `metric` and `p` keys of an already loaded yaml document.
pub fn metric_from_params(params: &Yaml) -> PointCloudResult<Minkowski> {
    match params["metric"].as_str().unwrap_or("euclidean") {
        "minkowski" => {
            let p = params["p"]
                .as_f64()
                .or_else(|| params["p"].as_i64().map(|p| p as f64))
                .unwrap_or(2.0);
            Minkowski::new(p as f32)
        }
        name => name.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distances::Metric;
    use std::fs::File;
    use std::io::Write;
    use tempdir::TempDir;

    #[test]
    fn loads_cloud_relative_to_config() {
        let dir = TempDir::new("yaml_loader").unwrap();
        let mut csv = File::create(dir.path().join("points.csv")).unwrap();
        writeln!(csv, "0,0,0").unwrap();
        writeln!(csv, "1,1,1").unwrap();
        drop(csv);
        let config_path = dir.path().join("config.yml");
        let mut config = File::create(&config_path).unwrap();
        writeln!(config, "---\ndata_path: points.csv\ndata_dim: 3\ncount: 2").unwrap();
        drop(config);

        let ram = ram_from_yaml(&config_path).unwrap();
        assert_eq!(ram.len(), 2);
        assert_eq!(ram.dim(), 3);
    }

    #[test]
    fn missing_data_path() {
        let dir = TempDir::new("yaml_loader").unwrap();
        let config_path = dir.path().join("config.yml");
        let mut config = File::create(&config_path).unwrap();
        writeln!(config, "---\ndata_dim: 3").unwrap();
        drop(config);

        assert!(matches!(
            ram_from_yaml(&config_path),
            Err(PointCloudError::ParsingError(ParsingError::MissingYamlError { .. }))
        ));
    }

    #[test]
    fn reads_metrics() {
        let params = &YamlLoader::load_from_str("metric: minkowski\np: 3").unwrap()[0];
        assert_eq!(metric_from_params(params).unwrap().p(), 3.0);
        let params = &YamlLoader::load_from_str("metric: manhattan").unwrap()[0];
        assert_eq!(metric_from_params(params).unwrap().minkowski_p(), Some(1.0));
        let params = &YamlLoader::load_from_str("leaf_size: 3").unwrap()[0];
        assert_eq!(metric_from_params(params).unwrap().p(), 2.0);
    }
}
