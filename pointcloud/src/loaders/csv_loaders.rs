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

use csv::ReaderBuilder;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::base_traits::PointCloud;
use crate::data_sources::DataRam;
use crate::pc_errors::*;

/// Opens a CSV of numbers, one point per record. Every record needs the same number of
/// fields. Set `has_headers` to skip a header line.
pub fn ram_from_csv<P: AsRef<Path>>(path: P, has_headers: bool) -> PointCloudResult<DataRam> {
    let file = File::open(&path)?;
    let name = path.as_ref().to_string_lossy().to_string();
    let ram = read_csv(&name, has_headers, file)?;
    debug!(
        "loaded {} points of dimension {} from {}",
        ram.len(),
        ram.dim(),
        name
    );
    Ok(ram.with_name(name))
}

fn read_csv<R: Read>(file_name: &str, has_headers: bool, reader: R) -> PointCloudResult<DataRam> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut data = Vec::new();
    let mut dim: Option<usize> = None;

    for result in rdr.records() {
        let record = result.map_err(|e| csv_error(file_name, &e))?;
        let line_number = record.position().map(|p| p.line() as usize).unwrap_or(0);
        match dim {
            Some(d) if d != record.len() => {
                return Err(PointCloudError::dimension_mismatch(d, record.len()))
            }
            None => dim = Some(record.len()),
            _ => (),
        }
        for field in record.iter() {
            let val = field.parse::<f32>().map_err(|_| {
                PointCloudError::ParsingError(ParsingError::CSVReadError {
                    file_name: file_name.to_string(),
                    line_number,
                    key: format!("unable to read f32 from {:?}", field),
                })
            })?;
            data.push(val);
        }
    }
    match dim {
        Some(d) => DataRam::new(data, d),
        None => Err(PointCloudError::ParsingError(
            ParsingError::RegularParsingError("the CSV has no records"),
        )),
    }
}

fn csv_error(file_name: &str, err: &csv::Error) -> PointCloudError {
    PointCloudError::ParsingError(ParsingError::CSVReadError {
        file_name: file_name.to_string(),
        line_number: err.position().map(|p| p.line() as usize).unwrap_or(0),
        key: err.to_string(),
    })
}
