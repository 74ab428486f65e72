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

//! Supported distances
//!
//! Every metric exposes a "reduced" distance, `rdist`, that is cheaper to compute and
//! orders pairs of points the same way `dist` does. Trees do all of their comparisons
//! in reduced space and only convert back when they hand results out.

use crate::pc_errors::*;
use std::fmt::Debug;

/// The trait that enables a metric
pub trait Metric: 'static + Send + Sync + Debug + Clone {
    /// The reduced distance. Monotone in `dist`.
    fn rdist(&self, x: &[f32], y: &[f32]) -> f32;
    /// Converts a reduced distance into a true distance
    fn rdist_to_dist(&self, rdist: f32) -> f32;
    /// Converts a true distance into a reduced distance
    fn dist_to_rdist(&self, dist: f32) -> f32;
    /// The true distance between two points
    fn dist(&self, x: &[f32], y: &[f32]) -> f32 {
        self.rdist_to_dist(self.rdist(x, y))
    }
    /// The Minkowski order of this metric, if it has one.
    ///
    /// When this is `Some(p)` the reduced distance must be exactly `sum |x_i - y_i|^p`,
    /// or `max |x_i - y_i|` when `p` is infinite. Axis aligned bounding boxes rely on it.
    fn minkowski_p(&self) -> Option<f32> {
        None
    }
    /// Short name, used in logs
    fn name(&self) -> &'static str;
}

/// L2 norm, the square root of the sum of squares
#[derive(Debug, Clone, Copy, Default)]
pub struct L2;

impl Metric for L2 {
    #[inline]
    fn rdist(&self, x: &[f32], y: &[f32]) -> f32 {
        x.iter()
            .zip(y)
            .map(|(xi, yi)| (xi - yi) * (xi - yi))
            .fold(0.0, |acc, d| acc + d)
    }
    #[inline]
    fn rdist_to_dist(&self, rdist: f32) -> f32 {
        rdist.sqrt()
    }
    #[inline]
    fn dist_to_rdist(&self, dist: f32) -> f32 {
        dist * dist
    }
    fn minkowski_p(&self) -> Option<f32> {
        Some(2.0)
    }
    fn name(&self) -> &'static str {
        "euclidean"
    }
}

/// L1 norm, the sum of absolute values. Reduced and true distances are the same.
#[derive(Debug, Clone, Copy, Default)]
pub struct L1;

impl Metric for L1 {
    #[inline]
    fn rdist(&self, x: &[f32], y: &[f32]) -> f32 {
        x.iter()
            .zip(y)
            .map(|(xi, yi)| (xi - yi).abs())
            .fold(0.0, |acc, d| acc + d)
    }
    #[inline]
    fn rdist_to_dist(&self, rdist: f32) -> f32 {
        rdist
    }
    #[inline]
    fn dist_to_rdist(&self, dist: f32) -> f32 {
        dist
    }
    fn minkowski_p(&self) -> Option<f32> {
        Some(1.0)
    }
    fn name(&self) -> &'static str {
        "manhattan"
    }
}

/// L-infinity norm, the largest absolute coordinate difference.
#[derive(Debug, Clone, Copy, Default)]
pub struct LInf;

impl Metric for LInf {
    #[inline]
    fn rdist(&self, x: &[f32], y: &[f32]) -> f32 {
        x.iter()
            .zip(y)
            .map(|(xi, yi)| (xi - yi).abs())
            .fold(0.0, f32::max)
    }
    #[inline]
    fn rdist_to_dist(&self, rdist: f32) -> f32 {
        rdist
    }
    #[inline]
    fn dist_to_rdist(&self, dist: f32) -> f32 {
        dist
    }
    fn minkowski_p(&self) -> Option<f32> {
        Some(f32::INFINITY)
    }
    fn name(&self) -> &'static str {
        "chebyshev"
    }
}

/// The general Minkowski distance of order `p >= 1`. `p` may be infinite.
#[derive(Debug, Clone, Copy)]
pub struct Minkowski {
    p: f32,
}

impl Minkowski {
    /// Fails for `p < 1` (not a metric) and for NaN.
    pub fn new(p: f32) -> PointCloudResult<Minkowski> {
        if p.is_nan() || p < 1.0 {
            return Err(PointCloudError::MetricError(format!(
                "minkowski order must be at least 1, got {}",
                p
            )));
        }
        Ok(Minkowski { p })
    }

    /// Order of the metric
    pub fn p(&self) -> f32 {
        self.p
    }
}

impl Default for Minkowski {
    fn default() -> Minkowski {
        Minkowski { p: 2.0 }
    }
}

impl Metric for Minkowski {
    fn rdist(&self, x: &[f32], y: &[f32]) -> f32 {
        let p = self.p;
        let diffs = x.iter().zip(y).map(|(xi, yi)| (xi - yi).abs());
        if p.is_infinite() {
            diffs.fold(0.0, f32::max)
        } else if p == 1.0 {
            diffs.fold(0.0, |acc, d| acc + d)
        } else if p == 2.0 {
            diffs.fold(0.0, |acc, d| acc + d * d)
        } else {
            diffs.fold(0.0, |acc, d| acc + d.powf(p))
        }
    }
    fn rdist_to_dist(&self, rdist: f32) -> f32 {
        if self.p.is_infinite() || self.p == 1.0 {
            rdist
        } else if self.p == 2.0 {
            rdist.sqrt()
        } else {
            rdist.powf(1.0 / self.p)
        }
    }
    fn dist_to_rdist(&self, dist: f32) -> f32 {
        if self.p.is_infinite() || self.p == 1.0 {
            dist
        } else if self.p == 2.0 {
            dist * dist
        } else {
            dist.powf(self.p)
        }
    }
    fn minkowski_p(&self) -> Option<f32> {
        Some(self.p)
    }
    fn name(&self) -> &'static str {
        "minkowski"
    }
}

impl std::str::FromStr for Minkowski {
    type Err = PointCloudError;
    /// Reads the common names of the Minkowski family. Use [`Minkowski::new`] for other orders.
    fn from_str(s: &str) -> PointCloudResult<Minkowski> {
        match s.to_lowercase().as_str() {
            "euclidean" | "l2" => Ok(Minkowski { p: 2.0 }),
            "manhattan" | "cityblock" | "l1" => Ok(Minkowski { p: 1.0 }),
            "chebyshev" | "infinity" | "linf" => Ok(Minkowski { p: f32::INFINITY }),
            other => Err(PointCloudError::MetricError(format!(
                "unknown metric {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_matches_hand_computation() {
        let x = [0.0, 3.0];
        let y = [4.0, 0.0];
        assert_approx_eq!(L2.rdist(&x, &y), 25.0);
        assert_approx_eq!(L2.dist(&x, &y), 5.0);
        assert_approx_eq!(L2.dist_to_rdist(5.0), 25.0);
    }

    #[test]
    fn l1_and_linf() {
        let x = [1.0, -2.0, 0.5];
        let y = [0.0, 2.0, 0.0];
        assert_approx_eq!(L1.dist(&x, &y), 5.5);
        assert_approx_eq!(LInf.dist(&x, &y), 4.0);
        assert_eq!(LInf.minkowski_p(), Some(f32::INFINITY));
    }

    #[test]
    fn minkowski_agrees_with_special_cases() {
        let x = [0.3, 1.7, -2.0, 4.0];
        let y = [1.0, 0.0, 2.5, 3.0];
        assert_approx_eq!(Minkowski::new(1.0).unwrap().dist(&x, &y), L1.dist(&x, &y));
        assert_approx_eq!(Minkowski::new(2.0).unwrap().dist(&x, &y), L2.dist(&x, &y));
        assert_approx_eq!(
            Minkowski::new(f32::INFINITY).unwrap().dist(&x, &y),
            LInf.dist(&x, &y)
        );
        let m3 = Minkowski::new(3.0).unwrap();
        let expected: f32 = x
            .iter()
            .zip(&y)
            .map(|(a, b)| (a - b).abs().powi(3))
            .sum::<f32>()
            .powf(1.0 / 3.0);
        assert_approx_eq!(m3.dist(&x, &y), expected, 1e-4);
        assert_approx_eq!(m3.rdist_to_dist(m3.dist_to_rdist(2.0)), 2.0, 1e-5);
    }

    #[test]
    fn minkowski_rejects_small_orders() {
        assert!(Minkowski::new(0.5).is_err());
        assert!(Minkowski::new(f32::NAN).is_err());
        assert!("hamming".parse::<Minkowski>().is_err());
        assert_eq!("Euclidean".parse::<Minkowski>().unwrap().p(), 2.0);
    }
}
