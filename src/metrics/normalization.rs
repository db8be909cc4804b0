//! 指標の正規化関数
//!
//! 角度の線形正規化と、生の比率を飽和するスコアに変換するシグモイド曲線です。

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::metrics::error::MetricError;

/// 角度（ラジアン）を `[0, 1]` に正規化（90°で1、0°で0）
pub fn normalize_angle_weight(angle: f64) -> f64 {
    (angle * 2.0 / PI).clamp(0.0, 1.0)
}

/// ロジスティック（シグモイド）曲線
///
/// `f(x) = 1 / (1 + ((x(1−m)) / (m(1−x)))^(−v))`
///
/// 定義域は `[0, 1]` で、`f(0) = 0`、`f(m) = 0.5`、`f(1) = 1` となります。
pub fn sigmoid(value: f64, midpoint: f64, steepness: f64) -> f64 {
    let ratio = (value * (1.0 - midpoint)) / (midpoint * (1.0 - value));
    1.0 / (1.0 + ratio.powf(-steepness))
}

/// `[min, max]` を `[0, 1]` に線形変換
///
/// `max` ちょうどは1を返します。範囲外はエラーです。
pub fn linearize(value: f64, min: f64, max: f64) -> Result<f64, MetricError> {
    if value > max || value < min {
        return Err(MetricError::ValueOutOfRange { value, min, max });
    }
    if value == max {
        return Ok(1.0);
    }
    Ok((value - min) / (max - min))
}

/// 範囲内の値を線形化してからシグモイド（中点1/3、急峻度4）で整形
pub fn normalize_range(value: f64, min: f64, max: f64) -> Result<f64, MetricError> {
    Ok(sigmoid(linearize(value, min, max)?, 1.0 / 3.0, 4.0))
}

/// シグモイド正規化のパラメータ（設定可能）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Sigmoid {
    /// 変曲点 m（0 < m < 1）
    pub midpoint: f64,
    /// 急峻度 v
    pub steepness: f64,
}

impl Sigmoid {
    pub fn apply(&self, value: f64) -> f64 {
        sigmoid(value, self.midpoint, self.steepness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_angle_weight() {
        assert_eq!(normalize_angle_weight(FRAC_PI_2), 1.0);
        assert_eq!(normalize_angle_weight(0.0), 0.0);
        assert_eq!(normalize_angle_weight(PI), 1.0);
        assert_abs_diff_eq!(normalize_angle_weight(PI / 4.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_sigmoid_fixed_points() {
        assert_eq!(sigmoid(0.0, 0.5, 5.0), 0.0);
        assert_eq!(sigmoid(1.0, 0.5, 5.0), 1.0);
        assert_abs_diff_eq!(sigmoid(0.5, 0.5, 5.0), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(sigmoid(1.0 / 3.0, 1.0 / 3.0, 4.0), 0.5, epsilon = 1e-12);
        // 中点より上は0.5を超え、急峻度が高いほど飽和が速い
        assert!(sigmoid(0.7, 0.5, 5.0) > sigmoid(0.7, 0.5, 2.0));
    }

    #[test]
    fn test_linearize() {
        assert_eq!(linearize(10.0, 0.0, 10.0), Ok(1.0));
        assert_eq!(linearize(2.5, 0.0, 10.0), Ok(0.25));
        assert!(linearize(11.0, 0.0, 10.0).is_err());
        assert!(linearize(-1.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_normalize_range_saturates() {
        assert_eq!(normalize_range(90.0, 0.0, 90.0), Ok(1.0));
        assert_eq!(normalize_range(0.0, 0.0, 90.0), Ok(0.0));
        assert_abs_diff_eq!(normalize_range(30.0, 0.0, 90.0).unwrap(), 0.5, epsilon = 1e-12);
    }
}
