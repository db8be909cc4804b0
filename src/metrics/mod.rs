// 指標計算のエラー型
pub mod error;

// 正規化関数（角度・シグモイド・範囲）
pub mod normalization;

// 各指標の計算器
pub mod body_coverage;
pub mod view_quality;
pub mod acoustic;

// ステップ単位の全指標評価
pub mod suite;

// 便利な re-export
pub use error::MetricError;
pub use normalization::{Sigmoid, linearize, normalize_angle_weight, normalize_range, sigmoid};
pub use body_coverage::{BodyCoverageMetric, viewing_angle, visible_sides};
pub use view_quality::{CameraQualityInfo, QUALITY_TOLERANCE, ViewQualityMetric};
pub use acoustic::{AcousticMetric, dispersion_of_sound, perceived_level, slant_distance, sum_of_sound_pressures};
pub use suite::{MetricNames, MetricSuite, StepMetrics, TargetMetrics};
