//! 音響知覚指標
//!
//! 上空の騒音源（ドローン）から地上のターゲットに届く音圧レベルを
//! 逆二乗則で減衰させ、聴覚閾値で切り捨ててから、パワー領域で合成します。

use crate::metrics::{error::MetricError, normalization::normalize_range};
use crate::models::{common::Point2D, entity::NoiseSource};

/// 斜距離（地上距離と高度の合成）
pub fn slant_distance(ground_distance: f64, height: f64) -> f64 {
    ground_distance.hypot(height)
}

/// 逆二乗則による距離減衰（0 dB未満は0）
///
/// # 引数
///
/// * `emitted_db` - 基準距離での音圧レベル（dB）
/// * `reference_distance` - 基準距離（メートル）
/// * `distance` - 受音点までの距離（メートル）
pub fn dispersion_of_sound(emitted_db: f64, reference_distance: f64, distance: f64) -> f64 {
    let received = emitted_db + 20.0 * (reference_distance / distance).log10();
    received.max(0.0)
}

/// 聴覚閾値未満は0（聞こえない）として扱う
pub fn perceived_level(decibel: f64, threshold: f64) -> f64 {
    if decibel < threshold { 0.0 } else { decibel }
}

/// 複数の音圧レベルをパワー領域で合成
///
/// 0 dB（聞こえない）の寄与は合計に含めません。聞こえる音源が無い場合は0です。
pub fn sum_of_sound_pressures(levels: &[f64]) -> f64 {
    let audible: Vec<f64> = levels.iter().copied().filter(|level| *level > 0.0).collect();
    if audible.is_empty() {
        return 0.0;
    }
    let power: f64 = audible.iter().map(|level| 10f64.powf(level / 10.0)).sum();
    10.0 * power.log10()
}

/// 音響知覚の計算器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcousticMetric {
    /// 聴覚閾値（dB）
    pub hearing_threshold: f64,
}

impl AcousticMetric {
    pub fn new(hearing_threshold: f64) -> Self {
        Self { hearing_threshold }
    }

    /// 1つの音源からターゲットが知覚するレベル
    pub fn level_from(&self, target: Point2D, source_position: Point2D, source: &NoiseSource) -> f64 {
        let distance = slant_distance(target.distance(&source_position), source.height);
        let received = dispersion_of_sound(source.emitted_db, source.reference_distance, distance);
        perceived_level(received, self.hearing_threshold)
    }

    /// 全音源を合成してターゲットが知覚するレベル（dB）
    ///
    /// 可視性とは無関係に、すべての音源の寄与を合計します。
    pub fn perceived_at(&self, target: Point2D, sources: &[(Point2D, NoiseSource)]) -> f64 {
        let levels: Vec<f64> = sources
            .iter()
            .map(|(position, source)| self.level_from(target, *position, source))
            .collect();
        sum_of_sound_pressures(&levels)
    }

    /// ターゲット間の平均（ターゲットが居なければNone）
    pub fn average_over_targets(levels: &[f64]) -> Option<f64> {
        if levels.is_empty() {
            return None;
        }
        Some(levels.iter().sum::<f64>() / levels.len() as f64)
    }

    /// 知覚レベルを `[0, 1]` の妨害スコアに正規化
    pub fn disturbance(level: f64, max_level: f64) -> Result<f64, MetricError> {
        normalize_range(level.min(max_level), 0.0, max_level)
    }
}
