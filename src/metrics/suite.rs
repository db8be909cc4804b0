//! ステップごとの全指標の評価
//!
//! 可視性スナップショットと環境から、全ターゲットについて体表カバレッジ・
//! 視点品質・知覚騒音を計算し、シナリオ全体の統計にまとめます。
//! ターゲットごとの評価は互いに独立なので rayon で並列に実行し、
//! 集計は順番通りに行うため再計算しても結果はビット単位で一致します。

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::metrics::{
    acoustic::AcousticMetric,
    body_coverage::BodyCoverageMetric,
    error::MetricError,
    view_quality::{CameraQualityInfo, ViewQualityMetric},
};
use crate::models::{
    capture::CaptureSnapshot,
    common::{Point2D, Pose},
    entity::{Entity, NoiseSource},
    traits::PlanarEnvironment,
};

/// 出力列の名前
///
/// 指標の識別子は報告側の設定として渡します。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricNames {
    pub body_coverage: String,
    pub view_quality: String,
    pub view_quality_covered: String,
    pub noise_perceived: String,
    pub noise_disturbance: String,
}

impl Default for MetricNames {
    fn default() -> Self {
        Self {
            body_coverage: "BodyCoverage".to_string(),
            view_quality: "FovDistance".to_string(),
            view_quality_covered: "FovDistanceOnlyCovered".to_string(),
            noise_perceived: "NoisePerceived".to_string(),
            noise_disturbance: "NoiseDisturbance".to_string(),
        }
    }
}

/// ターゲット1体分の指標
#[derive(Debug, Clone, PartialEq)]
pub struct TargetMetrics {
    pub target_id: String,
    /// ターゲットを見ているカメラの台数
    pub observers: usize,
    pub body_coverage: f64,
    pub view_quality: f64,
    /// 知覚騒音（dB）
    pub noise_db: f64,
}

impl TargetMetrics {
    pub fn is_covered(&self) -> bool {
        self.observers > 0
    }
}

/// 1ステップ分の指標
#[derive(Debug, Clone, PartialEq)]
pub struct StepMetrics {
    pub step: u64,
    pub time: f64,
    pub targets: Vec<TargetMetrics>,
    pub body_coverage: Option<f64>,
    pub view_quality: Option<f64>,
    /// カメラに見えているターゲットだけの視点品質平均
    pub view_quality_covered: Option<f64>,
    pub noise_perceived: Option<f64>,
    pub noise_disturbance: Option<f64>,
}

impl StepMetrics {
    /// カメラに見えているターゲット数
    pub fn covered_count(&self) -> usize {
        self.targets.iter().filter(|target| target.is_covered()).count()
    }

    /// 列名と値の組（報告用）
    pub fn columns<'a>(&self, names: &'a MetricNames) -> Vec<(&'a str, Option<f64>)> {
        vec![
            (names.body_coverage.as_str(), self.body_coverage),
            (names.view_quality.as_str(), self.view_quality),
            (names.view_quality_covered.as_str(), self.view_quality_covered),
            (names.noise_perceived.as_str(), self.noise_perceived),
            (names.noise_disturbance.as_str(), self.noise_disturbance),
        ]
    }
}

/// 平均（空ならNone）
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// 全指標の計算器と設定値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSuite {
    /// カメラが無いときの体表カバレッジ
    pub coverage_when_not_covered: f64,
    /// カメラが無いときの視点品質
    pub quality_when_not_covered: f64,
    pub view_quality: ViewQualityMetric,
    pub acoustic: AcousticMetric,
    /// 妨害スコアの上限レベル（dB）。Noneなら妨害スコアを計算しない
    pub max_noise_level: Option<f64>,
}

impl MetricSuite {
    /// ステップ全体の指標を計算
    pub fn evaluate<E: PlanarEnvironment + Sync>(
        &self,
        environment: &E,
        snapshot: &CaptureSnapshot,
        step: u64,
        time: f64,
    ) -> Result<StepMetrics, MetricError> {
        // 何かを見ているカメラだけ、各カメラ自身の平坦度で覆域形状を作る
        let camera_info: HashMap<&str, CameraQualityInfo> = snapshot
            .views
            .iter()
            .filter(|view| !view.visible.is_empty())
            .map(|view| {
                let footprint = view.shape.coverage_outline(&view.observer_pose);
                CameraQualityInfo::from_footprint(&footprint).map(|info| (view.observer_id.as_str(), info))
            })
            .collect::<Result<_, _>>()?;

        let sources: Vec<(Point2D, NoiseSource)> = environment
            .entities()
            .iter()
            .filter_map(|entity| entity.noise.map(|noise| (entity.pose.position, noise)))
            .collect();

        let targets = environment.targets();
        let targets: Vec<TargetMetrics> = targets
            .par_iter()
            .map(|target| self.evaluate_target(target, snapshot, &camera_info, &sources))
            .collect::<Result<_, _>>()?;

        let noise_perceived = AcousticMetric::average_over_targets(
            &targets.iter().map(|target| target.noise_db).collect::<Vec<_>>(),
        );
        let noise_disturbance = match (noise_perceived, self.max_noise_level) {
            (Some(level), Some(max_level)) => Some(AcousticMetric::disturbance(level, max_level)?),
            _ => None,
        };

        Ok(StepMetrics {
            step,
            time,
            body_coverage: mean(targets.iter().map(|target| target.body_coverage)),
            view_quality: mean(targets.iter().map(|target| target.view_quality)),
            view_quality_covered: mean(
                targets
                    .iter()
                    .filter(|target| target.is_covered())
                    .map(|target| target.view_quality),
            ),
            noise_perceived,
            noise_disturbance,
            targets,
        })
    }

    /// ターゲット1体の指標を計算
    fn evaluate_target(
        &self,
        target: &Entity,
        snapshot: &CaptureSnapshot,
        camera_info: &HashMap<&str, CameraQualityInfo>,
        sources: &[(Point2D, NoiseSource)],
    ) -> Result<TargetMetrics, MetricError> {
        let body = target.body.ok_or_else(|| MetricError::MissingComponent {
            entity: target.id.clone(),
            component: "body",
        })?;

        let observers = snapshot.observers_of(&target.id);
        let camera_poses: Vec<Pose> = observers.iter().map(|view| view.observer_pose).collect();
        let qualities: Vec<CameraQualityInfo> = observers
            .iter()
            .filter_map(|view| camera_info.get(view.observer_id.as_str()).copied())
            .collect();

        let body_coverage = BodyCoverageMetric::new(body).compute(
            &target.pose,
            &camera_poses,
            self.coverage_when_not_covered,
        )?;
        let view_quality = self.view_quality.compute(
            target.pose.position,
            &qualities,
            self.quality_when_not_covered,
        )?;
        let noise_db = self.acoustic.perceived_at(target.pose.position, sources);

        Ok(TargetMetrics {
            target_id: target.id.clone(),
            observers: observers.len(),
            body_coverage,
            view_quality,
            noise_db,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        body::BodyModel,
        capture::VisibilityCapture,
        common::math_utils::deg_to_rad,
        entity::TargetMarker,
        sensor::SensorShape,
        world::World,
    };
    use approx::assert_abs_diff_eq;

    fn suite() -> MetricSuite {
        MetricSuite {
            coverage_when_not_covered: 0.0,
            quality_when_not_covered: 0.0,
            view_quality: ViewQualityMetric::default(),
            acoustic: AcousticMetric::new(20.0),
            max_noise_level: Some(90.0),
        }
    }

    fn drone(id: &str, x: f64, y: f64, heading_deg: f64) -> Entity {
        Entity::drone(
            id.to_string(),
            Pose::new(Point2D::new(x, y), deg_to_rad(heading_deg)),
            SensorShape::new(1.0, 10.0, deg_to_rad(90.0)).unwrap(),
            NoiseSource { emitted_db: 80.0, reference_distance: 1.0, height: 10.0 },
        )
    }

    fn zebra(id: &str, x: f64, y: f64) -> Entity {
        Entity::animal(
            id.to_string(),
            Pose::new(Point2D::new(x, y), 0.0),
            TargetMarker { species: "zebra".to_string(), flagged: true },
            BodyModel::rectangle(2.0, 1.0).unwrap(),
        )
    }

    fn world() -> World {
        World::new(vec![
            drone("D1", 0.0, 0.0, 0.0),
            drone("D2", 5.0, 5.0, 270.0),
            zebra("Z1", 5.0, 0.0),
            zebra("Z2", 10_000.0, 10_000.0),
        ])
    }

    #[test]
    fn test_evaluate_reports_every_target() {
        let world = world();
        let snapshot = VisibilityCapture::default().capture(&world);
        let metrics = suite().evaluate(&world, &snapshot, 3, 0.3).unwrap();

        assert_eq!(metrics.step, 3);
        assert_eq!(metrics.targets.len(), 2);
        assert_eq!(metrics.covered_count(), 1);

        let z1 = &metrics.targets[0];
        assert_eq!(z1.target_id, "Z1");
        assert_eq!(z1.observers, 2);
        // 短辺と長辺に正対する2台
        assert_abs_diff_eq!(z1.body_coverage, 3.0 / 6.0, epsilon = 1e-9);
        assert!(z1.view_quality > 0.0 && z1.view_quality <= 1.0);
        assert!(z1.noise_db > 0.0);

        let z2 = &metrics.targets[1];
        assert_eq!(z2.observers, 0);
        assert_eq!(z2.body_coverage, 0.0);
        assert_eq!(z2.view_quality, 0.0);
        // 遠すぎて聞こえない
        assert_eq!(z2.noise_db, 0.0);

        assert_abs_diff_eq!(metrics.body_coverage.unwrap(), (z1.body_coverage + 0.0) / 2.0, epsilon = 1e-12);
        assert_eq!(metrics.view_quality_covered, Some(z1.view_quality));
        assert_eq!(metrics.noise_perceived, Some(z1.noise_db / 2.0));
        assert!(metrics.noise_disturbance.is_some());
    }

    #[test]
    fn test_view_quality_uses_each_camera_flatness() {
        let view_quality_with = |flatness: f64| {
            let mut camera = drone("D1", 0.0, 0.0, 0.0);
            camera.camera = camera.camera.map(|shape| shape.with_flatness(flatness).unwrap());
            let world = World::new(vec![camera, zebra("Z1", 5.0, 0.0)]);
            let snapshot = VisibilityCapture::default().capture(&world);
            suite().evaluate(&world, &snapshot, 0, 0.0).unwrap().targets[0].view_quality
        };

        let fine = view_quality_with(0.01);
        let coarse = view_quality_with(15.0);
        // 粗い近似では円弧が弦になり重心が観測者側へ寄る
        assert!(fine > 0.0 && coarse > 0.0);
        assert!((fine - coarse).abs() > 0.05, "fine={fine} coarse={coarse}");
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let world = world();
        let snapshot = VisibilityCapture::default().capture(&world);
        let first = suite().evaluate(&world, &snapshot, 0, 0.0).unwrap();
        let second = suite().evaluate(&world, &snapshot, 0, 0.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_world_without_targets_has_no_statistics() {
        let world = World::new(vec![drone("D1", 0.0, 0.0, 0.0)]);
        let snapshot = VisibilityCapture::default().capture(&world);
        let metrics = suite().evaluate(&world, &snapshot, 0, 0.0).unwrap();
        assert!(metrics.targets.is_empty());
        assert_eq!(metrics.body_coverage, None);
        assert_eq!(metrics.noise_perceived, None);
        assert_eq!(metrics.noise_disturbance, None);
    }

    #[test]
    fn test_target_without_body_is_configuration_error() {
        let mut marked = Entity::new("Z9".to_string(), Pose::new(Point2D::new(5.0, 0.0), 0.0));
        marked.target = Some(TargetMarker { species: "zebra".to_string(), flagged: true });
        let world = World::new(vec![drone("D1", 0.0, 0.0, 0.0), marked]);
        let snapshot = VisibilityCapture::default().capture(&world);
        assert_eq!(
            suite().evaluate(&world, &snapshot, 0, 0.0),
            Err(MetricError::MissingComponent { entity: "Z9".to_string(), component: "body" })
        );
    }

    #[test]
    fn test_columns_follow_configured_names() {
        let names = MetricNames {
            body_coverage: "coverage".to_string(),
            ..MetricNames::default()
        };
        let world = world();
        let snapshot = VisibilityCapture::default().capture(&world);
        let metrics = suite().evaluate(&world, &snapshot, 0, 0.0).unwrap();
        let columns = metrics.columns(&names);
        assert_eq!(columns[0].0, "coverage");
        assert_eq!(columns[3].0, "NoisePerceived");
        assert_eq!(columns.len(), 5);
    }
}
