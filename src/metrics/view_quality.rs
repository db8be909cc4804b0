//! 重心・距離による視点品質指標
//!
//! カメラ覆域の重心にターゲットがいるほど良く、覆域の最遠頂点（最悪点）の
//! 距離にいるほど悪いとみなします。複数カメラの場合は最良の1台で決まります。

use crate::metrics::{error::MetricError, normalization::Sigmoid};
use crate::models::{common::Point2D, geometry::Footprint};

/// 生の品質値の数値誤差許容幅
pub const QUALITY_TOLERANCE: f64 = 0.5;

/// カメラ1台分の品質計算用情報（重心と最悪点）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraQualityInfo {
    pub centroid: Point2D,
    pub worst_case: Point2D,
}

impl CameraQualityInfo {
    pub fn new(centroid: Point2D, worst_case: Point2D) -> Self {
        Self { centroid, worst_case }
    }

    /// 覆域形状から重心と最遠頂点を求める
    pub fn from_footprint(footprint: &Footprint) -> Result<Self, MetricError> {
        let centroid = footprint.centroid().ok_or(MetricError::EmptyFootprint)?;
        let worst_case = footprint
            .farthest_vertex_from(centroid)
            .ok_or(MetricError::EmptyFootprint)?;
        Ok(Self { centroid, worst_case })
    }

    /// 最悪点ベクトル（最悪点 − 重心）
    pub fn worst_case_vector(&self) -> Point2D {
        self.worst_case - self.centroid
    }

    /// このカメラに対するターゲットの品質（`[0, 1]` にクランプ済み）
    pub fn quality_for(&self, target: Point2D) -> Result<f64, MetricError> {
        let worst = self.worst_case_vector().magnitude();
        if worst == 0.0 {
            return Err(MetricError::DegenerateFootprint);
        }
        let offset = (target - self.centroid).magnitude();
        let raw = (worst - offset) / worst;
        if !(-QUALITY_TOLERANCE..=1.0 + QUALITY_TOLERANCE).contains(&raw) {
            return Err(MetricError::QualityOutOfRange {
                value: raw,
                tolerance: QUALITY_TOLERANCE,
            });
        }
        Ok(raw.clamp(0.0, 1.0))
    }
}

/// 視点品質の計算器
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewQualityMetric {
    normalization: Option<Sigmoid>,
}

impl ViewQualityMetric {
    pub fn new(normalization: Option<Sigmoid>) -> Self {
        Self { normalization }
    }

    /// ターゲット1体の視点品質
    ///
    /// # 引数
    ///
    /// * `target` - ターゲット位置
    /// * `cameras` - ターゲットを見ている各カメラの重心と最悪点
    /// * `when_not_covered` - カメラが1台も無いときに返す値（正規化しない）
    pub fn compute(
        &self,
        target: Point2D,
        cameras: &[CameraQualityInfo],
        when_not_covered: f64,
    ) -> Result<f64, MetricError> {
        let mut best: Option<f64> = None;
        for camera in cameras {
            let quality = camera.quality_for(target)?;
            best = Some(best.map_or(quality, |current| current.max(quality)));
        }

        Ok(match (best, self.normalization) {
            (None, _) => when_not_covered,
            (Some(quality), Some(sigmoid)) => sigmoid.apply(quality),
            (Some(quality), None) => quality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        common::{math_utils::deg_to_rad, Pose},
        sensor::SensorShape,
    };
    use proptest::prelude::*;

    fn center() -> Point2D {
        Point2D::new(0.0, 0.0)
    }

    fn farthest() -> Point2D {
        Point2D::new(1.0, 1.0)
    }

    #[test]
    fn test_quality_is_one_at_centroid() {
        let cameras = [CameraQualityInfo::new(center(), farthest())];
        assert_eq!(ViewQualityMetric::default().compute(center(), &cameras, 0.0), Ok(1.0));
    }

    #[test]
    fn test_quality_is_zero_at_farthest_point() {
        let cameras = [CameraQualityInfo::new(center(), farthest())];
        assert_eq!(ViewQualityMetric::default().compute(farthest(), &cameras, 0.0), Ok(0.0));
    }

    #[test]
    fn test_quality_takes_best_camera() {
        let cameras = [
            CameraQualityInfo::new(center(), farthest()),
            CameraQualityInfo::new(Point2D::new(-1.0, -1.0), farthest()),
        ];
        assert_eq!(ViewQualityMetric::default().compute(center(), &cameras, 0.0), Ok(1.0));
    }

    #[test]
    fn test_no_camera_returns_sentinel() {
        let metric = ViewQualityMetric::new(Some(Sigmoid { midpoint: 0.5, steepness: 5.0 }));
        assert_eq!(metric.compute(center(), &[], -1.0), Ok(-1.0));
    }

    #[test]
    fn test_values_slightly_outside_are_clamped() {
        let camera = CameraQualityInfo::new(center(), farthest());
        // 最悪点より少し外側（許容範囲内）
        assert_eq!(camera.quality_for(Point2D::new(1.2, 1.2)), Ok(0.0));
    }

    #[test]
    fn test_values_far_outside_are_errors() {
        let camera = CameraQualityInfo::new(center(), farthest());
        assert!(matches!(
            camera.quality_for(Point2D::new(10.0, 10.0)),
            Err(MetricError::QualityOutOfRange { .. })
        ));
        let degenerate = CameraQualityInfo::new(center(), center());
        assert_eq!(degenerate.quality_for(farthest()), Err(MetricError::DegenerateFootprint));
    }

    #[test]
    fn test_sigmoid_normalization_is_applied() {
        let metric = ViewQualityMetric::new(Some(Sigmoid { midpoint: 0.5, steepness: 5.0 }));
        let camera = CameraQualityInfo::new(center(), Point2D::new(2.0, 0.0));
        let normalized = metric.compute(Point2D::new(1.0, 0.0), &[camera], 0.0).unwrap();
        assert!((normalized - 0.5).abs() < 1e-12);
        let high = metric.compute(Point2D::new(0.4, 0.0), &[camera], 0.0).unwrap();
        assert!(high > 0.8 && high < 1.0);
    }

    #[test]
    fn test_from_footprint_of_sensor_shape() {
        let shape = SensorShape::new(2.0, 10.0, deg_to_rad(90.0)).unwrap();
        let pose = Pose::new(Point2D::new(5.0, 5.0), 0.0);
        let info = CameraQualityInfo::from_footprint(&shape.footprint(&pose, 0.05)).unwrap();
        // 重心は向きの軸上、死角と視野端の間
        assert!((info.centroid.y - 5.0).abs() < 1e-9);
        assert!(info.centroid.x > 7.0 && info.centroid.x < 15.0);
        assert!(info.worst_case.distance(&pose.position) > 9.999);
        assert_eq!(info.quality_for(info.centroid), Ok(1.0));
    }

    #[test]
    fn test_empty_footprint_is_error() {
        assert_eq!(
            CameraQualityInfo::from_footprint(&Footprint { rings: vec![] }),
            Err(MetricError::EmptyFootprint)
        );
    }

    proptest! {
        #[test]
        fn prop_quality_of_points_inside_the_sensor_is_normalized(
            heading in -3.0f64..3.0,
            radius in 2.0f64..10.0,
            bearing in -0.78f64..0.78,
        ) {
            let shape = SensorShape::new(2.0, 10.0, deg_to_rad(90.0)).unwrap();
            let pose = Pose::new(Point2D::new(-3.0, 7.0), heading);
            let info = CameraQualityInfo::from_footprint(&shape.footprint(&pose, 0.05)).unwrap();
            let target = pose.to_world(Point2D::from_polar(radius, bearing));
            let quality = ViewQualityMetric::default().compute(target, &[info], 0.0).unwrap();
            prop_assert!((0.0..=1.0).contains(&quality));
        }
    }
}
