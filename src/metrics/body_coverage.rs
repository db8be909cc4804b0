//! 体表カバレッジ指標
//!
//! ターゲットの輪郭多角形のうち、カメラ群から見えている周長の割合を推定します。
//! 各カメラからは多角形の手前側の辺だけが見え（凸形状で最大2辺）、
//! 辺ごとの重みは視線と辺のなす角で決まります。同じ辺を複数のカメラが
//! 見ている場合は最良のカメラの重みだけを採用します。

use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::metrics::{error::MetricError, normalization::normalize_angle_weight};
use crate::models::{
    body::BodyModel,
    common::{math_utils, Point2D, Pose},
    geometry::Edge,
};

/// 1台のカメラから同時に見える辺の最大数
const MAX_SIDES_PER_CAMERA: usize = 2;

/// 体表カバレッジの計算器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyCoverageMetric {
    body: BodyModel,
}

impl BodyCoverageMetric {
    pub fn new(body: BodyModel) -> Self {
        Self { body }
    }

    /// ターゲット1体のカバレッジを計算
    ///
    /// # 引数
    ///
    /// * `target` - ターゲットの姿勢
    /// * `cameras` - ターゲットを見ているカメラの姿勢
    /// * `when_not_covered` - カメラが1台も無いときに返す値
    ///
    /// # 戻り値
    ///
    /// `[0, 1]` のカバレッジ。可視辺の数が輪郭の辺の数を超えた場合はエラー
    pub fn compute(&self, target: &Pose, cameras: &[Pose], when_not_covered: f64) -> Result<f64, MetricError> {
        if cameras.is_empty() {
            return Ok(when_not_covered);
        }

        let polygon = self.body.polygon(target);
        let edges = polygon.edges();

        // 辺ごとに最良の重みだけを残す
        let mut best_weights: BTreeMap<usize, f64> = BTreeMap::new();
        for camera in cameras {
            for (index, weight) in visible_sides(&edges, camera.position) {
                best_weights
                    .entry(index)
                    .and_modify(|best| *best = best.max(weight))
                    .or_insert(weight);
            }
        }

        if best_weights.len() > self.body.vertex_count() {
            return Err(MetricError::TooManyEdges {
                found: best_weights.len(),
                limit: self.body.vertex_count(),
            });
        }

        let covered: f64 = best_weights
            .iter()
            .map(|(index, weight)| edges[*index].length() * weight)
            .sum();
        Ok((covered / polygon.perimeter()).clamp(0.0, 1.0))
    }
}

/// カメラから見える辺とその重み
///
/// 反時計回りの多角形で、カメラが辺の支持直線の外側（右側）に厳密にある辺を
/// 可視とします。3辺以上が該当する場合は端点までの距離の和が小さい2辺に絞ります。
pub fn visible_sides(edges: &[Edge], camera: Point2D) -> Vec<(usize, f64)> {
    let mut candidates: Vec<(usize, &Edge)> = edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| edge.direction().cross(&(camera - edge.start)) < 0.0)
        .collect();

    if candidates.len() > MAX_SIDES_PER_CAMERA {
        candidates.sort_by(|(_, a), (_, b)| {
            a.endpoint_distance_sum(camera)
                .total_cmp(&b.endpoint_distance_sum(camera))
        });
        candidates.truncate(MAX_SIDES_PER_CAMERA);
    }

    candidates
        .into_iter()
        .map(|(index, edge)| (index, normalize_angle_weight(viewing_angle(edge, camera))))
        .collect()
}

/// 辺を見る角度（ラジアン、`[0, π/2]`）
///
/// 辺の中点から遠い方の端点へのベクトルと中点からカメラへのベクトルのなす角を、
/// カメラ側に折り返して測ります。辺に正対すると π/2、辺の延長線上では0です。
pub fn viewing_angle(edge: &Edge, camera: Point2D) -> f64 {
    let midpoint = edge.midpoint();
    let farthest = edge.farthest_endpoint_from(camera);
    PI - math_utils::angle_between(farthest - midpoint, camera - midpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, TAU};

    const BODY_LENGTH: f64 = 2.0;
    const BODY_WIDTH: f64 = 1.0;
    const PERIMETER: f64 = 2.0 * (BODY_LENGTH + BODY_WIDTH);

    fn metric() -> BodyCoverageMetric {
        BodyCoverageMetric::new(BodyModel::rectangle(BODY_LENGTH, BODY_WIDTH).unwrap())
    }

    fn camera(x: f64, y: f64, heading_deg: f64) -> Pose {
        Pose::new(Point2D::new(x, y), math_utils::deg_to_rad(heading_deg))
    }

    #[test]
    fn test_four_perpendicular_cameras_cover_everything() {
        let cameras = [
            camera(2.0, 0.0, 180.0),
            camera(-2.0, 0.0, 0.0),
            camera(0.0, 2.0, 270.0),
            camera(0.0, -2.0, 90.0),
        ];
        assert_eq!(metric().compute(&Pose::default(), &cameras, 0.0), Ok(1.0));
    }

    #[test]
    fn test_single_camera_on_short_side() {
        let cameras = [camera(2.0, 0.0, 180.0)];
        assert_eq!(metric().compute(&Pose::default(), &cameras, 0.0), Ok(BODY_WIDTH / PERIMETER));
    }

    #[test]
    fn test_single_camera_on_long_side() {
        let cameras = [camera(0.0, 2.0, 270.0)];
        assert_eq!(metric().compute(&Pose::default(), &cameras, 0.0), Ok(BODY_LENGTH / PERIMETER));
    }

    #[test]
    fn test_diagonal_camera_sees_less_than_half() {
        let cameras = [camera(2.0, 2.0, 225.0)];
        let coverage = metric().compute(&Pose::default(), &cameras, 0.0).unwrap();
        assert!(coverage > 0.0);
        assert!(coverage < 0.5);
    }

    #[test]
    fn test_no_camera_returns_sentinel() {
        assert_eq!(metric().compute(&Pose::default(), &[], 0.0), Ok(0.0));
        assert_eq!(metric().compute(&Pose::default(), &[], -1.0), Ok(-1.0));
    }

    #[test]
    fn test_redundant_cameras_do_not_double_count() {
        let single = metric().compute(&Pose::default(), &[camera(2.0, 0.0, 180.0)], 0.0).unwrap();
        let doubled = metric()
            .compute(&Pose::default(), &[camera(2.0, 0.0, 180.0), camera(5.0, 0.0, 180.0)], 0.0)
            .unwrap();
        assert_eq!(single, doubled);
    }

    #[test]
    fn test_best_camera_wins_per_side() {
        // 斜めのカメラと正対するカメラが同じ右側面を見る
        let oblique = camera(1.5, 3.0, 0.0);
        let squared = camera(3.0, 0.0, 180.0);
        let both = metric().compute(&Pose::default(), &[oblique, squared], 0.0).unwrap();
        let oblique_only = metric().compute(&Pose::default(), &[oblique], 0.0).unwrap();
        assert!(both > oblique_only);
        assert!(both <= (BODY_WIDTH + BODY_LENGTH) / PERIMETER + 1e-12);
    }

    #[test]
    fn test_ellipse_body_limits_sides_per_camera() {
        let body = BodyModel::ellipse(BODY_LENGTH, BODY_WIDTH, 32).unwrap();
        let polygon = body.polygon(&Pose::default());
        let sides = visible_sides(&polygon.edges(), Point2D::new(10.0, 0.0));
        assert_eq!(sides.len(), 2);

        let coverage = BodyCoverageMetric::new(body)
            .compute(&Pose::default(), &[camera(10.0, 0.0, 180.0)], 0.0)
            .unwrap();
        assert!(coverage > 0.0 && coverage < 0.1);
    }

    #[test]
    fn test_viewing_angle_extremes() {
        let edge = Edge::new(Point2D::new(1.0, -0.5), Point2D::new(1.0, 0.5));
        assert_eq!(viewing_angle(&edge, Point2D::new(2.0, 0.0)), FRAC_PI_2);
        assert_abs_diff_eq!(viewing_angle(&edge, Point2D::new(1.0 + 1e-9, 50.0)), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_recomputation_is_bit_identical() {
        let target = Pose::new(Point2D::new(3.3, -1.7), 0.77);
        let cameras = [camera(6.0, 1.0, 0.0), camera(-1.0, -4.0, 0.0), camera(3.0, 4.0, 0.0)];
        let first = metric().compute(&target, &cameras, 0.0).unwrap();
        let second = metric().compute(&target, &cameras, 0.0).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    proptest! {
        #[test]
        fn prop_coverage_is_normalized(
            x in -100.0f64..100.0,
            y in -100.0f64..100.0,
            heading in 0.0f64..TAU,
            cameras in proptest::collection::vec((-200.0f64..200.0, -200.0f64..200.0), 1..8),
        ) {
            let target = Pose::new(Point2D::new(x, y), heading);
            let cameras: Vec<Pose> = cameras.iter().map(|(cx, cy)| Pose::new(Point2D::new(*cx, *cy), 0.0)).collect();
            let coverage = metric().compute(&target, &cameras, 0.0).unwrap();
            prop_assert!((0.0..=1.0).contains(&coverage));
        }

        #[test]
        fn prop_special_angles_match_closed_form(
            x in -100.0f64..100.0,
            y in -100.0f64..100.0,
            heading in 0.0f64..TAU,
            distance in 1.5f64..50.0,
            quadrant in 0usize..4,
        ) {
            let target = Pose::new(Point2D::new(x, y), heading);
            // ボディ座標系で正対する位置（相対向き 180°, 0°, 270°, 90°）
            let (local, relative_heading, expected) = match quadrant {
                0 => (Point2D::new(distance, 0.0), PI, BODY_WIDTH),
                1 => (Point2D::new(-distance, 0.0), 0.0, BODY_WIDTH),
                2 => (Point2D::new(0.0, distance), 3.0 * FRAC_PI_2, BODY_LENGTH),
                _ => (Point2D::new(0.0, -distance), FRAC_PI_2, BODY_LENGTH),
            };
            let camera = Pose::new(target.to_world(local), heading + relative_heading);
            let coverage = metric().compute(&target, &[camera], 0.0).unwrap();
            prop_assert!((coverage * PERIMETER - expected).abs() < 1e-6);
        }
    }
}
