//! 平面幾何のユーティリティ
//!
//! 円弧の折れ線近似、頂点リングの集合としての形状（フットプリント）、
//! 多角形の辺と周長の計算を提供します。形状はすべて不変の値として扱い、
//! 姿勢が変わるたびに作り直します。

use crate::models::common::Point2D;
use std::f64::consts::TAU;

/// 円弧1本あたりの最大分割数
const MAX_ARC_SEGMENTS: usize = 1024;

/// 平坦度の下限（0除算と分割数の暴走を防ぐ）
const MIN_FLATNESS: f64 = 1e-9;

/// 円弧を折れ線で近似した点列を返す（両端点を含む）
///
/// 各弦と円弧の最大距離（サジッタ）が `flatness` 以下になるように分割数を決めます。
///
/// # 引数
///
/// * `center` - 円の中心
/// * `radius` - 半径
/// * `start` - 開始角（ラジアン）
/// * `sweep` - 掃引角（ラジアン、正なら反時計回り）
/// * `flatness` - 許容する弦と円弧のずれ
pub fn arc_points(center: Point2D, radius: f64, start: f64, sweep: f64, flatness: f64) -> Vec<Point2D> {
    let segments = arc_segment_count(radius, sweep.abs(), flatness);
    (0..=segments)
        .map(|i| {
            let angle = start + sweep * (i as f64 / segments as f64);
            center + Point2D::from_polar(radius, angle)
        })
        .collect()
}

/// 円弧の分割数を計算
fn arc_segment_count(radius: f64, sweep: f64, flatness: f64) -> usize {
    if radius <= 0.0 || sweep <= 0.0 {
        return 1;
    }
    let ratio = (flatness.max(MIN_FLATNESS) / radius).min(1.0);
    let max_step = 2.0 * (1.0 - ratio).acos();
    let minimum = if sweep >= TAU { 3 } else { 1 };
    ((sweep / max_step).ceil() as usize).clamp(minimum, MAX_ARC_SEGMENTS)
}

/// 頂点リングの集合で表したセンサーの覆域形状
///
/// 扇形環（扇形から死角扇形を除いた領域）を折れ線近似したものです。
/// 全周の場合は外周リングと内周リングの2本、それ以外は1本のリングを持ちます。
/// リングは閉じ点（先頭点の重複）を含みません。
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub rings: Vec<Vec<Point2D>>,
}

impl Footprint {
    /// 全リングの頂点を走査
    pub fn vertices(&self) -> impl Iterator<Item = &Point2D> {
        self.rings.iter().flatten()
    }

    /// 頂点数
    pub fn vertex_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    /// 重心（頂点集合の平均）
    ///
    /// 頂点が無い場合はNone
    pub fn centroid(&self) -> Option<Point2D> {
        let count = self.vertex_count();
        if count == 0 {
            return None;
        }
        let sum = self
            .vertices()
            .fold(Point2D::origin(), |acc, vertex| acc + *vertex);
        Some(sum * (1.0 / count as f64))
    }

    /// 指定点から最も遠い頂点
    pub fn farthest_vertex_from(&self, point: Point2D) -> Option<Point2D> {
        self.vertices()
            .copied()
            .max_by(|a, b| a.distance(&point).total_cmp(&b.distance(&point)))
    }
}

/// 多角形の辺
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: Point2D,
    pub end: Point2D,
}

impl Edge {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    pub fn midpoint(&self) -> Point2D {
        self.start.midpoint(&self.end)
    }

    pub fn direction(&self) -> Point2D {
        self.end - self.start
    }

    /// 両端点から指定点までの距離の和
    pub fn endpoint_distance_sum(&self, point: Point2D) -> f64 {
        self.start.distance(&point) + self.end.distance(&point)
    }

    /// 指定点から遠い方の端点
    pub fn farthest_endpoint_from(&self, point: Point2D) -> Point2D {
        if self.end.distance(&point) > self.start.distance(&point) {
            self.end
        } else {
            self.start
        }
    }
}

/// 頂点列（閉じ点なし）から辺の列を作る
pub fn polygon_edges(vertices: &[Point2D]) -> Vec<Edge> {
    let n = vertices.len();
    (0..n)
        .map(|i| Edge::new(vertices[i], vertices[(i + 1) % n]))
        .collect()
}

/// 多角形の周長
pub fn polygon_perimeter(vertices: &[Point2D]) -> f64 {
    polygon_edges(vertices).iter().map(Edge::length).sum()
}

/// 符号付き面積（反時計回りなら正）
pub fn signed_area(vertices: &[Point2D]) -> f64 {
    polygon_edges(vertices)
        .iter()
        .map(|edge| edge.start.cross(&edge.end))
        .sum::<f64>()
        / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_arc_points_respects_flatness() {
        let radius = 10.0;
        let flatness = 0.1;
        let points = arc_points(Point2D::origin(), radius, 0.0, FRAC_PI_2, flatness);
        assert!(points.len() >= 3);
        for pair in points.windows(2) {
            let chord_mid = pair[0].midpoint(&pair[1]);
            assert!(radius - chord_mid.magnitude() <= flatness + 1e-9);
        }
        assert_abs_diff_eq!(points[0].x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(points.last().unwrap().y, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_full_circle_has_at_least_three_segments() {
        let points = arc_points(Point2D::origin(), 1.0, 0.0, TAU, 5.0);
        assert!(points.len() >= 4);
    }

    #[test]
    fn test_footprint_centroid_and_farthest_vertex() {
        let footprint = Footprint {
            rings: vec![vec![
                Point2D::new(-1.0, -1.0),
                Point2D::new(1.0, -1.0),
                Point2D::new(1.0, 1.0),
                Point2D::new(-1.0, 1.0),
            ]],
        };
        assert_eq!(footprint.centroid(), Some(Point2D::origin()));
        assert_eq!(
            footprint.farthest_vertex_from(Point2D::new(-0.5, -0.5)),
            Some(Point2D::new(1.0, 1.0))
        );
        assert_eq!(Footprint { rings: vec![] }.centroid(), None);
    }

    #[test]
    fn test_polygon_perimeter_and_orientation() {
        let square = [
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(2.0, 1.0),
            Point2D::new(0.0, 1.0),
        ];
        assert_eq!(polygon_perimeter(&square), 6.0);
        assert_eq!(signed_area(&square), 2.0);
    }
}
