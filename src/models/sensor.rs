use std::collections::HashSet;
use std::f64::consts::{PI, TAU};
use thiserror::Error;

use crate::models::{
    common::{math_utils, Point2D, Pose},
    geometry::{arc_points, Footprint},
    traits::Locatable,
};

/// センサー形状の構成エラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    #[error("死角半径 {blind_spot_radius} が視野半径 {fov_radius} を超えています")]
    BlindSpotExceedsFov { blind_spot_radius: f64, fov_radius: f64 },
    #[error("半径は0以上の有限値でなければなりません: {0}")]
    InvalidRadius(f64),
    #[error("開口角は(0, 2π]の範囲でなければなりません: {0} rad")]
    InvalidAperture(f64),
    #[error("平坦度は正の有限値でなければなりません: {0}")]
    InvalidFlatness(f64),
}

/// 覆域形状の円弧近似の既定の平坦度（メートル）
pub const DEFAULT_FLATNESS: f64 = 0.1;

/// 観測者を頂点とする扇形（ローカル座標系、向き0）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    /// 半径（メートル）
    pub radius: f64,
    /// 開口角（ラジアン、向きに対して左右対称）
    pub aperture: f64,
}

impl Sector {
    pub fn new(radius: f64, aperture: f64) -> Self {
        Self { radius, aperture }
    }

    /// 全周（円）かどうか
    pub fn is_full_circle(&self) -> bool {
        self.aperture >= TAU
    }

    /// 観測者の姿勢に合わせて配置した扇形を返す
    pub fn placed(&self, pose: &Pose) -> PlacedSector {
        PlacedSector {
            apex: pose.position,
            heading: pose.heading,
            radius: self.radius,
            half_aperture: self.aperture / 2.0,
        }
    }
}

/// ワールド座標系に配置済みの扇形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedSector {
    pub apex: Point2D,
    pub heading: f64,
    pub radius: f64,
    pub half_aperture: f64,
}

impl PlacedSector {
    /// 点が扇形に含まれるか（境界を含む）
    ///
    /// 頂点そのものは半径0でもすべての扇形に含まれます。
    pub fn contains(&self, point: Point2D) -> bool {
        let offset = point - self.apex;
        let distance = offset.magnitude();
        if distance > self.radius {
            return false;
        }
        if distance == 0.0 || self.half_aperture >= PI {
            return true;
        }
        math_utils::angle_difference(self.heading, offset.angle()).abs() <= self.half_aperture
    }
}

/// 死角付き視野を持つカメラセンサーの形状
///
/// 固定パラメータ（死角半径、視野半径、開口角）だけを保持し、
/// 扇形環の領域は問い合わせのたびに観測者の姿勢から求めます。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorShape {
    fov: Sector,
    blind_spot: Sector,
    flatness: f64,
}

impl SensorShape {
    /// 新しいセンサー形状を作成
    ///
    /// # 引数
    ///
    /// * `blind_spot_radius` - 死角半径（メートル）
    /// * `fov_radius` - 視野半径（メートル）
    /// * `aperture` - 開口角（ラジアン）
    ///
    /// # 戻り値
    ///
    /// `0 ≤ blind_spot_radius ≤ fov_radius` を満たさない場合はエラー
    pub fn new(blind_spot_radius: f64, fov_radius: f64, aperture: f64) -> Result<Self, SensorError> {
        for radius in [blind_spot_radius, fov_radius] {
            if !radius.is_finite() || radius < 0.0 {
                return Err(SensorError::InvalidRadius(radius));
            }
        }
        if blind_spot_radius > fov_radius {
            return Err(SensorError::BlindSpotExceedsFov { blind_spot_radius, fov_radius });
        }
        if !aperture.is_finite() || aperture <= 0.0 || aperture > TAU {
            return Err(SensorError::InvalidAperture(aperture));
        }
        Ok(Self {
            fov: Sector::new(fov_radius, aperture),
            blind_spot: Sector::new(blind_spot_radius, aperture),
            flatness: DEFAULT_FLATNESS,
        })
    }

    /// 覆域形状の平坦度を変更
    pub fn with_flatness(mut self, flatness: f64) -> Result<Self, SensorError> {
        if !(flatness.is_finite() && flatness > 0.0) {
            return Err(SensorError::InvalidFlatness(flatness));
        }
        self.flatness = flatness;
        Ok(self)
    }

    pub fn blind_spot_radius(&self) -> f64 {
        self.blind_spot.radius
    }

    pub fn fov_radius(&self) -> f64 {
        self.fov.radius
    }

    pub fn aperture(&self) -> f64 {
        self.fov.aperture
    }

    pub fn flatness(&self) -> f64 {
        self.flatness
    }

    /// 点が視野内かつ死角外にあるか
    pub fn contains(&self, pose: &Pose, point: Point2D) -> bool {
        self.fov.placed(pose).contains(point) && !self.blind_spot.placed(pose).contains(point)
    }

    /// 視野内にいる候補から死角内の候補を差し引いたIDの列を返す
    ///
    /// 結果は候補の並び順を保ちます。
    pub fn influential_nodes<T: Locatable>(&self, pose: &Pose, candidates: &[T]) -> Vec<String> {
        let fov = self.fov.placed(pose);
        let blind_spot = self.blind_spot.placed(pose);

        let in_blind_spot: HashSet<&str> = candidates
            .iter()
            .filter(|candidate| blind_spot.contains(candidate.position()))
            .map(|candidate| candidate.id())
            .collect();

        candidates
            .iter()
            .filter(|candidate| fov.contains(candidate.position()))
            .filter(|candidate| !in_blind_spot.contains(candidate.id()))
            .map(|candidate| candidate.id().to_string())
            .collect()
    }

    /// このカメラ自身の平坦度で近似した覆域形状
    pub fn coverage_outline(&self, pose: &Pose) -> Footprint {
        self.footprint(pose, self.flatness)
    }

    /// 扇形環をワールド座標系の頂点リングで近似した形状
    ///
    /// # 引数
    ///
    /// * `pose` - 観測者の姿勢
    /// * `flatness` - 円弧と弦の許容ずれ（メートル）
    pub fn footprint(&self, pose: &Pose, flatness: f64) -> Footprint {
        let center = pose.position;
        let outer = self.fov.radius;
        let inner = self.blind_spot.radius;

        if self.fov.is_full_circle() {
            let mut rings = vec![full_ring(center, outer, pose.heading, flatness)];
            if inner > 0.0 {
                rings.push(full_ring(center, inner, pose.heading, flatness));
            }
            return Footprint { rings };
        }

        let start = pose.heading - self.fov.aperture / 2.0;
        let mut ring = arc_points(center, outer, start, self.fov.aperture, flatness);
        if inner > 0.0 {
            let mut inner_arc = arc_points(center, inner, start, self.fov.aperture, flatness);
            inner_arc.reverse();
            ring.extend(inner_arc);
        } else {
            ring.push(center);
        }
        Footprint { rings: vec![ring] }
    }
}

/// 閉じ点を除いた全周リング
fn full_ring(center: Point2D, radius: f64, start: f64, flatness: f64) -> Vec<Point2D> {
    let mut ring = arc_points(center, radius, start, TAU, flatness);
    ring.pop();
    ring
}
