use std::ops::{Add, Mul, Sub};

/// 2次元平面上の点（またはベクトル）を表す構造体
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64, // m
    pub y: f64, // m
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 原点
    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    /// 2点間の距離を計算
    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// ベクトルの長さ（原点からの距離）
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// 内積
    pub fn dot(&self, other: &Point2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 外積のz成分（反時計回りなら正）
    pub fn cross(&self, other: &Point2D) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// 原点まわりに回転（ラジアン、反時計回り）
    pub fn rotated(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// +x軸からの方位角（ラジアン）
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// 2点の中点
    pub fn midpoint(&self, other: &Point2D) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// 角度と長さから作るベクトル
    pub fn from_polar(radius: f64, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(radius * cos, radius * sin)
    }
}

impl Add for Point2D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

/// 位置と向き
///
/// 向きは+x軸から反時計回りのラジアンで統一します。
/// シナリオファイルの度数表記は読み込み時に一度だけ変換されます。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Point2D,
    /// 向き（ラジアン）
    pub heading: f64,
}

impl Pose {
    pub fn new(position: Point2D, heading: f64) -> Self {
        Self { position, heading }
    }

    /// ローカル座標系の点をワールド座標系に変換（回転してから平行移動）
    pub fn to_world(&self, local: Point2D) -> Point2D {
        local.rotated(self.heading) + self.position
    }

    /// ワールド座標系の点をローカル座標系に変換
    pub fn to_local(&self, world: Point2D) -> Point2D {
        (world - self.position).rotated(-self.heading)
    }
}

/// 数学ユーティリティ関数
pub mod math_utils {
    use super::Point2D;
    use std::f64::consts::{PI, TAU};

    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * PI / 180.0
    }

    /// ラジアンを度に変換
    pub fn rad_to_deg(radians: f64) -> f64 {
        radians * 180.0 / PI
    }

    /// 角度を(-π, π]の範囲に正規化
    pub fn normalize_angle(angle: f64) -> f64 {
        let mut normalized = angle % TAU;
        if normalized > PI {
            normalized -= TAU;
        } else if normalized <= -PI {
            normalized += TAU;
        }
        normalized
    }

    /// 2つの角度の差を計算（(-π, π]の範囲）
    pub fn angle_difference(from: f64, to: f64) -> f64 {
        normalize_angle(to - from)
    }

    /// 2ベクトルのなす角（[0, π]）
    ///
    /// どちらかが零ベクトルの場合は0を返します。
    pub fn angle_between(a: Point2D, b: Point2D) -> f64 {
        if a.magnitude() == 0.0 || b.magnitude() == 0.0 {
            return 0.0;
        }
        a.cross(&b).abs().atan2(a.dot(&b))
    }
}
