use std::f64::consts::TAU;
use thiserror::Error;

use crate::models::{
    common::{Point2D, Pose},
    geometry::{polygon_edges, polygon_perimeter, Edge},
};

/// 体の輪郭モデルの構成エラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BodyError {
    #[error("体長・体幅は正の有限値でなければなりません: length={length}, width={width}")]
    InvalidDimensions { length: f64, width: f64 },
    #[error("輪郭多角形には3頂点以上が必要です: {0}")]
    DegeneratePolygon(usize),
}

/// 輪郭の近似方法
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyOutline {
    /// 長方形（4頂点）
    Rectangle,
    /// 楕円を正多角形的に近似（頂点数指定）
    Ellipse { segments: usize },
}

/// ターゲットの体の寸法と輪郭
///
/// 体長は向きの軸（ボディ座標系のx軸）、体幅はそれに直交する軸に沿います。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyModel {
    pub length: f64,
    pub width: f64,
    pub outline: BodyOutline,
}

impl BodyModel {
    pub fn new(length: f64, width: f64, outline: BodyOutline) -> Result<Self, BodyError> {
        let valid = |value: f64| value.is_finite() && value > 0.0;
        if !valid(length) || !valid(width) {
            return Err(BodyError::InvalidDimensions { length, width });
        }
        if let BodyOutline::Ellipse { segments } = outline {
            if segments < 3 {
                return Err(BodyError::DegeneratePolygon(segments));
            }
        }
        Ok(Self { length, width, outline })
    }

    pub fn rectangle(length: f64, width: f64) -> Result<Self, BodyError> {
        Self::new(length, width, BodyOutline::Rectangle)
    }

    pub fn ellipse(length: f64, width: f64, segments: usize) -> Result<Self, BodyError> {
        Self::new(length, width, BodyOutline::Ellipse { segments })
    }

    /// 多角形の頂点数（＝辺の数）
    pub fn vertex_count(&self) -> usize {
        match self.outline {
            BodyOutline::Rectangle => 4,
            BodyOutline::Ellipse { segments } => segments,
        }
    }

    /// 姿勢に合わせて配置した輪郭多角形を作る
    pub fn polygon(&self, pose: &Pose) -> BodyPolygon {
        let half_length = self.length / 2.0;
        let half_width = self.width / 2.0;
        let local: Vec<Point2D> = match self.outline {
            BodyOutline::Rectangle => vec![
                Point2D::new(half_length, -half_width),
                Point2D::new(half_length, half_width),
                Point2D::new(-half_length, half_width),
                Point2D::new(-half_length, -half_width),
            ],
            BodyOutline::Ellipse { segments } => (0..segments)
                .map(|i| {
                    let angle = TAU * i as f64 / segments as f64;
                    Point2D::new(half_length * angle.cos(), half_width * angle.sin())
                })
                .collect(),
        };

        BodyPolygon {
            vertices: local.into_iter().map(|point| pose.to_world(point)).collect(),
        }
    }
}

/// ワールド座標系に配置した体の輪郭（反時計回り、閉じ点なし）
#[derive(Debug, Clone, PartialEq)]
pub struct BodyPolygon {
    pub vertices: Vec<Point2D>,
}

impl BodyPolygon {
    pub fn edges(&self) -> Vec<Edge> {
        polygon_edges(&self.vertices)
    }

    pub fn perimeter(&self) -> f64 {
        polygon_perimeter(&self.vertices)
    }
}
