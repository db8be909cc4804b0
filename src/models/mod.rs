// 基本的なデータ型と数学ユーティリティ
pub mod common;

// 平面幾何（円弧近似・覆域形状・辺）
pub mod geometry;

// エンティティと環境の基本インターフェース（trait）定義
pub mod traits;

// 各モデルの実装
pub mod sensor;
pub mod body;
pub mod entity;
pub mod herd;
pub mod world;
pub mod capture;

// 便利な re-export
pub use common::*;
pub use geometry::{Edge, Footprint};
pub use traits::*;
pub use sensor::{PlacedSector, Sector, SensorError, SensorShape, DEFAULT_FLATNESS};
pub use body::{BodyError, BodyModel, BodyOutline, BodyPolygon};
pub use entity::{Entity, Motion, NoiseSource, TargetMarker};
pub use herd::HerdGroup;
pub use world::World;
pub use capture::{CaptureSnapshot, ObserverView, VisibilityCapture, VisibleObservation};
