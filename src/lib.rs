//! # dronemetrics
//!
//! ドローン（カメラ搭載の観測者）が地上の動物（ターゲット）を観測する状況で、
//! ターゲットごとの観測品質と騒音の影響を定量化するライブラリです。
//!
//! - `models`: 姿勢・センサー形状・体の輪郭・エンティティ・環境
//! - `metrics`: 体表カバレッジ、視点品質、音響知覚
//! - `scenario`: YAMLシナリオの読み込みと検証
//! - `simulation`: 固定時間刻みのシミュレーションエンジン
//! - `logging`: tracing によるログ出力

pub mod logging;
pub mod metrics;
pub mod models;
pub mod scenario;
pub mod simulation;
