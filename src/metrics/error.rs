use thiserror::Error;

/// 指標計算のエラー
///
/// どれも入力データの問題ではなく、構成の欠落か幾何計算の不具合を示すため、
/// 呼び出し側で回復せずにそのまま伝播させます。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetricError {
    #[error("可視辺の数 {found} が輪郭の辺の数 {limit} を超えました")]
    TooManyEdges { found: usize, limit: usize },
    #[error("視点品質 {value} が許容範囲 [-{tolerance}, 1+{tolerance}] を外れました")]
    QualityOutOfRange { value: f64, tolerance: f64 },
    #[error("カメラ覆域の形状に頂点がありません")]
    EmptyFootprint,
    #[error("カメラ覆域の最遠頂点が重心と一致しています")]
    DegenerateFootprint,
    #[error("値 {value} が範囲 [{min}, {max}] を外れました")]
    ValueOutOfRange { value: f64, min: f64, max: f64 },
    #[error("エンティティ {entity} に必要なコンポーネント {component} がありません")]
    MissingComponent { entity: String, component: &'static str },
}
