use crate::models::{
    common::{Point2D, Pose},
    sensor::SensorShape,
    traits::PlanarEnvironment,
};

/// 可視観測
///
/// あるステップで観測者がエンティティを見ていたことを表す一時的な関連付けです。
/// ステップをまたいで保持されることはありません。
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleObservation {
    /// 観測者（ドローン）のID
    pub observer_id: String,
    /// 観測されたエンティティのID
    pub target_id: String,
    /// 観測者の位置
    pub observer_position: Point2D,
    /// 観測者の向き（ラジアン）
    pub observer_heading: f64,
    /// 取得時点の観測対象の位置
    pub target_position: Point2D,
}

/// 1台の観測者が現在見ているエンティティの一覧
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverView {
    pub observer_id: String,
    pub observer_pose: Pose,
    pub shape: SensorShape,
    pub visible: Vec<VisibleObservation>,
}

impl ObserverView {
    /// 指定IDのエンティティを見ているか
    pub fn sees(&self, target_id: &str) -> bool {
        self.visible.iter().any(|observation| observation.target_id == target_id)
    }
}

/// 1ステップ分の可視性スナップショット
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureSnapshot {
    pub views: Vec<ObserverView>,
}

impl CaptureSnapshot {
    /// 指定ターゲットを見ている観測者の一覧
    pub fn observers_of(&self, target_id: &str) -> Vec<&ObserverView> {
        self.views.iter().filter(|view| view.sees(target_id)).collect()
    }

    /// 全観測者の可視観測の総数
    pub fn observation_count(&self) -> usize {
        self.views.iter().map(|view| view.visible.len()).sum()
    }
}

/// カメラによる可視エンティティの取得処理
///
/// ステップごとに1回、カメラを持つ全エンティティについて
/// センサー形状の影響ノードを求め、「現在見えている」一覧を作ります。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityCapture {
    /// ターゲット判定で絞り込むか
    pub targets_only: bool,
}

impl Default for VisibilityCapture {
    fn default() -> Self {
        Self { targets_only: true }
    }
}

impl VisibilityCapture {
    pub fn new(targets_only: bool) -> Self {
        Self { targets_only }
    }

    /// 環境のスナップショットから可視一覧を作成
    pub fn capture<E: PlanarEnvironment>(&self, environment: &E) -> CaptureSnapshot {
        let entities = environment.entities();
        let views = entities
            .iter()
            .filter_map(|observer| observer.camera.map(|shape| (observer, shape)))
            .map(|(observer, shape)| {
                let visible = shape
                    .influential_nodes(&observer.pose, entities)
                    .into_iter()
                    .filter(|id| *id != observer.id)
                    .filter_map(|id| environment.entity(&id))
                    .filter(|seen| !self.targets_only || seen.is_target())
                    .map(|seen| VisibleObservation {
                        observer_id: observer.id.clone(),
                        target_id: seen.id.clone(),
                        observer_position: observer.pose.position,
                        observer_heading: observer.pose.heading,
                        target_position: seen.pose.position,
                    })
                    .collect();

                ObserverView {
                    observer_id: observer.id.clone(),
                    observer_pose: observer.pose,
                    shape,
                    visible,
                }
            })
            .collect();

        CaptureSnapshot { views }
    }
}
