use crate::models::{
    common::{Point2D, Pose},
    entity::Entity,
};

/// 位置を持ち、IDで識別できるもの
///
/// センサー形状の影響ノード問い合わせの候補になります。
pub trait Locatable {
    /// 一意識別子
    fn id(&self) -> &str;

    /// 現在位置
    fn position(&self) -> Point2D;
}

/// 移動可能なエンティティのインターフェース
pub trait IMovable {
    /// 移動処理
    fn move_agent(&mut self, dt: f64);

    /// 現在の姿勢の取得
    fn get_pose(&self) -> Pose;
}

/// 2次元平面の環境インターフェース
///
/// 指標計算が必要とする位置と向きのスナップショットを提供します。
/// 1回の評価の間、返される値は変化してはいけません。
pub trait PlanarEnvironment {
    /// 全エンティティ
    fn entities(&self) -> &[Entity];

    /// IDからエンティティを取得
    fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities().iter().find(|entity| entity.id == id)
    }

    /// エンティティの位置
    fn position(&self, id: &str) -> Option<Point2D> {
        self.entity(id).map(|entity| entity.pose.position)
    }

    /// エンティティの向き（ラジアン）
    fn heading(&self, id: &str) -> Option<f64> {
        self.entity(id).map(|entity| entity.pose.heading)
    }

    /// エンティティの姿勢
    fn pose(&self, id: &str) -> Option<Pose> {
        self.entity(id).map(|entity| entity.pose)
    }

    /// 判定対象（ターゲット）のエンティティ
    fn targets(&self) -> Vec<&Entity> {
        self.entities().iter().filter(|entity| entity.is_target()).collect()
    }
}
