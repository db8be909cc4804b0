use crate::models::{
    body::BodyModel,
    common::{Point2D, Pose},
    sensor::SensorShape,
    traits::{IMovable, Locatable},
};

/// 運動パラメータ（等速・一定旋回）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    /// 速度（m/s）
    pub speed: f64,
    /// 旋回率（rad/s、反時計回りが正）
    pub turn_rate: f64,
}

/// ターゲット標識
///
/// 種名と真偽値の組です。`flagged` が真のときだけターゲットとして扱います。
#[derive(Debug, Clone, PartialEq)]
pub struct TargetMarker {
    pub species: String,
    pub flagged: bool,
}

/// 騒音源（ドローンのローター音など）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSource {
    /// 基準距離での放射音圧レベル（dB）
    pub emitted_db: f64,
    /// 放射レベルを測定した基準距離（メートル）
    pub reference_distance: f64,
    /// 地上からの高度（メートル）
    pub height: f64,
}

/// シミュレーション上のエンティティ
///
/// 能力はすべて型付きの任意コンポーネントとして持ち、
/// 能力の有無はコンポーネントの有無で判定します。
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// 一意識別子
    pub id: String,
    /// 現在の姿勢
    pub pose: Pose,
    /// 運動パラメータ
    pub motion: Motion,
    /// カメラセンサー
    pub camera: Option<SensorShape>,
    /// ターゲット標識
    pub target: Option<TargetMarker>,
    /// 体の輪郭
    pub body: Option<BodyModel>,
    /// 騒音源
    pub noise: Option<NoiseSource>,
}

impl Entity {
    /// コンポーネントを持たないエンティティを作成
    pub fn new(id: String, pose: Pose) -> Self {
        Self {
            id,
            pose,
            motion: Motion::default(),
            camera: None,
            target: None,
            body: None,
            noise: None,
        }
    }

    /// カメラと騒音源を持つドローン
    pub fn drone(id: String, pose: Pose, camera: SensorShape, noise: NoiseSource) -> Self {
        Self {
            camera: Some(camera),
            noise: Some(noise),
            ..Self::new(id, pose)
        }
    }

    /// ターゲット標識と体の輪郭を持つ動物
    pub fn animal(id: String, pose: Pose, marker: TargetMarker, body: BodyModel) -> Self {
        Self {
            target: Some(marker),
            body: Some(body),
            ..Self::new(id, pose)
        }
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    /// ターゲット判定（標識があり、かつ値が真）
    pub fn is_target(&self) -> bool {
        self.target.as_ref().is_some_and(|marker| marker.flagged)
    }

    /// カメラを持つか
    pub fn is_camera(&self) -> bool {
        self.camera.is_some()
    }

    /// 騒音源を持つか
    pub fn is_noise_source(&self) -> bool {
        self.noise.is_some()
    }
}

impl Locatable for Entity {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> Point2D {
        self.pose.position
    }
}

impl IMovable for Entity {
    fn move_agent(&mut self, dt: f64) {
        if self.motion.speed == 0.0 && self.motion.turn_rate == 0.0 {
            return;
        }
        // 向きを更新してから前進
        let heading = self.pose.heading + self.motion.turn_rate * dt;
        let position = self.pose.position + Point2D::from_polar(self.motion.speed * dt, heading);
        self.pose = Pose::new(position, heading);
    }

    fn get_pose(&self) -> Pose {
        self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn zebra(flagged: bool) -> Entity {
        Entity::animal(
            "Z1".to_string(),
            Pose::default(),
            TargetMarker { species: "zebra".to_string(), flagged },
            BodyModel::rectangle(2.0, 1.0).unwrap(),
        )
    }

    #[test]
    fn test_target_predicate_requires_flag() {
        assert!(zebra(true).is_target());
        assert!(!zebra(false).is_target());
        assert!(!Entity::new("X".to_string(), Pose::default()).is_target());
    }

    #[test]
    fn test_move_agent_turns_then_advances() {
        let mut entity = Entity::new("D1".to_string(), Pose::default()).with_motion(Motion {
            speed: 2.0,
            turn_rate: FRAC_PI_2,
        });
        entity.move_agent(1.0);
        assert_abs_diff_eq!(entity.pose.heading, FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(entity.pose.position.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(entity.pose.position.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_stationary_entity_does_not_move() {
        let mut entity = zebra(true);
        let before = entity.get_pose();
        entity.move_agent(10.0);
        assert_eq!(entity.get_pose(), before);
    }
}
