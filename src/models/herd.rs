use crate::models::{
    body::BodyModel,
    common::{math_utils, Point2D, Pose},
    entity::{Entity, Motion, TargetMarker},
};

/// 群れの配置パターンを生成するヘルパー構造体
///
/// 同じ種・同じ体格の動物を同心円リング状に配置して一括生成します。
/// 中心に1頭、その周囲のリングに等角度間隔で配置し、
/// 2本目以降のリングでは半角オフセットを付けられます。
#[derive(Debug, Clone)]
pub struct HerdGroup {
    /// 群れの一意識別子
    pub id: String,
    /// 種名（ターゲット標識に使われる）
    pub species: String,
    /// 配置の中心位置
    pub center: Point2D,
    /// 群れの頭数
    pub count: u32,
    /// リング間の間隔（メートル）
    pub ring_spacing: f64,
    /// 配置開始角度（度）
    pub start_angle_deg: f64,
    /// 外側リングで半角オフセットを使用するか
    pub ring_half_offset: bool,
    /// 群れ全体の向き（ラジアン）
    pub heading: f64,
    /// 群れの運動パラメータ
    pub motion: Motion,
    /// 個体の体の輪郭
    pub body: BodyModel,
    /// ターゲットとして扱うか
    pub flagged: bool,
}

impl HerdGroup {
    /// 群れの `index` 番目（0始まり）の個体ID
    pub fn animal_id(herd_id: &str, index: usize) -> String {
        format!("{}_A{:03}", herd_id, index + 1)
    }

    /// 群れ内の個体配置位置を計算
    ///
    /// # 戻り値
    ///
    /// 各個体の配置位置のベクター（中心が先頭）
    pub fn generate_positions(&self) -> Vec<Point2D> {
        let mut positions = Vec::with_capacity(self.count as usize);
        let mut remaining = self.count as usize;
        if remaining == 0 {
            return positions;
        }

        positions.push(self.center);
        remaining -= 1;

        let mut ring_index = 1usize;
        while remaining > 0 {
            let ring_radius = ring_index as f64 * self.ring_spacing;
            let capacity = ((std::f64::consts::TAU * ring_index as f64) as usize).max(1);
            let in_ring = remaining.min(capacity);

            let angle_step = 360.0 / in_ring as f64;
            let angle_offset = if self.ring_half_offset && ring_index > 1 {
                angle_step / 2.0
            } else {
                0.0
            };

            for i in 0..in_ring {
                let angle = self.start_angle_deg + i as f64 * angle_step + angle_offset;
                positions.push(self.center + Point2D::from_polar(ring_radius, math_utils::deg_to_rad(angle)));
            }

            remaining -= in_ring;
            ring_index += 1;
        }

        positions
    }

    /// 群れ内の全個体を生成
    pub fn generate_animals(&self) -> Vec<Entity> {
        self.generate_positions()
            .into_iter()
            .enumerate()
            .map(|(index, position)| {
                Entity::animal(
                    Self::animal_id(&self.id, index),
                    Pose::new(position, self.heading),
                    TargetMarker {
                        species: self.species.clone(),
                        flagged: self.flagged,
                    },
                    self.body,
                )
                .with_motion(self.motion)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn herd(count: u32) -> HerdGroup {
        HerdGroup {
            id: "H1".to_string(),
            species: "zebra".to_string(),
            center: Point2D::new(50.0, -20.0),
            count,
            ring_spacing: 4.0,
            start_angle_deg: 0.0,
            ring_half_offset: true,
            heading: 0.0,
            motion: Motion::default(),
            body: BodyModel::rectangle(2.0, 1.0).unwrap(),
            flagged: true,
        }
    }

    #[test]
    fn test_generate_positions_fills_rings() {
        let positions = herd(10).generate_positions();
        assert_eq!(positions.len(), 10);
        assert_eq!(positions[0], Point2D::new(50.0, -20.0));
        // 1本目のリングは6頭まで
        for position in &positions[1..7] {
            assert_abs_diff_eq!(position.distance(&positions[0]), 4.0, epsilon = 1e-9);
        }
        for position in &positions[7..] {
            assert_abs_diff_eq!(position.distance(&positions[0]), 8.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_empty_herd() {
        assert!(herd(0).generate_positions().is_empty());
    }

    #[test]
    fn test_generated_animals_are_targets_with_ids() {
        let animals = herd(3).generate_animals();
        assert_eq!(animals.len(), 3);
        assert_eq!(animals[2].id, "H1_A003");
        assert!(animals.iter().all(Entity::is_target));
        assert!(animals.iter().all(|animal| animal.body.is_some()));
    }
}
