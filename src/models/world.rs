use crate::models::{
    entity::Entity,
    traits::{IMovable, PlanarEnvironment},
};

/// 全エンティティを保持する2次元の世界
///
/// 1ステップの指標評価の間は読み取り専用のスナップショットとして扱われます。
#[derive(Debug, Clone, Default)]
pub struct World {
    entities: Vec<Entity>,
}

impl World {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// 全エンティティを移動
    pub fn advance(&mut self, dt: f64) {
        for entity in &mut self.entities {
            entity.move_agent(dt);
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// カメラを持つエンティティの数
    pub fn camera_count(&self) -> usize {
        self.entities.iter().filter(|entity| entity.is_camera()).count()
    }

    /// 騒音源を持つエンティティの数
    pub fn noise_source_count(&self) -> usize {
        self.entities.iter().filter(|entity| entity.is_noise_source()).count()
    }
}

impl PlanarEnvironment for World {
    fn entities(&self) -> &[Entity] {
        &self.entities
    }
}
