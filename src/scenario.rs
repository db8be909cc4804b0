use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::metrics::{
    acoustic::AcousticMetric,
    normalization::Sigmoid,
    suite::{MetricNames, MetricSuite},
    view_quality::ViewQualityMetric,
};
use crate::models::{
    body::{BodyError, BodyModel, BodyOutline},
    capture::VisibilityCapture,
    common::{math_utils::deg_to_rad, Point2D, Pose},
    entity::{Entity, Motion, NoiseSource},
    herd::HerdGroup,
    sensor::{SensorError, SensorShape, DEFAULT_FLATNESS},
    world::World,
};

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub dt_s: f64,
    pub t_max_s: f64,
    /// 最大ステップ数（安全上限）
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
}

fn default_max_steps() -> u64 {
    10_000
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position2D {
    pub x_m: f64,
    pub y_m: f64,
}

impl From<Position2D> for Point2D {
    fn from(position: Position2D) -> Self {
        Point2D::new(position.x_m, position.y_m)
    }
}

/// カメラセンサー設定
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SensorConfig {
    #[serde(default)]
    pub blind_spot_radius_m: f64,
    pub fov_radius_m: f64,
    pub aperture_deg: f64,
    /// 覆域形状の円弧近似の平坦度（カメラごと）
    #[serde(default = "default_flatness")]
    pub flatness_m: f64,
}

fn default_flatness() -> f64 {
    DEFAULT_FLATNESS
}

impl SensorConfig {
    pub fn to_shape(&self) -> Result<SensorShape, SensorError> {
        // 360度は丸め誤差なしで全周にする
        let aperture = if self.aperture_deg == 360.0 {
            std::f64::consts::TAU
        } else {
            deg_to_rad(self.aperture_deg)
        };
        SensorShape::new(self.blind_spot_radius_m, self.fov_radius_m, aperture)?.with_flatness(self.flatness_m)
    }
}

/// 体の輪郭の種類
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyShapeKind {
    Rectangle,
    Ellipse,
}

/// 体の寸法設定
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct BodyConfig {
    pub length_m: f64,
    pub width_m: f64,
    #[serde(default = "default_body_shape")]
    pub shape: BodyShapeKind,
    /// 楕円近似の頂点数
    #[serde(default = "default_ellipse_segments")]
    pub segments: usize,
}

fn default_body_shape() -> BodyShapeKind {
    BodyShapeKind::Rectangle
}

fn default_ellipse_segments() -> usize {
    16
}

impl BodyConfig {
    pub fn to_model(&self) -> Result<BodyModel, BodyError> {
        let outline = match self.shape {
            BodyShapeKind::Rectangle => BodyOutline::Rectangle,
            BodyShapeKind::Ellipse => BodyOutline::Ellipse { segments: self.segments },
        };
        BodyModel::new(self.length_m, self.width_m, outline)
    }
}

/// 音響設定
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct AcousticConfig {
    /// 基準距離での放射音圧レベル
    pub emitted_db: f64,
    #[serde(default = "default_reference_distance")]
    pub reference_distance_m: f64,
    /// ドローンの飛行高度
    pub source_height_m: f64,
    #[serde(default)]
    pub hearing_threshold_db: f64,
    /// 妨害スコアの上限レベル（未指定なら妨害スコアなし）
    #[serde(default)]
    pub max_level_db: Option<f64>,
}

fn default_reference_distance() -> f64 {
    1.0
}

impl AcousticConfig {
    pub fn to_noise_source(&self) -> NoiseSource {
        NoiseSource {
            emitted_db: self.emitted_db,
            reference_distance: self.reference_distance_m,
            height: self.source_height_m,
        }
    }
}

/// 指標設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub names: MetricNames,
    #[serde(default)]
    pub coverage_when_not_covered: f64,
    #[serde(default)]
    pub quality_when_not_covered: f64,
    /// 視点品質のシグモイド正規化
    #[serde(default)]
    pub view_quality_sigmoid: Option<Sigmoid>,
    /// 可視判定をターゲットに限定するか
    #[serde(default = "default_targets_only")]
    pub targets_only: bool,
}

fn default_targets_only() -> bool {
    true
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            names: MetricNames::default(),
            coverage_when_not_covered: 0.0,
            quality_when_not_covered: 0.0,
            view_quality_sigmoid: None,
            targets_only: default_targets_only(),
        }
    }
}

/// ドローン設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DroneConfig {
    pub id: String,
    pub position: Position2D,
    #[serde(default)]
    pub heading_deg: f64,
    #[serde(default)]
    pub speed_mps: f64,
    #[serde(default)]
    pub turn_rate_deg_s: f64,
    /// 個別のセンサー設定（未指定なら共通設定）
    #[serde(default)]
    pub sensor: Option<SensorConfig>,
}

/// 群れ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HerdConfig {
    pub id: String,
    pub species: String,
    pub center: Position2D,
    pub count: u32,
    pub ring_spacing_m: f64,
    #[serde(default)]
    pub start_angle_deg: f64,
    #[serde(default)]
    pub ring_half_offset: bool,
    #[serde(default)]
    pub heading_deg: f64,
    #[serde(default)]
    pub speed_mps: f64,
    #[serde(default)]
    pub turn_rate_deg_s: f64,
    /// ターゲットとして扱うか
    #[serde(default = "default_flagged")]
    pub flagged: bool,
    /// 個別の体の寸法（未指定なら共通設定）
    #[serde(default)]
    pub body: Option<BodyConfig>,
}

fn default_flagged() -> bool {
    true
}

/// 完全なシナリオ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub sensor: SensorConfig,
    pub body: BodyConfig,
    pub acoustic: AcousticConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub drones: Vec<DroneConfig>,
    #[serde(default)]
    pub herds: Vec<HerdConfig>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::IoError {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ScenarioConfig =
            serde_yaml::from_str(&contents).map_err(|source| ScenarioError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の検証
    ///
    /// NaN と無限大も不正値として扱います。
    pub fn validate(&self) -> Result<(), ScenarioError> {
        // 時間設定の検証
        require_positive("dt_s", self.sim.dt_s)?;
        require_positive("t_max_s", self.sim.t_max_s)?;
        if self.sim.max_steps == 0 {
            return Err(ScenarioError::ValidationError("max_steps must be positive".to_string()));
        }

        // センサー・体形状（構築できることを確認）
        self.sensor.to_shape()?;
        self.body.to_model()?;

        // 音響設定の検証
        let acoustic = &self.acoustic;
        require_finite("emitted_db", acoustic.emitted_db)?;
        require_positive("source_height_m", acoustic.source_height_m)?;
        require_positive("reference_distance_m", acoustic.reference_distance_m)?;
        if !(acoustic.hearing_threshold_db.is_finite() && acoustic.hearing_threshold_db >= 0.0) {
            return Err(ScenarioError::ValidationError(format!(
                "hearing_threshold_db must be a non-negative finite value: {}",
                acoustic.hearing_threshold_db
            )));
        }
        if let Some(max_level) = acoustic.max_level_db {
            require_positive("max_level_db", max_level)?;
        }

        let metrics = &self.metrics;
        require_finite("coverage_when_not_covered", metrics.coverage_when_not_covered)?;
        require_finite("quality_when_not_covered", metrics.quality_when_not_covered)?;
        if let Some(sigmoid) = &metrics.view_quality_sigmoid {
            if !(sigmoid.midpoint > 0.0 && sigmoid.midpoint < 1.0) {
                return Err(ScenarioError::ValidationError(format!(
                    "sigmoid midpoint {} must be in (0, 1)",
                    sigmoid.midpoint
                )));
            }
            require_positive("sigmoid steepness", sigmoid.steepness)?;
        }

        // IDの重複チェック（生成される個体IDを含む）
        let mut ids = HashSet::new();
        let mut claim = |id: String| {
            if ids.insert(id.clone()) {
                Ok(())
            } else {
                Err(ScenarioError::ValidationError(format!("Duplicate id: {}", id)))
            }
        };
        for drone in &self.drones {
            claim(drone.id.clone())?;
            require_finite("drone position", drone.position.x_m)?;
            require_finite("drone position", drone.position.y_m)?;
            require_finite("drone heading_deg", drone.heading_deg)?;
            require_finite("drone speed_mps", drone.speed_mps)?;
            require_finite("drone turn_rate_deg_s", drone.turn_rate_deg_s)?;
            if let Some(sensor) = &drone.sensor {
                sensor.to_shape()?;
            }
        }
        for herd in &self.herds {
            claim(herd.id.clone())?;
            for index in 0..herd.count as usize {
                claim(HerdGroup::animal_id(&herd.id, index))?;
            }
            require_positive(&format!("Herd {} ring_spacing_m", herd.id), herd.ring_spacing_m)?;
            require_finite("herd center", herd.center.x_m)?;
            require_finite("herd center", herd.center.y_m)?;
            require_finite("herd start_angle_deg", herd.start_angle_deg)?;
            require_finite("herd heading_deg", herd.heading_deg)?;
            require_finite("herd speed_mps", herd.speed_mps)?;
            require_finite("herd turn_rate_deg_s", herd.turn_rate_deg_s)?;
            if let Some(body) = &herd.body {
                body.to_model()?;
            }
        }

        Ok(())
    }

    /// ドローンの生成
    pub fn build_drones(&self) -> Result<Vec<Entity>, ScenarioError> {
        let noise = self.acoustic.to_noise_source();
        self.drones
            .iter()
            .map(|drone| {
                let camera = drone.sensor.as_ref().unwrap_or(&self.sensor).to_shape()?;
                let pose = Pose::new(drone.position.into(), deg_to_rad(drone.heading_deg));
                Ok(Entity::drone(drone.id.clone(), pose, camera, noise).with_motion(Motion {
                    speed: drone.speed_mps,
                    turn_rate: deg_to_rad(drone.turn_rate_deg_s),
                }))
            })
            .collect()
    }

    /// 群れの生成
    pub fn build_herds(&self) -> Result<Vec<HerdGroup>, ScenarioError> {
        self.herds
            .iter()
            .map(|herd| {
                let body = herd.body.as_ref().unwrap_or(&self.body).to_model()?;
                Ok(HerdGroup {
                    id: herd.id.clone(),
                    species: herd.species.clone(),
                    center: herd.center.into(),
                    count: herd.count,
                    ring_spacing: herd.ring_spacing_m,
                    start_angle_deg: herd.start_angle_deg,
                    ring_half_offset: herd.ring_half_offset,
                    heading: deg_to_rad(herd.heading_deg),
                    motion: Motion {
                        speed: herd.speed_mps,
                        turn_rate: deg_to_rad(herd.turn_rate_deg_s),
                    },
                    body,
                    flagged: herd.flagged,
                })
            })
            .collect()
    }

    /// 初期状態の世界を構築
    pub fn build_world(&self) -> Result<World, ScenarioError> {
        let mut world = World::new(self.build_drones()?);
        for herd in self.build_herds()? {
            for animal in herd.generate_animals() {
                world.add_entity(animal);
            }
        }
        Ok(world)
    }

    /// 指標計算器一式
    pub fn metric_suite(&self) -> MetricSuite {
        MetricSuite {
            coverage_when_not_covered: self.metrics.coverage_when_not_covered,
            quality_when_not_covered: self.metrics.quality_when_not_covered,
            view_quality: ViewQualityMetric::new(self.metrics.view_quality_sigmoid),
            acoustic: AcousticMetric::new(self.acoustic.hearing_threshold_db),
            max_noise_level: self.acoustic.max_level_db,
        }
    }

    /// 可視性取得の設定
    pub fn visibility_capture(&self) -> VisibilityCapture {
        VisibilityCapture::new(self.metrics.targets_only)
    }

    /// 全群れの総頭数
    pub fn total_animals(&self) -> u32 {
        self.herds.iter().map(|herd| herd.count).sum()
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!("最大時間: {:.1}秒 ({:.1}分)", self.sim.t_max_s, self.sim.t_max_s / 60.0);
        println!("最大ステップ数: {}", self.sim.max_steps);
        println!();

        println!("=== カメラ ===");
        println!(
            "視野半径: {:.1}m / 死角半径: {:.1}m / 開口角: {:.1}度",
            self.sensor.fov_radius_m, self.sensor.blind_spot_radius_m, self.sensor.aperture_deg
        );
        println!("ドローン: {}機", self.drones.len());
        for drone in &self.drones {
            println!(
                "  {}: ({:.1}, {:.1}) 向き {:.1}度 速度 {:.1}m/s",
                drone.id, drone.position.x_m, drone.position.y_m, drone.heading_deg, drone.speed_mps
            );
        }
        println!();

        println!("=== 音響 ===");
        println!(
            "放射レベル: {:.1}dB (基準距離 {:.1}m) / 飛行高度: {:.1}m / 聴覚閾値: {:.1}dB",
            self.acoustic.emitted_db,
            self.acoustic.reference_distance_m,
            self.acoustic.source_height_m,
            self.acoustic.hearing_threshold_db
        );
        println!();

        println!("=== 群れ ===");
        println!("群れ数: {}", self.herds.len());
        println!("総頭数: {}頭", self.total_animals());
        for herd in &self.herds {
            println!("  {} ({}): {}頭", herd.id, herd.species, herd.count);
        }
    }
}

/// 正の有限値であることを確認
fn require_positive(field: &str, value: f64) -> Result<(), ScenarioError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ScenarioError::ValidationError(format!(
            "{} must be a positive finite value: {}",
            field, value
        )))
    }
}

/// 有限値であることを確認
fn require_finite(field: &str, value: f64) -> Result<(), ScenarioError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ScenarioError::ValidationError(format!("{} must be finite: {}", field, value)))
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {source}", .path.display())]
    IoError { path: PathBuf, source: std::io::Error },
    #[error("YAML解析エラー {}: {source}", .path.display())]
    ParseError { path: PathBuf, source: serde_yaml::Error },
    #[error("YAML解析エラー: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    ValidationError(String),
    #[error("センサー設定エラー: {0}")]
    Sensor(#[from] SensorError),
    #[error("体形状設定エラー: {0}")]
    Body(#[from] BodyError),
}
