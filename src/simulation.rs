//! # Simulation モジュール
//!
//! ドローン観測シミュレーションの中核となるシミュレーションエンジンを提供します。
//!
//! 固定時間刻み（Δt）でエンティティを動かし、各ステップで可視性の取得と
//! 全指標の評価を行い、実行全体の統計を集計します。
//!
//! ## シミュレーション処理順序
//!
//! 各時間刻みにおいて、以下の順序で処理が実行されます：
//!
//! 1. **可視性取得**: カメラごとに現在見えているターゲットを求める
//! 2. **指標評価**: 全ターゲットの体表カバレッジ・視点品質・知覚騒音を計算
//! 3. **集計**: ステップの統計値を実行全体の統計に加える
//! 4. **移動**: 全エンティティを Δt だけ動かす
//!
//! 指標は移動前のスナップショットに対して計算されるため、
//! 評価中に位置や向きが変わることはありません。

use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::metrics::{
    error::MetricError,
    suite::{MetricNames, MetricSuite, StepMetrics},
};
use crate::models::{
    capture::VisibilityCapture, common::math_utils::rad_to_deg, traits::PlanarEnvironment, world::World,
};
use crate::scenario::{ScenarioConfig, ScenarioError};

/// シミュレーション実行エラー
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("シナリオエラー: {0}")]
    Scenario(#[from] ScenarioError),
    #[error("指標計算エラー (ステップ {step}): {source}")]
    Metric { step: u64, source: MetricError },
    #[error("シミュレーションエンジンが初期化されていません")]
    NotInitialized,
}

/// 1つの指標列の実行全体の統計
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub samples: u64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct ColumnAccumulator {
    sum: f64,
    samples: u64,
    min: Option<f64>,
    max: Option<f64>,
}

impl ColumnAccumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.samples += 1;
        self.min = Some(self.min.map_or(value, |min| min.min(value)));
        self.max = Some(self.max.map_or(value, |max| max.max(value)));
    }

    fn finish(&self, name: &str) -> ColumnSummary {
        ColumnSummary {
            name: name.to_string(),
            samples: self.samples,
            mean: (self.samples > 0).then(|| self.sum / self.samples as f64),
            min: self.min,
            max: self.max,
        }
    }
}

/// 実行全体の結果
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub steps: u64,
    pub simulated_time: f64,
    pub target_count: usize,
    /// 全ステップの可視観測の総数
    pub observations: usize,
    /// 一度もカメラに映らなかったターゲット
    pub never_covered: Vec<String>,
    pub columns: Vec<ColumnSummary>,
}

impl RunSummary {
    /// 列名で統計を取得
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// 結果を表示
    pub fn print(&self) {
        println!("=== 実行結果 ===");
        println!("総ステップ数: {}", self.steps);
        println!("シミュレーション時間: {:.1}秒", self.simulated_time);
        println!("ターゲット数: {}", self.target_count);
        println!("可視観測の総数: {}", self.observations);
        println!();

        let format = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |value| format!("{:.4}", value));
        println!("{:<24} {:>10} {:>10} {:>10} {:>8}", "指標", "平均", "最小", "最大", "標本数");
        for column in &self.columns {
            println!(
                "{:<24} {:>10} {:>10} {:>10} {:>8}",
                column.name,
                format(column.mean),
                format(column.min),
                format(column.max),
                column.samples
            );
        }

        if !self.never_covered.is_empty() {
            println!();
            println!("一度も観測されなかったターゲット: {}", self.never_covered.join(", "));
        }
    }
}

pub struct SimulationEngine {
    pub current_time: f64,
    pub dt: f64,
    pub max_time: f64,
    pub max_steps: u64,
    pub step_count: u64,

    pub world: World,
    pub suite: MetricSuite,
    pub capture: VisibilityCapture,
    pub names: MetricNames,

    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,

    initialized: bool,
    accumulators: Vec<ColumnAccumulator>,
    observations: usize,
    covered_targets: BTreeSet<String>,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        Self {
            current_time: 0.0,
            dt: scenario.sim.dt_s,
            max_time: scenario.sim.t_max_s,
            max_steps: scenario.sim.max_steps,
            step_count: 0,
            world: World::default(),
            suite: scenario.metric_suite(),
            capture: scenario.visibility_capture(),
            names: scenario.metrics.names.clone(),
            scenario_config: scenario,
            verbose_level,
            initialized: false,
            accumulators: Vec::new(),
            observations: 0,
            covered_targets: BTreeSet::new(),
        }
    }

    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        self.world = self.scenario_config.build_world()?;
        self.current_time = 0.0;
        self.step_count = 0;
        self.accumulators = Vec::new();
        self.observations = 0;
        self.covered_targets.clear();
        self.initialized = true;

        if self.verbose_level > 1 {
            for entity in self.world.entities() {
                debug!(
                    "エンティティ初期化: {} (位置: {:.1}, {:.1}, 向き: {:.1}度, カメラ: {}, ターゲット: {})",
                    entity.id,
                    entity.pose.position.x,
                    entity.pose.position.y,
                    rad_to_deg(entity.pose.heading),
                    entity.is_camera(),
                    entity.is_target()
                );
            }
        }

        if self.verbose_level > 0 {
            info!("初期化完了:");
            info!("  ドローン: {}機", self.world.camera_count());
            info!("  騒音源: {}", self.world.noise_source_count());
            info!("  ターゲット: {}頭", self.world.targets().len());
        }

        Ok(())
    }

    pub fn run(&mut self) -> Result<RunSummary, SimulationError> {
        if !self.initialized {
            return Err(SimulationError::NotInitialized);
        }

        info!("=== シミュレーション実行開始 ===");

        while self.current_time < self.max_time && self.step_count < self.max_steps {
            self.step()?;

            if self.step_count % 100 == 0 && self.verbose_level > 0 {
                let progress = (self.current_time / self.max_time) * 100.0;
                info!("進行状況: {:.1}% ({:.1}/{:.1}秒)", progress, self.current_time, self.max_time);
            }
        }

        if self.step_count >= self.max_steps && self.current_time < self.max_time {
            warn!("最大ステップ数 {} に達したため終了します", self.max_steps);
        }

        let summary = self.summary();

        info!("=== シミュレーション完了 ===");
        info!("実行時間: {:.1}秒", self.current_time);
        info!("総ステップ数: {}", self.step_count);
        for column in &summary.columns {
            if let Some(mean) = column.mean {
                info!(metric = %column.name, mean, "指標平均");
            }
        }
        if !summary.never_covered.is_empty() {
            warn!(
                "一度もカメラに映らなかったターゲット: {}頭 ({})",
                summary.never_covered.len(),
                summary.never_covered.join(", ")
            );
        }

        Ok(summary)
    }

    /// 1ステップ分の評価と移動
    pub fn step(&mut self) -> Result<StepMetrics, SimulationError> {
        if !self.initialized {
            return Err(SimulationError::NotInitialized);
        }

        let snapshot = self.capture.capture(&self.world);
        let metrics = self
            .suite
            .evaluate(&self.world, &snapshot, self.step_count, self.current_time)
            .map_err(|source| SimulationError::Metric { step: self.step_count, source })?;

        self.observations += snapshot.observation_count();
        for target in &metrics.targets {
            if target.is_covered() {
                self.covered_targets.insert(target.target_id.clone());
            } else if self.verbose_level > 2 {
                debug!(step = self.step_count, target = %target.target_id, "カメラに映っていないターゲット");
            }
        }

        let columns = metrics.columns(&self.names);
        if self.accumulators.len() < columns.len() {
            self.accumulators.resize(columns.len(), ColumnAccumulator::default());
        }
        for (accumulator, (name, value)) in self.accumulators.iter_mut().zip(&columns) {
            if let Some(value) = value {
                accumulator.add(*value);
                trace!(step = self.step_count, time = self.current_time, metric = %name, value = *value);
            }
        }

        self.world.advance(self.dt);
        self.current_time += self.dt;
        self.step_count += 1;

        Ok(metrics)
    }

    /// 現時点までの集計結果
    pub fn summary(&self) -> RunSummary {
        let names = self.column_names();
        let columns = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                self.accumulators
                    .get(index)
                    .copied()
                    .unwrap_or_default()
                    .finish(name)
            })
            .collect();

        let targets = self.world.targets();
        let never_covered = targets
            .iter()
            .filter(|target| !self.covered_targets.contains(&target.id))
            .map(|target| target.id.clone())
            .collect();

        RunSummary {
            steps: self.step_count,
            simulated_time: self.current_time,
            target_count: targets.len(),
            observations: self.observations,
            never_covered,
            columns,
        }
    }

    fn column_names(&self) -> [&str; 5] {
        [
            self.names.body_coverage.as_str(),
            self.names.view_quality.as_str(),
            self.names.view_quality_covered.as_str(),
            self.names.noise_perceived.as_str(),
            self.names.noise_disturbance.as_str(),
        ]
    }
}
