use clap::{Arg, ArgMatches, Command};
use std::str::FromStr;

use dronemetrics::logging::{self, LogConfig, LogOutput};
use dronemetrics::metrics::{
    AcousticMetric, BodyCoverageMetric, CameraQualityInfo, ViewQualityMetric, sum_of_sound_pressures,
};
use dronemetrics::models::{BodyModel, NoiseSource, Point2D, Pose, SensorShape, math_utils::deg_to_rad};
use dronemetrics::scenario::ScenarioConfig;
use dronemetrics::simulation::SimulationEngine;

fn main() {
    let matches = Command::new("dronemetrics")
        .version("0.1.0")
        .about("ドローン観測指標シミュレーション")
        .long_about("カメラ搭載ドローンが地上の動物を観測するシミュレーション\n\
                     体表カバレッジ・視点品質・騒音の知覚レベルをステップごとに評価します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
                .conflicts_with("test")
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .action(clap::ArgAction::SetTrue)
                .help("指標計算器のセルフチェックを実行")
                .conflicts_with("info")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: ステップごとの指標)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)。未指定なら -v から決定")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .default_value("logs")
                .help("ログファイルの出力ディレクトリ")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    let log_config = match build_log_config(&matches, verbose_level) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(2);
        }
    };
    // ガードはプログラム終了まで保持する
    let _log_guard = match logging::init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    };

    println!("ドローン観測指標シミュレーション - dronemetrics v0.1.0");
    println!();

    if verbose_level > 0 {
        println!("詳細出力レベル: {}", verbose_level);
        if log_config.output.writes_file() {
            println!("ログファイル出力先: {}/", log_config.log_dir);
        }
    }

    if matches.get_flag("test") {
        println!("=== 指標計算器セルフチェック ===");
        match self_check() {
            Ok(()) => println!("\n全ての指標計算器が正常に動作しました！"),
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        match run_scenario(scenario_path, matches.get_flag("info"), verbose_level) {
            Ok(_) => {
                if verbose_level > 0 {
                    println!("シナリオ実行が正常に完了しました。");
                }
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        show_default_help();
    }
}

fn build_log_config(matches: &ArgMatches, verbose_level: u8) -> Result<LogConfig, String> {
    let level = matches
        .get_one::<String>("log-level")
        .map(|level| logging::parse_log_level(level))
        .unwrap_or_else(|| logging::level_for_verbosity(verbose_level));
    let output = matches
        .get_one::<String>("log-output")
        .map(|output| LogOutput::from_str(output))
        .transpose()?
        .unwrap_or(LogOutput::Console);
    let log_dir = matches
        .get_one::<String>("log-dir")
        .cloned()
        .unwrap_or_else(|| "logs".to_string());

    Ok(LogConfig {
        level,
        output,
        log_dir,
        ..LogConfig::default()
    })
}

/// 既知の配置で各指標計算器の値を確認
fn self_check() -> Result<(), Box<dyn std::error::Error>> {
    // 体表カバレッジ: 2m x 1m の長方形に正対する4台
    let body = BodyModel::rectangle(2.0, 1.0)?;
    let coverage = BodyCoverageMetric::new(body);
    let cameras = [
        Pose::new(Point2D::new(2.0, 0.0), deg_to_rad(180.0)),
        Pose::new(Point2D::new(-2.0, 0.0), 0.0),
        Pose::new(Point2D::new(0.0, 2.0), deg_to_rad(270.0)),
        Pose::new(Point2D::new(0.0, -2.0), deg_to_rad(90.0)),
    ];
    let all_sides = coverage.compute(&Pose::default(), &cameras, 0.0)?;
    let short_side = coverage.compute(&Pose::default(), &cameras[..1], 0.0)?;
    let long_side = coverage.compute(&Pose::default(), &cameras[2..3], 0.0)?;
    println!("体表カバレッジ (4台): {:.4}", all_sides);
    println!("体表カバレッジ (短辺): {:.4}", short_side);
    println!("体表カバレッジ (長辺): {:.4}", long_side);

    // 視点品質: 開口角90度・視野20m・死角2mのカメラ
    let shape = SensorShape::new(2.0, 20.0, deg_to_rad(90.0))?;
    let camera = Pose::new(Point2D::origin(), 0.0);
    let info = CameraQualityInfo::from_footprint(&shape.footprint(&camera, 0.1))?;
    let quality = ViewQualityMetric::default();
    println!(
        "視点品質 (重心): {:.4} / (最悪点): {:.4}",
        quality.compute(info.centroid, &[info], 0.0)?,
        quality.compute(info.worst_case, &[info], 0.0)?
    );

    // 音響: 90dB の距離減衰と合成
    let acoustic = AcousticMetric::new(20.0);
    let source = NoiseSource {
        emitted_db: 90.0,
        reference_distance: 1.0,
        height: 2.0,
    };
    println!(
        "知覚騒音 (高度2m直下): {:.2}dB",
        acoustic.perceived_at(Point2D::origin(), &[(Point2D::origin(), source)])
    );
    println!("音圧合成 (80.3, 83.0, 84.0): {:.2}dB", sum_of_sound_pressures(&[80.3, 83.0, 84.0]));

    Ok(())
}

/// シナリオファイルを読み込んで実行
fn run_scenario(scenario_path: &str, info_only: bool, verbose_level: u8) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;

    if verbose_level > 0 {
        println!("シナリオファイル読み込み完了: {}", scenario_path);
    }

    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    scenario.print_summary();
    println!();

    let mut simulation = SimulationEngine::new(scenario, verbose_level);
    simulation.initialize()?;
    let summary = simulation.run()?;

    println!();
    summary.print();

    Ok(())
}

/// デフォルトヘルプを表示
fn show_default_help() {
    println!("使用方法:");
    println!("  dronemetrics [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>   シナリオファイルを指定して実行");
    println!("  -i, --info              シナリオ情報のみ表示");
    println!("  -t, --test              指標計算器のセルフチェック");
    println!("  -v, --verbose           詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-level <LEVEL> ログレベル");
    println!("      --log-output <OUT>  ログ出力先 (console, file, both)");
    println!("      --log-dir <DIR>     ログ出力ディレクトリ");
    println!("  -h, --help              このヘルプを表示");
    println!();
    println!("例:");
    println!("  dronemetrics -s scenarios/savanna_patrol.yaml");
    println!("  dronemetrics -s scenarios/savanna_patrol.yaml -i");
    println!("  dronemetrics -s scenarios/savanna_patrol.yaml -vvv --log-output both");
    println!("  dronemetrics --test");
}
