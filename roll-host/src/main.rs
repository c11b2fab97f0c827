//! # Roll
//!
//! 英雄组合随机抽取 - 终端宿主。
//!
//! ## 用法
//!
//! ```bash
//! roll roll                       # 默认时长，随机动画
//! roll roll 15 --mode hide-reveal # 指定时长与动画
//! roll roll --instant --seed 42   # 虚拟时钟，立即得到结果
//! roll stats --history 5
//! roll toggle "Духи"
//! roll reset
//! roll overlay --bg-color "#101010" --bg-opacity 0.6
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use roll_host::{
    AppConfig, Driver, EngineOptions, OverlayStyle, SystemClock, VirtualClock, build_engine,
    describe, format_record, init_tracing, overlay_link, save_history,
};
use roll_runtime::{Item, LastValueStore, RollEngine, RollInput, RollType, StatsSink};

#[derive(Parser)]
#[command(name = "roll")]
#[command(about = "英雄组合随机抽取")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（默认：config.json）
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// 数据目录（覆盖配置文件）
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// 输出 debug 日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 抽取一次
    Roll {
        /// 时长（秒，自由文本；无效时使用默认值）
        duration: Option<String>,

        /// 指定动画类型（left-to-right、hide-reveal……）
        #[arg(short, long)]
        mode: Option<RollType>,

        /// 使用虚拟时钟，不等待
        #[arg(long)]
        instant: bool,

        /// 固定随机种子
        #[arg(long)]
        seed: Option<u64>,

        /// 随机动画中包含旧版随机模式
        #[arg(long)]
        legacy: bool,

        /// 只输出结果
        #[arg(short, long)]
        quiet: bool,
    },

    /// 查看统计与最近的历史
    Stats {
        /// 显示最近 N 条历史
        #[arg(long, default_value = "10")]
        history: usize,
    },

    /// 切换条目的禁用状态
    Toggle {
        /// 条目名称
        name: String,
    },

    /// 清空统计与禁用集合
    Reset,

    /// 输出叠加层链接（基于最后一次选中状态）
    Overlay {
        /// 透明模式
        #[arg(long)]
        plain: bool,

        /// 背景色（#rgb 或 #rrggbb）
        #[arg(long)]
        bg_color: Option<String>,

        /// 背景不透明度（0..1）
        #[arg(long)]
        bg_opacity: Option<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config);
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    init_tracing(&config, cli.verbose);
    config.validate().context("配置无效")?;

    match cli.command {
        Commands::Roll {
            duration,
            mode,
            instant,
            seed,
            legacy,
            quiet,
        } => {
            let options = EngineOptions { seed, legacy };
            let mut engine = build_engine(&config, &options)?;
            let duration = duration.unwrap_or_default();
            let input = match mode {
                Some(roll_type) => RollInput::start_with(duration, roll_type),
                None => RollInput::start(duration),
            };

            let print = |event: &roll_runtime::RollEvent| {
                if !quiet {
                    println!("{}", describe(event));
                }
            };
            let item = if instant {
                Driver::new(VirtualClock::new()).run(&mut engine, input, print)?
            } else {
                Driver::new(SystemClock::new()).run(&mut engine, input, print)?
            };
            save_history(&config, &engine);

            match item {
                Some(item) => print_result(&item, &engine),
                None => anyhow::bail!("抽取没有完成"),
            }
        }

        Commands::Stats { history } => {
            let engine = build_engine(&config, &EngineOptions::default())?;
            print_stats(&engine, history);
        }

        Commands::Toggle { name } => {
            let mut engine = build_engine(&config, &EngineOptions::default())?;
            for event in engine.handle(RollInput::toggle(name), std::time::Duration::ZERO)? {
                println!("{}", describe(&event));
            }
        }

        Commands::Reset => {
            let mut engine = build_engine(&config, &EngineOptions::default())?;
            for event in engine.handle(RollInput::ResetStats, std::time::Duration::ZERO)? {
                println!("{}", describe(&event));
            }
        }

        Commands::Overlay {
            plain,
            bg_color,
            bg_opacity,
        } => {
            let file = roll_host::OverlayFile::new(config.overlay_path());
            let update = file
                .load()
                .with_context(|| format!("没有可用的选中状态: {:?}", file.path()))?;
            let style = OverlayStyle {
                plain,
                bg_color,
                bg_opacity,
            };
            let item = Item::new(update.name, update.assets);
            println!("{}", overlay_link(&config.overlay_base_url, &item, &style));
        }
    }

    Ok(())
}

fn print_result(item: &Item, engine: &RollEngine) {
    println!();
    println!("结果: {}", item.name);
    for asset in &item.assets {
        println!("  {}", asset);
    }
    let stats = engine.stats();
    println!("累计: {} / {}", stats.count(&item.name), stats.total());
}

fn print_stats(engine: &RollEngine, history: usize) {
    let stats = engine.stats();
    println!("总计 {} 次", stats.total());

    for item in engine.catalog().items() {
        let flag = if stats.is_disabled(&item.name) {
            " (禁用)"
        } else {
            ""
        };
        println!(
            "  {:>4}  {:>5.1}%  {}{}",
            stats.count(&item.name),
            stats.share(&item.name),
            item.name,
            flag
        );
    }

    let recent = engine.history().recent(history);
    if !recent.is_empty() {
        println!();
        println!("最近 {} 次:", recent.len());
        for record in recent {
            println!("  {}", format_record(record));
        }
    }
}
