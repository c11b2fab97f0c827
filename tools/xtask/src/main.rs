//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test，再检查目录
//! - `cov-runtime`: 运行 roll-runtime 覆盖率
//! - `catalog-check`: 检查目录文件（名称、资源引用）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode, Stdio};

use roll_runtime::{Catalog, DiagnosticResult, analyze_catalog, collect_asset_references};
use walkdir::WalkDir;

/// 一道 cargo 门禁
struct Gate {
    name: &'static str,
    args: &'static [&'static str],
}

/// `check-all` 依次执行的门禁
const GATES: &[Gate] = &[
    Gate {
        name: "fmt",
        args: &["fmt", "--all", "--", "--check"],
    },
    Gate {
        name: "clippy",
        args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    },
    Gate {
        name: "test",
        args: &["test", "--workspace"],
    },
];

/// 覆盖率报告的参数
const COVERAGE_ARGS: &[&str] = &["llvm-cov", "-p", "roll-runtime", "--html"];

/// 执行 `cargo <args>`，非零退出视为失败
fn cargo(args: &[&str]) -> anyhow::Result<()> {
    eprintln!("\n==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    anyhow::ensure!(status.success(), "cargo {} 失败: {status}", args[0]);
    Ok(())
}

/// 确认 cargo-llvm-cov 已安装
fn require_llvm_cov() -> anyhow::Result<()> {
    let installed = Command::new("cargo")
        .args(["llvm-cov", "--version"])
        .stdout(Stdio::null())
        .status()
        .is_ok_and(|s| s.success());
    anyhow::ensure!(
        installed,
        "找不到 cargo-llvm-cov，请先执行 `cargo install cargo-llvm-cov` \
         与 `rustup component add llvm-tools-preview`"
    );
    Ok(())
}

fn main() -> ExitCode {
    match dispatch(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("xtask error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(args: Vec<String>) -> anyhow::Result<()> {
    let (command, rest) = match args.split_first() {
        Some((command, rest)) => (command.as_str(), rest),
        None => ("help", &[][..]),
    };

    match command {
        "check-all" => {
            for gate in GATES {
                cargo(gate.args).map_err(|e| e.context(format!("门禁 {} 未通过", gate.name)))?;
            }
            catalog_check(None)
        }
        "cov-runtime" => {
            require_llvm_cov()?;
            cargo(COVERAGE_ARGS)?;
            eprintln!("\n覆盖率报告: target/llvm-cov/html/index.html");
            Ok(())
        }
        "catalog-check" => catalog_check(rest.first().map(String::as_str)),
        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => anyhow::bail!("未知命令: {other}（见 cargo xtask help）"),
    }
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       fmt、clippy、test，然后 catalog-check
  cov-runtime     运行 roll-runtime 覆盖率报告
  catalog-check   检查目录文件

CATALOG-CHECK:
  cargo xtask catalog-check [path]

  总是检查内置目录
  不带参数：另外检查 catalogs/ 下所有 .json 文件（目录存在时）
  带路径参数：另外检查指定文件或目录

  检查内容：
    - JSON 格式错误
    - 空名称、重复名称
    - 没有资源或资源重复的条目
    - 本地资源文件是否存在（http(s) 链接不检查）

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-runtime   -> cargo xtask cov-runtime
  cargo catalog-check -> cargo xtask catalog-check
"#
    );
}

//=============================================================================
// catalog-check 命令实现
//=============================================================================

/// 默认目录文件夹（相对于 workspace root）
const DEFAULT_CATALOGS_DIR: &str = "catalogs";

/// 目录检查结果
#[derive(Default)]
struct CatalogCheckResult {
    /// 检查的目录数量
    catalogs_checked: usize,
    /// 解析错误数量
    parse_errors: usize,
    /// 诊断结果
    diagnostics: DiagnosticResult,
    /// 缺失的资源文件
    missing_assets: Vec<MissingAsset>,
}

/// 缺失的资源信息
struct MissingAsset {
    source: String,
    path: String,
}

/// 执行目录检查
fn catalog_check(path: Option<&str>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_catalog_files(&path)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_CATALOGS_DIR);
            if dir.is_dir() {
                collect_catalog_files(dir)
            } else {
                Vec::new()
            }
        }
    };

    eprintln!("==> 检查内置目录与 {} 个目录文件...\n", files.len());

    let mut result = CatalogCheckResult::default();

    result.catalogs_checked += 1;
    result
        .diagnostics
        .merge(analyze_catalog("builtin", Catalog::builtin().items()));

    for file in &files {
        check_catalog_file(file, &mut result);
    }

    print_check_result(&result);

    if result.parse_errors > 0 || result.diagnostics.has_errors() {
        anyhow::bail!("目录检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有 .json 文件
fn collect_catalog_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 检查单个目录文件
fn check_catalog_file(file: &Path, result: &mut CatalogCheckResult) {
    let source = file.display().to_string();
    result.catalogs_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", source, e);
            result.parse_errors += 1;
            return;
        }
    };

    // 不经过 Catalog::new 的校验，以便报告全部问题
    let items: Vec<roll_runtime::Item> = match serde_json::from_str(&content) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", source, e);
            result.parse_errors += 1;
            return;
        }
    };

    result.diagnostics.merge(analyze_catalog(&source, &items));

    let base = file.parent().unwrap_or(Path::new("."));
    for asset in collect_asset_references(&items) {
        if is_remote(asset) {
            continue;
        }
        if !base.join(asset).exists() {
            result.missing_assets.push(MissingAsset {
                source: source.clone(),
                path: asset.to_string(),
            });
        }
    }
}

fn is_remote(asset: &str) -> bool {
    asset.starts_with("http://") || asset.starts_with("https://")
}

/// 输出检查结果
fn print_check_result(result: &CatalogCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个目录", result.catalogs_checked);
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    for missing in &result.missing_assets {
        eprintln!("[WARN] {}: 资源不存在 {}", missing.source, missing.path);
    }

    let error_count = result.parse_errors + result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count() + result.missing_assets.len();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
