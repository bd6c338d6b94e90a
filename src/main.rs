//! 程序入口：初始化日志、解析命令行、加载设计文件并输出交付信息

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use figma_handoff::model::data_core::DocumentStore;
use figma_handoff::model::performance::run_performance_suite;
use figma_handoff::model::walker::WalkOptions;
use figma_handoff::vm::bridge::*;
use figma_handoff::vm::session::{HandoffSession, LoadStatus};

#[derive(Parser, Debug)]
#[command(name = "figma_handoff", version, about = "设计文件交付检查工具")]
struct Cli {
    /// 设计文件 JSON（文件 API 导出格式）
    #[arg(value_name = "FILE", required_unless_present = "bench")]
    file: Option<PathBuf>,
    /// 只在选择器中显示这些画板（逗号分隔）
    #[arg(long, value_delimiter = ',')]
    frames: Vec<String>,
    /// 要选择的画板 id
    #[arg(long)]
    frame: Option<String>,
    /// 要检查的节点 id（需位于当前画板内）
    #[arg(long)]
    node: Option<String>,
    /// 遍历时跳过隐藏节点
    #[arg(long)]
    skip_hidden: bool,
    /// 输出当前画板的图层列表
    #[arg(long)]
    layers: bool,
    /// 导出清单保存路径
    #[arg(long, value_name = "PATH")]
    export_manifest: Option<PathBuf>,
    /// 同时输出被检查节点的原始 JSON
    #[arg(long)]
    raw: bool,
    /// 运行性能基准测试
    #[arg(long)]
    bench: bool,
}

fn main() {
    // 默认 info 级别，可通过 RUST_LOG 覆盖
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        tracing::error!("执行失败: {:#}", e);
        eprintln!("{}{:#}", STATUS_ERROR_PREFIX, e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.bench {
        run_bench();
    }
    let Some(path) = cli.file.as_deref() else {
        return Ok(());
    };
    inspect_file(cli, path)
}

fn run_bench() {
    println!("=== 性能基准测试 ===");
    for r in run_performance_suite() {
        let mark = if r.success { "✓" } else { "✗" };
        println!("{} {:<40} {:>6}ms  {}", mark, r.operation, r.duration_ms, r.details);
    }
}

fn inspect_file(cli: &Cli, path: &Path) -> anyhow::Result<()> {
    println!("{}", STATUS_LOADING);
    let mut store = DocumentStore::default();
    store
        .load_file(path)
        .with_context(|| format!("无法加载设计文件 {}", path.display()))?;

    let options = WalkOptions {
        include_hidden: !cli.skip_hidden,
    };
    let mut session = HandoffSession::new();
    let pending = session.spawn_walk(store.raw_file()?.clone(), options);
    let (ticket, outcome) = pending.join()?;
    let outcome = outcome.context("遍历被取消")?;

    match session.finish_load(ticket, outcome, cli.frames.as_slice()) {
        LoadStatus::Loaded { frames } => println!("{}：选择器中 {} 个画板", STATUS_LOADED, frames),
        LoadStatus::Empty { document_name } => {
            println!("{}：{}", STATUS_EMPTY, document_name);
            return Ok(());
        }
        LoadStatus::Stale => {
            println!("{}", STATUS_STALE);
            return Ok(());
        }
    }

    let output = session.output().context("文档未安装")?;
    let report = &output.report;
    println!(
        "文档 {}：{} 个组件，{} 项导出，{} 个问题（无效节点 {}，未解析组件 {}）",
        output.document_name,
        output.components.len(),
        output.export_settings.len(),
        report.issues.len(),
        report.malformed_count(),
        report.unresolved_count()
    );
    for issue in &report.issues {
        println!("  [{:?}] {} {}", issue.category, issue.path, issue.message);
    }

    if let Some(manifest) = &cli.export_manifest {
        store
            .save_export_manifest(manifest, &output.export_settings)
            .with_context(|| format!("无法保存导出清单 {}", manifest.display()))?;
        println!("导出清单已保存: {}", manifest.display());
    }

    if let Some(frame_id) = &cli.frame {
        let sel = session.select_frame(frame_id)?;
        println!("当前画板: {} / {}", sel.page_name, sel.frame_name);
    }

    if let Some(picker) = session.picker() {
        let pages = picker_pages(picker, session.selection().current_frame());
        println!("{}", serde_json::to_string_pretty(&pages)?);
    }

    if cli.layers {
        if let Some(layers) = session.layers() {
            for row in layers.rows().iter().map(LayerRowData::from) {
                println!("{}{} [{}] {}", "  ".repeat(row.depth as usize), row.name, row.kind, row.preview);
            }
        }
    }

    if let Some(node_id) = &cli.node {
        session.select_node(node_id)?;
        let inspection = session.inspect().context("节点检查数据不可用")?;
        let data = InspectorData::from(&inspection);
        println!("{}", serde_json::to_string_pretty(&data)?);
        if cli.raw {
            println!("{}", store.raw_node_pretty(inspection.node)?);
        }
        // 命令行没有淡出动画，直接完成
        session.deselect();
        session.dissolve_complete();
    }

    println!("{}", STATUS_READY);
    Ok(())
}
