//! 性能基准测试模块
//!
//! 用于测试大型设计文件的解析、遍历与原始节点回查性能

use std::time::Instant;

use serde_json::{json, Value};

use crate::model::data_core::DocumentStore;
use crate::model::walker::{WalkOptions, WalkOutcome};

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

/// 生成 Figma 结构的测试文档：`pages` 个页面，每页 `frames` 个画板，
/// 每个画板下 `depth` 层、每层 `width` 个子节点
pub fn generate_design_document(pages: usize, frames: usize, depth: usize, width: usize) -> Value {
    fn create_layer(id: &mut usize, current_depth: usize, max_depth: usize, width: usize, x: f64, y: f64) -> Value {
        *id += 1;
        let node_id = format!("9:{}", id);
        if current_depth >= max_depth {
            return match *id % 3 {
                0 => json!({
                    "id": node_id, "name": format!("文本_{}", id), "type": "TEXT",
                    "characters": format!("示例文本 {}", id),
                    "absoluteBoundingBox": { "x": x, "y": y, "width": 80, "height": 20 },
                    "fills": [{ "type": "SOLID", "color": { "r": 0.1, "g": 0.1, "b": 0.1, "a": 1 } }],
                    "style": { "fontFamily": "Inter", "fontSize": 14, "fontWeight": 400 }
                }),
                1 => json!({
                    "id": node_id, "name": format!("矩形_{}", id), "type": "RECTANGLE",
                    "absoluteBoundingBox": { "x": x, "y": y, "width": 40, "height": 40 },
                    "cornerRadius": 4,
                    "fills": [
                        { "type": "SOLID", "color": { "r": 1, "g": 1, "b": 1, "a": 1 } },
                        { "type": "SOLID", "blendMode": "MULTIPLY", "opacity": 0.5,
                          "color": { "r": 0.2, "g": 0.4, "b": 0.8, "a": 1 } }
                    ],
                    "effects": [{ "type": "DROP_SHADOW", "radius": 4, "offset": { "x": 0, "y": 2 },
                                  "color": { "r": 0, "g": 0, "b": 0, "a": 0.2 } }]
                }),
                _ => json!({
                    "id": node_id, "name": format!("图标_{}", id), "type": "VECTOR",
                    "absoluteBoundingBox": { "x": x, "y": y, "width": 24, "height": 24 },
                    "strokes": [{ "type": "SOLID", "color": { "r": 0, "g": 0, "b": 0, "a": 1 } }],
                    "strokeWeight": 1.5
                }),
            };
        }

        let children: Vec<Value> = (0..width)
            .map(|i| create_layer(id, current_depth + 1, max_depth, width, x + i as f64 * 8.0, y + 8.0))
            .collect();
        json!({
            "id": node_id, "name": format!("分组_{}", id), "type": "GROUP",
            "absoluteBoundingBox": { "x": x, "y": y, "width": 200, "height": 200 },
            "children": children
        })
    }

    let mut id = 0usize;
    let pages: Vec<Value> = (0..pages)
        .map(|p| {
            let frames: Vec<Value> = (0..frames)
                .map(|f| {
                    let x = f as f64 * 500.0;
                    let children: Vec<Value> = (0..width).map(|_| create_layer(&mut id, 1, depth, width, x, 0.0)).collect();
                    json!({
                        "id": format!("{}:{}", p + 1, f + 1),
                        "name": format!("画板_{}_{}", p + 1, f + 1),
                        "type": "FRAME",
                        "absoluteBoundingBox": { "x": x, "y": 0, "width": 375, "height": 812 },
                        "fills": [{ "type": "SOLID", "color": { "r": 1, "g": 1, "b": 1, "a": 1 } }],
                        "children": children
                    })
                })
                .collect();
            json!({
                "id": format!("0:{}", p + 1),
                "name": format!("页面_{}", p + 1),
                "type": "CANVAS",
                "children": frames
            })
        })
        .collect();

    json!({
        "name": "性能测试文档",
        "lastModified": "2025-01-09T10:00:00Z",
        "document": { "id": "0:0", "name": "Document", "type": "DOCUMENT", "children": pages },
        "components": {},
        "styles": {}
    })
}

/// 测试JSON解析性能
pub fn benchmark_json_parsing(json_str: &str) -> PerformanceResult {
    let start = Instant::now();
    let parse_result = serde_json::from_str::<Value>(json_str);
    let duration = start.elapsed();

    match parse_result {
        Ok(_) => PerformanceResult::new(
            "JSON解析",
            duration.as_millis(),
            true,
            &format!("解析了 {} 字节的JSON", json_str.len()),
        ),
        Err(e) => PerformanceResult::new("JSON解析", duration.as_millis(), false, &format!("解析失败: {}", e)),
    }
}

/// 测试文档遍历性能
pub fn benchmark_walk(store: &DocumentStore) -> PerformanceResult {
    let start = Instant::now();
    let outcome = store.walk(&WalkOptions::default());
    let duration = start.elapsed();

    match outcome {
        Ok(WalkOutcome::Built(out)) => PerformanceResult::new(
            "文档遍历",
            duration.as_millis(),
            true,
            &format!("构建了 {} 个节点，{} 条问题", out.tree.count(), out.report.issues.len()),
        ),
        Ok(WalkOutcome::Empty { .. }) => PerformanceResult::new("文档遍历", duration.as_millis(), false, "文档为空"),
        Err(e) => PerformanceResult::new("文档遍历", duration.as_millis(), false, &format!("遍历失败: {}", e)),
    }
}

/// 测试原始节点回查性能
pub fn benchmark_node_extraction(store: &DocumentStore, paths: &[&str]) -> Vec<PerformanceResult> {
    paths
        .iter()
        .map(|path| {
            let start = Instant::now();
            let extract_result = store.extract_subtree_pretty(path);
            let duration = start.elapsed();
            match extract_result {
                Ok(json_str) => PerformanceResult::new(
                    &format!("节点提取: {}", path),
                    duration.as_millis(),
                    true,
                    &format!("提取了 {} 字符", json_str.len()),
                ),
                Err(e) => PerformanceResult::new(
                    &format!("节点提取: {}", path),
                    duration.as_millis(),
                    false,
                    &format!("提取失败: {}", e),
                ),
            }
        })
        .collect()
}

/// 运行综合性能测试
pub fn run_performance_suite() -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    // (页面, 画板, 深度, 宽度)
    let test_cases = [(1, 4, 2, 4), (2, 8, 3, 5), (4, 10, 3, 8)];

    for (pages, frames, depth, width) in test_cases {
        let label = format!("{}x{}x{}x{}", pages, frames, depth, width);
        tracing::info!("测试规模：{}", label);

        let start = Instant::now();
        let doc = generate_design_document(pages, frames, depth, width);
        results.push(PerformanceResult::new(
            &format!("数据生成({})", label),
            start.elapsed().as_millis(),
            true,
            &format!("生成了 {} 个页面、每页 {} 个画板", pages, frames),
        ));

        let start = Instant::now();
        let json_str = match serde_json::to_string(&doc) {
            Ok(s) => s,
            Err(e) => {
                results.push(PerformanceResult::new(
                    &format!("JSON序列化({})", label),
                    start.elapsed().as_millis(),
                    false,
                    &format!("序列化失败: {}", e),
                ));
                continue;
            }
        };
        results.push(PerformanceResult::new(
            &format!("JSON序列化({})", label),
            start.elapsed().as_millis(),
            true,
            &format!("序列化了 {} 字节", json_str.len()),
        ));

        results.push(benchmark_json_parsing(&json_str));

        let start = Instant::now();
        let mut store = DocumentStore::default();
        let loaded = store.load_value(doc);
        results.push(PerformanceResult::new(
            &format!("文档加载({})", label),
            start.elapsed().as_millis(),
            loaded.is_ok(),
            &match &loaded {
                Ok(()) => "反序列化为原始模型".to_string(),
                Err(e) => format!("加载失败: {}", e),
            },
        ));
        if loaded.is_err() {
            continue;
        }

        results.push(benchmark_walk(&store));

        let test_paths = [
            "$.document",
            "$.document.children[0]",
            "$.document.children[0].children[0]",
            "$.document.children[0].children[0].children[0]",
        ];
        results.extend(benchmark_node_extraction(&store, &test_paths));
    }

    results
}
