//! HandoffSession：一次交付会话的视图模型
//!
//! 持有已加载文档（遍历产物、完整画板索引、选择器子集）与选择状态机。
//! 加载带票据：只有最新一次加载的结果会被安装，过期结果直接丢弃。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::model::css::{css_declarations, CssDeclaration};
use crate::model::data_core::HandoffError;
use crate::model::frame_index::FrameIndex;
use crate::model::layers::LayerList;
use crate::model::node::NodeModel;
use crate::model::raw::RawFile;
use crate::model::registry::ComponentEntry;
use crate::model::report::WalkIssue;
use crate::model::selection::{Phase, SelectionController, Transition};
use crate::model::walker::{DocumentWalker, WalkOptions, WalkOutcome, WalkOutput};

/// 加载票据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 后台遍历句柄；未 join 就丢弃时遍历被取消
#[derive(Debug)]
pub struct PendingWalk {
    ticket: LoadTicket,
    cancel: Arc<AtomicBool>,
    /// 只在 join 时取走
    handle: Option<JoinHandle<Option<WalkOutcome>>>,
}

impl PendingWalk {
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// 等待遍历结束；被取消时结果为 None
    pub fn join(mut self) -> Result<(LoadTicket, Option<WalkOutcome>), HandoffError> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| HandoffError::State("后台遍历已被等待过".into()))?;
        let outcome = handle
            .join()
            .map_err(|_| HandoffError::State("后台遍历线程异常退出".into()))?;
        Ok((self.ticket, outcome))
    }
}

impl Drop for PendingWalk {
    fn drop(&mut self) {
        // 线程不再被等待，让它尽快退出
        if self.handle.is_some() {
            tracing::debug!("第 {} 次加载的遍历句柄被丢弃，取消遍历", self.ticket.generation);
            self.cancel();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// 已安装，选择器中可用的画板数
    Loaded { frames: usize },
    /// 文档没有任何画板
    Empty { document_name: String },
    /// 已被更新的加载取代，结果被丢弃
    Stale,
}

#[derive(Debug)]
struct LoadedDocument {
    output: WalkOutput,
    full_index: FrameIndex,
    picker: FrameIndex,
}

/// 选择画板后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSelection {
    pub page_id: String,
    pub page_name: String,
    pub frame_id: String,
    pub frame_name: String,
    pub transition: Transition,
}

/// 检查器面板的输入
#[derive(Debug, Clone)]
pub struct Inspection<'a> {
    pub node: &'a NodeModel,
    /// 实例解析到的主组件
    pub component: Option<&'a ComponentEntry>,
    pub phase: Phase,
    pub css: Vec<CssDeclaration>,
    pub issues: Vec<&'a WalkIssue>,
}

#[derive(Debug, Default)]
pub struct HandoffSession {
    generation: u64,
    in_flight: Option<Arc<AtomicBool>>,
    document: Option<LoadedDocument>,
    empty_document: Option<String>,
    selection: SelectionController,
}

impl HandoffSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始一次新加载；正在进行的旧遍历会被请求取消
    pub fn begin_load(&mut self) -> LoadTicket {
        if let Some(cancel) = self.in_flight.take() {
            cancel.store(true, Ordering::Relaxed);
            tracing::info!("新的加载取代了第 {} 次加载", self.generation);
        }
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// 在后台线程遍历文档
    pub fn spawn_walk(&mut self, file: RawFile, options: WalkOptions) -> PendingWalk {
        let ticket = self.begin_load();
        let cancel = Arc::new(AtomicBool::new(false));
        self.in_flight = Some(cancel.clone());

        let flag = cancel.clone();
        let handle = std::thread::spawn(move || {
            tracing::info!("后台遍历开始: {}", file.name);
            DocumentWalker::new(options).walk_until_cancelled(&file, &flag)
        });
        PendingWalk {
            ticket,
            cancel,
            handle: Some(handle),
        }
    }

    /// 同步加载，适合命令行与测试
    pub fn load_blocking<S: AsRef<str>>(
        &mut self,
        file: &RawFile,
        options: &WalkOptions,
        requested_frames: &[S],
    ) -> LoadStatus {
        let ticket = self.begin_load();
        let outcome = DocumentWalker::new(options.clone()).walk(file);
        self.finish_load(ticket, outcome, requested_frames)
    }

    /// 安装遍历结果。`requested_frames` 为空时选择器使用完整索引
    pub fn finish_load<S: AsRef<str>>(
        &mut self,
        ticket: LoadTicket,
        outcome: WalkOutcome,
        requested_frames: &[S],
    ) -> LoadStatus {
        if !self.is_current(ticket) {
            tracing::info!("丢弃过期的加载结果: 第 {} 次 (当前第 {} 次)", ticket.generation, self.generation);
            return LoadStatus::Stale;
        }
        self.in_flight = None;
        self.selection = SelectionController::new();

        match outcome {
            WalkOutcome::Empty { document_name } => {
                tracing::info!("文档 {} 为空", document_name);
                self.document = None;
                self.empty_document = Some(document_name.clone());
                LoadStatus::Empty { document_name }
            }
            WalkOutcome::Built(output) => {
                let full_index = FrameIndex::index(&output.tree);
                let picker = if requested_frames.is_empty() {
                    full_index.clone()
                } else {
                    full_index.select_subset(requested_frames)
                };
                let frames = picker.frame_count();
                tracing::info!(
                    "文档 {} 已安装：{} 个画板，选择器中 {} 个，{} 条问题",
                    output.document_name,
                    full_index.frame_count(),
                    frames,
                    output.report.issues.len()
                );
                self.empty_document = None;
                self.document = Some(LoadedDocument {
                    output: *output,
                    full_index,
                    picker,
                });
                LoadStatus::Loaded { frames }
            }
        }
    }

    fn loaded(&self) -> Result<&LoadedDocument, HandoffError> {
        self.document
            .as_ref()
            .ok_or_else(|| HandoffError::State("没有已加载的文档".into()))
    }

    pub fn output(&self) -> Option<&WalkOutput> {
        self.document.as_ref().map(|d| &d.output)
    }

    pub fn full_index(&self) -> Option<&FrameIndex> {
        self.document.as_ref().map(|d| &d.full_index)
    }

    pub fn picker(&self) -> Option<&FrameIndex> {
        self.document.as_ref().map(|d| &d.picker)
    }

    /// 最近一次加载得到空文档时的文档名
    pub fn empty_document_name(&self) -> Option<&str> {
        self.empty_document.as_deref()
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// 选择器中的画板；所属页面从选择器子集中查找
    pub fn select_frame(&mut self, frame_id: &str) -> Result<FrameSelection, HandoffError> {
        let doc = self
            .document
            .as_ref()
            .ok_or_else(|| HandoffError::State("没有已加载的文档".into()))?;
        let (page, frame) = doc
            .picker
            .frame(frame_id)
            .ok_or_else(|| HandoffError::NotFound(format!("画板 {}", frame_id)))?;
        let transition = self.selection.select_frame(page.id.as_str(), frame.id.as_str());
        Ok(FrameSelection {
            page_id: page.id.clone(),
            page_name: page.name.clone(),
            frame_id: frame.id.clone(),
            frame_name: frame.name.clone(),
            transition,
        })
    }

    /// 当前画板；尚未选择时为选择器中的第一个画板
    pub fn current_frame(&self) -> Option<&NodeModel> {
        let doc = self.document.as_ref()?;
        let frame_id = match self.selection.current_frame() {
            Some(id) => id,
            None => doc.picker.first_frame().map(|(_, f)| f.id.as_str())?,
        };
        doc.output.tree.find(frame_id)
    }

    /// 只接受当前画板内的节点
    pub fn select_node(&mut self, node_id: &str) -> Result<Transition, HandoffError> {
        if self.selection.current_frame().is_none() {
            let first = self
                .loaded()?
                .picker
                .first_frame()
                .map(|(_, f)| f.id.clone())
                .ok_or_else(|| HandoffError::State("选择器中没有画板".into()))?;
            self.select_frame(&first)?;
        }
        let frame = self
            .current_frame()
            .ok_or_else(|| HandoffError::State("当前画板不在文档中".into()))?;
        if !frame.contains(node_id) {
            return Err(HandoffError::NotFound(format!("节点 {} 不在画板 {} 中", node_id, frame.id)));
        }
        Ok(self.selection.select_node(node_id))
    }

    pub fn deselect(&mut self) -> Transition {
        self.selection.deselect()
    }

    /// 展示层淡出结束时调用
    pub fn dissolve_complete(&mut self) -> Transition {
        self.selection.dissolve_complete()
    }

    /// 当前选中节点的检查数据；淡出期间仍然可用
    pub fn inspect(&self) -> Option<Inspection<'_>> {
        let doc = self.document.as_ref()?;
        let node_id = self.selection.current_node()?;
        let node = doc.output.tree.find(node_id)?;
        let component = node
            .component
            .as_ref()
            .filter(|c| c.is_resolved())
            .and_then(|c| doc.output.components.resolve(c.master_id()).ok());
        Some(Inspection {
            node,
            component,
            phase: self.selection.phase(),
            css: css_declarations(node),
            issues: doc.output.report.for_node(node_id).collect(),
        })
    }

    /// 当前画板的图层列表
    pub fn layers(&self) -> Option<LayerList> {
        self.current_frame().map(LayerList::new)
    }
}
