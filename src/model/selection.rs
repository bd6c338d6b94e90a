//! SelectionController：画板 / 节点选择的纯状态机
//!
//! 淡出动画的计时由展示层负责；控制器只接收一次显式的 `dissolve_complete`，
//! 在此之前保留节点数据，保证仍在淡出的面板不会丢失内容。

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Selected,
    Dissolving,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub page_id: Option<String>,
    pub frame_id: Option<String>,
    /// 仅在 Selected / Dissolving 时非空
    pub node_id: Option<String>,
    pub phase: Phase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    SelectFrame { page_id: String, frame_id: String },
    SelectNode { node_id: String },
    Deselect,
    DissolveComplete,
}

/// 事件处理结果；非法事件被静默忽略，从不作为错误抛给用户
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// 状态发生变化
    Applied,
    /// 合法但无变化（如重复选择同一画板）
    Unchanged,
    /// 当前阶段不允许该事件
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: SelectionState,
    /// 每次实际变更加一
    revision: u64,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn current_frame(&self) -> Option<&str> {
        self.state.frame_id.as_deref()
    }

    pub fn current_page(&self) -> Option<&str> {
        self.state.page_id.as_deref()
    }

    pub fn current_node(&self) -> Option<&str> {
        self.state.node_id.as_deref()
    }

    /// 按接收顺序处理事件
    pub fn apply(&mut self, event: SelectionEvent) -> Transition {
        let transition = match event {
            SelectionEvent::SelectFrame { page_id, frame_id } => self.on_select_frame(page_id, frame_id),
            SelectionEvent::SelectNode { node_id } => self.on_select_node(node_id),
            SelectionEvent::Deselect => self.on_deselect(),
            SelectionEvent::DissolveComplete => self.on_dissolve_complete(),
        };
        match transition {
            Transition::Applied => {
                self.revision += 1;
                tracing::debug!("选择状态变更: {:?}", self.state);
            }
            Transition::Ignored => tracing::debug!("忽略非法选择事件，当前阶段: {:?}", self.state.phase),
            Transition::Unchanged => {}
        }
        transition
    }

    pub fn apply_all<I: IntoIterator<Item = SelectionEvent>>(&mut self, events: I) -> Vec<Transition> {
        events.into_iter().map(|e| self.apply(e)).collect()
    }

    pub fn select_frame(&mut self, page_id: impl Into<String>, frame_id: impl Into<String>) -> Transition {
        self.apply(SelectionEvent::SelectFrame {
            page_id: page_id.into(),
            frame_id: frame_id.into(),
        })
    }

    pub fn select_node(&mut self, node_id: impl Into<String>) -> Transition {
        self.apply(SelectionEvent::SelectNode { node_id: node_id.into() })
    }

    pub fn deselect(&mut self) -> Transition {
        self.apply(SelectionEvent::Deselect)
    }

    pub fn dissolve_complete(&mut self) -> Transition {
        self.apply(SelectionEvent::DissolveComplete)
    }

    /// 切换画板总是隐式取消节点选择（包括正在淡出的节点）
    fn on_select_frame(&mut self, page_id: String, frame_id: String) -> Transition {
        if self.state.frame_id.as_deref() == Some(frame_id.as_str()) {
            return Transition::Unchanged;
        }
        self.state = SelectionState {
            page_id: Some(page_id),
            frame_id: Some(frame_id),
            node_id: None,
            phase: Phase::Idle,
        };
        Transition::Applied
    }

    fn on_select_node(&mut self, node_id: String) -> Transition {
        match self.state.phase {
            Phase::Dissolving => Transition::Ignored,
            Phase::Selected if self.state.node_id.as_deref() == Some(node_id.as_str()) => Transition::Unchanged,
            Phase::Idle | Phase::Selected => {
                self.state.node_id = Some(node_id);
                self.state.phase = Phase::Selected;
                Transition::Applied
            }
        }
    }

    fn on_deselect(&mut self) -> Transition {
        match self.state.phase {
            Phase::Selected => {
                self.state.phase = Phase::Dissolving;
                Transition::Applied
            }
            Phase::Idle | Phase::Dissolving => Transition::Ignored,
        }
    }

    fn on_dissolve_complete(&mut self) -> Transition {
        match self.state.phase {
            Phase::Dissolving => {
                self.state.node_id = None;
                self.state.phase = Phase::Idle;
                Transition::Applied
            }
            Phase::Idle | Phase::Selected => Transition::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_empty() {
        let ctl = SelectionController::new();
        assert_eq!(ctl.phase(), Phase::Idle);
        assert!(ctl.current_frame().is_none());
        assert!(ctl.current_node().is_none());
        assert_eq!(ctl.revision(), 0);
    }

    #[test]
    fn test_reselecting_same_frame_is_noop() {
        let mut ctl = SelectionController::new();
        assert_eq!(ctl.select_frame("A", "F1"), Transition::Applied);
        assert_eq!(ctl.select_frame("A", "F1"), Transition::Unchanged);
        assert_eq!(ctl.revision(), 1);
        assert_eq!(ctl.current_page(), Some("A"));
    }

    #[test]
    fn test_deselect_then_dissolve_ends_idle() {
        let mut ctl = SelectionController::new();
        ctl.select_frame("A", "F1");
        ctl.select_node("n1");
        assert_eq!(ctl.phase(), Phase::Selected);

        assert_eq!(ctl.deselect(), Transition::Applied);
        assert_eq!(ctl.phase(), Phase::Dissolving);
        // 淡出期间节点数据仍在
        assert_eq!(ctl.current_node(), Some("n1"));

        assert_eq!(ctl.dissolve_complete(), Transition::Applied);
        assert_eq!(ctl.phase(), Phase::Idle);
        assert!(ctl.current_node().is_none());

        // 重复的完成回调被忽略
        assert_eq!(ctl.dissolve_complete(), Transition::Ignored);
    }

    #[test]
    fn test_dissolve_without_deselect_is_ignored() {
        let mut ctl = SelectionController::new();
        ctl.select_frame("A", "F1");
        ctl.select_node("n1");
        let before = ctl.state().clone();
        assert_eq!(ctl.dissolve_complete(), Transition::Ignored);
        assert_eq!(ctl.state(), &before);
    }

    #[test]
    fn test_frame_change_clears_node_even_while_dissolving() {
        let mut ctl = SelectionController::new();
        ctl.select_frame("A", "F1");
        ctl.select_node("n1");
        ctl.deselect();
        assert_eq!(ctl.select_frame("B", "F3"), Transition::Applied);
        assert_eq!(ctl.phase(), Phase::Idle);
        assert!(ctl.current_node().is_none());
        assert_eq!(ctl.current_frame(), Some("F3"));
        // 迟到的淡出完成回调不再生效
        assert_eq!(ctl.dissolve_complete(), Transition::Ignored);
    }

    #[test]
    fn test_select_node_rules() {
        let mut ctl = SelectionController::new();
        assert_eq!(ctl.select_node("n1"), Transition::Applied);
        assert_eq!(ctl.select_node("n1"), Transition::Unchanged);
        assert_eq!(ctl.select_node("n2"), Transition::Applied);
        assert_eq!(ctl.current_node(), Some("n2"));

        ctl.deselect();
        assert_eq!(ctl.select_node("n3"), Transition::Ignored);
        assert_eq!(ctl.deselect(), Transition::Ignored);
    }

    #[test]
    fn test_apply_all_in_order() {
        let mut ctl = SelectionController::new();
        let results = ctl.apply_all([
            SelectionEvent::SelectFrame { page_id: "A".into(), frame_id: "F1".into() },
            SelectionEvent::SelectNode { node_id: "n".into() },
            SelectionEvent::Deselect,
            SelectionEvent::DissolveComplete,
            SelectionEvent::DissolveComplete,
        ]);
        assert_eq!(
            results,
            vec![
                Transition::Applied,
                Transition::Applied,
                Transition::Applied,
                Transition::Applied,
                Transition::Ignored
            ]
        );
        assert_eq!(ctl.phase(), Phase::Idle);
        assert_eq!(ctl.revision(), 4);
    }
}
