use crate::ir::{Chart, EdgeKind, NodeContent, NodeKind, SclNode};
use crate::sizing::SizingConfig;
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

static STEP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^STEP\s+(\S+)(?:\s+FROM\s+(\S+))?").unwrap());
static TRANSITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^TRANSITION\s+(\S+)(?:\s+FROM\s+(\S+))?").unwrap());

const STEP_KEYWORD: &str = "STEP ";
const TRANSITION_KEYWORD: &str = "TRANSITION ";
const ACTION_KEYWORD: &str = "ACTION ";
const CONDITION_KEYWORD: &str = "CONDITION ";
const JUMP_KEYWORD: &str = "JUMP ";
const CONNECT_KEYWORD: &str = "CONNECT ";

/// One trimmed, non-empty source line after keyword classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Declare {
        kind: NodeKind,
        name: &'a str,
        from: Option<&'a str>,
    },
    Action(&'a str),
    Condition(&'a str),
    Jump(Option<&'a str>),
    Continuation(&'a str),
    /// A declaration keyword whose operands did not match.
    Ignored,
}

fn has_keyword(line: &str, keyword: &str) -> bool {
    line.get(..keyword.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
}

fn declaration<'a>(re: &Regex, kind: NodeKind, line: &'a str) -> Line<'a> {
    let Some(caps) = re.captures(line) else {
        return Line::Ignored;
    };
    let Some(name) = caps.get(1) else {
        return Line::Ignored;
    };
    Line::Declare {
        kind,
        name: name.as_str(),
        from: caps.get(2).map(|m| m.as_str()),
    }
}

pub fn classify(line: &str) -> Line<'_> {
    if has_keyword(line, STEP_KEYWORD) {
        declaration(&STEP_RE, NodeKind::Step, line)
    } else if has_keyword(line, TRANSITION_KEYWORD) {
        declaration(&TRANSITION_RE, NodeKind::Transition, line)
    } else if has_keyword(line, ACTION_KEYWORD) {
        Line::Action(line[ACTION_KEYWORD.len()..].trim())
    } else if has_keyword(line, CONDITION_KEYWORD) {
        Line::Condition(line[CONDITION_KEYWORD.len()..].trim())
    } else if has_keyword(line, JUMP_KEYWORD) || has_keyword(line, CONNECT_KEYWORD) {
        Line::Jump(line.split_whitespace().nth(1))
    } else {
        Line::Continuation(line)
    }
}

/// Implicit chaining only crosses a Step/Transition boundary: a declaration of
/// `kind` chains from the cursor when the cursor names a node of the other kind.
pub fn implicit_source<'c>(chart: &'c Chart, current: Option<&'c str>, kind: NodeKind) -> Option<&'c str> {
    let current = current?;
    let node = chart.node(current)?;
    (node.kind() == kind.opposite()).then_some(current)
}

/// State threaded through the fold over source lines.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    chart: Chart,
    current: Option<String>,
    sizing: SizingConfig,
}

impl ParseContext {
    pub fn new(sizing: SizingConfig) -> Self {
        Self {
            chart: Chart::new(),
            current: None,
            sizing,
        }
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_node(&self) -> Option<&SclNode> {
        self.current.as_deref().and_then(|id| self.chart.node(id))
    }

    /// Processes one trimmed, non-empty line.
    pub fn apply(mut self, line: &str) -> Self {
        self.apply_line(classify(line));
        self
    }

    pub fn apply_line(&mut self, line: Line<'_>) {
        match line {
            Line::Declare { kind, name, from } => self.declare(kind, name, from),
            Line::Action(text) => self.append_action(text),
            Line::Condition(text) => self.set_condition(text),
            Line::Jump(target) => self.jump(target),
            Line::Continuation(text) => self.continue_condition(text),
            Line::Ignored => trace!("ignoring malformed declaration"),
        }
    }

    pub fn finish(self) -> Chart {
        self.chart
    }

    fn declare(&mut self, kind: NodeKind, name: &str, from: Option<&str>) {
        if let Some(previous) = self.chart.declare_node(SclNode::new(name, kind, &self.sizing)) {
            trace!(node = name, previous_kind:? = previous.kind(); "node redeclared, prior content discarded");
        }

        // The cursor is checked against the registry after replacement, so
        // redeclaring the current node never chains to itself.
        let source = match from {
            Some(source) => Some(source.to_string()),
            None => implicit_source(&self.chart, self.current.as_deref(), kind).map(str::to_string),
        };
        if let Some(source) = source {
            self.connect(&source, name, EdgeKind::Sequential);
        }

        self.current = Some(name.to_string());
    }

    fn append_action(&mut self, text: &str) {
        let action_height = self.sizing.action_height;
        match self.current_node_mut() {
            Some(SclNode {
                content: NodeContent::Step { actions, .. },
                height,
                ..
            }) => {
                actions.push(text.to_string());
                *height += action_height;
            }
            _ => trace!(action = text; "action outside of a step dropped"),
        }
    }

    fn set_condition(&mut self, text: &str) {
        match self.current_node_mut() {
            Some(SclNode {
                content: NodeContent::Transition { condition, .. },
                ..
            }) => *condition = text.to_string(),
            _ => trace!(condition = text; "condition outside of a transition dropped"),
        }
    }

    fn jump(&mut self, target: Option<&str>) {
        let (Some(current), Some(target)) = (self.current.clone(), target) else {
            trace!("jump without a current node or target dropped");
            return;
        };
        self.connect(&current, target, EdgeKind::Jump);
    }

    fn continue_condition(&mut self, text: &str) {
        match self.current_node_mut() {
            Some(SclNode {
                content: NodeContent::Transition { condition, .. },
                ..
            }) if !condition.is_empty() => {
                condition.push(' ');
                condition.push_str(text.trim());
            }
            _ => trace!(line = text; "continuation line discarded"),
        }
    }

    fn connect(&mut self, source: &str, target: &str, kind: EdgeKind) {
        if !self.chart.add_edge(source, target, kind) {
            trace!(source = source, target = target; "duplicate edge dropped");
        }
    }

    fn current_node_mut(&mut self) -> Option<&mut SclNode> {
        let id = self.current.as_deref()?;
        self.chart.node_mut(id)
    }
}

pub fn source_lines(input: &str) -> impl Iterator<Item = &str> {
    input.lines().map(str::trim).filter(|line| !line.is_empty())
}

pub fn parse_scl(input: &str) -> Chart {
    parse_scl_with(input, &SizingConfig::default())
}

pub fn parse_scl_with(input: &str, sizing: &SizingConfig) -> Chart {
    let chart = source_lines(input)
        .fold(ParseContext::new(sizing.clone()), ParseContext::apply)
        .finish();
    debug!(nodes = chart.nodes.len(), edges = chart.edge_count(); "parsed SCL source");
    chart
}

pub const EXAMPLE_SOURCE: &str = "STEP Init
ACTION Reset=1
TRANSITION T1
CONDITION Start=1
STEP Process
ACTION Run=1
TRANSITION T2
CONDITION Temp>100
STEP CoolDown
ACTION Fan=1
TRANSITION T3
CONDITION Temp<50
JUMP Init

STEP Alarm FROM T2
ACTION Alarm=1
TRANSITION T_Ack
CONDITION Ack=1
JUMP Init";

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_pairs(chart: &Chart) -> Vec<(String, String)> {
        chart
            .edges()
            .map(|edge| (edge.source.clone(), edge.target.clone()))
            .collect()
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(s, t)| (s.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn classify_keywords_case_insensitively() {
        assert_eq!(
            classify("step Init"),
            Line::Declare {
                kind: NodeKind::Step,
                name: "Init",
                from: None
            }
        );
        assert_eq!(
            classify("Transition T2 from S1"),
            Line::Declare {
                kind: NodeKind::Transition,
                name: "T2",
                from: Some("S1")
            }
        );
        assert_eq!(classify("action  Run=1 "), Line::Action("Run=1"));
        assert_eq!(classify("CONDITION Temp > 100"), Line::Condition("Temp > 100"));
        assert_eq!(classify("connect Init now"), Line::Jump(Some("Init")));
        assert_eq!(classify("JUMP Init"), Line::Jump(Some("Init")));
        assert_eq!(classify("AND Pressure<2"), Line::Continuation("AND Pressure<2"));
    }

    #[test]
    fn keyword_requires_separating_space() {
        assert_eq!(classify("STEPS A"), Line::Continuation("STEPS A"));
        assert_eq!(classify("STEP"), Line::Continuation("STEP"));
        assert_eq!(classify("JUMP"), Line::Continuation("JUMP"));
    }

    #[test]
    fn from_needs_an_operand() {
        assert_eq!(
            classify("STEP A FROM"),
            Line::Declare {
                kind: NodeKind::Step,
                name: "A",
                from: None
            }
        );
        assert_eq!(
            classify("STEP A FROMX"),
            Line::Declare {
                kind: NodeKind::Step,
                name: "A",
                from: None
            }
        );
    }

    #[test]
    fn alternation_chains_implicitly() {
        let chart = parse_scl("STEP A\nTRANSITION T\nSTEP B");
        assert_eq!(edge_pairs(&chart), pairs(&[("A", "T"), ("T", "B")]));
        assert!(chart.edges().all(|edge| edge.kind == EdgeKind::Sequential));
    }

    #[test]
    fn same_kind_does_not_chain() {
        let chart = parse_scl("STEP A\nSTEP B\nTRANSITION T1\nTRANSITION T2");
        assert_eq!(edge_pairs(&chart), pairs(&[("B", "T1")]));
    }

    #[test]
    fn from_overrides_implicit_chain() {
        let chart = parse_scl("STEP A\nTRANSITION T\nSTEP B FROM A");
        assert_eq!(edge_pairs(&chart), pairs(&[("A", "T"), ("A", "B")]));
        assert!(!chart.has_edge("T", "B"));
    }

    #[test]
    fn from_ignores_source_kind() {
        let chart = parse_scl("TRANSITION T1\nTRANSITION T2 FROM T1");
        assert_eq!(edge_pairs(&chart), pairs(&[("T1", "T2")]));
    }

    #[test]
    fn out_of_context_action_is_a_no_op() {
        let chart = parse_scl("TRANSITION T\nACTION x=1");
        let node = chart.node("T").unwrap();
        assert!(node.is_transition());
        assert!(node.actions().is_empty());
        assert_eq!(node.condition(), Some(""));
        assert_eq!(node.height, 60.0);
    }

    #[test]
    fn content_before_any_declaration_is_dropped() {
        let chart = parse_scl("ACTION a=1\nCONDITION X\nJUMP Init\nloose text");
        assert!(chart.is_empty());
    }

    #[test]
    fn actions_accumulate_and_grow_height() {
        let chart = parse_scl("STEP S\nACTION a=1\nACTION b=2");
        let node = chart.node("S").unwrap();
        assert_eq!(node.actions(), ["a=1", "b=2"]);
        assert_eq!(node.height, 80.0 + 2.0 * 24.0);
    }

    #[test]
    fn condition_is_overwritten_not_appended() {
        let chart = parse_scl("TRANSITION T\nCONDITION X>1\nCONDITION Y<2");
        assert_eq!(chart.node("T").unwrap().condition(), Some("Y<2"));
    }

    #[test]
    fn condition_outside_transition_is_dropped() {
        let chart = parse_scl("STEP S\nCONDITION X>1");
        assert_eq!(chart.node("S").unwrap().condition(), None);
    }

    #[test]
    fn continuation_extends_condition() {
        let chart = parse_scl("TRANSITION T\nCONDITION X>1\nmore text");
        assert_eq!(chart.node("T").unwrap().condition(), Some("X>1 more text"));
    }

    #[test]
    fn continuation_before_condition_is_discarded() {
        let chart = parse_scl("TRANSITION T\nmore text\nCONDITION X>1");
        assert_eq!(chart.node("T").unwrap().condition(), Some("X>1"));
    }

    #[test]
    fn continuation_after_step_is_discarded() {
        let chart = parse_scl("STEP S\nACTION a=1\nRun=2");
        assert_eq!(chart.node("S").unwrap().actions(), ["a=1"]);
    }

    #[test]
    fn jump_edge_is_marked() {
        let chart = parse_scl("STEP A\nJUMP Init");
        assert_eq!(chart.edge_count(), 1);
        let edge = chart.edge("A", "Init").unwrap();
        assert_eq!(edge.kind, EdgeKind::Jump);
        assert_eq!(edge.style.stroke_dasharray.as_deref(), Some("5,5"));
        assert!(chart.node("Init").is_none());
    }

    #[test]
    fn connect_is_a_jump_synonym() {
        let chart = parse_scl("TRANSITION T3\nCONNECT Init");
        assert!(chart.edge("T3", "Init").unwrap().is_jump());
    }

    #[test]
    fn duplicate_edges_are_suppressed() {
        let chart = parse_scl("STEP A\nTRANSITION T FROM A\nSTEP B\nTRANSITION T2 FROM B\nJUMP A\nJUMP A");
        assert_eq!(
            edge_pairs(&chart),
            pairs(&[("A", "T"), ("T", "B"), ("B", "T2"), ("T2", "A")])
        );
    }

    #[test]
    fn explicit_then_implicit_duplicate_keeps_one() {
        let chart = parse_scl("TRANSITION T\nSTEP B FROM T\nTRANSITION T\nSTEP B");
        assert_eq!(edge_pairs(&chart), pairs(&[("T", "B"), ("B", "T")]));
    }

    #[test]
    fn hyphenated_names_never_share_an_edge_id() {
        let chart = parse_scl(
            "STEP a-b FROM x\nSTEP b-c FROM a\nTRANSITION c FROM a-b\nSTEP a FROM x\nTRANSITION b\nSTEP b-c FROM b",
        );
        let ids: Vec<&str> = chart.edges().map(|edge| edge.id.as_str()).collect();
        assert_eq!(ids, vec!["e-x-a-b", "e-a-b-c", "e-x-a", "e-a-b", "e-b-b-c"]);
        let unique: std::collections::HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(chart.has_edge("a", "b-c"));
        assert!(!chart.has_edge("a-b", "c"));

        let diagram = crate::ir::Diagram::from(chart);
        assert_eq!(diagram.edges.len(), 5);
    }

    #[test]
    fn jump_then_sequential_keeps_first_kind() {
        let chart = parse_scl("TRANSITION T\nJUMP B\nSTEP B");
        assert_eq!(chart.edge_count(), 1);
        assert!(chart.edge("T", "B").unwrap().is_jump());
    }

    #[test]
    fn dangling_source_is_tolerated() {
        let chart = parse_scl("STEP A FROM Ghost");
        assert!(chart.has_edge("Ghost", "A"));
        assert!(chart.node("Ghost").is_none());
        assert_eq!(chart.dangling_edges().count(), 1);
    }

    #[test]
    fn redeclaration_replaces_content() {
        let chart = parse_scl("STEP S\nACTION a=1\nTRANSITION T\nSTEP S");
        let node = chart.node("S").unwrap();
        assert!(node.actions().is_empty());
        assert_eq!(node.height, 80.0);
        assert_eq!(chart.nodes.len(), 2);
    }

    #[test]
    fn redeclaring_current_node_does_not_self_chain() {
        let chart = parse_scl("STEP A\nTRANSITION A");
        assert_eq!(chart.edge_count(), 0);
        assert!(chart.node("A").unwrap().is_transition());
    }

    #[test]
    fn blank_lines_and_whitespace_are_insignificant() {
        let spaced = parse_scl("\n   STEP A  \r\n\n\t TRANSITION T\n\n STEP B\n");
        let compact = parse_scl("STEP A\nTRANSITION T\nSTEP B");
        assert_eq!(spaced, compact);
    }

    #[test]
    fn empty_input_yields_empty_chart() {
        assert!(parse_scl("").is_empty());
        assert!(parse_scl("  \n\n ").is_empty());
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse_scl(EXAMPLE_SOURCE), parse_scl(EXAMPLE_SOURCE));
    }

    #[test]
    fn example_chart_shape() {
        let chart = parse_scl(EXAMPLE_SOURCE);
        let ids: Vec<&str> = chart.nodes.keys().map(String::as_str).collect();
        assert_eq!(
            ids,
            vec!["Init", "T1", "Process", "T2", "CoolDown", "T3", "Alarm", "T_Ack"]
        );
        assert_eq!(
            edge_pairs(&chart),
            pairs(&[
                ("Init", "T1"),
                ("T1", "Process"),
                ("Process", "T2"),
                ("T2", "CoolDown"),
                ("CoolDown", "T3"),
                ("T3", "Init"),
                ("T2", "Alarm"),
                ("Alarm", "T_Ack"),
                ("T_Ack", "Init"),
            ])
        );
        assert!(chart.edge("T3", "Init").unwrap().is_jump());
        assert_eq!(chart.node("T2").unwrap().condition(), Some("Temp>100"));
    }

    #[test]
    fn fold_steps_can_be_tested_individually() {
        let ctx = ParseContext::default().apply("STEP A");
        assert_eq!(ctx.current_id(), Some("A"));
        let ctx = ctx.apply("ACTION x=1");
        assert_eq!(ctx.current_node().unwrap().actions(), ["x=1"]);
        let ctx = ctx.apply("TRANSITION T");
        assert!(ctx.chart().has_edge("A", "T"));
        assert_eq!(ctx.current_id(), Some("T"));
    }

    #[test]
    fn implicit_source_policy() {
        let chart = parse_scl("STEP A\nTRANSITION T");
        assert_eq!(implicit_source(&chart, Some("A"), NodeKind::Transition), Some("A"));
        assert_eq!(implicit_source(&chart, Some("A"), NodeKind::Step), None);
        assert_eq!(implicit_source(&chart, Some("T"), NodeKind::Step), Some("T"));
        assert_eq!(implicit_source(&chart, Some("Missing"), NodeKind::Step), None);
        assert_eq!(implicit_source(&chart, None, NodeKind::Step), None);
    }
}
