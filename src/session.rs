//! Session state around the annotation pass.
//!
//! A [`TreeSession`] owns everything a pass reads besides the records
//! themselves: the layout configuration, the [`SessionContext`], the named
//! groups and optionally a measurer of its own. Every state change that
//! affects the layout reruns the pass over the last accepted snapshot.
//!
//! Updates are transactional. A change is committed only when its pass
//! succeeds; on a fatal error the previous annotated tree, configuration and
//! groups stay as they were and the error is returned. Subscribers are called
//! once per committed pass.

use std::collections::HashSet;
use std::sync::Arc;

use log::{info, warn};

use crate::config::{LayoutConfig, LayoutMode};
use crate::error::{Error, LayoutError};
use crate::graph::{Hierarchy, Node};
use crate::groups::Groups;
use crate::layout::{AnnotatedTree, annotate};
use crate::measure::TextMeasure;
use crate::names::{DisplayNames, ParamName};
use crate::protocol::{PROBE_RECEIPT, RelayMessage, TreeMessage};

/// Per-session inputs to the pass other than the records and geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    /// Prefix → display name mapping.
    pub names: DisplayNames,
    /// Parameters shared by the whole model, kept out of node labels.
    pub globals: HashSet<String>,
    /// Cutoff drawn by the renderer for global parameters.
    pub global_limit: Option<f32>,
    /// Selected group; `None` shows the whole tree.
    pub group: Option<String>,
}

/// Handle returned by [`TreeSession::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u32);

type Subscriber = Box<dyn FnMut(&AnnotatedTree)>;

/// What a relay message did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    /// Text to send straight back to the relay.
    Reply(&'static str),
    /// A new tree was committed.
    Tree(Arc<AnnotatedTree>),
    /// Groups were replaced; the tree was re-laid out if one is loaded.
    Groups,
}

/// The state a pass runs against.
#[derive(Clone)]
struct State {
    config: LayoutConfig,
    context: SessionContext,
    groups: Groups,
}

pub struct TreeSession {
    state: State,
    measure: Option<Arc<dyn TextMeasure>>,
    records: Option<Arc<[Node]>>,
    current: Option<Arc<AnnotatedTree>>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u32,
}

impl TreeSession {
    /// A session using the process-wide measurer.
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            state: State {
                config,
                context: SessionContext::default(),
                groups: Groups::new(),
            },
            measure: None,
            records: None,
            current: None,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// A session with its own measurer.
    pub fn with_measure(config: LayoutConfig, measure: impl TextMeasure + 'static) -> Self {
        Self {
            measure: Some(Arc::new(measure)),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.state.config
    }

    pub fn context(&self) -> &SessionContext {
        &self.state.context
    }

    pub fn groups(&self) -> &Groups {
        &self.state.groups
    }

    /// The last committed tree.
    pub fn current(&self) -> Option<Arc<AnnotatedTree>> {
        self.current.clone()
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register a callback invoked after every committed pass.
    pub fn subscribe(&mut self, callback: impl FnMut(&AnnotatedTree) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Lay out a new snapshot.
    ///
    /// Groups are reconciled against the new tree first: members it lacks are
    /// dropped, then every remaining member's ancestors are added.
    pub fn load(&mut self, nodes: Vec<Node>) -> Result<Arc<AnnotatedTree>, Error> {
        let mut state = self.state.clone();
        // An invalid snapshot is reported by the pass itself.
        if let Ok(hierarchy) = Hierarchy::build(nodes.clone()) {
            reconcile(&mut state.groups, &hierarchy);
        }
        self.commit(nodes.into(), state)
    }

    pub fn set_config(&mut self, config: LayoutConfig) -> Result<(), Error> {
        self.update(|state| state.config = config)
    }

    pub fn set_mode(&mut self, mode: LayoutMode) -> Result<(), Error> {
        self.update(|state| state.config.mode = mode)
    }

    pub fn set_show_globals(&mut self, show: bool) -> Result<(), Error> {
        self.update(|state| state.config.show_globals = show)
    }

    pub fn set_names(&mut self, names: DisplayNames) -> Result<(), Error> {
        self.update(|state| state.context.names = names)
    }

    /// Give every prefix in the loaded records that has no display name its
    /// generated abbreviation (`factor_loadings` → `fl`).
    ///
    /// Abbreviations are opt-in; until this is called unnamed prefixes are
    /// shown literally. Returns how many names were added.
    pub fn register_default_names(&mut self) -> Result<usize, Error> {
        let Some(records) = self.records.clone() else {
            return Ok(0);
        };
        let mut state = self.state.clone();
        let added = state.context.names.register_defaults(
            records
                .iter()
                .flat_map(|node| &node.params)
                .map(|param| ParamName::prefix_of(param)),
        );
        if added > 0 {
            self.apply(state)?;
        }
        Ok(added)
    }

    pub fn set_globals(
        &mut self,
        globals: HashSet<String>,
        limit: Option<f32>,
    ) -> Result<(), Error> {
        self.update(|state| {
            state.context.globals = globals;
            state.context.global_limit = limit;
        })
    }

    /// Restrict the tree to a group and its ancestors. Unknown names show everything.
    pub fn select_group(&mut self, group: Option<String>) -> Result<(), Error> {
        self.update(|state| state.context.group = group)
    }

    pub fn define_group(&mut self, name: &str, nodes: Vec<String>) -> Result<(), Error> {
        let mut state = self.state.clone();
        state.groups.define(name, nodes)?;
        self.apply(state)
    }

    pub fn remove_group(&mut self, name: &str) -> Result<(), Error> {
        self.update(|state| {
            state.groups.remove(name);
        })
    }

    /// Decode and apply one relay message.
    pub fn handle_message(&mut self, text: &str) -> Result<Handled, Error> {
        match RelayMessage::decode(text)? {
            RelayMessage::Probe => Ok(Handled::Reply(PROBE_RECEIPT)),
            RelayMessage::Tree(message) => self.apply_tree(message).map(Handled::Tree),
            RelayMessage::Groups(groups) => {
                self.update(|state| state.groups = groups)?;
                Ok(Handled::Groups)
            }
        }
    }

    fn apply_tree(&mut self, message: TreeMessage) -> Result<Arc<AnnotatedTree>, Error> {
        if let Some(sid) = &message.sid {
            info!("tree update for session {sid}");
        }
        let hierarchy = Hierarchy::build(message.nodes.clone())?;
        let mut state = self.state.clone();
        state.context.globals = message.globals;
        state.context.global_limit = message.global_limit;
        state.groups.merge(message.groups);
        reconcile(&mut state.groups, &hierarchy);
        self.commit(message.nodes.into(), state)
    }

    fn update(&mut self, change: impl FnOnce(&mut State)) -> Result<(), Error> {
        let mut state = self.state.clone();
        change(&mut state);
        self.apply(state)
    }

    /// Rerun over the current records, or just store `state` if none are loaded.
    fn apply(&mut self, state: State) -> Result<(), Error> {
        match self.records.clone() {
            Some(records) => self.commit(records, state).map(|_| ()),
            None => {
                self.state = state;
                Ok(())
            }
        }
    }

    fn commit(&mut self, records: Arc<[Node]>, state: State) -> Result<Arc<AnnotatedTree>, Error> {
        let tree = match self.run(&records, &state) {
            Ok(tree) => Arc::new(tree),
            Err(err) => {
                if self.current.is_some() {
                    warn!("keeping previous tree: {err}");
                }
                return Err(err.into());
            }
        };
        self.state = state;
        self.records = Some(records);
        self.current = Some(Arc::clone(&tree));
        for (_, subscriber) in &mut self.subscribers {
            subscriber(tree.as_ref());
        }
        Ok(tree)
    }

    fn run(&self, records: &[Node], state: &State) -> Result<AnnotatedTree, LayoutError> {
        annotate(
            records,
            &state.config,
            &state.context,
            &state.groups,
            self.measure.as_deref(),
        )
    }
}

fn reconcile(groups: &mut Groups, hierarchy: &Hierarchy) {
    groups.prune(hierarchy);
    groups.expand(hierarchy);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::StructuralError;
    use crate::measure::FixedWidthMeasure;

    fn session() -> TreeSession {
        TreeSession::with_measure(LayoutConfig::default(), FixedWidthMeasure::new(6.0))
    }

    fn snapshot() -> Vec<Node> {
        vec![
            Node::new("1", "", 0.0, vec!["a[1]", "a[2]", "s"]),
            Node::new("2", "1", 0.4, vec!["a[1]", "s"]),
            Node::new("3", "1", 0.3, vec!["a[2]"]),
        ]
    }

    fn counter(session: &mut TreeSession) -> (Rc<RefCell<usize>>, SubscriptionId) {
        let count = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&count);
        let id = session.subscribe(move |_| *seen.borrow_mut() += 1);
        (count, id)
    }

    #[test]
    fn test_subscribers_notified_once_per_pass() {
        let mut session = session();
        let (count, id) = counter(&mut session);

        session.load(snapshot()).unwrap();
        assert_eq!(*count.borrow(), 1);
        session.set_mode(LayoutMode::Sequence).unwrap();
        assert_eq!(*count.borrow(), 2);
        assert_eq!(session.current().unwrap().mode, LayoutMode::Sequence);

        assert!(session.unsubscribe(id));
        session.set_show_globals(false).unwrap();
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_fatal_error_keeps_previous_tree() {
        let mut session = session();
        let first = session.load(snapshot()).unwrap();
        let (count, _) = counter(&mut session);

        let broken = vec![
            Node::new("1", "", 0.0, Vec::<String>::new()),
            Node::new("2", "nobody", 0.0, Vec::<String>::new()),
        ];
        let err = session.load(broken).unwrap_err();
        assert!(matches!(
            err,
            Error::Layout(LayoutError::Structural(StructuralError::MissingParent { .. }))
        ));
        assert!(Arc::ptr_eq(&first, &session.current().unwrap()));
        assert_eq!(*count.borrow(), 0);

        // Later changes still apply to the last good snapshot.
        session.set_mode(LayoutMode::Sequence).unwrap();
        assert_eq!(session.current().unwrap().len(), 3);
    }

    #[test]
    fn test_settings_before_load_are_kept() {
        let mut session = session();
        session.set_mode(LayoutMode::Sequence).unwrap();
        assert!(session.current().is_none());
        let tree = session.load(snapshot()).unwrap();
        assert_eq!(tree.mode, LayoutMode::Sequence);
    }

    #[test]
    fn test_select_group_filters_tree() {
        let mut session = session();
        session.load(snapshot()).unwrap();
        session.define_group("right", vec!["3".into()]).unwrap();
        session.select_group(Some("right".into())).unwrap();
        let names: Vec<_> = session
            .current()
            .unwrap()
            .nodes
            .iter()
            .map(|n| n.node.name.clone())
            .collect();
        assert_eq!(names, vec!["1", "3"]);

        session.select_group(None).unwrap();
        assert_eq!(session.current().unwrap().len(), 3);
    }

    #[test]
    fn test_load_drops_groups_missing_from_new_tree() {
        let mut session = session();
        session.load(snapshot()).unwrap();
        session.define_group("right", vec!["3".into()]).unwrap();
        session.select_group(Some("right".into())).unwrap();
        assert_eq!(session.current().unwrap().len(), 2);

        let next = vec![
            Node::new("1", "", 0.0, vec!["a[1]"]),
            Node::new("7", "1", 0.2, vec!["a[1]"]),
        ];
        let tree = session.load(next).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.get("7").is_some());
        assert!(session.groups().get("right").is_none());
    }

    #[test]
    fn test_load_expands_surviving_groups() {
        let mut session = session();
        session.load(snapshot()).unwrap();
        session.define_group("g", vec!["2".into(), "3".into()]).unwrap();

        let next = vec![
            Node::new("1", "", 0.0, Vec::<String>::new()),
            Node::new("4", "1", 0.0, Vec::<String>::new()),
            Node::new("3", "4", 0.0, Vec::<String>::new()),
        ];
        session.load(next).unwrap();
        let members: Vec<_> = session.groups().get("g").unwrap().iter().cloned().collect();
        assert_eq!(members, vec!["1", "3", "4"]);
    }

    #[test]
    fn test_register_default_names() {
        let labels = |s: &TreeSession| s.current().unwrap().nodes[0].param_names.clone();
        let mut session = session();
        assert_eq!(session.register_default_names().unwrap(), 0);

        let root = Node::new("1", "", 0.0, vec!["overall_sd", "mu[1]", "mu[2]"]);
        session.load(vec![root]).unwrap();
        assert_eq!(labels(&session), vec!["overall_sd", "mu[1-2]"]);

        let mut names = DisplayNames::new();
        names.insert_plain("mu", "μ");
        session.set_names(names).unwrap();
        assert_eq!(session.register_default_names().unwrap(), 1);
        assert_eq!(labels(&session), vec!["os", "μ[1-2]"]);
        assert_eq!(session.register_default_names().unwrap(), 0);
    }

    #[test]
    fn test_tree_message_sets_globals_and_groups() {
        let mut session = session();
        let text = serde_json::json!({
            "type": "tree",
            "tree": serde_json::to_string(&snapshot()).unwrap(),
            "globals": "[\"s\"]",
            "global_limit": "0.1",
            "groups": "{\"g\":[\"2\",\"ghost\"]}",
        })
        .to_string();

        let Handled::Tree(tree) = session.handle_message(&text).unwrap() else {
            panic!("expected a tree");
        };
        assert_eq!(tree.global_limit, Some(0.1));
        assert_eq!(tree.get("2").unwrap().param_names, vec!["a", "ḡ"]);
        let members: Vec<_> = session.groups().get("g").unwrap().iter().cloned().collect();
        assert_eq!(members, vec!["1", "2"], "pruned and expanded");
    }

    #[test]
    fn test_probe_and_bad_messages() {
        let mut session = session();
        assert_eq!(
            session.handle_message("test_message").unwrap(),
            Handled::Reply("test_receipt")
        );
        assert!(matches!(
            session.handle_message(r#"{"type":"nope"}"#),
            Err(Error::Protocol(_))
        ));
        assert!(matches!(session.define_group("", vec![]), Err(Error::Group(_))));
    }
}
