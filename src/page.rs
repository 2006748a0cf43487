use std::collections::{HashMap, VecDeque};

use crate::dom::{Dom, NodeId};
use crate::html::parse_html;
use crate::selector;
use crate::{Error, Result};

pub type TimerId = i64;

/// Identifies one attached event listener so it can be detached later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle {
    pub(crate) node: NodeId,
    pub(crate) listener_id: u64,
}

/// What a listener does when its event fires. Listener behavior is data, not
/// closures, so pending wiring stays inspectable and disposable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListenerAction {
    /// Check the radio input nested inside the listening element.
    CheckNestedRadio,
    /// Remove the listening element immediately and cancel its timers.
    DismissNotice,
}

#[derive(Debug, Clone, Copy)]
struct Listener {
    id: u64,
    action: ListenerAction,
}

#[derive(Debug, Default)]
struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    fn add(&mut self, node_id: NodeId, event: String, listener: Listener) {
        self.map
            .entry(node_id)
            .or_default()
            .entry(event)
            .or_default()
            .push(listener);
    }

    fn remove(&mut self, node_id: NodeId, listener_id: u64) -> bool {
        let Some(events) = self.map.get_mut(&node_id) else {
            return false;
        };
        let mut removed = false;
        for listeners in events.values_mut() {
            let before = listeners.len();
            listeners.retain(|listener| listener.id != listener_id);
            removed |= listeners.len() != before;
        }
        removed
    }

    fn remove_node(&mut self, node_id: NodeId) {
        self.map.remove(&node_id);
    }

    fn get(&self, node_id: NodeId, event: &str) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }
}

/// The action a scheduled timer performs when it comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerAction {
    /// Apply the opacity fade to a notice, then queue its removal.
    FadeOut {
        node: NodeId,
        remove_delay_ms: i64,
    },
    Remove {
        node: NodeId,
    },
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    id: TimerId,
    due_at: i64,
    order: i64,
    action: TimerAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: TimerId,
    pub due_at: i64,
    pub order: i64,
}

/// An in-memory page with a virtual clock. Time only moves when the caller
/// advances it, and every scheduled behavior is cancellable by id.
#[derive(Debug)]
pub struct Page {
    pub(crate) dom: Dom,
    listeners: ListenerStore,
    task_queue: Vec<ScheduledTask>,
    now_ms: i64,
    timer_step_limit: usize,
    next_timer_id: TimerId,
    next_task_order: i64,
    next_listener_id: u64,
    pub(crate) saved_labels: HashMap<NodeId, String>,
    pub(crate) scroll_target: Option<NodeId>,
    pub(crate) confirm_responses: VecDeque<bool>,
    pub(crate) default_confirm_response: bool,
    pub(crate) confirm_prompts: Vec<String>,
    trace: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            task_queue: Vec::new(),
            now_ms: 0,
            timer_step_limit: 10_000,
            next_timer_id: 1,
            next_task_order: 0,
            next_listener_id: 1,
            saved_labels: HashMap::new(),
            scroll_target: None,
            confirm_responses: VecDeque::new(),
            default_confirm_response: false,
            confirm_prompts: Vec::new(),
            trace: false,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        })
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::PageRuntime(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::PageRuntime(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.timer_step_limit = max_steps;
        Ok(())
    }

    /// Queues the answer the next blocking confirmation prompt receives.
    pub fn queue_confirm_response(&mut self, accepted: bool) {
        self.confirm_responses.push_back(accepted);
    }

    pub fn set_default_confirm_response(&mut self, accepted: bool) {
        self.default_confirm_response = accepted;
    }

    /// Prompts shown so far, oldest first. Draining, like trace logs.
    pub fn take_confirm_prompts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.confirm_prompts)
    }

    /// Id of the element the viewport last smooth-scrolled to.
    pub fn scroll_target_id(&self) -> Option<String> {
        self.scroll_target
            .and_then(|node| self.dom.attr(node, "id"))
    }

    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::PageRuntime(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.now_ms;
        let target = self.now_ms.saturating_add(delta_ms);
        let ran = self.run_timer_queue(Some(target))?;
        self.now_ms = target;
        self.trace_line(format!(
            "[timer] advance delta_ms={delta_ms} from={from} to={target} ran_due={ran}"
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        if target_ms < self.now_ms {
            return Err(Error::PageRuntime(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={})",
                self.now_ms
            )));
        }
        let from = self.now_ms;
        let ran = self.run_timer_queue(Some(target_ms))?;
        self.now_ms = target_ms;
        self.trace_line(format!(
            "[timer] advance_to from={from} to={target_ms} ran_due={ran}"
        ));
        Ok(())
    }

    /// Runs every pending timer, advancing the clock to each due time.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.now_ms;
        let ran = self.run_timer_queue(None)?;
        self.trace_line(format!(
            "[timer] flush from={} to={} ran={}",
            from, self.now_ms, ran
        ));
        Ok(())
    }

    pub fn run_due_timers(&mut self) -> Result<usize> {
        let ran = self.run_timer_queue(Some(self.now_ms))?;
        self.trace_line(format!(
            "[timer] run_due now_ms={} ran={}",
            self.now_ms, ran
        ));
        Ok(ran)
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub fn cancel_timer(&mut self, timer_id: TimerId) -> bool {
        let before = self.task_queue.len();
        self.task_queue.retain(|task| task.id != timer_id);
        let existed = self.task_queue.len() != before;
        self.trace_line(format!("[timer] cancel id={timer_id} existed={existed}"));
        existed
    }

    pub fn cancel_all_timers(&mut self) -> usize {
        let cleared = self.task_queue.len();
        self.task_queue.clear();
        self.trace_line(format!("[timer] cancel_all cleared={cleared}"));
        cleared
    }

    pub(crate) fn schedule(&mut self, delay_ms: i64, action: TimerAction) -> TimerId {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        let due_at = self.now_ms.saturating_add(delay_ms.max(0));
        self.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            action,
        });
        self.trace_line(format!(
            "[timer] schedule id={id} due_at={due_at} action={action:?}"
        ));
        id
    }

    /// Drops pending timers whose action targets `node`.
    pub(crate) fn cancel_timers_for(&mut self, node: NodeId) {
        self.task_queue.retain(|task| match task.action {
            TimerAction::FadeOut { node: target, .. } | TimerAction::Remove { node: target } => {
                target != node
            }
        });
    }

    /// Runs tasks due at or before `due_limit` (all tasks when `None`) in
    /// `(due_at, order)` order, stepping the clock through each task's due
    /// time. Tasks a running task schedules are therefore relative to that
    /// task's own due time, keeping per-notice fade/removal spacing exact
    /// even across coarse jumps.
    fn run_timer_queue(&mut self, due_limit: Option<i64>) -> Result<usize> {
        let mut steps = 0usize;
        while let Some(next_idx) = self.next_task_index(due_limit) {
            steps += 1;
            if steps > self.timer_step_limit {
                return Err(Error::PageRuntime(format!(
                    "timer step limit exceeded (max_steps={}, steps={steps})",
                    self.timer_step_limit
                )));
            }
            let task = self.task_queue.remove(next_idx);
            if task.due_at > self.now_ms {
                self.now_ms = task.due_at;
            }
            self.execute_timer_task(task)?;
        }
        Ok(steps)
    }

    fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.map(|limit| task.due_at <= limit).unwrap_or(true))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    fn execute_timer_task(&mut self, task: ScheduledTask) -> Result<()> {
        match task.action {
            TimerAction::FadeOut {
                node,
                remove_delay_ms,
            } => {
                if !self.dom.is_connected(node) {
                    self.trace_line(format!("[timer] fade skipped, node gone id={}", task.id));
                    return Ok(());
                }
                self.dom.style_set(node, "transition", "opacity 0.3s");
                self.dom.style_set(node, "opacity", "0");
                self.schedule(remove_delay_ms, TimerAction::Remove { node });
            }
            TimerAction::Remove { node } => {
                if !self.dom.is_connected(node) {
                    return Ok(());
                }
                self.dom.remove_node(node)?;
                self.listeners.remove_node(node);
            }
        }
        Ok(())
    }

    pub(crate) fn add_listener(
        &mut self,
        node: NodeId,
        event: &str,
        action: ListenerAction,
    ) -> ListenerHandle {
        let listener_id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners
            .add(node, event.to_string(), Listener { id: listener_id, action });
        ListenerHandle { node, listener_id }
    }

    pub fn remove_listener(&mut self, handle: ListenerHandle) -> bool {
        self.listeners.remove(handle.node, handle.listener_id)
    }

    /// Dispatches a click to the first element matching `selector`. The click
    /// bubbles root-ward; disabled targets swallow it, as controls do.
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = selector::select_one(&self.dom, selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        self.dispatch_click(target)
    }

    fn dispatch_click(&mut self, target: NodeId) -> Result<()> {
        let mut plan: Vec<(NodeId, ListenerAction)> = Vec::new();
        let mut cursor = Some(target);
        while let Some(current) = cursor {
            for listener in self.listeners.get(current, "click") {
                plan.push((current, listener.action));
            }
            cursor = self.dom.parent(current);
        }
        for (owner, action) in plan {
            if !self.dom.is_connected(owner) {
                continue;
            }
            self.run_listener_action(owner, action)?;
        }
        Ok(())
    }

    fn run_listener_action(&mut self, owner: NodeId, action: ListenerAction) -> Result<()> {
        match action {
            ListenerAction::CheckNestedRadio => {
                let radios = selector::select_all_within(&self.dom, owner, "input[type=radio]")?;
                if let Some(radio) = radios.into_iter().next() {
                    self.check_radio(radio)?;
                }
            }
            ListenerAction::DismissNotice => {
                self.dismiss_notice(owner);
            }
        }
        Ok(())
    }

    /// Removes a notice immediately, cancelling any fade/removal still
    /// pending for it. Returns whether the notice was still in the page.
    pub(crate) fn dismiss_notice(&mut self, node: NodeId) -> bool {
        if !self.dom.is_connected(node) {
            return false;
        }
        self.cancel_timers_for(node);
        let removed = self.dom.remove_node(node).is_ok();
        self.listeners.remove_node(node);
        self.trace_line(format!("[notice] dismissed node={node:?}"));
        removed
    }

    /// Checks a radio input and unchecks the rest of its named group, scoped
    /// to the enclosing form when there is one.
    fn check_radio(&mut self, radio: NodeId) -> Result<()> {
        self.dom.set_checked(radio, true)?;
        let Some(group_name) = self.dom.attr(radio, "name") else {
            return Ok(());
        };
        let scope = self.enclosing_form(radio).unwrap_or(self.dom.root);
        let peers = selector::select_all_within(&self.dom, scope, "input[type=radio]")?;
        for peer in peers {
            if peer != radio && self.dom.attr(peer, "name").as_deref() == Some(group_name.as_str()) {
                self.dom.set_checked(peer, false)?;
            }
        }
        Ok(())
    }

    fn enclosing_form(&self, node: NodeId) -> Option<NodeId> {
        let mut cursor = self.dom.parent(node);
        while let Some(current) = cursor {
            if self
                .dom
                .tag_name(current)
                .map(|tag| tag.eq_ignore_ascii_case("form"))
                .unwrap_or(false)
            {
                return Some(current);
            }
            cursor = self.dom.parent(current);
        }
        None
    }

    /// Types into an input or textarea, replacing its value.
    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = selector::select_one(&self.dom, selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        let tag = self
            .dom
            .tag_name(target)
            .unwrap_or_default()
            .to_ascii_lowercase();
        if tag != "input" && tag != "textarea" {
            return Err(Error::PageRuntime(format!(
                "type_text target must be input or textarea, got <{tag}>"
            )));
        }
        self.dom.set_value(target, text)
    }

    pub fn exists(&self, selector: &str) -> Result<bool> {
        Ok(!selector::select_all(&self.dom, selector)?.is_empty())
    }

    pub fn count(&self, selector: &str) -> Result<usize> {
        Ok(selector::select_all(&self.dom, selector)?.len())
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let node = selector::select_one(&self.dom, selector)?;
        Ok(self.dom.text_content(node))
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let node = selector::select_one(&self.dom, selector)?;
        Ok(self.dom.attr(node, name))
    }

    /// Sets an attribute on the first match. Ids are re-indexed, and the
    /// `value`/`checked`/`disabled`/`required` properties track their
    /// attributes.
    pub fn set_attr(&mut self, selector: &str, name: &str, value: &str) -> Result<()> {
        let node = selector::select_one(&self.dom, selector)?;
        self.dom.set_attr(node, name, value)
    }

    /// Removes an attribute from the first match, clearing the matching
    /// boolean property for `checked`/`disabled`/`required`.
    pub fn remove_attr(&mut self, selector: &str, name: &str) -> Result<()> {
        let node = selector::select_one(&self.dom, selector)?;
        self.dom.remove_attr(node, name)
    }

    pub fn style_value(&self, selector: &str, property: &str) -> Result<Option<String>> {
        let node = selector::select_one(&self.dom, selector)?;
        Ok(self.dom.style_get(node, property))
    }

    pub fn is_disabled(&self, selector: &str) -> Result<bool> {
        let node = selector::select_one(&self.dom, selector)?;
        Ok(self.dom.disabled(node))
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let node = selector::select_one(&self.dom, selector)?;
        let actual = self.dom.text_content(node);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.into(),
                expected: expected.into(),
                actual,
                dom_snippet: self.dom.dump_node(node),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let node = selector::select_one(&self.dom, selector)?;
        let actual = self.dom.value(node).unwrap_or_default().to_string();
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.into(),
                expected: expected.into(),
                actual,
                dom_snippet: self.dom.dump_node(node),
            });
        }
        Ok(())
    }

    pub fn assert_checked(&self, selector: &str, expected: bool) -> Result<()> {
        let node = selector::select_one(&self.dom, selector)?;
        let actual = self.dom.checked(node);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.into(),
                expected: expected.to_string(),
                actual: actual.to_string(),
                dom_snippet: self.dom.dump_node(node),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        if selector::select_all(&self.dom, selector)?.is_empty() {
            return Err(Error::SelectorNotFound(selector.into()));
        }
        Ok(())
    }

    pub fn assert_not_exists(&self, selector: &str) -> Result<()> {
        let matches = selector::select_all(&self.dom, selector)?;
        if let Some(node) = matches.first() {
            return Err(Error::AssertionFailed {
                selector: selector.into(),
                expected: "no match".into(),
                actual: format!("{} match(es)", matches.len()),
                dom_snippet: self.dom.dump_node(*node),
            });
        }
        Ok(())
    }

    pub(crate) fn trace_line(&mut self, line: String) {
        if !self.trace {
            return;
        }
        if self.trace_to_stderr {
            eprintln!("{line}");
        }
        self.trace_logs.push(line);
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
    }
}
