use anyhow::Result;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::aggregate::{NamespaceGroup, aggregate};
use crate::catalog::NamespaceCatalog;
use crate::input::Action;
use crate::model::{NamespaceDescriptor, NamespaceScope, PodRecord};
use crate::refresh::{RefreshController, compact_error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    RefreshPods {
        scope: NamespaceScope,
    },
    LoadDetail {
        namespace: String,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailContent {
    Loading,
    Loaded(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub namespace: String,
    pub name: String,
    pub content: DetailContent,
    pub scroll: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RowKey {
    Namespace(String),
    Pod { namespace: String, name: String },
}

#[derive(Debug, Clone)]
pub enum ViewRow<'a> {
    Namespace {
        group: NamespaceGroup<'a>,
        collapsed: bool,
    },
    Pod(&'a PodRecord),
}

impl ViewRow<'_> {
    fn key(&self) -> RowKey {
        match self {
            Self::Namespace { group, .. } => RowKey::Namespace(group.name().to_string()),
            Self::Pod(pod) => {
                let (namespace, name) = pod.identity();
                RowKey::Pod {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                }
            }
        }
    }
}

pub struct App {
    running: bool,
    server: String,
    scope: NamespaceScope,
    refresh_interval: Option<Duration>,
    pods: RefreshController,
    catalog: NamespaceCatalog,
    refresh_queued: bool,
    collapsed: BTreeSet<String>,
    selected: usize,
    page_size: usize,
    detail: Option<DetailView>,
    detail_page_size: u16,
    show_help: bool,
    status: String,
    pulse_on: bool,
}

impl App {
    pub fn new(server: String, scope: NamespaceScope, refresh_interval: Option<Duration>) -> Self {
        Self {
            running: true,
            server,
            pods: RefreshController::new(scope.clone()),
            scope,
            refresh_interval,
            catalog: NamespaceCatalog::new(),
            refresh_queued: false,
            collapsed: BTreeSet::new(),
            selected: 0,
            page_size: 10,
            detail: None,
            detail_page_size: 10,
            show_help: false,
            status: "Ready".to_string(),
            pulse_on: true,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn scope(&self) -> &NamespaceScope {
        &self.scope
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval
    }

    pub fn pods(&self) -> &RefreshController {
        &self.pods
    }

    pub fn catalog(&self) -> &NamespaceCatalog {
        &self.catalog
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn pulse_on(&self) -> bool {
        self.pulse_on
    }

    pub fn advance_pulse(&mut self) {
        self.pulse_on = !self.pulse_on;
    }

    pub fn is_collapsed(&self, namespace: &str) -> bool {
        self.collapsed.contains(namespace)
    }

    pub fn groups(&self) -> Vec<NamespaceGroup<'_>> {
        aggregate(self.pods.records())
    }

    pub fn visible_rows(&self) -> Vec<ViewRow<'_>> {
        let mut rows = Vec::new();
        for group in self.groups() {
            let collapsed = self.is_collapsed(group.name());
            let members = if collapsed {
                Vec::new()
            } else {
                group.members.clone()
            };
            rows.push(ViewRow::Namespace { group, collapsed });
            rows.extend(members.into_iter().map(ViewRow::Pod));
        }
        rows
    }

    pub fn selected_index(&self) -> Option<usize> {
        let len = self.visible_rows().len();
        (len > 0).then(|| self.selected.min(len - 1))
    }

    pub fn selected_pod(&self) -> Option<&PodRecord> {
        let index = self.selected_index()?;
        match self.visible_rows().get(index)? {
            ViewRow::Pod(pod) => Some(*pod),
            ViewRow::Namespace { .. } => None,
        }
    }

    pub fn set_page_size(&mut self, rows: usize) {
        self.page_size = rows.max(1);
    }

    pub fn set_detail_page_size(&mut self, rows: u16) {
        self.detail_page_size = rows.max(1);
    }

    pub fn tick_refresh(&mut self) -> AppCommand {
        if self.pods.is_loading() {
            return AppCommand::None;
        }
        self.refresh_command()
    }

    pub fn request_refresh(&mut self) -> AppCommand {
        if self.pods.is_loading() {
            self.refresh_queued = true;
            self.status = "Refresh already in progress, queued".to_string();
            return AppCommand::None;
        }
        self.refresh_command()
    }

    fn refresh_command(&mut self) -> AppCommand {
        self.refresh_queued = false;
        AppCommand::RefreshPods {
            scope: self.scope.clone(),
        }
    }

    pub fn begin_refresh(&mut self, scope: &NamespaceScope) {
        self.pods.begin(scope);
        self.status = format!("Refreshing pods ({scope})…");
    }

    pub fn finish_refresh(&mut self, result: Result<Vec<PodRecord>>) -> AppCommand {
        let selected_key = self.selected_key();
        self.pods.finish(result);
        self.reselect(selected_key);

        self.status = match &self.pods.state().last_error {
            Some(error) => format!("Refresh failed (showing last data): {error}"),
            None => format!(
                "Loaded {} pods from {}",
                self.pods.records().len(),
                self.pods.scope()
            ),
        };

        if self.refresh_queued {
            return self.refresh_command();
        }
        AppCommand::None
    }

    pub fn finish_catalog(&mut self, result: Result<Vec<NamespaceDescriptor>>) {
        self.catalog.finish(result);
        if let Some(error) = self.catalog.error() {
            self.status = format!("Namespace list unavailable: {error}");
        }
    }

    // Dropped unless the overlay still shows the same pod.
    pub fn finish_detail(&mut self, namespace: &str, name: &str, result: Result<String>) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        if detail.namespace != namespace || detail.name != name {
            return;
        }

        detail.content = match result {
            Ok(text) => DetailContent::Loaded(text),
            Err(error) => DetailContent::Failed(compact_error(&error)),
        };
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if self.show_help && !matches!(action, Action::ToggleHelp | Action::Quit) {
            self.show_help = false;
            if matches!(action, Action::CloseOverlay) {
                return AppCommand::None;
            }
        }

        if self.detail.is_some()
            && let Some(command) = self.apply_detail_action(&action)
        {
            return command;
        }

        match action {
            Action::Quit => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            Action::Down => {
                self.move_selection(1);
                AppCommand::None
            }
            Action::Up => {
                self.move_selection(-1);
                AppCommand::None
            }
            Action::PageDown => {
                self.move_selection(self.page_size as isize);
                AppCommand::None
            }
            Action::PageUp => {
                self.move_selection(-(self.page_size as isize));
                AppCommand::None
            }
            Action::Top => {
                self.selected = 0;
                AppCommand::None
            }
            Action::Bottom => {
                self.selected = self.visible_rows().len().saturating_sub(1);
                AppCommand::None
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                AppCommand::None
            }
            Action::Refresh => self.request_refresh(),
            Action::EnterRow => match self.selected_key() {
                Some(RowKey::Namespace(namespace)) => {
                    self.toggle_namespace(&namespace);
                    AppCommand::None
                }
                Some(RowKey::Pod { namespace, name }) => self.open_detail(namespace, name),
                None => AppCommand::None,
            },
            Action::ShowDetails => match self.selected_key() {
                Some(RowKey::Pod { namespace, name }) => self.open_detail(namespace, name),
                _ => {
                    self.status = "Select a pod to show its manifest".to_string();
                    AppCommand::None
                }
            },
            Action::ToggleCollapse => {
                let namespace = match self.selected_key() {
                    Some(RowKey::Namespace(namespace)) => namespace,
                    Some(RowKey::Pod { namespace, .. }) => namespace,
                    None => return AppCommand::None,
                };
                self.toggle_namespace(&namespace);
                AppCommand::None
            }
            Action::CollapseAll => {
                let selected_namespace = self.selected_namespace();
                self.collapsed = self
                    .groups()
                    .iter()
                    .map(|group| group.name().to_string())
                    .collect();
                self.reselect(selected_namespace.map(RowKey::Namespace));
                AppCommand::None
            }
            Action::ExpandAll => {
                let selected_key = self.selected_key();
                self.collapsed.clear();
                self.reselect(selected_key);
                AppCommand::None
            }
            Action::NextNamespace => self.cycle_scope(1),
            Action::PrevNamespace => self.cycle_scope(-1),
            Action::AllNamespaces => self.switch_scope(NamespaceScope::All),
            Action::CloseOverlay => AppCommand::None,
        }
    }

    fn apply_detail_action(&mut self, action: &Action) -> Option<AppCommand> {
        let page = self.detail_page_size;
        let detail = self.detail.as_mut()?;
        match action {
            Action::CloseOverlay | Action::EnterRow | Action::ShowDetails => {
                self.detail = None;
            }
            Action::Down => detail.scroll = detail.scroll.saturating_add(1),
            Action::Up => detail.scroll = detail.scroll.saturating_sub(1),
            Action::PageDown => detail.scroll = detail.scroll.saturating_add(page),
            Action::PageUp => detail.scroll = detail.scroll.saturating_sub(page),
            Action::Top => detail.scroll = 0,
            Action::Bottom => {
                let lines = match &detail.content {
                    DetailContent::Loaded(text) => text.lines().count(),
                    _ => 0,
                };
                detail.scroll = u16::try_from(lines.saturating_sub(page as usize))
                    .unwrap_or(u16::MAX);
            }
            _ => return None,
        }
        Some(AppCommand::None)
    }

    fn open_detail(&mut self, namespace: String, name: String) -> AppCommand {
        self.detail = Some(DetailView {
            namespace: namespace.clone(),
            name: name.clone(),
            content: DetailContent::Loading,
            scroll: 0,
        });
        self.status = format!("Loading manifest for {namespace}/{name}…");
        AppCommand::LoadDetail { namespace, name }
    }

    fn toggle_namespace(&mut self, namespace: &str) {
        if !self.collapsed.remove(namespace) {
            self.collapsed.insert(namespace.to_string());
        }
        self.reselect(Some(RowKey::Namespace(namespace.to_string())));
    }

    fn cycle_scope(&mut self, delta: isize) -> AppCommand {
        let choices = self.catalog.scope_choices();
        if choices.len() <= 1 {
            self.status = if self.catalog.loading() {
                "Namespace list is still loading".to_string()
            } else {
                "No namespaces to choose from".to_string()
            };
            return AppCommand::None;
        }

        let len = choices.len() as isize;
        let current = choices
            .iter()
            .position(|scope| scope == &self.scope)
            .map_or(0, |index| index as isize);
        let next = (current + delta).rem_euclid(len) as usize;
        self.switch_scope(choices[next].clone())
    }

    fn switch_scope(&mut self, scope: NamespaceScope) -> AppCommand {
        if scope == self.scope {
            return AppCommand::None;
        }
        self.scope = scope;
        self.selected = 0;
        self.status = format!("Namespace scope: {}", self.scope);
        self.request_refresh()
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.visible_rows().len();
        if len == 0 {
            self.selected = 0;
            return;
        }

        let max_index = len.saturating_sub(1) as isize;
        let current = self.selected.min(max_index as usize) as isize;
        self.selected = (current + delta).clamp(0, max_index) as usize;
    }

    fn selected_key(&self) -> Option<RowKey> {
        let rows = self.visible_rows();
        let index = self.selected.min(rows.len().checked_sub(1)?);
        rows.get(index).map(ViewRow::key)
    }

    fn selected_namespace(&self) -> Option<String> {
        match self.selected_key()? {
            RowKey::Namespace(namespace) => Some(namespace),
            RowKey::Pod { namespace, .. } => Some(namespace),
        }
    }

    fn reselect(&mut self, key: Option<RowKey>) {
        let rows = self.visible_rows();
        if rows.is_empty() {
            self.selected = 0;
            return;
        }

        if let Some(key) = key {
            if let Some(index) = rows.iter().position(|row| row.key() == key) {
                self.selected = index;
                return;
            }
            if let RowKey::Pod { namespace, .. } = key
                && let Some(index) = rows
                    .iter()
                    .position(|row| row.key() == RowKey::Namespace(namespace.clone()))
            {
                self.selected = index;
                return;
            }
        }

        self.selected = self.selected.min(rows.len() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::{App, AppCommand, DetailContent, ViewRow};
    use crate::input::Action;
    use crate::model::{NamespaceDescriptor, NamespaceScope, pod};
    use anyhow::anyhow;

    fn app() -> App {
        App::new(
            "http://localhost:8080".to_string(),
            NamespaceScope::All,
            None,
        )
    }

    fn loaded_app() -> App {
        let mut app = app();
        app.begin_refresh(&NamespaceScope::All);
        app.finish_refresh(Ok(vec![
            pod("web", "shop", "Running"),
            pod("api", "shop", "CrashLoopBackOff"),
            pod("coredns", "kube-system", "Running"),
        ]));
        app
    }

    fn row_labels(app: &App) -> Vec<String> {
        app.visible_rows()
            .iter()
            .map(|row| match row {
                ViewRow::Namespace { group, collapsed } => {
                    format!("{}{}", if *collapsed { "+" } else { "-" }, group.name())
                }
                ViewRow::Pod(pod) => pod.name.clone(),
            })
            .collect()
    }

    fn with_catalog(app: &mut App, names: &[&str]) {
        app.finish_catalog(Ok(names
            .iter()
            .map(|name| NamespaceDescriptor {
                name: name.to_string(),
                status: "Active".to_string(),
            })
            .collect()));
    }

    #[test]
    fn rows_are_grouped_and_sorted() {
        let app = loaded_app();
        assert_eq!(
            row_labels(&app),
            vec!["-kube-system", "coredns", "-shop", "api", "web"]
        );
    }

    #[test]
    fn enter_on_namespace_toggles_collapse() {
        let mut app = loaded_app();
        app.apply_action(Action::Down);
        app.apply_action(Action::Down);
        let command = app.apply_action(Action::EnterRow);

        assert_eq!(command, AppCommand::None);
        assert!(app.is_collapsed("shop"));
        assert_eq!(row_labels(&app), vec!["-kube-system", "coredns", "+shop"]);
        assert_eq!(app.selected_index(), Some(2));

        app.apply_action(Action::EnterRow);
        assert!(!app.is_collapsed("shop"));
    }

    #[test]
    fn space_on_pod_collapses_its_namespace() {
        let mut app = loaded_app();
        app.apply_action(Action::Bottom);
        app.apply_action(Action::ToggleCollapse);

        assert!(app.is_collapsed("shop"));
        assert_eq!(app.selected_index(), Some(2));
    }

    #[test]
    fn collapse_and_expand_all() {
        let mut app = loaded_app();
        app.apply_action(Action::CollapseAll);
        assert_eq!(row_labels(&app), vec!["+kube-system", "+shop"]);

        app.apply_action(Action::ExpandAll);
        assert_eq!(row_labels(&app).len(), 5);
    }

    #[test]
    fn enter_on_pod_opens_detail_and_loads_manifest() {
        let mut app = loaded_app();
        app.apply_action(Action::Down);
        let command = app.apply_action(Action::EnterRow);

        assert_eq!(
            command,
            AppCommand::LoadDetail {
                namespace: "kube-system".to_string(),
                name: "coredns".to_string(),
            }
        );
        let detail = app.detail().expect("detail should be open");
        assert_eq!(detail.content, DetailContent::Loading);

        app.finish_detail("kube-system", "coredns", Ok("kind: Pod\n".to_string()));
        assert_eq!(
            app.detail().map(|detail| detail.content.clone()),
            Some(DetailContent::Loaded("kind: Pod\n".to_string()))
        );

        app.apply_action(Action::CloseOverlay);
        assert!(app.detail().is_none());
    }

    #[test]
    fn stale_detail_results_are_dropped() {
        let mut app = loaded_app();
        app.apply_action(Action::Down);
        app.apply_action(Action::ShowDetails);

        app.finish_detail("shop", "web", Ok("kind: Pod\n".to_string()));
        assert_eq!(
            app.detail().map(|detail| detail.content.clone()),
            Some(DetailContent::Loading)
        );

        app.finish_detail("kube-system", "coredns", Err(anyhow!("404 Not Found")));
        assert_eq!(
            app.detail().map(|detail| detail.content.clone()),
            Some(DetailContent::Failed("404 Not Found".to_string()))
        );
    }

    #[test]
    fn show_details_on_namespace_row_does_nothing() {
        let mut app = loaded_app();
        assert_eq!(app.apply_action(Action::ShowDetails), AppCommand::None);
        assert!(app.detail().is_none());
    }

    #[test]
    fn refresh_is_queued_behind_in_flight_fetch() {
        let mut app = app();
        let command = app.apply_action(Action::Refresh);
        assert_eq!(
            command,
            AppCommand::RefreshPods {
                scope: NamespaceScope::All
            }
        );

        app.begin_refresh(&NamespaceScope::All);
        assert_eq!(app.apply_action(Action::Refresh), AppCommand::None);
        assert_eq!(app.tick_refresh(), AppCommand::None);

        let follow_up = app.finish_refresh(Ok(Vec::new()));
        assert_eq!(
            follow_up,
            AppCommand::RefreshPods {
                scope: NamespaceScope::All
            }
        );
    }

    #[test]
    fn tick_does_not_queue() {
        let mut app = app();
        app.begin_refresh(&NamespaceScope::All);
        assert_eq!(app.tick_refresh(), AppCommand::None);
        assert_eq!(app.finish_refresh(Ok(Vec::new())), AppCommand::None);
    }

    #[test]
    fn failed_refresh_keeps_rows_and_reports() {
        let mut app = loaded_app();
        app.begin_refresh(&NamespaceScope::All);
        app.finish_refresh(Err(anyhow!("GET /api/pods returned 503")));

        assert_eq!(row_labels(&app).len(), 5);
        assert!(app.status().contains("503"));
        assert!(app.pods().state().last_error.is_some());
    }

    #[test]
    fn selection_follows_pod_across_refresh() {
        let mut app = loaded_app();
        app.apply_action(Action::Bottom);
        assert_eq!(app.selected_index(), Some(4));

        app.begin_refresh(&NamespaceScope::All);
        app.finish_refresh(Ok(vec![
            pod("web", "shop", "Running"),
            pod("aaa", "shop", "Pending"),
            pod("api", "shop", "Running"),
        ]));

        assert_eq!(row_labels(&app), vec!["-shop", "aaa", "api", "web"]);
        assert_eq!(app.selected_index(), Some(3));
    }

    #[test]
    fn cycling_scope_requests_refresh() {
        let mut app = loaded_app();
        assert_eq!(app.apply_action(Action::NextNamespace), AppCommand::None);
        assert_eq!(app.scope(), &NamespaceScope::All);

        with_catalog(&mut app, &["default", "shop"]);
        let command = app.apply_action(Action::NextNamespace);
        assert_eq!(
            command,
            AppCommand::RefreshPods {
                scope: NamespaceScope::Named("default".to_string())
            }
        );
        assert_eq!(row_labels(&app).len(), 5);

        app.apply_action(Action::PrevNamespace);
        assert_eq!(app.scope(), &NamespaceScope::All);
        app.apply_action(Action::PrevNamespace);
        assert_eq!(app.scope(), &NamespaceScope::Named("shop".to_string()));

        let command = app.apply_action(Action::AllNamespaces);
        assert_eq!(
            command,
            AppCommand::RefreshPods {
                scope: NamespaceScope::All
            }
        );
        assert_eq!(app.apply_action(Action::AllNamespaces), AppCommand::None);
    }

    #[test]
    fn catalog_failure_does_not_touch_pods() {
        let mut app = loaded_app();
        app.finish_catalog(Err(anyhow!("GET /api/namespaces returned 500")));

        assert!(app.catalog().error().is_some());
        assert!(app.pods().state().last_error.is_none());
        assert_eq!(row_labels(&app).len(), 5);
    }

    #[test]
    fn help_closes_on_escape_without_quitting() {
        let mut app = loaded_app();
        app.apply_action(Action::ToggleHelp);
        assert!(app.show_help());
        app.apply_action(Action::CloseOverlay);
        assert!(!app.show_help());
        assert!(app.running());
        app.apply_action(Action::Quit);
        assert!(!app.running());
    }
}
