use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::aggregate::NamespaceGroup;
use crate::app::{App, DetailContent, DetailView, ViewRow};
use crate::model::PodRecord;
use crate::quantity::{ResourceKind, ResourceUsage, format_bytes, format_millicores};
use crate::status::{StatusClass, StatusTone};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);
const BAR_CELLS: usize = 6;

const HEADERS: [&str; 7] = ["NAME", "STATUS", "READY", "RESTARTS", "CPU", "MEMORY", "AGE"];

pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    app.set_page_size(table_rows_visible(root[1]));
    render_table(frame, root[1], app);
    render_footer(frame, root[2], app);

    if let Some(detail) = app.detail() {
        let area = centered_rect(84, 80, frame.area());
        let (_, height) = detail_viewport(area);
        let detail = detail.clone();
        app.set_detail_page_size(height);
        render_detail(frame, area, &detail);
    }

    if app.show_help() {
        render_help_modal(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let groups = app.groups();
    let pods = app.pods();
    let state = pods.state();

    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " 󱃾 podglass ", Color::White, PL_A, PL_B);
    push_powerline_segment(
        &mut spans,
        format!(
            " {} pods in {} namespaces ",
            state.records.len(),
            groups.len()
        ),
        Color::White,
        PL_B,
        PL_C,
    );
    push_powerline_segment(
        &mut spans,
        format!(" scope:{} ", app.scope()),
        Color::White,
        PL_C,
        BG,
    );

    let updated = state
        .last_success
        .map(|time| time.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    spans.push(Span::styled(
        format!(" updated {updated}"),
        Style::default().fg(MUTED),
    ));

    if pods.is_loading() {
        let dot = if app.pulse_on() { "●" } else { "○" };
        spans.push(Span::styled(
            format!("  {dot} refreshing"),
            Style::default().fg(WARN),
        ));
    }

    if let Some(error) = &state.last_error {
        let budget = (area.width as usize).saturating_sub(spans_width(&spans) + 4);
        spans.push(Span::styled(
            format!("  󰅚 {}", compact_text(first_line(error), budget.max(8))),
            Style::default().fg(ERROR),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG).fg(Color::White)),
        area,
    );
}

fn render_table(frame: &mut Frame, area: Rect, app: &App) {
    let rows = app.visible_rows();
    let block = Block::default()
        .title(format!(" Pods ({}) · {} ", app.scope(), app.server()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));

    if rows.is_empty() {
        let waiting = app.pods().is_loading()
            || (app.pods().state().last_success.is_none()
                && app.pods().state().last_error.is_none());
        let mut lines = vec![Line::from(Span::styled(
            if waiting {
                "Loading pods…"
            } else {
                "No pods found"
            },
            Style::default().fg(MUTED),
        ))];
        if let Some(error) = &app.pods().state().last_error {
            lines.push(Line::from(""));
            lines.extend(error_lines(error));
        }
        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
            area,
        );
        return;
    }

    let header_row = Row::new(HEADERS.iter().map(|header| {
        Cell::from(*header).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));

    let table_rows = rows.iter().map(|row| match row {
        ViewRow::Namespace { group, collapsed } => namespace_row(group, *collapsed),
        ViewRow::Pod(pod) => pod_row(pod, app.pulse_on()),
    });

    let table = Table::new(
        table_rows,
        [
            Constraint::Percentage(28),
            Constraint::Percentage(16),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Percentage(18),
            Constraint::Percentage(18),
            Constraint::Length(8),
        ],
    )
    .header(header_row)
    .block(block)
    .column_spacing(1)
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(24, 36, 58))
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("󰜴 ");

    let mut state = TableState::default();
    state.select(app.selected_index());
    frame.render_stateful_widget(table, area, &mut state);
}

fn namespace_row(group: &NamespaceGroup<'_>, collapsed: bool) -> Row<'static> {
    let marker = if collapsed { "▸" } else { "▾" };
    let tone = group
        .worst_status()
        .map(|status| tone_color(status.tone()))
        .unwrap_or(MUTED);
    let summary = &group.summary;
    let failed_style = if summary.failed > 0 {
        Style::default().fg(ERROR).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(MUTED)
    };

    Row::new(vec![
        Cell::from(Line::from(vec![
            Span::styled(format!("{marker} "), Style::default().fg(tone)),
            Span::styled(
                summary.name.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ])),
        Cell::from(format!("{} pods", summary.total)).style(Style::default().fg(MUTED)),
        Cell::from(format!("{} up", summary.running)).style(Style::default().fg(ACCENT)),
        Cell::from(format!("{} failed", summary.failed)).style(failed_style),
        Cell::from(""),
        Cell::from(""),
        Cell::from(""),
    ])
    .style(Style::default().bg(Color::Rgb(20, 33, 52)))
}

fn pod_row(pod: &PodRecord, pulse_on: bool) -> Row<'static> {
    let restarts_style = if pod.restarts > 0 {
        Style::default().fg(WARN).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    Row::new(vec![
        Cell::from(format!("  {}", pod.name)).style(Style::default().fg(Color::White)),
        Cell::from(status_badge(&pod.status, pulse_on)),
        Cell::from(pod.ready.clone()).style(Style::default().fg(Color::White)),
        Cell::from(pod.restarts.to_string()).style(restarts_style),
        Cell::from(usage_line(&ResourceUsage::new(
            &pod.cpu_request,
            &pod.cpu_limit,
            ResourceKind::Cpu,
        ))),
        Cell::from(usage_line(&ResourceUsage::new(
            &pod.mem_request,
            &pod.mem_limit,
            ResourceKind::Memory,
        ))),
        Cell::from(pod.age.clone()).style(Style::default().fg(MUTED)),
    ])
}

fn status_badge(status: &str, pulse_on: bool) -> Line<'static> {
    let class = StatusClass::classify(status);
    let color = tone_color(class.tone());
    let dot = if class.pulses() && !pulse_on {
        "○"
    } else {
        "●"
    };
    let label = if status.trim().is_empty() {
        class.title().to_string()
    } else {
        status.to_string()
    };

    Line::from(vec![
        Span::styled(format!("{dot} "), Style::default().fg(color)),
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ])
}

fn usage_line(usage: &ResourceUsage) -> Line<'static> {
    if !usage.is_set() {
        return Line::from(Span::styled("Not set", Style::default().fg(MUTED)));
    }

    let mut spans = vec![Span::styled(
        format!("{} ", usage.label()),
        Style::default().fg(Color::White),
    )];
    if let Some(percent) = usage.percent() {
        let filled = usage_cells(percent);
        let color = usage_color(percent);
        spans.push(Span::styled("▮".repeat(filled), Style::default().fg(color)));
        spans.push(Span::styled(
            "▯".repeat(BAR_CELLS - filled),
            Style::default().fg(Color::Rgb(51, 65, 85)),
        ));
    }
    Line::from(spans)
}

fn usage_cells(percent: u64) -> usize {
    let percent = percent.min(100) as usize;
    let mut filled = (BAR_CELLS * percent).div_ceil(100);
    if percent == 0 {
        filled = 0;
    }
    filled.min(BAR_CELLS)
}

fn usage_color(percent: u64) -> Color {
    if percent >= 90 {
        ERROR
    } else if percent >= 70 {
        WARN
    } else {
        ACCENT
    }
}

fn tone_color(tone: StatusTone) -> Color {
    match tone {
        StatusTone::Green => ACCENT,
        StatusTone::Yellow => WARN,
        StatusTone::Blue => Color::Rgb(96, 165, 250),
        StatusTone::Red => ERROR,
        StatusTone::Orange => Color::Rgb(251, 146, 60),
        StatusTone::Gray => MUTED,
    }
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let status_text = app.status().to_string();
    let mut spans = Vec::new();
    let refresh_label = match app.refresh_interval() {
        Some(interval) => format!(" 󰑓 {}s ", interval.as_secs_f64()),
        None => " 󰑓 off ".to_string(),
    };
    push_powerline_segment(&mut spans, refresh_label, Color::White, PL_A, PL_B);

    let glance = build_footer_glance(app);
    let status_budget = (area.width as usize)
        .saturating_sub(spans_width(&spans) + glance.chars().count() + 6)
        .max(8);
    push_powerline_segment(
        &mut spans,
        format!(
            " {} {} ",
            footer_status_icon(&status_text),
            compact_text(first_line(&status_text), status_budget)
        ),
        Color::White,
        PL_B,
        BG,
    );
    if !glance.is_empty() {
        spans.push(Span::styled(
            format!(" {glance}"),
            Style::default().fg(Color::Rgb(94, 234, 212)),
        ));
    }
    spans.push(Span::styled("  ? help", Style::default().fg(MUTED)));

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn build_footer_glance(app: &App) -> String {
    let Some(pod) = app.selected_pod() else {
        return String::new();
    };

    let cpu = ResourceUsage::new(&pod.cpu_request, &pod.cpu_limit, ResourceKind::Cpu);
    let memory = ResourceUsage::new(&pod.mem_request, &pod.mem_limit, ResourceKind::Memory);
    let mut parts = Vec::new();
    if cpu.is_set() {
        parts.push(format!(
            "{} {}/{}",
            cpu.kind.title(),
            format_millicores(cpu.request),
            format_millicores(cpu.limit)
        ));
    }
    if memory.is_set() {
        parts.push(format!(
            "{} {}/{}",
            memory.kind.title(),
            format_bytes(memory.request),
            format_bytes(memory.limit)
        ));
    }
    if !pod.node_name.is_empty() {
        parts.push(format!("node {}", pod.node_name));
    }
    parts.join("  ")
}

fn footer_status_icon(status_text: &str) -> &'static str {
    let status = status_text.to_ascii_lowercase();
    let has_failure = [
        "failed",
        "error",
        "timed out",
        "timeout",
        "unavailable",
        "refused",
        "returned",
    ]
    .iter()
    .any(|needle| status.contains(needle));
    if has_failure { "󰅚" } else { "󰄬" }
}

fn render_detail(frame: &mut Frame, area: Rect, detail: &DetailView) {
    frame.render_widget(Clear, area);

    let (text, border) = match &detail.content {
        DetailContent::Loading => (
            Text::from(Span::styled("Loading manifest…", Style::default().fg(MUTED))),
            ACCENT,
        ),
        DetailContent::Failed(error) => (Text::from(error_lines(error)), ERROR),
        DetailContent::Loaded(manifest) => (highlight_yaml_text(manifest), ACCENT),
    };

    let block = Block::default()
        .title(format!(" {}/{} · Esc to close ", detail.namespace, detail.name))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(PANEL));
    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false })
        .scroll((detail.scroll, 0));

    frame.render_widget(paragraph, area);
}

fn highlight_yaml_text(input: &str) -> Text<'static> {
    let lines = input
        .lines()
        .map(highlight_yaml_line)
        .collect::<Vec<Line<'static>>>();
    Text::from(lines)
}

fn highlight_yaml_line(line: &str) -> Line<'static> {
    let indent_len = line
        .as_bytes()
        .iter()
        .take_while(|byte| **byte == b' ' || **byte == b'\t')
        .count();
    let indent = &line[..indent_len];
    let trimmed = &line[indent_len..];

    let mut spans = vec![Span::raw(indent.to_string())];
    if trimmed.is_empty() {
        return Line::from(spans);
    }

    if trimmed.starts_with('#') {
        spans.push(Span::styled(trimmed.to_string(), Style::default().fg(MUTED)));
        return Line::from(spans);
    }

    if let Some(rest) = trimmed.strip_prefix("- ") {
        spans.push(Span::styled("- ", Style::default().fg(ACCENT)));
        spans.extend(highlight_yaml_content(rest));
        return Line::from(spans);
    }

    spans.extend(highlight_yaml_content(trimmed));
    Line::from(spans)
}

fn highlight_yaml_content(content: &str) -> Vec<Span<'static>> {
    let Some((key, value)) = split_yaml_key_value(content) else {
        return vec![Span::styled(content.to_string(), Style::default().fg(Color::White))];
    };

    let mut spans = vec![
        Span::styled(
            key.to_string(),
            Style::default().fg(Color::Rgb(103, 232, 249)),
        ),
        Span::styled(":", Style::default().fg(MUTED)),
    ];
    let value = value.trim();
    if !value.is_empty() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            value.to_string(),
            Style::default().fg(yaml_value_color(value)),
        ));
    }
    spans
}

fn split_yaml_key_value(content: &str) -> Option<(&str, &str)> {
    let (key, value) = content.split_once(':')?;
    let key = key.trim_end();
    if key.is_empty() || key.contains(' ') {
        return None;
    }
    if !value.is_empty() && !value.starts_with(' ') {
        return None;
    }
    Some((key, value))
}

fn yaml_value_color(value: &str) -> Color {
    if value.starts_with('"') || value.starts_with('\'') {
        Color::Rgb(125, 211, 252)
    } else if matches!(value, "true" | "false" | "null" | "~") {
        WARN
    } else if value.parse::<f64>().is_ok() {
        Color::Rgb(251, 146, 60)
    } else if value.starts_with('{') || value.starts_with('[') {
        MUTED
    } else {
        Color::Rgb(147, 197, 253)
    }
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!("podglass  server:{}  scope:{}", app.server(), app.scope())),
        Line::from(""),
    ];
    for (keys, description) in HELP_ENTRIES {
        lines.push(Line::from(vec![
            Span::styled(format!("{keys:<18}"), Style::default().fg(ACCENT)),
            Span::styled(description, Style::default().fg(Color::White)),
        ]));
    }
    if let Some(error) = app.catalog().error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("namespace list: {}", first_line(error)),
            Style::default().fg(ERROR),
        )));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(modal, area);
}

const HELP_ENTRIES: [(&str, &str); 12] = [
    ("j/k ↓/↑", "move selection"),
    ("ctrl-d/ctrl-u", "page down / up"),
    ("g/G", "first / last row"),
    ("enter", "toggle namespace or open pod manifest"),
    ("d", "open pod manifest"),
    ("space", "collapse / expand namespace"),
    ("- / +", "collapse all / expand all"),
    ("n/tab N/shift-tab", "next / previous namespace scope"),
    ("a", "all namespaces"),
    ("r/F5", "refresh now"),
    ("esc", "close overlay"),
    ("q/ctrl-c", "quit"),
];

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.chars().count()).sum()
}

fn error_lines(error: &str) -> Vec<Line<'static>> {
    error
        .lines()
        .map(|line| Line::from(Span::styled(line.to_string(), Style::default().fg(ERROR))))
        .collect()
}

fn first_line(value: &str) -> &str {
    value.lines().next().unwrap_or_default()
}

fn table_rows_visible(area: Rect) -> usize {
    area.height.saturating_sub(3).max(1) as usize
}

fn detail_viewport(area: Rect) -> (u16, u16) {
    let width = area.width.saturating_sub(2).max(1);
    let height = area.height.saturating_sub(2).max(1);
    (width, height)
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
