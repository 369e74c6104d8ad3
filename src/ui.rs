use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Span, Spans},
    widgets::{
        Axis, BarChart, Block, Borders, Cell, Chart, Dataset, GraphType, List, ListItem,
        ListState, Paragraph, Row, Table, Tabs, Wrap,
    },
    Frame,
};

use crate::app::{App, Focus, Tab};
use crate::dataset::{Sex, COLUMNS};
use crate::format::thousands;
use crate::pass::Dashboard;
use crate::view::LongRow;

const SERIES_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
];

fn sex_color(sex: Sex) -> Color {
    match sex {
        Sex::Male => Color::Blue,
        Sex::Female => Color::LightRed,
    }
}

const PAGE_TITLE: &str = "都道府県別 人口分析ダッシュボード";

pub fn draw<B: Backend, S>(f: &mut Frame<B>, app: &App<S>) {
    let page = Block::default()
        .title(Span::styled(
            PAGE_TITLE,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let body = page.inner(f.size());
    f.render_widget(page, f.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(40)].as_ref())
        .split(body);

    draw_sidebar(f, app, columns[0]);

    match &app.pass {
        Ok(dashboard) => draw_dashboard(f, app, dashboard, columns[1]),
        Err(err) => {
            let message = Paragraph::new(vec![
                Spans::from(Span::styled(
                    "データを読み込めませんでした",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Spans::from(Span::raw(err.to_string())),
                Spans::from(Span::styled(
                    "r: 再読み込み  q: 終了",
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .block(Block::default().title("Error").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
            f.render_widget(message, columns[1]);
        }
    }
}

fn focused_block(title: &str, focused: bool) -> Block {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}

fn draw_sidebar<B: Backend, S>(f: &mut Frame<B>, app: &App<S>, area: Rect) {
    let outer = Block::default().title("分析条件").borders(Borders::ALL);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(inner);

    let prefectures: Vec<ListItem> = app
        .options
        .prefectures
        .iter()
        .map(|name| {
            let mark = if app.selection.prefectures.contains(name) {
                "[x] "
            } else {
                "[ ] "
            };
            ListItem::new(format!("{mark}{name}"))
        })
        .collect();
    let list = List::new(prefectures)
        .block(focused_block("都道府県", app.focus == Focus::Prefectures))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if !app.options.prefectures.is_empty() {
        state.select(Some(app.prefecture_cursor));
    }
    f.render_stateful_widget(list, chunks[0], &mut state);

    let years: Vec<ListItem> = app
        .options
        .years
        .iter()
        .map(|year| {
            let style = if *year == app.selection.year {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Spans::from(Span::styled(year.to_string(), style)))
        })
        .collect();
    let list = List::new(years)
        .block(focused_block("西暦（年）", app.focus == Focus::Years))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if !app.options.years.is_empty() {
        state.select(Some(app.year_cursor));
    }
    f.render_stateful_widget(list, chunks[1], &mut state);
}

fn draw_dashboard<B: Backend, S>(f: &mut Frame<B>, app: &App<S>, dashboard: &Dashboard, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Percentage(50),
                Constraint::Min(8),
            ]
            .as_ref(),
        )
        .split(area);

    draw_metrics(f, dashboard, chunks[0]);

    let titles = ["データ表", "グラフ"]
        .iter()
        .map(|t| Spans::from(Span::raw(*t)))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.into())
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::raw("|"));
    f.render_widget(tabs, chunks[1]);

    match app.tab {
        Tab::Table => draw_table(f, dashboard, chunks[2]),
        Tab::Chart => draw_bar_chart(f, dashboard, chunks[2]),
    }
    draw_trend(f, dashboard, chunks[3]);
}

fn draw_metrics<B: Backend>(f: &mut Frame<B>, dashboard: &Dashboard, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ]
            .as_ref(),
        )
        .split(area);

    let totals = dashboard.totals;
    let metrics = [
        ("総人口", totals.total),
        ("男性人口", totals.male),
        ("女性人口", totals.female),
    ];
    for ((label, value), chunk) in metrics.into_iter().zip(chunks.iter()) {
        let metric = Paragraph::new(Spans::from(Span::styled(
            thousands(value),
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().title(label).borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(metric, *chunk);
    }
}

fn draw_table<B: Backend>(f: &mut Frame<B>, dashboard: &Dashboard, area: Rect) {
    let header = Row::new(COLUMNS.iter().map(|c| Cell::from(*c)))
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows = dashboard
        .filtered
        .records
        .iter()
        .map(|record| Row::new(record.cells().into_iter().map(Cell::from)));
    let table = Table::new(rows)
        .header(header)
        .block(
            Block::default()
                .title(format!("{} 件", dashboard.filtered.len()))
                .borders(Borders::ALL),
        )
        .widths(&[
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(14),
        ])
        .column_spacing(1);
    f.render_widget(table, area);
}

/// Bar heights per prefecture, male then female, in first-appearance order.
/// Rows repeating a prefecture add to its bars; missing and negative values
/// draw as zero.
fn bar_clusters(long_form: &[LongRow]) -> Vec<(&str, [u64; 2])> {
    let mut clusters: Vec<(&str, [u64; 2])> = Vec::new();
    for row in long_form {
        let index = match clusters.iter().position(|(name, _)| *name == row.prefecture) {
            Some(index) => index,
            None => {
                clusters.push((row.prefecture.as_str(), [0, 0]));
                clusters.len() - 1
            }
        };
        let height = row.population.unwrap_or(0.0).max(0.0).round() as u64;
        let slot = match row.sex {
            Sex::Male => 0,
            Sex::Female => 1,
        };
        clusters[index].1[slot] = clusters[index].1[slot].saturating_add(height);
    }
    clusters
}

fn draw_bar_chart<B: Backend>(f: &mut Frame<B>, dashboard: &Dashboard, area: Rect) {
    let block = Block::default()
        .title(Spans::from(vec![
            Span::raw("都道府県別 人口（男女） "),
            Span::styled("■男 ", Style::default().fg(sex_color(Sex::Male))),
            Span::styled("■女", Style::default().fg(sex_color(Sex::Female))),
        ]))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let clusters = bar_clusters(&dashboard.long_form);
    if clusters.is_empty() {
        return;
    }
    let max = clusters
        .iter()
        .flat_map(|(_, heights)| heights.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1);

    // One area per prefecture, split into one single-colour chart per sex so
    // the two bars get different colours.
    let cluster_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            (0..clusters.len())
                .map(|_| Constraint::Ratio(1, clusters.len() as u32))
                .collect::<Vec<_>>(),
        )
        .split(inner);

    for ((prefecture, heights), cluster) in clusters.iter().zip(cluster_areas.iter()) {
        let bar_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)].as_ref())
            .split(*cluster);
        for ((sex, height), bar_area) in Sex::ALL.iter().zip(heights.iter()).zip(bar_areas.iter()) {
            let label = format!("{}{}", prefecture, sex.label());
            let data = [(label.as_str(), *height)];
            let width = bar_area.width.saturating_sub(2).max(1);
            let chart = BarChart::default()
                .data(&data)
                .max(max)
                .bar_width(width)
                .bar_gap(0)
                .bar_style(Style::default().fg(sex_color(*sex)))
                .value_style(Style::default().fg(Color::Black).bg(sex_color(*sex)))
                .label_style(Style::default().fg(Color::White));
            f.render_widget(chart, *bar_area);
        }
    }
}

fn draw_trend<B: Backend>(f: &mut Frame<B>, dashboard: &Dashboard, area: Rect) {
    let points: Vec<Vec<(f64, f64)>> = dashboard
        .trend_series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .map(|&(year, total)| (year as f64, total))
                .collect()
        })
        .collect();

    let datasets = dashboard
        .trend_series
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, (series, data))| {
            Dataset::default()
                .name(series.prefecture.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(data)
        })
        .collect();

    let years = dashboard.trend_series.iter().flat_map(|s| s.points.iter().map(|p| p.0));
    let (min_year, max_year) = years.fold((i32::MAX, i32::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)));
    let (min_year, max_year) = if min_year > max_year {
        (0, 1)
    } else if min_year == max_year {
        (min_year - 1, max_year + 1)
    } else {
        (min_year, max_year)
    };
    let (min_total, max_total) = dashboard
        .trend_series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.1))
        .fold((0.0_f64, 1.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let label_style = Style::default().fg(Color::DarkGray);
    let chart = Chart::new(datasets)
        .block(Block::default().title("人口推移（総数）").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title("西暦（年）")
                .style(label_style)
                .bounds([min_year as f64, max_year as f64])
                .labels(vec![
                    Span::raw(min_year.to_string()),
                    Span::raw(max_year.to_string()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("人口（総数）")
                .style(label_style)
                .bounds([min_total, max_total])
                .labels(vec![
                    Span::raw(thousands(min_total)),
                    Span::raw(thousands((min_total + max_total) / 2.0)),
                    Span::raw(thousands(max_total)),
                ]),
        );
    f.render_widget(chart, area);
}
