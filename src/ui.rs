use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};
use tracing::info;

use crate::braille::BrailleCanvas;
use crate::controller::{Session, ViewController, ViewState};
use crate::data::lookup::Year;
use crate::map::choropleth::{format_amount, ChoroplethLayer, DetailsSink, NO_DATA_LABEL};
use crate::map::geometry::draw_outlines;
use crate::map::scale::{self, legend};
use crate::map::HitRaster;

const SLIDER_WIDTH: usize = 30;

/// Country detail popup opened by clicking the map
#[derive(Debug, Default)]
pub struct DetailsPanel {
    selection: Option<(String, Year)>,
}

impl DetailsPanel {
    pub fn is_open(&self) -> bool {
        self.selection.is_some()
    }

    pub fn close(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<(&str, Year)> {
        self.selection.as_ref().map(|(country, year)| (country.as_str(), *year))
    }
}

impl DetailsSink for DetailsPanel {
    fn show_details(&mut self, country: &str, year: Year) {
        info!(%country, %year, "details requested");
        self.selection = Some((country.to_string(), year));
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, controller: &ViewController, details: &DetailsPanel) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_map(frame, controller, details, chunks[0]);
    render_status_bar(frame, controller, chunks[1]);
}

fn render_map(frame: &mut Frame, controller: &ViewController, details: &DetailsPanel, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" Military Expenditure · {} ", controller.year()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    match controller.state() {
        ViewState::Uninitialized | ViewState::Loading => render_message(
            frame,
            inner,
            vec![Line::from("Loading boundaries and expenditure tables…")],
            Color::Yellow,
        ),
        ViewState::Failed(err) => render_message(
            frame,
            inner,
            vec![
                Line::styled("Failed to load data", Style::default().add_modifier(Modifier::BOLD)),
                Line::from(""),
                Line::from(err.to_string()),
                Line::from(""),
                Line::from("Press q to quit"),
            ],
            Color::Red,
        ),
        ViewState::Ready(session) => {
            if let (Some(layer), Some(raster)) = (session.layer(), session.raster()) {
                let mut outlines = BrailleCanvas::new(inner.width as usize, inner.height as usize);
                draw_outlines(&mut outlines, session.boundaries(), &controller.viewport);
                frame.render_widget(ChoroplethWidget { layer, raster, outlines }, inner);
            }
            render_legend(frame, inner);
            if let (Some(tooltip), Some(pos)) = (controller.hovered_tooltip(), controller.mouse_pos) {
                render_tooltip(frame, inner, pos, tooltip);
            }
            if let Some((country, year)) = details.selection() {
                render_details(frame, inner, session, country, year);
            }
        }
    }
}

fn render_message(frame: &mut Frame, area: Rect, lines: Vec<Line<'_>>, color: Color) {
    let height = lines.len() as u16;
    let top = area.y + area.height.saturating_sub(height) / 2;
    let text_area = Rect::new(area.x, top, area.width, height.min(area.height));
    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, text_area);
}

/// Filled countries with outlines on top
struct ChoroplethWidget<'a> {
    layer: &'a ChoroplethLayer,
    raster: &'a HitRaster,
    outlines: BrailleCanvas,
}

impl Widget for ChoroplethWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                let cell = &mut buf[(area.x + col, area.y + row)];

                if let Some(feature) = self.raster.get(col, row).and_then(|i| self.layer.feature(i)) {
                    cell.set_bg(feature.fill.color());
                }
                if let Some(glyph) = self.outlines.glyph(col as usize, row as usize) {
                    cell.set_char(glyph).set_fg(Color::White);
                }
            }
        }
    }
}

fn render_legend(frame: &mut Frame, map: Rect) {
    let entries = legend();
    let mut lines: Vec<Line> = entries
        .iter()
        .rev()
        .map(|entry| {
            Line::from(vec![
                Span::styled("██ ", Style::default().fg(entry.bucket.color())),
                Span::raw(entry.label()),
            ])
        })
        .collect();
    lines.push(Line::from(vec![
        Span::styled("██ ", Style::default().fg(scale::no_data_color())),
        Span::raw(NO_DATA_LABEL),
    ]));

    let height = lines.len() as u16 + 2;
    let width = 18;
    if map.width < width + 2 || map.height < height + 1 {
        return;
    }
    let area = Rect::new(map.x + 1, map.y + map.height - height, width, height);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" USD "),
        ),
        area,
    );
}

fn render_tooltip(frame: &mut Frame, map: Rect, (col, row): (u16, u16), tooltip: &str) {
    let lines: Vec<&str> = tooltip.lines().collect();
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 2;
    let height = lines.len() as u16 + 2;
    if width > map.width || height > map.height {
        return;
    }

    // Prefer below-right of the pointer, flip when it would leave the map
    let mut x = col + 2;
    if x + width > map.x + map.width {
        x = col.saturating_sub(width + 1).max(map.x);
    }
    let mut y = row + 1;
    if y + height > map.y + map.height {
        y = row.saturating_sub(height).max(map.y);
    }
    let area = Rect::new(x, y, width, height);

    let mut text: Vec<Line> = Vec::with_capacity(lines.len());
    let mut rest = lines.iter();
    if let Some(title) = rest.next() {
        text.push(Line::styled(*title, Style::default().add_modifier(Modifier::BOLD)));
    }
    text.extend(rest.map(|l| Line::from(*l)));

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Gray)),
        ),
        area,
    );
}

fn render_details(frame: &mut Frame, map: Rect, session: &Session, country: &str, year: Year) {
    let lookup = session.lookup();
    let label = Style::default().fg(Color::DarkGray);

    let amount = lookup
        .value(country, year)
        .map_or_else(|| NO_DATA_LABEL.to_string(), format_amount);

    let mut lines = vec![
        Line::styled(country.to_string(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from(vec![Span::styled("Year: ", label), Span::raw(year.to_string())]),
        Line::from(vec![Span::styled("Military Expenditure: ", label), Span::raw(amount)]),
    ];

    match lookup.summary(country) {
        Some(summary) => {
            let coverage = match (summary.first_year, summary.last_year) {
                (Some(first), Some(last)) => {
                    format!("{first}–{last} ({} years)", summary.years_with_data)
                }
                _ => String::from("none"),
            };
            lines.push(Line::from(vec![Span::styled("Years with data: ", label), Span::raw(coverage)]));
            if let Some((peak_year, peak)) = summary.peak {
                lines.push(Line::from(vec![
                    Span::styled("Peak: ", label),
                    Span::raw(format!("{} in {peak_year}", format_amount(peak))),
                ]));
            }
        }
        None => lines.push(Line::styled("No expenditure rows for this country", label)),
    }
    lines.push(Line::from(""));
    lines.push(Line::styled("Esc to close", label));

    let area = centered_rect(48, lines.len() as u16 + 2, map);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Details "),
        ),
        area,
    );
}

fn centered_rect(width: u16, height: u16, outer: Rect) -> Rect {
    let width = width.min(outer.width);
    let height = height.min(outer.height);
    Rect::new(
        outer.x + (outer.width - width) / 2,
        outer.y + (outer.height - height) / 2,
        width,
        height,
    )
}

/// `1960 ━━━━━●━━━━ 2020` with the marker at the selected year
fn year_slider(year: Year) -> String {
    let span = (Year::LAST.get() - Year::FIRST.get()) as usize;
    let marker = year.index() * (SLIDER_WIDTH - 1) / span;
    let track: String = (0..SLIDER_WIDTH)
        .map(|i| if i == marker { '●' } else { '━' })
        .collect();
    format!("{} {track} {}", Year::FIRST, Year::LAST)
}

fn render_status_bar(frame: &mut Frame, controller: &ViewController, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(" Year: ", dim),
        Span::styled(
            controller.year().to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(year_slider(controller.year()), Style::default().fg(Color::Yellow)),
        Span::styled(" | Zoom: ", dim),
        Span::styled(controller.zoom_level(), Style::default().fg(Color::Magenta)),
        Span::styled(" | ", dim),
        Span::styled(controller.center_coords(), Style::default().fg(Color::Cyan)),
    ];
    if !matches!(controller.state(), ViewState::Ready(_)) {
        spans.push(Span::styled(
            format!(" | {}", controller.state().label()),
            Style::default().fg(Color::Red),
        ));
    }
    spans.push(Span::styled(
        " | [/]:year {/}:±10 hjkl:pan +/-:zoom click:details q:quit",
        dim,
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
