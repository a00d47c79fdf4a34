use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

use crate::app::{App, Popup};
use crate::braille::{BrailleCanvas, BLANK};
use crate::favorites::terminal_safe;
use crate::map::{cell, draw_ring, BaseLayers, MarkerIcon};

/// Widest popup, border included
const POPUP_MAX_WIDTH: u16 = 44;
/// Rings larger than this many pixels are all off-screen anyway
const MAX_RING_RADIUS: f64 = 20_000.0;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Favorite places ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(
            Line::from(Span::styled(
                format!(" {} ", app.base_map.attribution),
                Style::default().fg(Color::DarkGray),
            ))
            .right_aligned(),
        );

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let (width, height) = (inner.width as usize, inner.height as usize);

    let mut accuracy = BrailleCanvas::new(width, height);
    if let Some(circle) = app.location.circle() {
        let radius = viewport.meters_to_pixels(circle.center, circle.radius_m);
        if radius <= MAX_RING_RADIUS {
            let (cx, cy) = viewport.project(circle.center);
            draw_ring(&mut accuracy, cx, cy, radius.round() as i32);
        }
    }

    let open_feature = app.visible_popup().map(|popup| popup.feature);
    let markers = app
        .markers
        .markers()
        .iter()
        .filter_map(|marker| {
            let (col, row) = marker.cell(&viewport)?;
            Some(Glyph {
                col,
                row,
                icon: (*marker.icon).clone(),
                highlight: open_feature == Some(marker.feature),
            })
        })
        .collect();

    let here = app.location.marker().and_then(|marker| {
        let (col, row) = cell(&viewport, marker.position)?;
        Some(Glyph {
            col,
            row,
            icon: (*marker.icon).clone(),
            highlight: false,
        })
    });

    let map_widget = MapWidget {
        base: app.base_map.render(width, height, &viewport),
        accuracy,
        markers,
        here,
        locate_label: app.locate_control().map(|control| control.label),
    };
    frame.render_widget(map_widget, inner);

    if let Some(popup) = app.visible_popup() {
        if let Some(anchor) = cell(&viewport, popup.anchor) {
            render_popup(frame, popup, inner, anchor);
        }
    }
}

/// A marker glyph at a cell of the map area
struct Glyph {
    col: u16,
    row: u16,
    icon: MarkerIcon,
    highlight: bool,
}

/// Braille base map with overlays
struct MapWidget {
    base: BaseLayers,
    accuracy: BrailleCanvas,
    markers: Vec<Glyph>,
    here: Option<Glyph>,
    locate_label: Option<&'static str>,
}

impl MapWidget {
    /// Copy non-blank cells of a braille canvas with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for row in 0..canvas.height().min(area.height as usize) {
            for col in 0..canvas.width().min(area.width as usize) {
                let ch = canvas.cell(col, row);
                if ch != BLANK {
                    buf[(area.x + col as u16, area.y + row as u16)].set_char(ch).set_fg(color);
                }
            }
        }
    }

    fn render_glyph(glyph: &Glyph, area: Rect, buf: &mut Buffer) {
        if glyph.col >= area.width || glyph.row >= area.height {
            return;
        }
        let mut style = Style::default().fg(glyph.icon.color).add_modifier(Modifier::BOLD);
        if glyph.highlight {
            style = style.add_modifier(Modifier::REVERSED);
        }
        buf[(area.x + glyph.col, area.y + glyph.row)]
            .set_char(glyph.icon.glyph)
            .set_style(style);
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        Self::render_layer(&self.base.coastlines, Color::Cyan, area, buf);
        Self::render_layer(&self.base.borders, Color::DarkGray, area, buf);
        Self::render_layer(&self.accuracy, Color::Blue, area, buf);

        for glyph in &self.markers {
            Self::render_glyph(glyph, area, buf);
        }
        if let Some(here) = &self.here {
            Self::render_glyph(here, area, buf);
        }

        if let Some(label) = self.locate_label {
            let width = label.chars().count() as u16;
            if width <= area.width {
                let style = Style::default().fg(Color::Black).bg(Color::LightBlue);
                buf.set_string(area.x + area.width - width, area.y, label, style);
            }
        }
    }
}

/// Greedy word wrap for popup text
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if !current.is_empty() && needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Popup lines, with every piece of user text made terminal safe
fn popup_lines(popup: &Popup, text_width: usize) -> Vec<Line<'static>> {
    let content = &popup.content;
    let mut lines: Vec<Line<'static>> = Vec::new();

    for title in wrap(&terminal_safe(&content.title), text_width) {
        lines.push(Line::from(Span::styled(
            title,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
    }
    if let Some(rating) = &content.rating {
        lines.push(Line::from(Span::styled(rating.clone(), Style::default().fg(Color::Yellow))));
    }
    if !content.tags.is_empty() {
        let tags = terminal_safe(&content.tags.join(" ")).into_owned();
        for line in wrap(&tags, text_width) {
            lines.push(Line::from(Span::styled(line, Style::default().fg(Color::Cyan))));
        }
    }
    if let Some(notes) = &content.notes {
        lines.push(Line::default());
        for paragraph in notes.lines() {
            for line in wrap(&terminal_safe(paragraph), text_width) {
                lines.push(Line::from(line));
            }
        }
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        content.link.clone(),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::UNDERLINED),
    )));
    lines
}

/// Place the popup above its marker, or below when there is no room
fn popup_area(map: Rect, anchor: (u16, u16), width: u16, height: u16) -> Rect {
    let width = width.min(map.width);
    let height = height.min(map.height);
    let (col, row) = anchor;

    let x = col.saturating_sub(width / 2).min(map.width - width);
    let y = if row >= height {
        row - height
    } else {
        (row + 1).min(map.height - height)
    };
    Rect::new(map.x + x, map.y + y, width, height)
}

fn render_popup(frame: &mut Frame, popup: &Popup, map: Rect, anchor: (u16, u16)) {
    let text_width = POPUP_MAX_WIDTH.min(map.width).saturating_sub(2).max(1) as usize;
    let mut lines = popup_lines(popup, text_width);
    // The link is never wrapped, long ones are cut by the frame
    let widest = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
    let width = (widest + 2).clamp(12, POPUP_MAX_WIDTH);
    let height = lines.len() as u16 + 2;

    let area = popup_area(map, anchor, width, height);
    lines.truncate(area.height.saturating_sub(2) as usize);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightRed));
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", dim),
        Span::styled(format!("{} places", app.markers.len()), Style::default().fg(Color::LightRed)),
        Span::styled(" | ", dim),
        Span::styled(
            if app.base_map.show_borders { "[B]orders " } else { "[b]orders " },
            Style::default().fg(if app.base_map.show_borders { Color::Green } else { Color::DarkGray }),
        ),
    ];
    if app.locate_control().is_some() {
        spans.push(Span::styled("[g]locate ", Style::default().fg(Color::LightBlue)));
    }
    match &app.status {
        Some(status) => spans.push(Span::styled(format!("| {status}"), Style::default().fg(Color::Red))),
        None => spans.push(Span::styled(
            "| hjkl:pan +/-:zoom tab:next esc:close r:reset q:quit",
            dim,
        )),
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::{Favorite, Platform, PopupContent};
    use crate::geo::LatLng;

    fn popup(favorite: &Favorite) -> Popup {
        let anchor = LatLng::new(52.37, 4.89);
        Popup {
            feature: 0,
            anchor,
            content: PopupContent::new(favorite, anchor, Platform::Other),
            visible: true,
        }
    }

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("  ", 7), Vec::<String>::new());
        assert_eq!(wrap("unbreakable", 4), vec!["unbreakable"]);
    }

    #[test]
    fn test_popup_lines() {
        let favorite = Favorite {
            name: Some("Café de Klos".to_string()),
            rating: Some(7.0),
            tags: vec!["ribs".to_string()],
            notes: Some("Cash only".to_string()),
            ..Favorite::default()
        };
        let lines = text(&popup_lines(&popup(&favorite), 40));
        assert_eq!(
            lines,
            vec![
                "Café de Klos",
                "★ 5/5",
                "#ribs",
                "",
                "Cash only",
                "",
                "https://www.google.com/maps/search/?api=1&query=52.37,4.89",
            ]
        );
    }

    #[test]
    fn test_popup_lines_strip_control_characters() {
        let favorite = Favorite {
            name: Some("evil\x1b]0;pwned\x07".to_string()),
            ..Favorite::default()
        };
        let lines = text(&popup_lines(&popup(&favorite), 40));
        assert!(lines.iter().all(|line| !line.chars().any(char::is_control)));
    }

    #[test]
    fn test_popup_area_stays_inside_map() {
        let map = Rect::new(1, 1, 40, 20);

        let above = popup_area(map, (20, 15), 20, 6);
        assert_eq!(above, Rect::new(11, 10, 20, 6));

        let below = popup_area(map, (38, 2), 20, 6);
        assert_eq!(below, Rect::new(21, 4, 20, 6));
    }
}
