//! TUI module using ratatui.
//!
//! A read-only viewer: one tab per language, scrollable text, a status line for
//! notices. `←/→/Tab` switch tabs, `↑/↓/PgUp/PgDn` scroll, `q`/`Esc` quit.

use crate::pipeline::Outcome;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use ratatui::Frame;

/// Viewer state
pub struct Viewer {
    pages: Vec<(String, String)>,
    notice: Option<String>,
    selected: usize,
    scroll: u16,
    should_quit: bool,
}

impl Viewer {
    pub fn new(outcome: &Outcome) -> Self {
        Self {
            pages: outcome.pages(),
            notice: outcome.message().map(str::to_string),
            selected: 0,
            scroll: 0,
            should_quit: false,
        }
    }

    /// Run the event loop until the user quits
    pub fn run(&mut self) -> std::io::Result<()> {
        let mut terminal = ratatui::init();
        let result = self.event_loop(&mut terminal);
        ratatui::restore();
        result
    }

    fn event_loop(&mut self, terminal: &mut ratatui::DefaultTerminal) -> std::io::Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        let count = self.pages.len().max(1);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Right | KeyCode::Tab => {
                self.selected = (self.selected + 1) % count;
                self.scroll = 0;
            }
            KeyCode::Left | KeyCode::BackTab => {
                self.selected = (self.selected + count - 1) % count;
                self.scroll = 0;
            }
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            _ => {}
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let [tabs_area, body_area, status_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let titles: Vec<Line> = self
            .pages
            .iter()
            .map(|(title, _)| Line::from(title.as_str()))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.selected)
            .block(Block::default().borders(Borders::ALL).title(" MailMind "))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, tabs_area);

        let body = self
            .pages
            .get(self.selected)
            .map(|(_, text)| text.as_str())
            .unwrap_or_default();
        let paragraph = Paragraph::new(body)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(paragraph, body_area);

        let status = match &self.notice {
            Some(notice) => Paragraph::new(notice.as_str()).style(Style::default().fg(Color::Yellow)),
            None => Paragraph::new("←/→ switch tab · ↑/↓ scroll · q quit")
                .style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(status, status_area);
    }
}

/// Show an outcome in the tabbed viewer
pub fn run(outcome: &Outcome) -> std::io::Result<()> {
    Viewer::new(outcome).run()
}
