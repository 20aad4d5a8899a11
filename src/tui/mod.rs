//! TUI module - browse saved programs with ratatui

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};
use std::io::{stdout, Stdout};
use tracing::info;

use crate::db::{Database, ProgramStore, SavedProgram};
use crate::format::format_program_plain;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// App state for TUI
pub struct App {
    db: Database,
    programs: Vec<(i64, SavedProgram)>,
    table: TableState,
    status: String,
    should_quit: bool,
}

/// Newest first
fn load_sorted(db: &Database) -> Result<Vec<(i64, SavedProgram)>> {
    let mut programs: Vec<_> = db.load()?.into_iter().collect();
    programs.sort_by(|a, b| b.1.saved_at.cmp(&a.1.saved_at).then(a.0.cmp(&b.0)));
    Ok(programs)
}

impl App {
    pub fn new(db: Database) -> Result<Self> {
        let programs = load_sorted(&db)?;
        let mut table = TableState::default();
        if !programs.is_empty() {
            table.select(Some(0));
        }
        Ok(Self {
            db,
            status: format!("{} saved programs", programs.len()),
            programs,
            table,
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(())
    }

    fn selected(&self) -> Option<&(i64, SavedProgram)> {
        self.table.selected().and_then(|i| self.programs.get(i))
    }

    fn refresh(&mut self) -> Result<()> {
        self.programs = load_sorted(&self.db)?;
        let selected = match self.table.selected() {
            _ if self.programs.is_empty() => None,
            Some(i) => Some(i.min(self.programs.len() - 1)),
            None => Some(0),
        };
        self.table.select(selected);
        self.status = format!("{} saved programs", self.programs.len());
        Ok(())
    }

    fn move_selection(&mut self, forward: bool) {
        if self.programs.is_empty() {
            return;
        }
        let last = self.programs.len() - 1;
        let next = match self.table.selected() {
            Some(i) if forward => (i + 1).min(last),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.table.select(Some(next));
    }

    fn delete_selected(&mut self) -> Result<()> {
        let Some(user_id) = self.selected().map(|(id, _)| *id) else {
            return Ok(());
        };
        if self.db.delete(user_id)? {
            info!("Deleted program of user {} from TUI", user_id);
        }
        self.refresh()?;
        self.status = format!("Program of user {} deleted", user_id);
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let header = Paragraph::new("programma - saved workout programs")
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        // Program table
        let rows: Vec<Row> = self.programs.iter().map(|(user_id, p)| {
            Row::new(vec![
                Cell::from(user_id.to_string()),
                Cell::from(p.label.clone()),
                Cell::from(p.days.to_string()),
                Cell::from(p.body.exercise_count().to_string()),
                Cell::from(p.saved_at.format("%Y-%m-%d %H:%M").to_string()),
            ])
        }).collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Min(14),
                Constraint::Length(5),
                Constraint::Length(10),
                Constraint::Length(17),
            ],
        )
        .header(Row::new(vec!["User", "Program", "Days", "Exercises", "Saved"])
            .style(Style::default().bold()))
        .row_highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title("Programs"));

        frame.render_stateful_widget(table, body[0], &mut self.table);

        let detail = self
            .selected()
            .map(|(_, p)| format_program_plain(p))
            .unwrap_or_else(|| "No program selected".to_string());
        let detail = Paragraph::new(detail)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Details"));
        frame.render_widget(detail, body[1]);

        // Footer
        let footer = Paragraph::new(format!("q: quit | j/k: move | r: refresh | d: delete | {}", self.status))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => self.should_quit = true,
                        KeyCode::Char('r') => self.refresh()?,
                        KeyCode::Char('d') => self.delete_selected()?,
                        KeyCode::Char('j') | KeyCode::Down => self.move_selection(true),
                        KeyCode::Char('k') | KeyCode::Up => self.move_selection(false),
                        _ => {}
                    }
                }
        Ok(())
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
