use crate::config::Config;
use crate::display::{Raster, Resolution, Rgb};
use crate::error::Result;
use crate::frontend::{Flow, Frontend};
use crate::input::{Input, TermKeys};
use crate::loader::Fetcher;
use crate::status::Status;
use crate::vm::Vm;
use std::io;
use std::time::Instant;
use tui::backend::{Backend, CrosstermBackend};
use tui::layout::{Constraint, Direction, Layout, Rect};
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::text::Spans;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

/// width of the status panel, borders included
const STATUS_WIDTH: u16 = 32;

/// presents the raster and status panel in a terminal, rendered using TUI
pub struct TermHost<B: Backend> {
    terminal: Terminal<B>,
    resolution: Resolution,
    foreground: Color,
}

impl TermHost<CrosstermBackend<io::Stdout>> {
    pub fn stdout(config: &Config) -> Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        TermHost::new(backend, config)
    }
}

impl<B: Backend> TermHost<B> {
    pub fn new(backend: B, config: &Config) -> Result<Self> {
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        let Rgb(r, g, b) = config.foreground()?;
        Ok(TermHost {
            terminal,
            resolution: config.resolution(),
            foreground: Color::Rgb(r, g, b),
        })
    }

    pub fn clear(&mut self) -> Result<()> {
        self.terminal.clear()?;
        Ok(())
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    pub fn present(&mut self, raster: &Raster, status: &Status) -> Result<()> {
        let resolution = self.resolution;
        let foreground = self.foreground;
        // one point per CHIP-8 pixel; the terminal can't show the scaling
        let coords: Vec<(f64, f64)> = raster.lit_points().collect();
        let lines: Vec<Spans> = status.lines().into_iter().map(Spans::from).collect();

        self.terminal.draw(|f| {
            let screen = Rect::new(
                0,
                0,
                2 + resolution.0 as u16 + STATUS_WIDTH,
                2 + resolution.1 as u16,
            )
            .intersection(f.size());
            let panes = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(
                    [
                        Constraint::Length(2 + resolution.0 as u16),
                        Constraint::Length(STATUS_WIDTH),
                    ]
                    .as_ref(),
                )
                .split(screen);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &coords,
                        color: foreground,
                    });
                });
            f.render_widget(canvas, panes[0]);

            let panel = Paragraph::new(lines.clone())
                .block(Block::default().title("Status").borders(Borders::ALL));
            f.render_widget(panel, panes[1]);
        })?;
        Ok(())
    }
}

/// the host loop: input, tick, draw, sleep until the next refresh. returns
/// when the input asks to quit
pub fn run<V: Vm, F: Fetcher, B: Backend>(
    frontend: &mut Frontend<V, F>,
    host: &mut TermHost<B>,
    input: &mut impl Input,
    config: &Config,
) -> Result<()> {
    config.validate()?;
    let period = config.refresh_period();
    let epoch = Instant::now();
    loop {
        let started = Instant::now();
        for event in input.poll_events(started)? {
            if frontend.handle(event) == Flow::Quit {
                log::info!("quit after {:.1}s", epoch.elapsed().as_secs_f64());
                return Ok(());
            }
        }
        frontend.tick(started.duration_since(epoch).as_secs_f64() * 1000.0);
        host.present(frontend.screen().raster(), frontend.screen().status())?;
        spin_sleep::sleep(period.saturating_sub(started.elapsed()));
    }
}

/// plays the configured catalog on this terminal until Esc
pub fn launch<V: Vm>(vm: V, config: &Config) -> Result<()> {
    let mut frontend = Frontend::from_config(vm, config)?;
    frontend.boot()?;
    let mut host = TermHost::stdout(config)?;
    let mut input = TermKeys::new(config.key_hold())?;
    let result = run(&mut frontend, &mut host, &mut input, config);
    host.clear()?;
    result
}
