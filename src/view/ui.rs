//! Terminal painting layer for the waveform viewer.
//!
//! Draws the primitives produced by the view onto a braille canvas, so every
//! terminal cell holds a 2x4 grid of envelope pixels. Owns all colors and
//! turns key presses and mouse clicks into viewer commands.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Paragraph,
    },
};

use crate::config::DisplayConfig;
use crate::waveform::DrawPrimitive;

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(185, 207, 212);
const HELP_FG: Color = Color::Rgb(100, 100, 100);
const ERROR_FG: Color = Color::Rgb(255, 60, 60);

/// Envelope pixels per terminal cell with braille markers.
const DOTS_PER_COLUMN: u16 = 2;
const DOTS_PER_ROW: u16 = 4;

/// User input in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    /// Nothing to do (timeout or unbound key)
    Continue,
    Quit,
    TogglePlay,
    SeekBackward,
    SeekForward,
    /// Seek to an envelope pixel column (mouse click)
    SeekToPixel(u32),
    ZoomIn,
    ZoomOut,
    NextFile,
    PrevFile,
    Home,
}

/// Load state shown in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus<'a> {
    Ready,
    Loading,
    Failed(&'a str),
}

/// Everything the header and footer show.
#[derive(Debug, Clone, Copy)]
pub struct StatusLine<'a> {
    pub file_name: &'a str,
    pub index: usize,
    pub count: usize,
    pub load: LoadStatus<'a>,
    pub position: Duration,
    pub duration: Duration,
    pub zoom: u32,
    pub playing: bool,
    /// Whether an external player makes the audio audible
    pub audible: bool,
}

/// Screen areas of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerLayout {
    pub header: Rect,
    pub canvas: Rect,
    pub footer: Rect,
}

impl ViewerLayout {
    /// One header row, one footer row, the canvas in between.
    pub fn split(area: Rect) -> Self {
        let header_height = area.height.min(1);
        let footer_height = area.height.saturating_sub(header_height).min(1);
        let canvas_height = area.height - header_height - footer_height;

        ViewerLayout {
            header: Rect {
                height: header_height,
                ..area
            },
            canvas: Rect {
                y: area.y + header_height,
                height: canvas_height,
                ..area
            },
            footer: Rect {
                y: area.y + header_height + canvas_height,
                height: footer_height,
                ..area
            },
        }
    }

    /// Canvas size in envelope pixels.
    pub fn canvas_pixels(&self) -> (u32, u32) {
        (
            u32::from(self.canvas.width) * u32::from(DOTS_PER_COLUMN),
            u32::from(self.canvas.height) * u32::from(DOTS_PER_ROW),
        )
    }
}

/// Colors used to paint channels and the cursor.
#[derive(Debug, Clone)]
struct Palette {
    channels: Vec<Color>,
    cursor: Color,
}

impl Palette {
    fn from_config(display: &DisplayConfig) -> Self {
        let channels = (0..display.channel_colors.len().max(1))
            .map(|channel| display.channel_color(channel))
            .collect();
        Palette {
            channels,
            cursor: display.cursor_color(),
        }
    }

    fn channel(&self, channel: usize) -> Color {
        self.channels[channel % self.channels.len()]
    }
}

/// Full-screen waveform viewer.
pub struct ViewerTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    palette: Palette,
    restored: bool,
}

impl ViewerTui {
    /// Enters the alternate screen with raw mode and mouse capture.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized
    pub fn new(display: &DisplayConfig) -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ViewerTui {
            terminal,
            palette: Palette::from_config(display),
            restored: false,
        })
    }

    /// Current layout for the terminal size.
    ///
    /// # Errors
    /// - If the terminal size cannot be queried
    pub fn layout(&self) -> anyhow::Result<ViewerLayout> {
        let size = self.terminal.size()?;
        Ok(ViewerLayout::split(Rect::new(0, 0, size.width, size.height)))
    }

    /// Paints one frame.
    ///
    /// `pixel_height` is the height the primitives were computed for; canvas
    /// y grows upwards, so rows are flipped here.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw(
        &mut self,
        primitives: &[DrawPrimitive],
        pixel_width: u32,
        pixel_height: u32,
        status: &StatusLine<'_>,
    ) -> anyhow::Result<()> {
        let palette = &self.palette;
        let width = f64::from(pixel_width.max(1));
        let height = f64::from(pixel_height.max(1));

        self.terminal.draw(|frame| {
            let layout = ViewerLayout::split(frame.area());

            let header = Paragraph::new(header_line(status)).style(Style::default().bg(BG));
            frame.render_widget(header, layout.header);

            let canvas = Canvas::default()
                .marker(Marker::Braille)
                .background_color(BG)
                .x_bounds([0.0, width - 1.0])
                .y_bounds([0.0, height])
                .paint(|ctx| {
                    let mut cursor = None;
                    for primitive in primitives {
                        match *primitive {
                            DrawPrimitive::Segment {
                                channel,
                                x,
                                y_top,
                                y_bottom,
                            } => {
                                let x = f64::from(x);
                                ctx.draw(&CanvasLine::new(
                                    x,
                                    height - f64::from(y_top),
                                    x,
                                    height - f64::from(y_bottom),
                                    palette.channel(channel),
                                ));
                            }
                            DrawPrimitive::Cursor { .. } => cursor = Some(*primitive),
                        }
                    }

                    // Own layer so the cursor color wins in shared cells
                    if let Some(DrawPrimitive::Cursor { x, y_top, y_bottom }) = cursor {
                        ctx.layer();
                        let x = f64::from(x);
                        ctx.draw(&CanvasLine::new(
                            x,
                            height - f64::from(y_top),
                            x,
                            height - f64::from(y_bottom),
                            palette.cursor,
                        ));
                    }
                });
            frame.render_widget(canvas, layout.canvas);

            let footer = Paragraph::new(footer_line(status)).style(Style::default().bg(BG));
            frame.render_widget(footer, layout.footer);
        })?;

        Ok(())
    }

    /// Waits up to `timeout` for input and maps it to a command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<ViewerCommand> {
        if !event::poll(timeout)? {
            return Ok(ViewerCommand::Continue);
        }

        let command = match event::read()? {
            Event::Key(key) => key_command(key),
            Event::Mouse(mouse) => mouse_command(mouse, self.layout()?.canvas),
            _ => ViewerCommand::Continue,
        };
        if command != ViewerCommand::Continue {
            tracing::debug!("Viewer command: {:?}", command);
        }
        Ok(command)
    }

    /// Restores the terminal. Safe to call more than once.
    ///
    /// # Errors
    /// - If terminal mode cannot be restored
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        tracing::debug!("Viewer terminal cleanup complete");
        Ok(())
    }
}

impl Drop for ViewerTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Maps a key press to a viewer command.
pub fn key_command(key: KeyEvent) -> ViewerCommand {
    if key.kind != KeyEventKind::Press {
        return ViewerCommand::Continue;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => ViewerCommand::Quit,
        KeyCode::Char('q') | KeyCode::Esc => ViewerCommand::Quit,
        KeyCode::Char(' ') => ViewerCommand::TogglePlay,
        KeyCode::Left => ViewerCommand::SeekBackward,
        KeyCode::Right => ViewerCommand::SeekForward,
        KeyCode::Char('+') | KeyCode::Char('=') => ViewerCommand::ZoomIn,
        KeyCode::Char('-') | KeyCode::Char('_') => ViewerCommand::ZoomOut,
        KeyCode::Char('n') => ViewerCommand::NextFile,
        KeyCode::Char('p') => ViewerCommand::PrevFile,
        KeyCode::Home => ViewerCommand::Home,
        _ => ViewerCommand::Continue,
    }
}

/// Maps a left click inside `canvas` to a seek on the clicked pixel column.
pub fn mouse_command(mouse: MouseEvent, canvas: Rect) -> ViewerCommand {
    let MouseEventKind::Down(MouseButton::Left) = mouse.kind else {
        return ViewerCommand::Continue;
    };
    if !canvas.contains(Position::new(mouse.column, mouse.row)) {
        return ViewerCommand::Continue;
    }

    let cell = u32::from(mouse.column - canvas.x);
    ViewerCommand::SeekToPixel(cell * u32::from(DOTS_PER_COLUMN))
}

/// Formats a duration as `m:ss`.
pub fn format_time(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn header_line<'a>(status: &StatusLine<'a>) -> ratatui::text::Line<'a> {
    let mut spans = vec![
        Span::styled(status.file_name, Style::default().fg(Color::White).bold()),
        Span::styled(
            format!("  {} of {}", status.index + 1, status.count),
            Style::default().fg(HELP_FG),
        ),
    ];

    match status.load {
        LoadStatus::Ready => {}
        LoadStatus::Loading => spans.push(Span::styled("  loading…", Style::default().fg(FG))),
        LoadStatus::Failed(message) => spans.push(Span::styled(
            format!("  {message}"),
            Style::default().fg(ERROR_FG),
        )),
    }

    ratatui::text::Line::from(spans)
}

fn footer_line(status: &StatusLine<'_>) -> ratatui::text::Line<'static> {
    let indicator = if status.playing {
        Span::styled("▶ ", Style::default().fg(Color::Green))
    } else {
        Span::styled("⏸ ", Style::default().fg(Color::Yellow))
    };
    let muted = if status.audible {
        Span::raw("")
    } else {
        Span::styled("  muted", Style::default().fg(HELP_FG))
    };

    ratatui::text::Line::from(vec![
        indicator,
        Span::styled(
            format!("{} / {}", format_time(status.position), format_time(status.duration)),
            Style::default().fg(FG),
        ),
        Span::styled(format!("  zoom x{}", status.zoom), Style::default().fg(FG)),
        muted,
        Span::styled(
            "  space play  ←/→ seek  +/- zoom  n/p file  q quit",
            Style::default().fg(HELP_FG),
        ),
    ])
}
