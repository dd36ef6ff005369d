//! Application event loop wiring the store, controller, and widgets.

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
    Terminal,
};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::warn;

use crate::chat::{ChatController, TurnOutcome};
use crate::config::Config;
use crate::dialogue::HttpDialogueClient;
use crate::storage;
use crate::store::ConversationStore;
use crate::ui::commands::{get_help_text, ParsedCommand, SlashCommand};
use crate::ui::composer::{Composer, ComposerGate, ComposerResult};
use crate::ui::history::ChatHistory;
use crate::ui::perspectives::{PerspectivePicker, PickerResult};
use crate::ui::sidebar::{step_active, Sidebar};
use crate::upload::{UploadClient, UploadReceipt};

/// Which pane receives plain key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Sidebar,
    Composer,
}

/// Transient, auto-dismissing status-line message.
struct Notice {
    text: String,
    shown_at: Instant,
}

pub struct App {
    config: Config,
    store: ConversationStore,
    controller: ChatController<HttpDialogueClient>,
    upload_client: UploadClient,
    composer: Composer,
    picker: Option<PerspectivePicker>,
    focus: Focus,
    notice: Option<Notice>,
    pending_upload: Option<oneshot::Receiver<Result<UploadReceipt>>>,
    should_quit: bool,
}

/// Run the TUI until the user exits.
pub async fn run(config: Config) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw terminal mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(config);
    let result = app.event_loop(&mut terminal).await;

    disable_raw_mode().context("Failed to disable raw terminal mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to restore cursor")?;

    result
}

impl App {
    pub fn new(config: Config) -> Self {
        let store = storage::load_store(&config.store_path());
        let controller = ChatController::new(HttpDialogueClient::new(config.backend_url.clone()));
        let upload_client = UploadClient::new(config.backend_url.clone());

        let mut composer = Composer::new();
        composer.set_focus(true);

        Self {
            config,
            store,
            controller,
            upload_client,
            composer,
            picker: None,
            focus: Focus::Composer,
            notice: None,
            pending_upload: None,
            should_quit: false,
        }
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| {
                let area = frame.size();
                self.render(area, frame.buffer_mut());
            })?;

            if event::poll(Duration::from_millis(50)).context("Failed to poll terminal events")? {
                if let Event::Key(key) = event::read().context("Failed to read terminal event")? {
                    self.handle_key(key);
                }
            }

            self.tick();
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        // Global bindings first.
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('n') => {
                    self.create_conversation();
                    return;
                }
                KeyCode::Char('p') => {
                    self.open_picker();
                    return;
                }
                _ => {}
            }
        }

        if let Some(picker) = self.picker.as_mut() {
            match picker.handle_key(key) {
                PickerResult::Applied(perspectives) => {
                    self.picker = None;
                    if self.store.active().is_some() {
                        self.store.set_perspectives(perspectives);
                        self.persist();
                        self.notify("Perspectives updated");
                    }
                }
                PickerResult::Cancelled => self.picker = None,
                PickerResult::None => {}
            }
            return;
        }

        if key.code == KeyCode::Tab {
            self.focus = match self.focus {
                Focus::Sidebar => Focus::Composer,
                Focus::Composer => Focus::Sidebar,
            };
            self.composer.set_focus(self.focus == Focus::Composer);
            return;
        }

        // Approval bindings apply in either pane while a summary is pending.
        let confirming = self.store.active().map(|c| c.is_confirming).unwrap_or(false);
        if confirming && !self.controller.is_busy() {
            match key.code {
                KeyCode::Char('y') => {
                    if self.controller.approve(&mut self.store) {
                        self.persist();
                    }
                    return;
                }
                KeyCode::Char('n') => {
                    if self.controller.reject(&mut self.store) {
                        self.persist();
                    }
                    return;
                }
                _ => {}
            }
        }

        match self.focus {
            Focus::Sidebar => self.handle_sidebar_key(key),
            Focus::Composer => match self.composer.handle_key(key) {
                ComposerResult::Submitted(text) => {
                    if self.controller.submit(&mut self.store, &text) {
                        self.persist();
                    } else if self.store.active().is_none() {
                        self.notify("No conversation — press Ctrl+N to start one");
                    }
                }
                ComposerResult::Command(command) => self.handle_command(command),
                ComposerResult::None => {}
            },
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        // Switching or deleting under an outstanding call would let the
        // reply land on the wrong conversation; hold the selection steady.
        if self.controller.is_busy() {
            return;
        }

        match key.code {
            KeyCode::Up => {
                step_active(&mut self.store, -1);
                self.persist();
            }
            KeyCode::Down => {
                step_active(&mut self.store, 1);
                self.persist();
            }
            KeyCode::Enter | KeyCode::Right => {
                self.focus = Focus::Composer;
                self.composer.set_focus(true);
            }
            KeyCode::Delete | KeyCode::Backspace => self.delete_active(),
            _ => {}
        }
    }

    fn handle_command(&mut self, parsed: ParsedCommand) {
        match parsed.command {
            SlashCommand::New => self.create_conversation(),
            SlashCommand::Rename => match parsed.argument() {
                Some(title) => {
                    if let Some(id) = self.store.active_conversation_id.clone() {
                        self.store.rename(&id, title);
                        self.persist();
                    }
                }
                None => self.notify("Usage: /rename <title>"),
            },
            SlashCommand::Delete => self.delete_active(),
            SlashCommand::Perspectives => {
                if let Some(targets) = parsed.perspective_targets() {
                    if self.store.active().is_some() {
                        self.store.set_perspectives(targets);
                        self.persist();
                        self.notify("Perspectives updated");
                    }
                } else if parsed.argument().is_some() {
                    self.notify("Unknown perspective tag (US, EU, NORWAY, CHINA, RUSSIA, NEUTRAL)");
                } else {
                    self.open_picker();
                }
            }
            SlashCommand::Upload => match parsed.argument() {
                Some(path) => self.start_upload(PathBuf::from(path)),
                None => self.notify("Usage: /upload <path>"),
            },
            SlashCommand::Help => self.notify(get_help_text()),
            SlashCommand::Bye => self.should_quit = true,
        }
    }

    fn create_conversation(&mut self) {
        if self.controller.is_busy() {
            return;
        }
        self.store.create(None);
        self.focus = Focus::Composer;
        self.composer.set_focus(true);
        self.persist();
    }

    fn delete_active(&mut self) {
        if self.controller.is_busy() {
            return;
        }
        if let Some(id) = self.store.active_conversation_id.clone() {
            self.store.delete(&id);
            self.persist();
            self.notify("Conversation deleted");
        }
    }

    fn open_picker(&mut self) {
        let Some(conversation) = self.store.active() else {
            self.notify("No conversation — press Ctrl+N to start one");
            return;
        };
        self.picker = Some(PerspectivePicker::new(&conversation.perspectives));
    }

    fn start_upload(&mut self, path: PathBuf) {
        if self.pending_upload.is_some() {
            self.notify("An upload is already running");
            return;
        }

        let client = self.upload_client.clone();
        let (tx, rx) = oneshot::channel();
        let display = path.display().to_string();
        tokio::spawn(async move {
            let result = client.upload(&path).await;
            let _ = tx.send(result);
        });

        self.pending_upload = Some(rx);
        self.notify(format!("Uploading {}...", display));
    }

    /// Drain completed async work and expire the status notice.
    fn tick(&mut self) {
        match self.controller.poll(&mut self.store) {
            Some(TurnOutcome::Reply { .. }) => self.persist(),
            Some(TurnOutcome::Failed(err)) => {
                self.notify(format!("Dialogue failed: {}", err));
            }
            None => {}
        }

        if let Some(rx) = self.pending_upload.as_mut() {
            match rx.try_recv() {
                Ok(Ok(receipt)) => {
                    self.pending_upload = None;
                    self.notify(format!("Uploaded {} ({})", receipt.filename, receipt.status));
                }
                Ok(Err(err)) => {
                    self.pending_upload = None;
                    self.notify(format!("Upload failed: {}", err));
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.pending_upload = None;
                    self.notify("Upload task vanished");
                }
            }
        }

        let ttl = Duration::from_secs(self.config.ui.notice_ttl_secs);
        if let Some(notice) = &self.notice {
            if notice.shown_at.elapsed() > ttl {
                self.notice = None;
            }
        }

        let gate = match self.store.active() {
            _ if self.controller.is_busy() => ComposerGate::Busy,
            Some(conversation) if conversation.is_confirming => ComposerGate::Confirming,
            _ => ComposerGate::Open,
        };
        self.composer.set_gate(gate);
    }

    fn persist(&mut self) {
        if let Err(err) = storage::save_store(&self.config.store_path(), &self.store) {
            warn!(%err, "failed to persist conversation store");
            self.notify(format!("Save failed: {}", err));
        }
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(self.config.ui.sidebar_width),
                Constraint::Min(20),
            ])
            .split(area);

        let chat = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // History
                Constraint::Length(3), // Composer
                Constraint::Length(1), // Status line
            ])
            .split(columns[1]);

        Sidebar::new(&self.store, self.focus == Focus::Sidebar).render(columns[0], buf);
        ChatHistory::new(self.store.active(), self.controller.is_busy()).render(chat[0], buf);
        (&self.composer).render(chat[1], buf);
        self.render_status(chat[2], buf);

        if let Some(picker) = &self.picker {
            picker.render(area, buf);
        }
    }

    fn render_status(&self, area: Rect, buf: &mut Buffer) {
        let line = match &self.notice {
            Some(notice) => Line::from(Span::styled(
                notice.text.clone(),
                Style::default().fg(Color::Yellow),
            )),
            None => {
                let perspectives = self
                    .store
                    .active()
                    .map(|c| {
                        c.perspectives
                            .iter()
                            .map(|p| p.as_ref())
                            .collect::<Vec<_>>()
                            .join(",")
                    })
                    .unwrap_or_default();
                Line::from(Span::styled(
                    format!(
                        " {}  ·  Tab focus · Ctrl+N new · Ctrl+P perspectives · /help",
                        perspectives
                    ),
                    Style::default().fg(Color::DarkGray),
                ))
            }
        };
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
