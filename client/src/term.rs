use {
    crossterm::{
        QueueableCommand, cursor,
        style::{Color, ResetColor, SetForegroundColor},
        terminal,
    },
    once_cell::sync::Lazy,
    parking_lot::{Mutex, RawMutex, lock_api::ArcMutexGuard},
    std::{
        fmt::{Display, Write as _},
        io::{self, Stdout, Write},
        process,
        sync::Arc,
    },
    tokio::signal::ctrl_c,
    tracing::{Level, Subscriber, error, field::Visit, warn},
    tracing_subscriber::Layer,
};

/// Name of the event field that marks the final line of a run.
pub const OUTCOME_FIELD: &str = "outcome";

struct Term {
    stdout: Stdout,
    current_status: Option<String>,
}

fn term() -> ArcMutexGuard<RawMutex, Term> {
    static TERM: Lazy<Arc<Mutex<Term>>> = Lazy::new(|| Arc::new(Mutex::new(Term::new())));
    Mutex::lock_arc(&TERM)
}

/// Keeps a status line at the bottom of the terminal until dropped.
#[must_use]
pub struct StatusGuard;

impl StatusGuard {
    pub fn set(&self, status: impl Display) {
        let _ = term().set_status(status);
    }
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        clear_status();
    }
}

pub fn set_status(status: impl Display) -> StatusGuard {
    let _ = term().set_status(status);
    StatusGuard
}

pub fn clear_status() {
    let _ = term().clear_status();
}

impl Term {
    fn new() -> Self {
        // The status line hides the cursor, so restore it before dying.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async {
                match ctrl_c().await {
                    Ok(()) => {
                        clear_status();
                        error!("Interrupted.");
                        process::exit(1);
                    }
                    Err(err) => {
                        warn!(?err, "failed to listen to interrupt signal");
                    }
                }
            });
        }
        Self {
            stdout: io::stdout(),
            current_status: None,
        }
    }

    fn set_status(&mut self, status: impl Display) -> io::Result<()> {
        let status = status.to_string();
        if self.current_status.is_none() {
            self.stdout.queue(cursor::Hide)?;
            self.stdout.queue(terminal::DisableLineWrap)?;
        } else {
            self.stdout.queue(cursor::RestorePosition)?;
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::FromCursorDown))?;
        }
        self.stdout.queue(cursor::SavePosition)?;
        self.stdout.queue(SetForegroundColor(Color::DarkGreen))?;
        self.stdout.write_all(status.as_bytes())?;
        self.stdout.queue(ResetColor)?;
        self.stdout.queue(cursor::RestorePosition)?;
        self.stdout.flush()?;
        self.current_status = Some(status);
        Ok(())
    }

    fn clear_status(&mut self) -> io::Result<()> {
        if self.current_status.is_none() {
            return Ok(());
        }

        self.stdout.queue(cursor::RestorePosition)?;
        self.stdout
            .queue(terminal::Clear(terminal::ClearType::FromCursorDown))?;
        self.stdout.queue(terminal::EnableLineWrap)?;
        self.stdout.queue(cursor::Show)?;
        self.stdout.flush()?;

        self.current_status = None;
        Ok(())
    }

    fn write(&mut self, color: Option<Color>, text: impl Display) -> io::Result<()> {
        let old_status = self.current_status.clone();
        self.clear_status()?;
        if let Some(color) = color {
            self.stdout.queue(SetForegroundColor(color))?;
        }
        let mut text = text.to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        self.stdout.write_all(text.as_bytes())?;
        if color.is_some() {
            self.stdout.queue(ResetColor)?;
        }
        if let Some(old_status) = old_status {
            self.set_status(old_status)?;
        }
        self.stdout.flush()
    }
}

/// Prints events of the CLI crate to the terminal, keeping the status line
/// below them. Library events only reach the log file.
pub struct TermLayer;

impl<S: Subscriber> Layer<S> for TermLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let mut message = visitor.message;
        if !visitor.fields.is_empty() {
            let _ = write!(message, " ({})", visitor.fields.join(", "));
        }
        let level = *event.metadata().level();
        let color = if level == Level::ERROR || level == Level::WARN {
            Some(Color::Red)
        } else if visitor.success {
            Some(Color::Green)
        } else if level == Level::INFO {
            None
        } else {
            Some(Color::Grey)
        };
        let _ = term().write(color, message);
    }

    fn enabled(
        &self,
        metadata: &tracing::Metadata<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> bool {
        metadata
            .module_path()
            .is_some_and(|path| path == "ownproof" || path.starts_with("ownproof::"))
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<String>,
    success: bool,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else if field.name() == OUTCOME_FIELD {
            self.success = format!("{value:?}") == "Success";
        } else {
            self.fields.push(format!("{} = {:?}", field.name(), value));
        }
    }
}
