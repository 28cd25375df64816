// ── ProgressBar ───────────────────────────────────────────────────────────────
//
// Host-facing wrapper over `ProgressWindow`.  Remembers the current progress
// and message, hands every click handler a `&ProgressBar` so it can close the
// bar or swap the buttons, and fires an `on_close` hook once.
//
// Cloning is cheap and every clone refers to the same window.  The window is
// destroyed by `close()` or when the last clone is dropped.  Single-threaded
// like the window it wraps.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use crate::{
    error::Result,
    options::ProgressBarOptions,
    platform::win32::window::{ButtonRow, ProgressWindow},
};

/// Click handler for a [`Button`].
pub type ClickHandler = Box<dyn FnMut(&ProgressBar)>;

/// One button: its label and what happens when it is clicked.
pub struct Button {
    label: String,
    click: ClickHandler,
}

impl Button {
    pub fn new(label: impl Into<String>, click: impl FnMut(&ProgressBar) + 'static) -> Self {
        Self {
            label: label.into(),
            click: Box::new(click),
        }
    }

    /// A button that closes the bar.
    pub fn close(label: impl Into<String>) -> Self {
        Self::new(label, |bar| bar.close())
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

struct Inner {
    window: RefCell<Option<ProgressWindow>>,
    progress: Cell<i32>,
    message: RefCell<String>,
    labels: RefCell<Vec<String>>,
    on_close: RefCell<Option<Box<dyn FnOnce()>>>,
}

/// A shown progress bar.
#[derive(Clone)]
pub struct ProgressBar {
    inner: Rc<Inner>,
}

/// Collects the initial state of a [`ProgressBar`].
pub struct ProgressBarBuilder {
    title: String,
    message: String,
    progress: i32,
    buttons: Vec<Button>,
    on_close: Option<Box<dyn FnOnce()>>,
}

impl ProgressBarBuilder {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn progress(mut self, progress: i32) -> Self {
        self.progress = progress;
        self
    }

    pub fn button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }

    /// Runs once, when the bar is closed through [`ProgressBar::close`].
    pub fn on_close(mut self, on_close: impl FnOnce() + 'static) -> Self {
        self.on_close = Some(Box::new(on_close));
        self
    }

    /// Create the window and show it.
    pub fn show(self) -> Result<ProgressBar> {
        let inner = Rc::new(Inner {
            window: RefCell::new(None),
            progress: Cell::new(self.progress),
            message: RefCell::new(self.message),
            labels: RefCell::new(Vec::new()),
            on_close: RefCell::new(self.on_close),
        });

        let (labels, row) = button_row(Rc::downgrade(&inner), self.buttons);
        let window = ProgressWindow::create(&self.title, &inner.message.borrow(), row)?;
        window.set_progress(self.progress);

        *inner.labels.borrow_mut() = labels;
        *inner.window.borrow_mut() = Some(window);
        tracing::debug!(title = %self.title, "progress bar shown");
        Ok(ProgressBar { inner })
    }
}

impl ProgressBar {
    pub fn builder(title: impl Into<String>) -> ProgressBarBuilder {
        ProgressBarBuilder {
            title: title.into(),
            message: String::new(),
            progress: 0,
            buttons: Vec::new(),
            on_close: None,
        }
    }

    /// Builder pre-filled from `options`.  Option buttons get `click` as
    /// their handler, called with the bar and the button's index.
    pub fn from_options(
        options: &ProgressBarOptions,
        click: impl Fn(&ProgressBar, usize) + Clone + 'static,
    ) -> ProgressBarBuilder {
        let mut builder = Self::builder(options.title.clone())
            .message(options.message.clone())
            .progress(options.progress);
        for (i, label) in options.buttons.iter().enumerate() {
            let click = click.clone();
            builder = builder.button(Button::new(label.clone(), move |bar| click(bar, i)));
        }
        builder
    }

    pub fn progress(&self) -> i32 {
        self.inner.progress.get()
    }

    /// Unclamped, like the underlying control.
    pub fn set_progress(&self, progress: i32) {
        self.inner.progress.set(progress);
        if let Some(window) = self.inner.window.borrow().as_ref() {
            window.set_progress(progress);
        }
    }

    pub fn message(&self) -> String {
        self.inner.message.borrow().clone()
    }

    pub fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        if let Some(window) = self.inner.window.borrow().as_ref() {
            window.set_message(&message);
        }
        *self.inner.message.borrow_mut() = message;
    }

    /// Labels of the buttons currently shown, left to right.
    pub fn button_labels(&self) -> Vec<String> {
        self.inner.labels.borrow().clone()
    }

    /// Replace the whole button row.  Safe to call from a click handler.
    pub fn set_buttons(&self, buttons: Vec<Button>) {
        let (labels, row) = button_row(Rc::downgrade(&self.inner), buttons);
        if let Some(window) = self.inner.window.borrow().as_ref() {
            window.replace_buttons(row);
        }
        *self.inner.labels.borrow_mut() = labels;
    }

    /// Destroy the window and run the `on_close` hook.  Later calls do
    /// nothing.  Safe to call from a click handler.
    pub fn close(&self) {
        let window = self.inner.window.borrow_mut().take();
        let Some(window) = window else {
            return;
        };
        window.close();
        tracing::debug!("progress bar closed");

        let on_close = self.inner.on_close.borrow_mut().take();
        if let Some(on_close) = on_close {
            on_close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .window
            .borrow()
            .as_ref()
            .map_or(true, |w| !w.is_open())
    }
}

/// Split `buttons` into their labels and a native row whose press handler
/// forwards to the matching click handler.  The row only holds a weak
/// reference so the window never keeps its own bar alive.
fn button_row(bar: Weak<Inner>, buttons: Vec<Button>) -> (Vec<String>, ButtonRow) {
    let (labels, mut clicks): (Vec<String>, Vec<ClickHandler>) =
        buttons.into_iter().map(|b| (b.label, b.click)).unzip();

    let row = ButtonRow::new(labels.iter(), move |index| {
        let Some(inner) = bar.upgrade() else {
            return;
        };
        let bar = ProgressBar { inner };
        if let Some(click) = clicks.get_mut(index) {
            click(&bar);
        }
    });
    (labels, row)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
