//! Tasks, calendar and overview panels

use crate::models::{decode_stock_rows, sort_pending_first, CalendarEvent, StockRow, Task};
use crate::remote::{CalendarSource, StockSource, TaskSource};
use safeapp_common::{normalize, Error, Result};
use std::fmt;
use std::sync::Arc;

/// Task list used when none is configured
pub const DEFAULT_TASK_LIST: &str = "@default";

/// Entries per overview section
pub const OVERVIEW_LIMIT: usize = 5;

pub struct TasksPanel {
    source: Arc<dyn TaskSource>,
    list_id: String,
    tasks: Vec<Task>,
}

impl TasksPanel {
    pub fn new(source: Arc<dyn TaskSource>) -> Self {
        Self {
            source,
            list_id: DEFAULT_TASK_LIST.to_string(),
            tasks: Vec::new(),
        }
    }

    /// Tasks with open ones first, source order kept within each group
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub async fn load(&mut self) -> Result<()> {
        let raw = self.source.list_tasks().await?;
        let mut tasks = Task::from_rows(normalize(raw));
        sort_pending_first(&mut tasks);
        self.tasks = tasks;
        tracing::info!(tasks = self.tasks.len(), "Tasks loaded");
        Ok(())
    }

    /// Create a task; a blank title is ignored and returns `Ok(false)`
    pub async fn add(&mut self, title: &str) -> Result<bool> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        self.source.create_task(&self.list_id, title).await?;
        tracing::info!(title = %title, "Task created");
        self.load().await?;
        Ok(true)
    }

    /// Flip a task between completed and needsAction
    pub async fn toggle(&mut self, task: &Task) -> Result<()> {
        let toggled = task.toggled();
        self.source.update_task(&self.list_id, &toggled).await?;
        tracing::info!(task_id = %task.id, status = ?toggled.status, "Task updated");
        self.load().await
    }

    /// Delete after confirmation; `Ok(false)` when not confirmed
    pub async fn delete(&mut self, task: &Task, confirmed: bool) -> Result<bool> {
        if !confirmed {
            return Ok(false);
        }
        self.source.delete_task(&self.list_id, &task.id).await?;
        tracing::info!(task_id = %task.id, "Task deleted");
        self.load().await?;
        Ok(true)
    }
}

pub struct CalendarPanel {
    source: Arc<dyn CalendarSource>,
    events: Vec<CalendarEvent>,
}

impl CalendarPanel {
    pub fn new(source: Arc<dyn CalendarSource>) -> Self {
        Self {
            source,
            events: Vec::new(),
        }
    }

    /// Events in source order
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub async fn load(&mut self) -> Result<()> {
        let raw = self.source.list_calendar_events().await?;
        self.events = CalendarEvent::from_rows(normalize(raw));
        tracing::info!(events = self.events.len(), "Calendar loaded");
        Ok(())
    }
}

/// Data source behind one overview section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewSection {
    Tasks,
    Calendar,
    Stock,
}

impl fmt::Display for OverviewSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverviewSection::Tasks => "tasks",
            OverviewSection::Calendar => "calendar",
            OverviewSection::Stock => "stock",
        };
        f.write_str(name)
    }
}

/// Landing summary. A failed source leaves its section empty and is listed
/// in `errors`.
#[derive(Debug, Default)]
pub struct Overview {
    pub open_tasks: Vec<Task>,
    pub upcoming_events: Vec<CalendarEvent>,
    pub low_stock: Vec<StockRow>,
    pub errors: Vec<(OverviewSection, Error)>,
}

impl Overview {
    /// Query the three sources concurrently
    pub async fn load(
        tasks: &dyn TaskSource,
        calendar: &dyn CalendarSource,
        stock: &dyn StockSource,
    ) -> Overview {
        let (tasks_raw, events_raw, stock_raw) = tokio::join!(
            tasks.list_tasks(),
            calendar.list_calendar_events(),
            stock.list_stock()
        );

        let mut overview = Overview::default();

        match tasks_raw {
            Ok(raw) => {
                overview.open_tasks = Task::from_rows(normalize(raw))
                    .into_iter()
                    .filter(|t| !t.is_completed())
                    .take(OVERVIEW_LIMIT)
                    .collect();
            }
            Err(e) => overview.record_failure(OverviewSection::Tasks, e),
        }

        match events_raw {
            Ok(raw) => {
                overview.upcoming_events = CalendarEvent::from_rows(normalize(raw))
                    .into_iter()
                    .take(OVERVIEW_LIMIT)
                    .collect();
            }
            Err(e) => overview.record_failure(OverviewSection::Calendar, e),
        }

        match stock_raw {
            Ok(raw) => {
                overview.low_stock = decode_stock_rows(normalize(raw))
                    .into_iter()
                    .filter(StockRow::is_low_stock)
                    .take(OVERVIEW_LIMIT)
                    .collect();
            }
            Err(e) => overview.record_failure(OverviewSection::Stock, e),
        }

        overview
    }

    fn record_failure(&mut self, section: OverviewSection, error: Error) {
        tracing::warn!(section = %section, error = %error, "Overview section unavailable");
        self.errors.push((section, error));
    }

    pub fn failed(&self, section: OverviewSection) -> bool {
        self.errors.iter().any(|(s, _)| *s == section)
    }
}
