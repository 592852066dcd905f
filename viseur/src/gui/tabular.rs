#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TabKind {
    Info,
    Inspect,
    Settings,
    Help,
}

impl TabKind {
    pub const ALL: [TabKind; 4] = [
        TabKind::Info,
        TabKind::Inspect,
        TabKind::Settings,
        TabKind::Help,
    ];

    pub fn title(self) -> &'static str {
        match self {
            TabKind::Info => "Info",
            TabKind::Inspect => "Inspect",
            TabKind::Settings => "Settings",
            TabKind::Help => "Help",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tab {
    pub kind: TabKind,
    pub title: String,
}

impl Tab {
    pub fn new(kind: TabKind) -> Self {
        Self {
            kind,
            title: String::from(kind.title()),
        }
    }
}

/// A row of tabs with exactly one of them active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tabular {
    tabs: Vec<Tab>,
    active: usize,
}

impl Tabular {
    pub fn new(tabs: Vec<Tab>) -> Self {
        Self { tabs, active: 0 }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn active(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Selects a tab, returning it if the selection changed.
    pub fn select(&mut self, index: usize) -> Option<&Tab> {
        if index >= self.tabs.len() || index == self.active {
            return None;
        }
        self.active = index;
        self.tabs.get(index)
    }

    pub fn select_kind(&mut self, kind: TabKind) -> Option<&Tab> {
        let index = self.tabs.iter().position(|t| t.kind == kind)?;
        self.select(index)
    }

    /// Selects the tab after the active one, wrapping around.
    pub fn select_next(&mut self) -> Option<&Tab> {
        if self.tabs.is_empty() {
            return None;
        }
        self.select((self.active + 1) % self.tabs.len())
    }
}

impl Default for Tabular {
    fn default() -> Self {
        Tabular::new(TabKind::ALL.into_iter().map(Tab::new).collect())
    }
}
