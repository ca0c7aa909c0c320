/// Result views. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Tab {
    #[default]
    Equity,
    Analytics,
    Assumptions,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Equity, Tab::Analytics, Tab::Assumptions];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Equity => "Equity",
            Tab::Analytics => "Analytics",
            Tab::Assumptions => "Assumptions",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct TabController {
    active: Tab,
}

impl TabController {
    pub fn new(initial: Tab) -> Self {
        Self { active: initial }
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    pub fn is_active(&self, tab: Tab) -> bool {
        self.active == tab
    }

    /// Make `tab` the only active tab. Returns `false` when it already was.
    pub fn activate(&mut self, tab: Tab) -> bool {
        if self.active == tab {
            return false;
        }
        self.active = tab;
        true
    }

    pub fn next(&mut self) -> Tab {
        let next = Tab::ALL[(self.active.index() + 1) % Tab::ALL.len()];
        self.activate(next);
        next
    }
}
