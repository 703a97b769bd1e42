//! Tabbed shell holding the three views.

use super::{AssistantApi, ChatView, PlanningView, SearchView};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Chat,
    Games,
    Planning,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Chat, Tab::Games, Tab::Planning];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Chat => "💬 Chat",
            Tab::Games => "🎯 Spiele",
            Tab::Planning => "📅 Planung",
        }
    }
}

pub struct Shell<A> {
    api: A,
    active: Tab,
    chat: ChatView,
    search: SearchView,
    planning: PlanningView,
}

impl<A: AssistantApi> Shell<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            active: Tab::default(),
            chat: ChatView::default(),
            search: SearchView::default(),
            planning: PlanningView,
        }
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    /// Switch tabs. View state is left untouched.
    pub fn select(&mut self, tab: Tab) {
        self.active = tab;
    }

    pub fn chat(&self) -> &ChatView {
        &self.chat
    }

    pub fn search(&self) -> &SearchView {
        &self.search
    }

    /// Feed a line of input to the active view.
    pub async fn submit(&mut self, line: &str) {
        match self.active {
            Tab::Chat => {
                self.chat.input = line.to_string();
                self.chat.submit(&self.api).await;
            }
            Tab::Games => {
                self.search.query = line.to_string();
                self.search.submit(&self.api).await;
            }
            Tab::Planning => {}
        }
    }

    pub fn render(&self) -> String {
        let nav: Vec<String> = Tab::ALL
            .iter()
            .map(|tab| {
                if *tab == self.active() {
                    format!("[{}]", tab.label())
                } else {
                    format!(" {} ", tab.label())
                }
            })
            .collect();

        let view = match self.active() {
            Tab::Chat => self.chat().render(),
            Tab::Games => self.search().render(),
            Tab::Planning => self.planning.render(),
        };

        format!("🏕️ Pfadi AI Assistent\n{}\n\n{}", nav.join(" "), view)
    }
}
