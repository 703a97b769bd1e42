//! Planning tab. Static until planning moves into the client.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanningView;

impl PlanningView {
    pub fn render(&self) -> String {
        "📅 Heimstunden-Planung\n\nComing soon... 🚧\n".to_string()
    }
}
