use std::time::Duration;

use crate::tables::TableView;

/// Entrance-animated element and its `data-delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animatable {
    pub id: String,
    pub delay: Duration,
}

impl Animatable {
    pub fn new(id: &str, delay: Duration) -> Self {
        Self {
            id: id.to_string(),
            delay,
        }
    }
}

pub trait Surface {
    fn exists(&self, id: &str) -> bool;

    fn set_text(&self, id: &str, text: &str);

    /// Replaces the table body of `id`.
    fn render_table(&self, id: &str, table: &TableView);

    fn set_visible(&self, id: &str, visible: bool);

    fn has_class(&self, id: &str, class: &str) -> bool;

    fn add_class(&self, id: &str, class: &str);

    /// Elements carrying an entrance animation, in document order.
    fn animatables(&self) -> Vec<Animatable>;

    /// Chart canvases and map containers.
    fn visualization_containers(&self) -> Vec<String>;
}
