use crate::service::MapOverlay;

/// General popups and route duration labels are closed independently: a pin click
/// closes only general popups, a map click closes both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCategory {
    General,
    RouteLabel,
}

/// Tracks the info windows that are currently open.
#[derive(Default)]
pub struct OverlayCoordinator {
    general: Vec<Box<dyn MapOverlay>>,
    route_labels: Vec<Box<dyn MapOverlay>>,
}

impl OverlayCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an opened overlay. Nothing else in the category is closed.
    pub fn open(&mut self, category: OverlayCategory, overlay: Box<dyn MapOverlay>) {
        self.category_mut(category).push(overlay);
    }

    pub fn close_category(&mut self, category: OverlayCategory) {
        for mut overlay in self.category_mut(category).drain(..) {
            overlay.remove();
        }
    }

    pub fn close_all(&mut self) {
        self.close_category(OverlayCategory::General);
        self.close_category(OverlayCategory::RouteLabel);
    }

    pub fn count(&self, category: OverlayCategory) -> usize {
        match category {
            OverlayCategory::General => self.general.len(),
            OverlayCategory::RouteLabel => self.route_labels.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.general.len() + self.route_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn category_mut(&mut self, category: OverlayCategory) -> &mut Vec<Box<dyn MapOverlay>> {
        match category {
            OverlayCategory::General => &mut self.general,
            OverlayCategory::RouteLabel => &mut self.route_labels,
        }
    }
}
