use serde::{Deserialize, Serialize};

/// When POI markers and routes show up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    /// POI markers and routes of a listing appear once its pin is clicked
    #[default]
    OnInteraction,
    /// POI markers of every listing are shown up front, without routes
    ShowAll,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::OnInteraction => DisplayMode::ShowAll,
            DisplayMode::ShowAll => DisplayMode::OnInteraction,
        }
    }
}

#[test]
fn toggle_flips() {
    assert_eq!(DisplayMode::default().toggled(), DisplayMode::ShowAll);
    assert_eq!(DisplayMode::ShowAll.toggled(), DisplayMode::OnInteraction);
}

#[test]
fn serialized_names() {
    assert_eq!(serde_json::to_string(&DisplayMode::OnInteraction).unwrap(), "\"on-interaction\"");
    assert_eq!(serde_json::from_str::<DisplayMode>("\"show-all\"").unwrap(), DisplayMode::ShowAll);
}
