use serde::{Deserialize, Serialize};

pub const CATEGORY_COUNT: usize = 5;

/// Diagnostic categories in the fixed order reported by the prediction
/// service; its probability vector is index-aligned with [`DrCategory::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrCategory {
    NoDr,
    Mild,
    Moderate,
    Severe,
    Proliferative,
}

impl DrCategory {
    pub const ALL: [DrCategory; CATEGORY_COUNT] = [
        DrCategory::NoDr,
        DrCategory::Mild,
        DrCategory::Moderate,
        DrCategory::Severe,
        DrCategory::Proliferative,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DrCategory::NoDr => "No DR",
            DrCategory::Mild => "Mild",
            DrCategory::Moderate => "Moderate",
            DrCategory::Severe => "Severe",
            DrCategory::Proliferative => "Proliferative DR",
        }
    }

    pub fn index(self) -> usize {
        match self {
            DrCategory::NoDr => 0,
            DrCategory::Mild => 1,
            DrCategory::Moderate => 2,
            DrCategory::Severe => 3,
            DrCategory::Proliferative => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<DrCategory> {
        DrCategory::ALL.get(index).copied()
    }
}

/// A bundled example scan served by the API under `/examples/{file_name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleScan {
    pub file_name: &'static str,
    pub caption: &'static str,
}

pub const EXAMPLE_GALLERY: [ExampleScan; 3] = [
    ExampleScan {
        file_name: "example_no_dr.png",
        caption: "Healthy retina",
    },
    ExampleScan {
        file_name: "example_moderate.png",
        caption: "Moderate DR",
    },
    ExampleScan {
        file_name: "example_severe.png",
        caption: "Severe DR",
    },
];

pub fn example_by_name(name: &str) -> Option<ExampleScan> {
    EXAMPLE_GALLERY
        .iter()
        .copied()
        .find(|example| example.file_name == name)
}

pub const REPORT_FILE_NAME: &str = "AuraSight_Report.pdf";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
