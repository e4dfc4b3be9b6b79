//! The closed intent label set.

use serde::{Deserialize, Serialize};

/// Dimensionality of every intent vector.
pub const INTENT_DIMENSIONS: usize = 128;

/// Semantic classification of an observed event.
///
/// The set is closed: the encoder must map every event onto exactly one of
/// these labels, falling back to [`IntentClass::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentClass {
    DataEntry,
    Navigation,
    Communication,
    Research,
    Approval,
    FileOperation,
    Authentication,
    Configuration,
    DataExtraction,
    WorkflowTransition,
    ErrorHandling,
    Unknown,
}

impl IntentClass {
    /// All twelve labels, in declaration order.
    pub const ALL: [IntentClass; 12] = [
        IntentClass::DataEntry,
        IntentClass::Navigation,
        IntentClass::Communication,
        IntentClass::Research,
        IntentClass::Approval,
        IntentClass::FileOperation,
        IntentClass::Authentication,
        IntentClass::Configuration,
        IntentClass::DataExtraction,
        IntentClass::WorkflowTransition,
        IntentClass::ErrorHandling,
        IntentClass::Unknown,
    ];

    /// The wire label for this class.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentClass::DataEntry => "data_entry",
            IntentClass::Navigation => "navigation",
            IntentClass::Communication => "communication",
            IntentClass::Research => "research",
            IntentClass::Approval => "approval",
            IntentClass::FileOperation => "file_operation",
            IntentClass::Authentication => "authentication",
            IntentClass::Configuration => "configuration",
            IntentClass::DataExtraction => "data_extraction",
            IntentClass::WorkflowTransition => "workflow_transition",
            IntentClass::ErrorHandling => "error_handling",
            IntentClass::Unknown => "unknown",
        }
    }

    /// Per-class generator seed. Fixed by the data contract: two deployments
    /// must produce byte-identical vectors for the same event.
    pub fn seed(&self) -> u32 {
        match self {
            IntentClass::DataEntry => 0x1a2b_3c4d,
            IntentClass::Navigation => 0x2b3c_4d5e,
            IntentClass::Communication => 0x3c4d_5e6f,
            IntentClass::Research => 0x4d5e_6f70,
            IntentClass::Approval => 0x5e6f_7081,
            IntentClass::FileOperation => 0x6f70_8192,
            IntentClass::Authentication => 0x7081_92a3,
            IntentClass::Configuration => 0x8192_a3b4,
            IntentClass::DataExtraction => 0x92a3_b4c5,
            IntentClass::WorkflowTransition => 0xa3b4_c5d6,
            IntentClass::ErrorHandling => 0xb4c5_d6e7,
            IntentClass::Unknown => 0xc5d6_e7f8,
        }
    }
}

impl std::fmt::Display for IntentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
