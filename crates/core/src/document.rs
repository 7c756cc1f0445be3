use serde::{Deserialize, Serialize};

/// Project phase a deliverable belongs to.
///
/// The set is closed; [`ReviewStage::ALL`] is the fixed presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewStage {
    #[serde(rename = "stage-1")]
    Stage1,
    #[serde(rename = "stage-2")]
    Stage2,
    #[serde(rename = "stage-3")]
    Stage3,
}

impl ReviewStage {
    pub const ALL: [ReviewStage; 3] = [ReviewStage::Stage1, ReviewStage::Stage2, ReviewStage::Stage3];

    /// Parse a raw stage tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "stage-1" => Some(ReviewStage::Stage1),
            "stage-2" => Some(ReviewStage::Stage2),
            "stage-3" => Some(ReviewStage::Stage3),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ReviewStage::Stage1 => "stage-1",
            ReviewStage::Stage2 => "stage-2",
            ReviewStage::Stage3 => "stage-3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReviewStage::Stage1 => "Stage 1 review",
            ReviewStage::Stage2 => "Stage 2 review",
            ReviewStage::Stage3 => "Final review",
        }
    }
}

impl std::fmt::Display for ReviewStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A single file handed to the customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliverableDocument {
    pub name: String,
    pub url: String,
    pub category: String,
    /// Raw review-stage tag as supplied by the caller.
    pub stage: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl DeliverableDocument {
    pub fn review_stage(&self) -> Option<ReviewStage> {
        ReviewStage::from_tag(&self.stage)
    }
}

/// Documents of one review stage, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct StageGroup<'a> {
    pub stage: ReviewStage,
    pub tag: &'static str,
    pub label: &'static str,
    pub documents: Vec<&'a DeliverableDocument>,
}

impl StageGroup<'_> {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Group documents by review stage.
///
/// Always returns the three stages in fixed order, empty groups included.
/// Relative order inside a stage follows the input. Documents with an
/// unrecognised stage tag are left out.
pub fn partition_by_stage(documents: &[DeliverableDocument]) -> [StageGroup<'_>; 3] {
    ReviewStage::ALL.map(|stage| StageGroup {
        stage,
        tag: stage.tag(),
        label: stage.label(),
        documents: documents
            .iter()
            .filter(|doc| doc.review_stage() == Some(stage))
            .collect(),
    })
}
