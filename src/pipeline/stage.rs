use serde::Serialize;
use std::fmt;

/// Where one upload is in the processing protocol.
///
/// Success runs `Received` through `CleanedUp` in declaration order, skipping
/// `Persisted` when the result is empty. `Failed` can follow any stage before
/// `CleanedUp`, and is itself always followed by `CleanedUp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Validated,
    Unpacked,
    Located,
    Extracted,
    Diffed,
    Persisted,
    Rendered,
    Failed,
    CleanedUp,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Unpacked => "unpacked",
            Stage::Located => "located",
            Stage::Extracted => "extracted",
            Stage::Diffed => "diffed",
            Stage::Persisted => "persisted",
            Stage::Rendered => "rendered",
            Stage::Failed => "failed",
            Stage::CleanedUp => "cleaned_up",
        }
    }

    /// Short human description of the work that leads into this stage.
    pub fn activity(&self) -> &'static str {
        match self {
            Stage::Received => "Receiving upload",
            Stage::Validated => "Checking file type",
            Stage::Unpacked => "Unpacking archive",
            Stage::Located => "Locating followers and following lists",
            Stage::Extracted => "Reading account lists",
            Stage::Diffed => "Comparing lists",
            Stage::Persisted => "Saving result list",
            Stage::Rendered => "Preparing output",
            Stage::Failed => "Processing failed",
            Stage::CleanedUp => "Removing temporary files",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
