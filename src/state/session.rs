/// The analysis session: the single "current image" and its result slots
///
/// This is the mediator between the capture layer and the analysis client.
/// It owns the only shared mutable state in the application: the current
/// image and the three result slots (description, detail, answer), each
/// with its own loading flag. Nothing outside this struct writes to them.
///
/// Because completions arrive as messages in the iced update loop, every
/// remote operation is split into a synchronous `begin_*` (precondition
/// checks + state transition, returns what the dispatcher needs to launch
/// the call) and a synchronous `finish_*` (applies the settlement). The
/// update loop wires the two to the actual network call.

use thiserror::Error;

use super::data::CapturedImage;

/// Placeholder shown when a describe call fails outright
pub const DESCRIPTION_FAILED: &str = "Error fetching description.";
/// Placeholder shown when a detail call fails outright
pub const DETAIL_FAILED: &str = "Error fetching detailed description.";
/// Placeholder shown when a question call fails outright
pub const ANSWER_FAILED: &str = "Error fetching answer.";

/// Precondition failures surfaced to the user as guidance, never stored
/// in a result slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuidanceError {
    #[error("No image available. Please capture or upload one first.")]
    NoImage,
    #[error("Please enter a question.")]
    EmptyQuestion,
}

/// Settlement of a remote call, already reduced to a displayable string
/// on the error side (network error types don't survive the message
/// boundary, which requires Clone).
pub type Settlement = Result<String, String>;

#[derive(Debug, Default)]
pub struct AnalysisSession {
    current_image: Option<CapturedImage>,
    /// Identity of the current image. Bumped on every replacement so that
    /// settlements of calls issued against an older image can be told
    /// apart and discarded instead of overwriting the new image's slots.
    generation: u64,
    description: Option<String>,
    detail: Option<String>,
    answer: Option<String>,
    loading_description: bool,
    loading_detail: bool,
    loading_answer: bool,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Accessors for the view layer ==========

    pub fn current_image(&self) -> Option<&CapturedImage> {
        self.current_image.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn loading_description(&self) -> bool {
        self.loading_description
    }

    pub fn loading_detail(&self) -> bool {
        self.loading_detail
    }

    pub fn loading_answer(&self) -> bool {
        self.loading_answer
    }

    // ========== Describe (triggered by every new image) ==========

    /// Replace the current image and prepare the describe dispatch.
    ///
    /// All three result slots and the dependent loading flags are cleared
    /// *before* the new call goes out, so no result is ever displayed
    /// against the wrong image, even transiently. Returns the generation
    /// the caller must attach to the describe call.
    pub fn set_current_image(&mut self, image: CapturedImage) -> u64 {
        self.generation += 1;
        self.current_image = Some(image);
        self.description = None;
        self.detail = None;
        self.answer = None;
        self.loading_detail = false;
        self.loading_answer = false;
        self.loading_description = true;
        self.generation
    }

    /// Apply a describe settlement. Stale settlements (issued against a
    /// previous image) are discarded entirely: the replacement already
    /// reset the slot and the flag.
    pub fn finish_describe(&mut self, generation: u64, outcome: Settlement) {
        if generation != self.generation {
            return;
        }
        self.loading_description = false;
        self.description = Some(outcome.unwrap_or_else(|_| DESCRIPTION_FAILED.to_string()));
    }

    // ========== Detail (user-triggered, needs a current image) ==========

    /// Start a detail request against the current image.
    ///
    /// Fails with guidance when there is no current image; no network call
    /// may be dispatched in that case and no slot is touched.
    pub fn begin_detail(&mut self) -> Result<(CapturedImage, u64), GuidanceError> {
        let image = self
            .current_image
            .clone()
            .ok_or(GuidanceError::NoImage)?;
        self.detail = None;
        self.loading_detail = true;
        Ok((image, self.generation))
    }

    pub fn finish_detail(&mut self, generation: u64, outcome: Settlement) {
        if generation != self.generation {
            return;
        }
        self.loading_detail = false;
        self.detail = Some(outcome.unwrap_or_else(|_| DETAIL_FAILED.to_string()));
    }

    // ========== Question (user-triggered, needs image + text) ==========

    /// Start a question request against the current image.
    ///
    /// The question text is checked first (matching the original flow);
    /// empty or whitespace-only text is guidance, not a request.
    pub fn begin_answer(&mut self, question: &str) -> Result<(CapturedImage, u64), GuidanceError> {
        if question.trim().is_empty() {
            return Err(GuidanceError::EmptyQuestion);
        }
        let image = self
            .current_image
            .clone()
            .ok_or(GuidanceError::NoImage)?;
        self.answer = None;
        self.loading_answer = true;
        Ok((image, self.generation))
    }

    pub fn finish_answer(&mut self, generation: u64, outcome: Settlement) {
        if generation != self.generation {
            return;
        }
        self.loading_answer = false;
        self.answer = Some(outcome.unwrap_or_else(|_| ANSWER_FAILED.to_string()));
    }

    // ========== Recapture support ==========

    /// Clear all three result slots and their loading flags.
    ///
    /// Used by the recapture action. The current image is retained, but
    /// the generation is bumped so any settlement still in flight lands
    /// stale and cannot repopulate a slot the user just cleared.
    pub fn clear_results(&mut self) {
        self.generation += 1;
        self.description = None;
        self.detail = None;
        self.answer = None;
        self.loading_description = false;
        self.loading_detail = false;
        self.loading_answer = false;
    }
}
