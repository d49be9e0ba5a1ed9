/// Capture mode state machine
///
/// Three modes govern how images are produced: `Live` auto-captures on a
/// repeating countdown, `Capture` takes one frame per button press and
/// freezes it for review, `Upload` analyzes a picked file. Transitions
/// happen only on explicit user selection.
///
/// The one-second tick source itself lives in the iced subscription (see
/// `main.rs`), which is armed exactly while `timer_armed()` is true. That
/// keeps the timer's lifetime tied one-to-one to being in live mode: at
/// most one timer exists, leaving live tears it down, re-entering re-arms
/// it at the full interval.

use crate::state::data::CapturedImage;

/// Seconds between automatic captures in live mode
pub const CAPTURE_INTERVAL_SECS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Repeating countdown, one capture each time it reaches zero
    Live,
    /// Analyze a file picked from disk; no camera involved
    Upload,
    /// One manual capture, then review until recaptured
    Capture,
}

impl CaptureMode {
    pub const ALL: [CaptureMode; 3] = [CaptureMode::Live, CaptureMode::Upload, CaptureMode::Capture];

    pub fn label(&self) -> &'static str {
        match self {
            CaptureMode::Live => "Live Stream",
            CaptureMode::Upload => "Upload Image",
            CaptureMode::Capture => "Capture Photo",
        }
    }
}

/// A file selected in upload mode, decoded and waiting for "Analyze"
#[derive(Debug, Clone)]
pub struct UploadSelection {
    pub filename: String,
    pub image: CapturedImage,
}

#[derive(Debug)]
pub struct CaptureController {
    mode: CaptureMode,
    /// Seconds until the next automatic capture (live mode only)
    countdown: u32,
    /// Frozen frame shown in place of the preview after a manual capture
    review_image: Option<CapturedImage>,
    /// File picked in upload mode, if any
    upload: Option<UploadSelection>,
}

impl CaptureController {
    /// Start in live mode with a full countdown, matching the original
    /// default of the studio.
    pub fn new() -> Self {
        Self {
            mode: CaptureMode::Live,
            countdown: CAPTURE_INTERVAL_SECS,
            review_image: None,
            upload: None,
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Whether the repeating timer should currently exist
    pub fn timer_armed(&self) -> bool {
        self.mode == CaptureMode::Live
    }

    /// Explicit user mode selection. The countdown display always resets
    /// to the full interval, whichever direction the switch goes; review
    /// and upload selections survive switches and are only cleared by
    /// their own explicit actions.
    pub fn select_mode(&mut self, mode: CaptureMode) {
        self.mode = mode;
        self.countdown = CAPTURE_INTERVAL_SECS;
    }

    /// One second elapsed in live mode. Returns true when the countdown
    /// hit zero, meaning the caller should perform one capture-and-analyze
    /// action; the countdown is already reset to the full interval.
    pub fn tick(&mut self) -> bool {
        if self.mode != CaptureMode::Live {
            return false;
        }
        if self.countdown <= 1 {
            self.countdown = CAPTURE_INTERVAL_SECS;
            true
        } else {
            self.countdown -= 1;
            false
        }
    }

    // ========== Review sub-state (capture mode) ==========

    pub fn review_image(&self) -> Option<&CapturedImage> {
        self.review_image.as_ref()
    }

    pub fn in_review(&self) -> bool {
        self.review_image.is_some()
    }

    /// Freeze a manually captured frame for inspection
    pub fn enter_review(&mut self, image: CapturedImage) {
        self.review_image = Some(image);
    }

    /// Explicit recapture: back to the live preview. The caller is
    /// responsible for also clearing the session's result slots.
    pub fn clear_review(&mut self) {
        self.review_image = None;
    }

    // ========== Upload selection ==========

    pub fn upload(&self) -> Option<&UploadSelection> {
        self.upload.as_ref()
    }

    pub fn set_upload(&mut self, filename: String, image: CapturedImage) {
        self.upload = Some(UploadSelection { filename, image });
    }
}

impl Default for CaptureController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> CapturedImage {
        CapturedImage::new(vec![0xFF, 0xD8, 0xFF, 0xD9], "image/jpeg")
    }

    #[test]
    fn test_starts_live_with_full_countdown() {
        let controller = CaptureController::new();
        assert_eq!(controller.mode(), CaptureMode::Live);
        assert_eq!(controller.countdown(), CAPTURE_INTERVAL_SECS);
        assert!(controller.timer_armed());
    }

    #[test]
    fn test_tick_counts_down_and_fires_at_zero() {
        let mut controller = CaptureController::new();
        for expected in (1..CAPTURE_INTERVAL_SECS).rev() {
            assert!(!controller.tick());
            assert_eq!(controller.countdown(), expected);
        }
        // The final second fires the capture and resets in one step
        assert!(controller.tick());
        assert_eq!(controller.countdown(), CAPTURE_INTERVAL_SECS);
    }

    #[test]
    fn test_leaving_live_disarms_and_resets() {
        let mut controller = CaptureController::new();
        controller.tick();
        controller.tick();
        assert!(controller.countdown() < CAPTURE_INTERVAL_SECS);

        controller.select_mode(CaptureMode::Upload);
        assert!(!controller.timer_armed());
        assert_eq!(controller.countdown(), CAPTURE_INTERVAL_SECS);

        // Ticks outside live mode never fire
        assert!(!controller.tick());
        assert_eq!(controller.countdown(), CAPTURE_INTERVAL_SECS);
    }

    #[test]
    fn test_reentering_live_rearms_at_full_interval() {
        let mut controller = CaptureController::new();
        controller.tick();
        controller.select_mode(CaptureMode::Capture);
        controller.select_mode(CaptureMode::Live);
        assert!(controller.timer_armed());
        assert_eq!(controller.countdown(), CAPTURE_INTERVAL_SECS);
    }

    #[test]
    fn test_review_enter_and_clear() {
        let mut controller = CaptureController::new();
        controller.select_mode(CaptureMode::Capture);
        assert!(!controller.in_review());

        controller.enter_review(frame());
        assert!(controller.in_review());
        assert!(controller.review_image().is_some());

        controller.clear_review();
        assert!(!controller.in_review());
    }

    #[test]
    fn test_review_survives_mode_switches() {
        let mut controller = CaptureController::new();
        controller.select_mode(CaptureMode::Capture);
        controller.enter_review(frame());

        controller.select_mode(CaptureMode::Upload);
        controller.select_mode(CaptureMode::Capture);
        assert!(controller.in_review());
    }

    #[test]
    fn test_upload_selection_is_kept_until_replaced() {
        let mut controller = CaptureController::new();
        controller.select_mode(CaptureMode::Upload);
        assert!(controller.upload().is_none());

        controller.set_upload("cat.png".to_string(), frame());
        let selection = controller.upload().unwrap();
        assert_eq!(selection.filename, "cat.png");

        controller.select_mode(CaptureMode::Live);
        controller.select_mode(CaptureMode::Upload);
        assert!(controller.upload().is_some());
    }
}
