use iced::widget::image as preview_image;
use iced::widget::{button, column, container, radio, row, text, text_input, Column, Row};
use iced::{time, Alignment, Element, Length, Subscription, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::time::Duration;

mod api;
mod capture;
mod state;

use api::client::AnalysisClient;
use capture::camera::{SnapshotSource, Webcam};
use capture::codec;
use state::data::CapturedImage;
use state::mode::{CaptureController, CaptureMode, CAPTURE_INTERVAL_SECS};
use state::session::AnalysisSession;

/// Main application state
struct VisionStudio {
    /// Current image and the three analysis result slots
    session: AnalysisSession,
    /// Mode state machine: countdown, review frame, upload selection
    controller: CaptureController,
    /// Client for the remote vision-analysis backend
    client: AnalysisClient,
    /// The webcam, if one could be opened at startup
    camera: Option<Webcam>,
    /// User-entered question text; never cleared automatically, so the
    /// same question can be re-asked for a new image
    question: String,
    /// Status / guidance message shown to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User picked a capture mode
    ModeSelected(CaptureMode),
    /// One second elapsed on the live-mode timer
    CountdownTick,
    /// User pressed "Capture & Analyze" in capture mode
    CaptureRequested,
    /// User pressed "Recapture" while reviewing a frozen frame
    RecaptureRequested,
    /// User pressed "Choose File" in upload mode
    PickFile,
    /// Background file read finished
    FileLoaded(Result<(String, CapturedImage), String>),
    /// User pressed "Analyze Image" in upload mode
    AnalyzeUpload,
    /// Describe call settled for the given image generation
    DescribeComplete(u64, Result<String, String>),
    /// User asked for the detailed description
    DetailRequested,
    /// Detail call settled for the given image generation
    DetailComplete(u64, Result<String, String>),
    /// Question textarea edited
    QuestionChanged(String),
    /// User pressed "Get Answer"
    AskQuestion,
    /// Question call settled for the given image generation
    AnswerComplete(u64, Result<String, String>),
}

impl VisionStudio {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let client = AnalysisClient::from_env();

        // A missing camera is not fatal: upload mode still works, and
        // capture attempts simply do nothing until a camera appears on
        // the next launch.
        let camera = match Webcam::open() {
            Ok(cam) => Some(cam),
            Err(e) => {
                eprintln!("⚠️  No camera available: {}", e);
                None
            }
        };

        let status = format!(
            "Ready. Auto-capturing every {}s in live mode.",
            CAPTURE_INTERVAL_SECS
        );
        println!("🎥 Vision Studio initialized");

        (
            VisionStudio {
                session: AnalysisSession::new(),
                controller: CaptureController::new(),
                client,
                camera,
                question: String::new(),
                status,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ModeSelected(mode) => {
                self.controller.select_mode(mode);
                self.status = match mode {
                    CaptureMode::Live => format!(
                        "🔴 Live mode: capturing every {}s.",
                        CAPTURE_INTERVAL_SECS
                    ),
                    CaptureMode::Upload => "📁 Upload mode: choose an image file.".to_string(),
                    CaptureMode::Capture => "📸 Capture mode: take a photo when ready.".to_string(),
                };
                Task::none()
            }

            Message::CountdownTick => {
                if self.controller.tick() {
                    // Live-mode auto-capture: no review freeze, the
                    // preview keeps running
                    self.capture_and_describe(false)
                } else {
                    Task::none()
                }
            }

            Message::CaptureRequested => {
                // Only valid from capture mode, and not while a frozen
                // frame is awaiting an explicit recapture
                if self.controller.mode() != CaptureMode::Capture || self.controller.in_review() {
                    return Task::none();
                }
                self.capture_and_describe(true)
            }

            Message::RecaptureRequested => {
                self.controller.clear_review();
                self.session.clear_results();
                self.status = "📸 Ready for a new capture.".to_string();
                Task::none()
            }

            Message::PickFile => {
                let picked = FileDialog::new()
                    .set_title("Select an Image to Analyze")
                    .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
                    .pick_file();

                if let Some(path) = picked {
                    return Task::perform(load_upload(path), Message::FileLoaded);
                }
                Task::none()
            }

            Message::FileLoaded(Ok((filename, image))) => {
                self.status = format!("✅ {} ready for analysis.", filename);
                self.controller.set_upload(filename, image);
                Task::none()
            }

            Message::FileLoaded(Err(reason)) => {
                self.status = format!("⚠️  {}", reason);
                Task::none()
            }

            Message::AnalyzeUpload => {
                let Some(selection) = self.controller.upload() else {
                    self.status = "Please select an image first.".to_string();
                    return Task::none();
                };
                let image = selection.image.clone();
                self.dispatch_describe(image)
            }

            Message::DescribeComplete(generation, outcome) => {
                self.session.finish_describe(generation, outcome);
                Task::none()
            }

            Message::DetailRequested => match self.session.begin_detail() {
                Ok((image, generation)) => {
                    let client = self.client.clone();
                    Task::perform(
                        async move { client.detail(image).await.map_err(|e| e.to_string()) },
                        move |outcome| Message::DetailComplete(generation, outcome),
                    )
                }
                Err(guidance) => {
                    self.status = guidance.to_string();
                    Task::none()
                }
            },

            Message::DetailComplete(generation, outcome) => {
                self.session.finish_detail(generation, outcome);
                Task::none()
            }

            Message::QuestionChanged(question) => {
                self.question = question;
                Task::none()
            }

            Message::AskQuestion => match self.session.begin_answer(&self.question) {
                Ok((image, generation)) => {
                    let client = self.client.clone();
                    let question = self.question.trim().to_string();
                    Task::perform(
                        async move {
                            client
                                .question(image, question)
                                .await
                                .map_err(|e| e.to_string())
                        },
                        move |outcome| Message::AnswerComplete(generation, outcome),
                    )
                }
                Err(guidance) => {
                    self.status = guidance.to_string();
                    Task::none()
                }
            },

            Message::AnswerComplete(generation, outcome) => {
                self.session.finish_answer(generation, outcome);
                Task::none()
            }
        }
    }

    /// Take one snapshot from the camera and send it off for description.
    ///
    /// No camera or no frame means the attempt ends silently; a frame
    /// that fails to decode only costs a status line. Nothing in the
    /// session is touched until a valid image exists.
    fn capture_and_describe(&mut self, enter_review: bool) -> Task<Message> {
        let Some(camera) = self.camera.as_mut() else {
            return Task::none();
        };
        let Some(snapshot) = camera.try_snapshot() else {
            return Task::none();
        };

        match codec::decode_snapshot(&snapshot) {
            Ok(image) => {
                if enter_review {
                    self.controller.enter_review(image.clone());
                }
                self.dispatch_describe(image)
            }
            Err(e) => {
                self.status = format!("⚠️  Dropped frame: {}", e);
                Task::none()
            }
        }
    }

    /// Install the image as the current one and launch the describe call.
    /// The session clears every result slot before the call goes out.
    fn dispatch_describe(&mut self, image: CapturedImage) -> Task<Message> {
        let generation = self.session.set_current_image(image.clone());
        let client = self.client.clone();

        Task::perform(
            async move { client.describe(image).await.map_err(|e| e.to_string()) },
            move |outcome| Message::DescribeComplete(generation, outcome),
        )
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let content: Column<Message> = column![
            text("Vision Studio").size(40),
            self.mode_selector(),
            row![self.acquisition_panel(), self.results_panel()].spacing(30),
            text(&self.status).size(14),
        ]
        .spacing(20)
        .padding(30)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    fn mode_selector(&self) -> Element<Message> {
        let selected = Some(self.controller.mode());
        CaptureMode::ALL
            .iter()
            .fold(Row::new().spacing(20), |r, mode| {
                r.push(radio(mode.label(), *mode, selected, Message::ModeSelected))
            })
            .into()
    }

    /// Left column: camera preview / upload picker, depending on mode
    fn acquisition_panel(&self) -> Element<Message> {
        let panel: Column<Message> = match self.controller.mode() {
            CaptureMode::Live => column![
                text("🔴 Live Camera Feed").size(20),
                text(format!(
                    "Next capture in {}s",
                    self.controller.countdown()
                )),
            ],

            CaptureMode::Capture => {
                if let Some(frame) = self.controller.review_image() {
                    column![
                        text("📷 Captured Frame").size(20),
                        preview_image(preview_image::Handle::from_bytes(frame.bytes.clone()))
                            .width(Length::Fixed(420.0)),
                        button("📸 Recapture").on_press(Message::RecaptureRequested),
                    ]
                } else {
                    column![
                        text("📷 Camera Preview").size(20),
                        button("📸 Capture & Analyze").on_press_maybe(
                            (!self.session.loading_description())
                                .then_some(Message::CaptureRequested)
                        ),
                    ]
                }
            }

            CaptureMode::Upload => {
                let selection = self
                    .controller
                    .upload()
                    .map(|upload| format!("✅ {}", upload.filename))
                    .unwrap_or_else(|| "No file selected.".to_string());

                column![
                    text("📁 Upload Your Image").size(20),
                    text(selection),
                    row![
                        button("Choose File").on_press(Message::PickFile),
                        button("🔍 Analyze Image").on_press_maybe(
                            (!self.session.loading_description())
                                .then_some(Message::AnalyzeUpload)
                        ),
                    ]
                    .spacing(10),
                ]
            }
        };

        panel.spacing(15).width(Length::FillPortion(1)).into()
    }

    /// Right column: the three result slots
    fn results_panel(&self) -> Element<Message> {
        let description: Element<Message> = if self.session.loading_description() {
            text("Analyzing image...").into()
        } else {
            text(self.session.description().unwrap_or(
                "No description available yet. Capture or upload an image to get started.",
            ))
            .into()
        };

        let mut panel: Column<Message> = column![
            text("🔍 AI Analysis Results").size(20),
            description,
            button(if self.session.loading_detail() {
                "Loading..."
            } else {
                "📋 Detailed Analysis"
            })
            .on_press_maybe(
                (self.session.current_image().is_some() && !self.session.loading_detail())
                    .then_some(Message::DetailRequested)
            ),
        ]
        .spacing(15);

        if let Some(detail) = self.session.detail() {
            panel = panel.push(text(detail));
        }

        panel = panel
            .push(text("💬 Ask About the Image").size(20))
            .push(
                text_input(
                    "What would you like to know about this image?",
                    &self.question,
                )
                .on_input(Message::QuestionChanged)
                .on_submit(Message::AskQuestion),
            )
            .push(
                button(if self.session.loading_answer() {
                    "Getting Answer..."
                } else {
                    "🤖 Get Answer"
                })
                .on_press_maybe((!self.session.loading_answer()).then_some(Message::AskQuestion)),
            );

        if let Some(answer) = self.session.answer() {
            panel = panel.push(text(answer));
        }

        panel.width(Length::FillPortion(1)).into()
    }

    /// The repeating auto-capture timer exists exactly while live mode is
    /// active; switching away drops the subscription, switching back
    /// re-creates it with a freshly reset countdown.
    fn subscription(&self) -> Subscription<Message> {
        if self.controller.timer_armed() {
            time::every(Duration::from_secs(1)).map(|_| Message::CountdownTick)
        } else {
            Subscription::none()
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    iced::application("Vision Studio", VisionStudio::update, VisionStudio::view)
        .subscription(VisionStudio::subscription)
        .theme(VisionStudio::theme)
        .centered()
        .run_with(VisionStudio::new)
}

/// Read a picked file and sniff its MIME type off the UI thread
async fn load_upload(path: PathBuf) -> Result<(String, CapturedImage), String> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let format = image::guess_format(&bytes)
        .map_err(|_| format!("{} is not a recognized image file.", path.display()))?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());

    Ok((
        filename,
        CapturedImage::new(bytes, format.to_mime_type()),
    ))
}
