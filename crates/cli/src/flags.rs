use absa_inference::InferenceMode;
use clap::ValueEnum;

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum ModeFlag {
    Onnx,
    Stub,
}

impl ModeFlag {
    pub(crate) const fn as_domain(self) -> InferenceMode {
        match self {
            ModeFlag::Onnx => InferenceMode::Onnx,
            ModeFlag::Stub => InferenceMode::Stub,
        }
    }
}

#[derive(Copy, Clone, Default, ValueEnum)]
pub(crate) enum ReportFormat {
    #[default]
    Json,
    Markdown,
}
