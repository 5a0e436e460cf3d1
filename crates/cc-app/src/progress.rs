#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    CheckingCache,
    LoadingCachedResult,
    Simulating,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(self) -> &'static str {
        match self {
            RunStage::CheckingCache => "checking cache",
            RunStage::LoadingCachedResult => "loading cache",
            RunStage::Simulating => "simulating",
            RunStage::SavingResults => "saving",
            RunStage::Completed => "done",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimProgress {
    pub tick: usize,
    pub total_ticks: usize,
    pub sim_time_s: f64,
    pub temperature_c: f64,
    pub fraction_complete: f64,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub scenario: String,
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub sim: Option<SimProgress>,
}

impl RunProgressEvent {
    pub fn stage(
        scenario: &str,
        stage: RunStage,
        elapsed_wall_s: f64,
        message: Option<String>,
    ) -> Self {
        Self {
            scenario: scenario.to_string(),
            stage,
            elapsed_wall_s,
            message,
            sim: None,
        }
    }
}
