use crate::{
    config::Config,
    error::ConsultError,
    llm::{ModelAvailability, ModelBackend},
    prompt::create_review_prompt,
    retry::{RetryOutcome, RetryPolicy},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// What the user asked for on the command line.
#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    pub package: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub quiet: bool,
    pub score_only: bool,
}

impl ReviewOptions {
    /// Whether anything besides the final answer should reach the terminal.
    pub fn is_interactive(&self) -> bool {
        !self.quiet && !self.score_only
    }
}

/// A completed review. `response` is never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub package: PathBuf,
    pub model: String,
    pub response: String,
    pub attempts: u32,
}

pub struct Consultant<B: ModelBackend> {
    backend: B,
    model: String,
    retry: RetryPolicy,
    show_progress: bool,
}

impl<B: ModelBackend> Consultant<B> {
    pub fn new(backend: B, config: &Config) -> Self {
        Self {
            backend,
            model: config.llm.model.clone(),
            retry: RetryPolicy::new(config.review.max_attempts),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Fail early if the backend is down or the model isn't installed.
    pub async fn ensure_model(&self) -> Result<String, ConsultError> {
        match self.backend.check_model(&self.model).await? {
            ModelAvailability::Present { name } => {
                tracing::debug!("Model {} resolved to {}", self.model, name);
                Ok(name)
            }
            ModelAvailability::Missing { installed } => {
                tracing::debug!("Installed models: {:?}", installed);
                Err(ConsultError::ModelNotFound {
                    model: self.model.clone(),
                })
            }
        }
    }

    /// Check the model, read the manifest and ask for a review.
    pub async fn review(&self, package: &Path) -> Result<Review, ConsultError> {
        self.ensure_model().await?;

        let manifest = fs::read_to_string(package).map_err(|e| ConsultError::io(package, e))?;
        tracing::info!("Reviewing {} ({} bytes)", package.display(), manifest.len());

        let prompt = create_review_prompt(&manifest);
        let (response, attempts) = self.ask(&prompt).await?;

        Ok(Review {
            package: package.to_path_buf(),
            model: self.model.clone(),
            response,
            attempts,
        })
    }

    /// Send the prompt, asking again while the reply is blank.
    async fn ask(&self, prompt: &str) -> Result<(String, u32), ConsultError> {
        let spinner = self.spinner("Analyzing your swift package ...");
        let backend = &self.backend;
        let model = self.model.as_str();
        let max_attempts = self.retry.max_attempts();

        let outcome = self
            .retry
            .run(
                move |attempt| {
                    tracing::debug!("Chat attempt {}/{}", attempt, max_attempts);
                    backend.chat(model, prompt)
                },
                |reply: &String| reply.trim().is_empty(),
            )
            .await;
        spinner.finish_and_clear();

        match outcome? {
            RetryOutcome::Accepted { value, attempts } => Ok((value, attempts)),
            RetryOutcome::Exhausted { attempts, .. } => Err(ConsultError::EmptyResponse { attempts }),
        }
    }

    fn spinner(&self, message: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg:.green.bold}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}
