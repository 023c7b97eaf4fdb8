//! Game service: new rounds, prompt generation and image comparison.

use super::config::{GameConfig, DEFAULT_BUDGET, DEFAULT_FETCH_TIMEOUT};
use super::deadline::Deadline;
use super::Round;
use crate::core::fetch::{DefaultFetcher, HttpFetcher, ImageFetcher, Locator};
use crate::core::generator::{random_prompt, ImageGenerator, Language, OpenAiGenerator};
use crate::core::scorer::{Comparison, SimilarityScorer};
use crate::error::{GameError, Result};
use crate::events::{null_sender, CompareEvent, Event, EventSender, GenerateEvent, Stage};
use chrono::Utc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

/// Builder for the game service
pub struct GameServiceBuilder {
    fetcher: Option<Arc<dyn ImageFetcher>>,
    generator: Option<Arc<dyn ImageGenerator>>,
    budget: Duration,
    events: Option<EventSender>,
    local_files: bool,
}

impl GameServiceBuilder {
    pub fn new() -> Self {
        Self {
            fetcher: None,
            generator: None,
            budget: DEFAULT_BUDGET,
            events: None,
            local_files: false,
        }
    }

    /// Accept local file paths as image locators (off by default)
    pub fn local_files(mut self, enabled: bool) -> Self {
        self.local_files = enabled;
        self
    }

    /// Set the image fetcher
    pub fn fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the image generator
    pub fn generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the wall-clock budget for each workflow
    pub fn budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Report progress through this sender
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the service.
    ///
    /// Without an explicit fetcher, a default http fetcher is created; it
    /// also reads the filesystem when local files are enabled.
    pub fn build(self) -> Result<GameService> {
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => default_fetcher(DEFAULT_FETCH_TIMEOUT, self.local_files)?,
        };

        Ok(GameService {
            fetcher,
            generator: self.generator,
            scorer: SimilarityScorer::new(),
            budget: self.budget,
            events: self.events.unwrap_or_else(null_sender),
            local_files: self.local_files,
        })
    }
}

impl Default for GameServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_fetcher(timeout: Duration, local_files: bool) -> Result<Arc<dyn ImageFetcher>> {
    let http = HttpFetcher::new(timeout)
        .map_err(|e| GameError::Config(format!("failed to build HTTP client: {}", e)))?;
    if local_files {
        Ok(Arc::new(DefaultFetcher::with_local_files(http)))
    } else {
        Ok(Arc::new(DefaultFetcher::new(http)))
    }
}

/// Orchestrates the game workflows.
///
/// Cheap to clone; clones share the fetcher and generator.
#[derive(Clone)]
pub struct GameService {
    fetcher: Arc<dyn ImageFetcher>,
    generator: Option<Arc<dyn ImageGenerator>>,
    scorer: SimilarityScorer,
    budget: Duration,
    events: EventSender,
    local_files: bool,
}

impl GameService {
    pub fn builder() -> GameServiceBuilder {
        GameServiceBuilder::new()
    }

    /// Build a service from configuration.
    ///
    /// Generation stays disabled when no API key is configured; scoring
    /// works either way.
    pub fn from_config(config: &GameConfig, events: Option<EventSender>) -> Result<Self> {
        let mut builder = Self::builder()
            .fetcher(default_fetcher(config.fetch_timeout, config.local_files)?)
            .local_files(config.local_files)
            .budget(config.budget);

        if let Some(api_key) = &config.api_key {
            let generator = OpenAiGenerator::new(api_key.clone(), config.budget)?
                .base_url(config.base_url.clone())
                .model(config.model.clone());
            builder = builder.generator(Arc::new(generator));
        }
        if let Some(events) = events {
            builder = builder.events(events);
        }

        builder.build()
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Whether an image generator is configured
    pub fn can_generate(&self) -> bool {
        self.generator.is_some()
    }

    fn generator(&self) -> Result<Arc<dyn ImageGenerator>> {
        self.generator.clone().ok_or_else(|| {
            GameError::Config(
                "image generation is not configured; set OPENAI_API_KEY".to_string(),
            )
        })
    }

    fn generate_within(&self, deadline: &Deadline, prompt: String) -> Result<String> {
        let generator = self.generator()?;
        let started = Instant::now();

        let url = deadline.run(Stage::Generating, &self.events, move || {
            generator.generate(&prompt).map_err(GameError::from)
        })?;

        self.events.send(Event::Generate(GenerateEvent::Completed {
            url: url.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
        }));
        Ok(url)
    }

    /// Start a round: draw a target prompt and generate its image
    pub fn new_round(&self, language: Language) -> Result<Round> {
        let prompt = random_prompt(language, &mut rand::thread_rng());
        info!(%language, prompt, "Starting new round");
        self.events.send(Event::Generate(GenerateEvent::PromptChosen {
            prompt: prompt.to_string(),
        }));

        let deadline = Deadline::start(self.budget);
        let image_url = self.generate_within(&deadline, prompt.to_string())?;

        Ok(Round {
            id: Uuid::new_v4(),
            language,
            prompt: prompt.to_string(),
            image_url,
            created_at: Utc::now(),
        })
    }

    /// Generate an image for a player's prompt and return its URL
    pub fn generate(&self, prompt: &str) -> Result<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GameError::InvalidRequest("prompt must not be empty".to_string()));
        }

        let deadline = Deadline::start(self.budget);
        self.generate_within(&deadline, prompt.to_string())
    }

    fn locator(&self, raw: &str) -> Result<Locator> {
        let locator = Locator::parse(raw).map_err(|e| GameError::InvalidRequest(e.to_string()))?;
        if !self.local_files && !locator.is_remote() {
            return Err(GameError::InvalidRequest(
                "Image locations must be http(s) URLs".to_string(),
            ));
        }
        Ok(locator)
    }

    /// Fetch both images concurrently and score them
    pub fn compare(&self, target: &str, candidate: &str) -> Result<Comparison> {
        let target = self.locator(target)?;
        let candidate = self.locator(candidate)?;

        info!(%target, %candidate, "Comparing images");
        let deadline = Deadline::start(self.budget);
        let started = Instant::now();

        let fetcher = Arc::clone(&self.fetcher);
        let (target_bytes, candidate_bytes) =
            deadline.run(Stage::Fetching, &self.events, move || {
                let (target_bytes, candidate_bytes) = thread::scope(|scope| {
                    let target_job = scope.spawn(|| fetcher.fetch(&target));
                    let candidate_bytes = fetcher.fetch(&candidate);
                    let target_bytes = target_job.join().map_err(|_| {
                        GameError::Internal("target fetch worker panicked".to_string())
                    });
                    (target_bytes, candidate_bytes)
                });
                Ok((target_bytes??, candidate_bytes?))
            })?;

        for (label, bytes) in [("target", &target_bytes), ("candidate", &candidate_bytes)] {
            self.events.send(Event::Compare(CompareEvent::ImageFetched {
                label: label.to_string(),
                bytes: bytes.len(),
            }));
        }

        let scorer = self.scorer;
        let comparison = deadline.run(Stage::Scoring, &self.events, move || {
            scorer
                .compare(&target_bytes, &candidate_bytes)
                .map_err(GameError::from)
        })?;

        info!(score = comparison.score, tier = %comparison.tier, "Comparison score");
        self.events.send(Event::Compare(CompareEvent::Scored {
            score: comparison.score,
            tier: comparison.tier,
            duration_ms: started.elapsed().as_millis() as u64,
        }));
        Ok(comparison)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, UpstreamError};
    use crate::events::{EventChannel, WorkflowEvent};
    use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;

    fn gray_png(size: u32, value: u8) -> Vec<u8> {
        let image = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(size, size, Luma([value])));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    struct MapFetcher {
        images: HashMap<String, Vec<u8>>,
        delay: Duration,
    }

    impl ImageFetcher for MapFetcher {
        fn fetch(&self, locator: &Locator) -> std::result::Result<Vec<u8>, FetchError> {
            thread::sleep(self.delay);
            self.images
                .get(&locator.to_string())
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    locator: locator.to_string(),
                    status: 404,
                    reason: "Not Found".to_string(),
                })
        }
    }

    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    impl ImageGenerator for RecordingGenerator {
        fn generate(&self, prompt: &str) -> std::result::Result<String, UpstreamError> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            Ok(format!("https://images.example/{}.png", prompts.len()))
        }
    }

    fn fetcher(delay: Duration) -> Arc<MapFetcher> {
        let mut images = HashMap::new();
        images.insert("https://images.example/black.png".to_string(), gray_png(64, 0));
        images.insert("https://images.example/white.png".to_string(), gray_png(64, 255));
        images.insert("https://images.example/gray.png".to_string(), gray_png(300, 128));
        images.insert("https://images.example/broken.png".to_string(), b"nope".to_vec());
        Arc::new(MapFetcher { images, delay })
    }

    fn service(delay: Duration) -> GameService {
        GameService::builder()
            .fetcher(fetcher(delay))
            .build()
            .unwrap()
    }

    #[test]
    fn compare_scores_identical_images_100() {
        let comparison = service(Duration::ZERO)
            .compare("https://images.example/gray.png", "https://images.example/gray.png")
            .unwrap();
        assert_eq!(comparison.score, 100);
    }

    #[test]
    fn compare_scores_black_and_white_0() {
        let comparison = service(Duration::ZERO)
            .compare("https://images.example/black.png", "https://images.example/white.png")
            .unwrap();
        assert_eq!(comparison.score, 0);
    }

    #[test]
    fn missing_image_is_a_fetch_error_not_a_score() {
        let error = service(Duration::ZERO)
            .compare("https://images.example/gray.png", "https://images.example/missing.png")
            .unwrap_err();
        assert!(matches!(error, GameError::Fetch(FetchError::Status { status: 404, .. })));
    }

    #[test]
    fn undecodable_image_is_a_score_error() {
        let error = service(Duration::ZERO)
            .compare("https://images.example/broken.png", "https://images.example/gray.png")
            .unwrap_err();
        assert!(matches!(error, GameError::Score(_)));
    }

    #[test]
    fn empty_locator_is_an_invalid_request() {
        let error = service(Duration::ZERO)
            .compare("", "https://images.example/gray.png")
            .unwrap_err();
        assert!(matches!(error, GameError::InvalidRequest(_)));
    }

    #[test]
    fn local_paths_are_refused_by_default() {
        let service = service(Duration::ZERO);
        for path in ["/etc/passwd", "../secrets.png", "C:\\Windows\\win.ini"] {
            let error = service
                .compare(path, "https://images.example/gray.png")
                .unwrap_err();
            assert!(matches!(error, GameError::InvalidRequest(_)));
            assert!(!error.to_string().contains(path));
        }
    }

    #[test]
    fn slow_fetch_times_out() {
        let service = GameService::builder()
            .fetcher(fetcher(Duration::from_millis(400)))
            .budget(Duration::from_millis(50))
            .build()
            .unwrap();

        let error = service
            .compare("https://images.example/gray.png", "https://images.example/gray.png")
            .unwrap_err();
        assert!(error.is_timeout());
    }

    #[test]
    fn fetches_run_concurrently() {
        // Each fetch sleeps 400ms; sequential fetching would blow a 700ms budget.
        let service = GameService::builder()
            .fetcher(fetcher(Duration::from_millis(400)))
            .budget(Duration::from_millis(700))
            .build()
            .unwrap();

        assert!(service
            .compare("https://images.example/gray.png", "https://images.example/gray.png")
            .is_ok());
    }

    #[test]
    fn generation_requires_a_generator() {
        let error = service(Duration::ZERO).generate("a red fox").unwrap_err();
        assert!(matches!(error, GameError::Config(_)));
    }

    #[test]
    fn new_round_uses_a_target_prompt() {
        let generator = Arc::new(RecordingGenerator {
            prompts: Mutex::new(Vec::new()),
        });
        let service = GameService::builder()
            .fetcher(fetcher(Duration::ZERO))
            .generator(generator.clone())
            .build()
            .unwrap();

        let round = service.new_round(Language::En).unwrap();

        assert_eq!(round.language, Language::En);
        assert_eq!(round.image_url, "https://images.example/1.png");
        assert!(crate::core::generator::target_prompts(Language::En).contains(&round.prompt.as_str()));
        assert_eq!(generator.prompts.lock().unwrap().as_slice(), &[round.prompt.clone()]);
    }

    #[test]
    fn generate_rejects_blank_prompt() {
        let service = GameService::builder()
            .fetcher(fetcher(Duration::ZERO))
            .generator(Arc::new(RecordingGenerator {
                prompts: Mutex::new(Vec::new()),
            }))
            .build()
            .unwrap();

        assert!(matches!(service.generate("   "), Err(GameError::InvalidRequest(_))));
    }

    #[test]
    fn compare_reports_progress() {
        let (sender, receiver) = EventChannel::new();
        let service = GameService::builder()
            .fetcher(fetcher(Duration::ZERO))
            .events(sender)
            .build()
            .unwrap();

        service
            .compare("https://images.example/gray.png", "https://images.example/black.png")
            .unwrap();
        drop(service);

        let events: Vec<Event> = receiver.iter().collect();
        assert!(events.iter().any(|e| matches!(
            e,
            Event::Workflow(WorkflowEvent::StageChanged { stage: Stage::Scoring })
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Compare(CompareEvent::Scored { .. }))));
    }
}
