//! One experiment session: the per-frame loop tying devices, trials, flat
//! renders and the data log together.
//!
//! Frame order: keys → gesture classification → cursor fusion → trial update
//! → flat render (if requested) → completion / sequencing → log row.

pub mod manifest;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use uuid::Uuid;

use crate::algorithm::cursor_fusion::{CursorFusion, CursorSample};
use crate::algorithm::gesture::{Classification, GestureClassifier};
use crate::algorithm::hand_ray::{Calibration, InteractionPlane};
use crate::error::SessionError;
use crate::input::InputSource;
use crate::models::config::{InputMode, SessionConfig};
use crate::models::events::{LoggingEnvironment, ManipulationMode};
use crate::models::input::FrameInput;
use crate::render::flat_buffer::{BufferSize, FlatRenderBuffer};
use crate::render::hit_test::HitTester;
use crate::scene::roles::EntityView;
use crate::telemetry::data_logger::DataLogger;
use crate::trials::registry::TrialSetup;
use crate::trials::{create_trial, CursorOverlay, Trial, TrialContext, TrialId, TrialPhase, TrialSequence};

use self::manifest::{SessionManifest, SCHEMA_VERSION};

pub const LOG_FILE: &str = "log.txt";
/// Custom log column that is filled with the active trial's name.
pub const TRIAL_TITLE: &str = "trial";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// The trial sequence ran out.
    Finished,
    /// Escape, or the input source ran dry.
    Exit,
}

/// What a presentation layer needs to draw the current frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneView {
    pub trial: TrialId,
    pub phase: TrialPhase,
    pub cursor: (f64, f64),
    pub gesture: ManipulationMode,
    pub show_idle_cursor: bool,
    /// False while the active device has lost its pointer.
    pub pointer_detected: bool,
    pub camera_position: [f32; 3],
    pub camera_yaw: f32,
    pub entities: Vec<EntityView>,
}

/// `{username}{MODE} {day}-{month} {hour};{minute}`
pub fn session_dir_name(username: &str, mode: InputMode, at: &DateTime<Local>) -> String {
    format!(
        "{}{} {}-{} {};{}",
        username,
        mode.tag(),
        at.day(),
        at.month(),
        at.hour(),
        at.minute()
    )
}

pub struct Session {
    id: Uuid,
    config: SessionConfig,
    dir: PathBuf,
    started_at: DateTime<Utc>,
    /// Seconds since the session (and its log) started.
    elapsed: f64,
    fusion: CursorFusion,
    classifier: GestureClassifier,
    plane: InteractionPlane,
    calibration: Calibration,
    hit_tester: HitTester,
    rng: StdRng,
    sequence: TrialSequence,
    trial: Option<Box<dyn Trial>>,
    renders: Vec<FlatRenderBuffer>,
    /// Index into `renders` of the active trial's latest flat render.
    current_render: Option<usize>,
    environment: LoggingEnvironment,
    overlay: CursorOverlay,
    logger: DataLogger<BufWriter<File>>,
    custom_values: Vec<String>,
    trials_completed: Vec<TrialId>,
    last_right: bool,
    bone_ray: Option<Vec3>,
    pointer_request: Option<(f64, f64)>,
    finished: bool,
}

impl Session {
    pub fn create(config: SessionConfig) -> Result<Self, SessionError> {
        Self::create_at(config, Local::now())
    }

    /// Creates the session directory named after `at` and opens the log.
    pub fn create_at(config: SessionConfig, at: DateTime<Local>) -> Result<Self, SessionError> {
        config.validate()?;
        let order = config.resolved_trial_order()?;
        let root = config.output_root().ok_or(SessionError::NoOutputRoot)?;
        let dir = root.join(session_dir_name(&config.username, config.input_mode, &at));
        if dir.exists() {
            return Err(SessionError::DirectoryExists(dir));
        }
        std::fs::create_dir_all(&root)?;
        std::fs::create_dir(&dir)?;

        let logger = DataLogger::create(&dir.join(LOG_FILE), &config.custom_titles, config.log_settle_secs)?;
        log::info!(
            "create_session: dir={} mode={} trials={:?}",
            dir.display(),
            config.input_mode,
            order.iter().map(|id| id.name()).collect::<Vec<_>>()
        );

        let mut session = Self {
            id: Uuid::new_v4(),
            dir,
            started_at: at.with_timezone(&Utc),
            elapsed: 0.0,
            fusion: CursorFusion::new(config.point_capacity, config.viewport, config.edge_inset),
            classifier: GestureClassifier::new(config.input_mode),
            plane: InteractionPlane::default(),
            calibration: Calibration::default(),
            hit_tester: HitTester::new(config.cursor_area),
            rng: StdRng::seed_from_u64(config.seed),
            sequence: TrialSequence::new(order),
            trial: None,
            renders: Vec::new(),
            current_render: None,
            environment: LoggingEnvironment::NoGesture,
            overlay: CursorOverlay::default(),
            logger,
            custom_values: vec![String::new(); config.custom_titles.len()],
            trials_completed: Vec::new(),
            last_right: false,
            bone_ray: None,
            pointer_request: None,
            finished: false,
            config,
        };
        if session.config.autostart {
            session.start_sequence();
        }
        Ok(session)
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cursor(&self) -> (f64, f64) {
        self.fusion.cursor()
    }

    pub fn environment(&self) -> LoggingEnvironment {
        self.environment
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn trial(&self) -> Option<&dyn Trial> {
        self.trial.as_deref()
    }

    pub fn active_trial(&self) -> Option<TrialId> {
        self.trial().map(|trial| trial.id())
    }

    pub fn sequence(&self) -> &TrialSequence {
        &self.sequence
    }

    pub fn trials_completed(&self) -> &[TrialId] {
        &self.trials_completed
    }

    /// Every flat render produced so far, oldest first.
    pub fn renders(&self) -> &[FlatRenderBuffer] {
        &self.renders
    }

    pub fn overlay(&self) -> CursorOverlay {
        self.overlay
    }

    pub fn log_rows(&self) -> usize {
        self.logger.rows_written()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pointer warp requested by the last step, if any.
    pub fn take_pointer_request(&mut self) -> Option<(f64, f64)> {
        self.pointer_request.take()
    }

    /// Sets a custom log column by title. Returns false for unknown titles.
    pub fn set_custom_value(&mut self, title: &str, value: impl Into<String>) -> bool {
        match self.config.custom_titles.iter().position(|t| t == title) {
            Some(i) => {
                self.custom_values[i] = value.into();
                true
            }
            None => false,
        }
    }

    pub fn scene(&self) -> Option<SceneView> {
        let trial = self.trial()?;
        let camera = trial.camera();
        Some(SceneView {
            trial: trial.id(),
            phase: trial.phase(),
            cursor: self.fusion.cursor(),
            gesture: self.classifier.state().current,
            show_idle_cursor: self.overlay.displaying_without_gesture,
            pointer_detected: self.pointer_detected(),
            camera_position: camera.position.to_array(),
            camera_yaw: camera.yaw,
            entities: trial.roles().views(),
        })
    }

    fn pointer_detected(&self) -> bool {
        match self.config.input_mode {
            InputMode::Mouse => true,
            InputMode::Kinect => self.bone_ray.is_some(),
            InputMode::Wand => self.classifier.point_detected(self.now_ms()),
        }
    }

    fn now_ms(&self) -> u64 {
        (self.elapsed * 1000.0) as u64
    }

    // ─── Frame loop ──────────────────────────────────────────────────────────

    /// Drives the session from `source` until it finishes, exits or runs dry.
    pub fn run(&mut self, source: &mut dyn InputSource) -> Result<StepOutcome, SessionError> {
        loop {
            let Some(frame) = source.poll() else {
                log::info!("session: input exhausted");
                self.finish()?;
                return Ok(StepOutcome::Exit);
            };
            let outcome = self.step(&frame)?;
            if let Some((x, y)) = self.take_pointer_request() {
                source.set_pointer(x, y);
            }
            if outcome != StepOutcome::Continue {
                return Ok(outcome);
            }
        }
    }

    pub fn step(&mut self, input: &FrameInput) -> Result<StepOutcome, SessionError> {
        if self.finished {
            return Ok(StepOutcome::Finished);
        }
        self.elapsed += input.dt.max(0.0);
        let now_ms = self.now_ms();

        if input.keys.escape {
            log::info!("session: escape pressed");
            self.finish()?;
            return Ok(StepOutcome::Exit);
        }
        if let Some(id) = input.keys.debug_trial.and_then(TrialId::from_debug_key) {
            log::info!("session: debug launch trial={}", id);
            self.launch(id);
        }
        if let Some(mouse) = input.mouse {
            if mouse.right && !self.last_right && !self.sequence.is_started() {
                self.start_sequence();
            }
            self.last_right = mouse.right;
        }

        let classification = self.classifier.classify(input, now_ms);
        self.fuse(input, &classification, now_ms);
        self.update_trial(input, &classification);
        self.render_if_requested();

        if self.trial.as_ref().is_some_and(|trial| trial.is_complete()) {
            if let Some(outcome) = self.complete_trial()? {
                return Ok(outcome);
            }
        }

        self.refresh_trial_column();
        if let Err(e) = self
            .logger
            .update(self.elapsed, self.fusion.cursor(), self.environment, &self.custom_values)
        {
            log::error!("session: log write failed: {}", e);
            if let Err(finish_err) = self.finish() {
                log::error!("session: finish after log failure failed: {}", finish_err);
            }
            return Err(e.into());
        }
        Ok(StepOutcome::Continue)
    }

    fn fuse(&mut self, input: &FrameInput, classification: &Classification, now_ms: u64) {
        self.bone_ray = input.skeleton.and_then(|skeleton| self.plane.bone_ray(&skeleton));

        let sample = match self.config.input_mode {
            InputMode::Mouse => {
                let Some(mouse) = input.mouse else {
                    return;
                };
                if classification.recenter {
                    let (cx, cy) = self.config.viewport.center();
                    self.fusion.set_published(cx, cy);
                    self.pointer_request = Some((cx, cy));
                    return;
                }
                let fenced = self.fusion.fence(mouse.x, mouse.y);
                if fenced.warped {
                    self.pointer_request = Some((fenced.x, fenced.y));
                }
                Some((fenced.x, fenced.y))
            }
            InputMode::Kinect => self
                .bone_ray
                .and_then(|point| self.calibration.to_screen(point.truncate(), self.config.viewport)),
            InputMode::Wand => input
                .wand
                .filter(|wand| wand.ir_found)
                .map(|wand| (wand.ir_x, wand.ir_y)),
        };

        if let Some((x, y)) = sample {
            self.fusion.push(CursorSample { ts: now_ms, x, y });
        }
    }

    fn update_trial(&mut self, input: &FrameInput, classification: &Classification) {
        let Some(trial) = self.trial.as_mut() else {
            return;
        };
        let gesture = classification.state;
        self.environment = LoggingEnvironment::for_gesture(gesture.current, self.environment);

        let mut ctx = TrialContext {
            cursor: self.fusion.cursor(),
            gesture,
            dt: input.dt as f32,
            acknowledge: input.keys.acknowledge,
            input_mode: self.config.input_mode,
            bone_ray: self.bone_ray,
            flat: self.current_render.and_then(|i| self.renders.get(i)),
            hit_tester: &self.hit_tester,
            rng: &mut self.rng,
            environment: &mut self.environment,
            overlay: &mut self.overlay,
        };
        trial.tick(&mut ctx);
    }

    /// Drops the finished trial and, once the sequence has started, moves it on.
    /// A debug launch before the sequence starts is simply dropped.
    fn complete_trial(&mut self) -> Result<Option<StepOutcome>, SessionError> {
        let Some(mut trial) = self.trial.take() else {
            return Ok(None);
        };
        self.current_render = None;
        let id = trial.id();
        if let Some(calibration) = trial.take_calibration() {
            log::info!("session: calibration updated {:?}", calibration);
            self.calibration = calibration;
        }
        self.trials_completed.push(id);
        log::info!("session: trial complete trial={}", id);

        if !self.sequence.is_started() {
            return Ok(None);
        }
        match self.sequence.advance() {
            Some(next) => {
                self.launch(next);
                Ok(None)
            }
            None => {
                log::info!("session: trial sequence finished");
                self.finish()?;
                Ok(Some(StepOutcome::Finished))
            }
        }
    }

    fn start_sequence(&mut self) {
        match self.sequence.start() {
            Some(first) => {
                log::info!("session: sequence started");
                self.launch(first);
            }
            None => log::warn!("session: trial sequence is empty"),
        }
    }

    fn launch(&mut self, id: TrialId) {
        self.current_render = None;
        let setup = TrialSetup {
            viewport: self.config.viewport,
            input_mode: self.config.input_mode,
            rng: &mut self.rng,
            overlay: &mut self.overlay,
        };
        match create_trial(id, setup) {
            Ok(trial) => {
                log::info!("session: trial started trial={} position={:?}", id, self.sequence.position());
                self.trial = Some(trial);
            }
            Err(e) => {
                log::error!("session: failed to start trial {}: {}", id, e);
                self.trial = None;
            }
        }
    }

    fn render_if_requested(&mut self) {
        let Some(trial) = self.trial.as_mut() else {
            return;
        };
        if !trial.render_requested() {
            return;
        }
        let viewport = self.config.viewport;
        let colors = self.hit_tester.colors();
        let mut buffer = FlatRenderBuffer::new(BufferSize::new(viewport.width, viewport.height), colors.background);
        trial.roles().render_flat(trial.camera(), &mut buffer, &colors);
        self.renders.push(buffer);
        self.current_render = Some(self.renders.len() - 1);
        trial.accept_flat_render();
        log::debug!("session: flat render {} for {}", self.renders.len() - 1, trial.id());
    }

    fn refresh_trial_column(&mut self) {
        let name = self.active_trial().map(|id| id.name()).unwrap_or_default();
        self.set_custom_value(TRIAL_TITLE, name);
    }

    fn manifest(&self, finished_at: Option<DateTime<Utc>>, renders: Vec<String>) -> SessionManifest {
        SessionManifest {
            schema_version: SCHEMA_VERSION,
            session_id: self.id.to_string(),
            username: self.config.username.clone(),
            input_mode: self.config.input_mode,
            viewport: self.config.viewport,
            started_at: self.started_at,
            finished_at,
            trial_order: self.sequence.order().to_vec(),
            trials_completed: self.trials_completed.clone(),
            renders,
            log_file: LOG_FILE.to_string(),
            calibration: self.calibration,
        }
    }

    /// Closes the log, exports every flat render and writes the manifest.
    /// Only the first call does anything. A failed log close is reported
    /// after the renders and manifest are written.
    pub fn finish(&mut self) -> Result<(), SessionError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.trial = None;
        let closed = self.logger.close();
        if let Err(e) = &closed {
            log::error!("finish_session: closing log failed: {}", e);
        }

        let mut names = Vec::with_capacity(self.renders.len());
        for (i, buffer) in self.renders.iter().enumerate() {
            let name = format!("srender{i}.png");
            let path = self.dir.join(&name);
            buffer
                .save_png(&path)
                .map_err(|source| SessionError::Export { path, source })?;
            names.push(name);
        }
        self.manifest(Some(Utc::now()), names).save(&self.dir)?;
        log::info!(
            "finish_session: dir={} renders={} completed={}",
            self.dir.display(),
            self.renders.len(),
            self.trials_completed.len()
        );
        closed?;
        Ok(())
    }
}
