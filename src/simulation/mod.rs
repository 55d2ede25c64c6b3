pub mod config;
pub mod clock;
pub mod memory;

pub use config::SimConfig;
pub use memory::Memory;

use crate::agent::{Agent, Arena, Point};
use crate::behavior::BehaviorRegistry;
use crate::color;
use crate::event::{Event, EventSource, Interaction, NoInput};
use crate::metrics::analyzer::{self, AnalysisReport};
use crate::metrics::logger::{self, MetricsLogger};
use crate::metrics::{self, MetricsCollector};
use crate::render::{FrameRenderer, Renderer, Scene};
use anyhow::{Context, Result, anyhow};
use clock::FrameClock;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_8, PI, TAU};
use std::io::Write;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Hook called once per loop iteration; lets outside software read and steer agents.
pub trait Bridge: Send {
    fn exchange(&mut self, t: u64, agents: &mut [Agent]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// All timesteps simulated.
    Completed,
    /// Stopped by a quit event or a shutdown request.
    Quit,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: Outcome,
    pub steps: u64,
    pub frames: u64,
    pub elapsed: Duration,
    pub analysis: AnalysisReport,
}

pub struct Simulation {
    config: SimConfig,
    arena: Arena,
    t: u64,
    frame: u64,
    framerate: u32,
    is_paused: bool,
    change_agent_colors: bool,
    agents: Vec<Agent>,
    memory: Memory,
    rng: StdRng,
    pub metrics: MetricsCollector,
    renderer: Option<Box<dyn Renderer>>,
    events: Box<dyn EventSource>,
    bridge: Option<Box<dyn Bridge>>,
    shutdown: CancellationToken,
    console: Box<dyn Write + Send>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let arena = Arena::new(config.width, config.height, config.window_pad);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let renderer: Option<Box<dyn Renderer>> = if config.with_visualization {
            let frame_dir = config.output_dir.join(format!("{}_frames", config.name));
            Some(Box::new(
                FrameRenderer::new(arena).with_frame_dump(frame_dir, config.frame_every)?,
            ))
        } else {
            None
        };

        let mut sim = Self {
            arena,
            t: 0,
            frame: 0,
            framerate: config.framerate,
            is_paused: false,
            change_agent_colors: false,
            agents: Vec::with_capacity(config.num_agents as usize),
            memory: Memory::new(config.memory_length),
            rng,
            metrics: MetricsCollector::new(),
            renderer,
            events: Box::new(NoInput),
            bridge: None,
            shutdown: CancellationToken::new(),
            console: Box::new(std::io::stdout()),
            config,
        };
        sim.create_agents()?;
        Ok(sim)
    }

    pub fn with_events(mut self, events: impl EventSource + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    pub fn with_bridge(mut self, bridge: impl Bridge + 'static) -> Self {
        self.bridge = Some(Box::new(bridge));
        self
    }

    /// Cancelling the token ends the run like a quit event.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Where lifecycle messages go; stdout by default.
    pub fn with_console(mut self, console: impl Write + Send + 'static) -> Self {
        self.console = Box::new(console);
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn t(&self) -> u64 {
        self.t
    }

    pub fn framerate(&self) -> u32 {
        self.framerate
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn frames_drawn(&self) -> u64 {
        self.renderer.as_ref().map(|r| r.frames_drawn()).unwrap_or(0)
    }

    fn create_agents(&mut self) -> Result<()> {
        let pad = self.config.window_pad as i64;
        let r = self.config.agent_radius as i64;
        let width = self.config.width as i64;
        let height = self.config.height as i64;

        for i in 0..self.config.num_agents {
            // agents may overlap the arena border by up to one radius
            let x = self.rng.gen_range(pad - r..width + pad - r);
            let y = self.rng.gen_range(pad - r..height + pad - r);
            let orientation = self.rng.gen_range(0.0..TAU);
            self.add_new_agent(i, x as f64, y as f64, orientation)?;
        }
        debug!("Created {} {} agents", self.agents.len(), self.config.agent_type);
        Ok(())
    }

    pub fn add_new_agent(&mut self, id: u32, x: f64, y: f64, orientation: f64) -> Result<()> {
        let behavior = BehaviorRegistry::global()
            .create(&self.config.agent_type)
            .ok_or_else(|| anyhow!("Unknown agent type: {}", self.config.agent_type))?;

        let agent = Agent::new(
            id,
            self.config.agent_radius as f64,
            Point::new(x, y),
            orientation,
            self.arena,
            color::BLUE,
            behavior,
        )
        .with_boundary(self.config.boundary);
        self.agents.push(agent);
        Ok(())
    }

    /// Inter-agent distance matrix.
    pub fn iid_matrix(&self) -> Vec<Vec<f64>> {
        metrics::iid_matrix(&self.agents)
    }

    /// For every agent, the other agents it currently overlaps with.
    /// Agents are told apart by index, so duplicate ids still collide.
    pub fn collision_groups(&self) -> Vec<(usize, Vec<usize>)> {
        self.agents
            .iter()
            .enumerate()
            .filter_map(|(i, a)| {
                let hits: Vec<usize> = self
                    .agents
                    .iter()
                    .enumerate()
                    .filter(|&(j, b)| i != j && a.overlaps(b))
                    .map(|(j, _)| j)
                    .collect();
                (!hits.is_empty()).then_some((i, hits))
            })
            .collect()
    }

    /// Turns every agent in `others` away from `agent` and kicks its speed.
    pub fn agent_agent_collision(&mut self, agent: usize, others: &[usize]) {
        let origin = self.agents[agent].position;
        for &j in others {
            let other = &mut self.agents[j];
            let dx = other.position.x - origin.x;
            let dy = other.position.y - origin.y;
            let theta = (dy.atan2(dx) + other.orientation).rem_euclid(TAU);

            if theta <= PI {
                other.orientation -= FRAC_PI_8;
            } else {
                other.orientation += FRAC_PI_8;
            }

            if other.velocity == other.v_max {
                other.velocity += 0.5;
            } else {
                other.velocity = other.v_max;
            }
        }
    }

    /// Advances every agent by one timestep, returns the number of colliding pairs.
    pub fn step(&mut self) -> usize {
        let collisions = self.move_agents();
        self.metrics.record_step(self.t, &self.agents, collisions);
        self.t += 1;
        collisions
    }

    /// Collisions and agent updates of one step, without metrics or advancing `t`.
    pub fn move_agents(&mut self) -> usize {
        let mut collisions = 0;
        if self.config.physical_collision_avoidance {
            let groups = self.collision_groups();
            collisions = groups.iter().map(|(_, hits)| hits.len()).sum::<usize>() / 2;
            for (i, hits) in &groups {
                self.agent_agent_collision(*i, hits);
            }
        }

        for agent in &mut self.agents {
            agent.update(&mut self.rng);
        }
        collisions
    }

    pub fn save_data(&mut self) {
        if self.config.save_agent_data {
            self.memory.record(&self.agents);
        }
    }

    /// External software bridge, called every loop iteration.
    pub fn bridge_io(&mut self) -> Result<()> {
        if let Some(bridge) = self.bridge.as_mut() {
            bridge
                .exchange(self.t, &mut self.agents)
                .context("bridge exchange failed")?;
        }
        Ok(())
    }

    pub fn interact_with_event(&mut self, events: &[Event]) -> Interaction {
        for event in events {
            match *event {
                Event::Quit => return Interaction::Quit,
                // one 0.1 rad turn per event however many notches it reports
                Event::MouseWheel { delta, x, y } => {
                    self.move_agents_with_cursor(Point::new(x, y), delta > 0, delta < 0);
                }
                Event::TogglePause => {
                    self.is_paused = !self.is_paused;
                    info!("{}", if self.is_paused { "Paused" } else { "Resumed" });
                }
                Event::SlowDown => {
                    self.framerate = self
                        .framerate
                        .saturating_sub(5)
                        .max(SimConfig::MIN_FRAMERATE);
                }
                Event::SpeedUp => {
                    self.framerate = self
                        .framerate
                        .saturating_add(5)
                        .min(SimConfig::MAX_FRAMERATE);
                }
                Event::ResetFramerate => {
                    self.framerate = self.config.framerate;
                }
                Event::ToggleColors => {
                    self.change_agent_colors = !self.change_agent_colors;
                    for agent in &mut self.agents {
                        agent.change_color_with_orientation = self.change_agent_colors;
                        if !self.change_agent_colors {
                            agent.color = agent.orig_color;
                        }
                        agent.draw_update();
                    }
                }
                Event::RotateLeft { x, y } => self.move_agents_with_cursor(Point::new(x, y), true, false),
                Event::RotateRight { x, y } => self.move_agents_with_cursor(Point::new(x, y), false, true),
                Event::Drag { x, y } => self.move_agents_with_cursor(Point::new(x, y), false, false),
                Event::Release => {
                    for agent in &mut self.agents {
                        agent.is_moved_with_cursor = false;
                        agent.draw_update();
                    }
                }
            }
        }
        Interaction::Continue
    }

    fn move_agents_with_cursor(&mut self, cursor: Point, rotate_left: bool, rotate_right: bool) {
        for agent in &mut self.agents {
            agent.move_with_cursor(cursor, rotate_left, rotate_right);
        }
    }

    pub fn status_line(&self) -> String {
        let mut status = format!("FPS: {}, t = {}/{}", self.framerate, self.t, self.config.duration);
        if self.is_paused {
            status.push_str(" -Paused-");
        }
        status
    }

    pub fn draw_frame(&mut self) {
        let status = self.status_line();
        let trails = (self.config.show_agent_trails && self.config.memory_length > 0)
            .then_some(&self.memory);

        if let Some(renderer) = self.renderer.as_mut() {
            let scene = Scene {
                arena: self.arena,
                agents: &self.agents,
                trails,
                status,
            };
            if let Err(e) = renderer.draw_frame(&scene) {
                warn!("Error while drawing frame {}: {:#}", self.frame, e);
            }
        }
    }

    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.console, "{}", line)?;
        self.console.flush()?;
        Ok(())
    }

    /// Runs the main loop until all timesteps are done or the user quits.
    pub async fn start(&mut self) -> Result<RunReport> {
        let start_time = Instant::now();
        self.say("Running simulation start method!")?;
        info!("Starting simulation: {}", self.config.name);
        info!(
            "Agents: {}, Timesteps: {}, Type: {}",
            self.config.num_agents, self.config.duration, self.config.agent_type
        );

        self.say("Starting main simulation loop!")?;

        let mut clock = self
            .config
            .with_visualization
            .then(|| FrameClock::new(self.framerate));

        let pb = if self.config.with_visualization {
            None
        } else {
            let pb = ProgressBar::new(self.config.duration);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} steps {msg}")?
                    .progress_chars("█▓░"),
            );
            Some(pb)
        };

        let outcome = loop {
            if self.t >= self.config.duration {
                break Outcome::Completed;
            }
            if self.shutdown.is_cancelled() {
                info!("Shutdown requested at t = {}", self.t);
                break Outcome::Quit;
            }

            self.bridge_io()?;

            let events = self.events.poll(self.frame);
            if self.interact_with_event(&events) == Interaction::Quit {
                break Outcome::Quit;
            }

            if !self.is_paused {
                self.step();
                if let Some(pb) = &pb {
                    pb.inc(1);
                    if let Some(snapshot) = self.metrics.latest() {
                        pb.set_message(format!("Polarization: {:.2}", snapshot.polarization));
                    }
                }
            }

            if self.config.memory_length > 0 {
                self.save_data();
            }

            if self.config.with_visualization {
                self.draw_frame();
            }
            self.frame += 1;

            match clock.as_mut() {
                Some(clock) => {
                    clock.set_framerate(self.framerate);
                    clock.tick().await;
                }
                None if self.is_paused => tokio::task::yield_now().await,
                None => {}
            }
        };

        if let Some(pb) = pb {
            pb.finish_with_message("Simulation complete");
        }

        let elapsed = start_time.elapsed();
        if outcome == Outcome::Completed {
            let line = format!(
                "{} Total simulation time:  {}",
                chrono::Local::now().format("%Y-%m-%d_%H-%M-%S%.6f"),
                elapsed.as_secs_f64()
            );
            self.say(&line)?;
        }
        self.say("Bye bye!")?;

        let analysis = analyzer::analyze(
            &self.metrics.get_snapshots(),
            &self.config.name,
            &self.config.agent_type,
            self.config.num_agents,
        );

        if self.config.save_results {
            self.save_results(&analysis)?;
        }

        Ok(RunReport {
            outcome,
            steps: self.t,
            frames: self.frame,
            elapsed,
            analysis,
        })
    }

    /// Runs `start` on a fresh single-threaded runtime, for callers outside async code.
    pub fn start_blocking(&mut self) -> Result<RunReport> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(self.start())
    }

    fn save_results(&self, analysis: &AnalysisReport) -> Result<()> {
        let snapshots = self.metrics.get_snapshots();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let dir = &self.config.output_dir;

        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;

        let csv_path = dir.join(format!("{}_{}.csv", self.config.name, timestamp));
        let mut metrics_logger = MetricsLogger::new(&csv_path)?;
        metrics_logger.log_batch(&snapshots)?;
        info!("Results saved to: {}", csv_path.display());

        let json_path = dir.join(format!("{}_{}_summary.json", self.config.name, timestamp));
        std::fs::write(&json_path, serde_json::to_string_pretty(analysis)?)?;
        info!("Summary saved to: {}", json_path.display());

        if !self.memory.is_empty() {
            let traj_path = dir.join(format!("{}_{}_trajectories.csv", self.config.name, timestamp));
            let rows = logger::write_trajectories(&self.memory, &traj_path)?;
            info!("{} trajectory samples saved to: {}", rows, traj_path.display());
        }

        info!("Avg polarization: {:.3}", analysis.avg_polarization);
        info!("Total collisions: {}", analysis.total_collisions);
        Ok(())
    }
}
