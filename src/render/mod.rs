pub mod canvas;

pub use canvas::Canvas;

use crate::agent::{Agent, Arena, Point};
use crate::color;
use crate::simulation::memory::Memory;
use anyhow::{Context, Result};
use std::f64::consts::TAU;
use std::path::PathBuf;
use tracing::debug;

/// Everything needed to draw one frame.
pub struct Scene<'a> {
    pub arena: Arena,
    pub agents: &'a [Agent],
    pub trails: Option<&'a Memory>,
    pub status: String,
}

pub trait Renderer: Send {
    fn draw_frame(&mut self, scene: &Scene<'_>) -> Result<()>;
    fn frames_drawn(&self) -> u64;
}

/// Text shown next to a selected agent: its id and heading.
pub fn agent_stats(agent: &Agent) -> Vec<String> {
    vec![
        format!("ID: {}", agent.id),
        format!("ori.: {:.2}", agent.orientation),
    ]
}

/// Draws onto an in-memory canvas and optionally dumps every n-th frame as PNG.
pub struct FrameRenderer {
    canvas: Canvas,
    frame_dir: Option<PathBuf>,
    frame_every: u64,
    frames_drawn: u64,
}

impl FrameRenderer {
    const TRAIL_ALPHA: f64 = 0.5;
    const HEADING_LINE_WIDTH: u32 = 3;

    pub fn new(arena: Arena) -> Self {
        let width = (arena.width + 2.0 * arena.pad) as u32;
        let height = (arena.height + 2.0 * arena.pad) as u32;
        Self {
            canvas: Canvas::new(width, height, color::BACKGROUND),
            frame_dir: None,
            frame_every: 0,
            frames_drawn: 0,
        }
    }

    /// Save every `every`-th frame into `dir` (created if missing).
    pub fn with_frame_dump(mut self, dir: impl Into<PathBuf>, every: u64) -> Result<Self> {
        let dir = dir.into();
        if every > 0 {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating frame directory {}", dir.display()))?;
            self.frame_dir = Some(dir);
        }
        self.frame_every = every;
        Ok(self)
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    fn draw_walls(&mut self, arena: &Arena) {
        let (x0, x1) = arena.x_bounds();
        let (y0, y1) = arena.y_bounds();
        let corners = [
            (Point::new(x0, y0), Point::new(x0, y1)),
            (Point::new(x0, y0), Point::new(x1, y0)),
            (Point::new(x1, y0), Point::new(x1, y1)),
            (Point::new(x0, y1), Point::new(x1, y1)),
        ];
        for (from, to) in corners {
            self.canvas.draw_line(from, to, color::BLACK, 1);
        }
    }

    fn draw_agent_paths(&mut self, agents: &[Agent], memory: &Memory) {
        for (agent, history) in agents.iter().zip(memory.histories()) {
            let radius = (agent.radius / 3.0).floor().max(2.0);
            for sample in history.iter().skip(2).step_by(2) {
                let shade = color::jet(1.0 - sample.orientation / TAU);
                self.canvas
                    .fill_circle(sample.point(), radius, shade, Self::TRAIL_ALPHA);
            }
        }
    }

    fn draw_agent(&mut self, agent: &Agent) {
        let center = agent.center();
        self.canvas
            .fill_circle(center, agent.radius, agent.display_color(), 1.0);
        let tip = Point::new(
            center.x + agent.orientation.cos() * agent.radius,
            center.y - agent.orientation.sin() * agent.radius,
        );
        self.canvas
            .draw_line(center, tip, color::BACKGROUND, Self::HEADING_LINE_WIDTH);
    }
}

impl Renderer for FrameRenderer {
    fn draw_frame(&mut self, scene: &Scene<'_>) -> Result<()> {
        self.canvas.fill(color::BACKGROUND);
        self.draw_walls(&scene.arena);
        if let Some(memory) = scene.trails {
            self.draw_agent_paths(scene.agents, memory);
        }
        for agent in scene.agents {
            self.draw_agent(agent);
            if agent.is_moved_with_cursor || agent.show_stats {
                debug!("{}", agent_stats(agent).join(", "));
            }
        }
        debug!("{}", scene.status);

        if let Some(dir) = &self.frame_dir {
            if self.frame_every > 0 && self.frames_drawn % self.frame_every == 0 {
                let path = dir.join(format!("frame_{:06}.png", self.frames_drawn));
                self.canvas
                    .save(&path)
                    .with_context(|| format!("saving frame {}", path.display()))?;
            }
        }

        self.frames_drawn += 1;
        Ok(())
    }

    fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}
