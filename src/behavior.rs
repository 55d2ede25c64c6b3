use rand::RngCore;
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;
use std::fmt;

/// Change rates an agent applies during one update: `dv` for speed, `dtheta` for heading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Steering {
    pub dv: f64,
    pub dtheta: f64,
}

pub trait Behavior: Send + Sync + fmt::Debug {
    fn steer(&mut self, velocity: f64, orientation: f64, rng: &mut dyn RngCore) -> Steering;
    fn name(&self) -> &str;
    fn clone_box(&self) -> Box<dyn Behavior>;
}

impl Clone for Box<dyn Behavior> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Keeps heading and speed; agents fly straight until a wall or another agent turns them.
#[derive(Debug, Clone, Default)]
pub struct Ballistic;

impl Behavior for Ballistic {
    fn steer(&mut self, _velocity: f64, _orientation: f64, _rng: &mut dyn RngCore) -> Steering {
        Steering::default()
    }

    fn name(&self) -> &str { "ballistic" }

    fn clone_box(&self) -> Box<dyn Behavior> {
        Box::new(self.clone())
    }
}

/// Rotational diffusion: heading rate drawn from a zero-mean normal every step.
#[derive(Debug, Clone)]
pub struct Brownian {
    noise: Normal<f64>,
}

impl Brownian {
    pub const DEFAULT_SIGMA: f64 = 2.0;

    pub fn new(sigma: f64) -> anyhow::Result<Self> {
        let noise = Normal::new(0.0, sigma)
            .map_err(|e| anyhow::anyhow!("invalid brownian noise {}: {}", sigma, e))?;
        Ok(Self { noise })
    }
}

impl Default for Brownian {
    fn default() -> Self {
        Self {
            noise: Normal::new(0.0, Self::DEFAULT_SIGMA).expect("constant sigma is finite and positive"),
        }
    }
}

impl Behavior for Brownian {
    fn steer(&mut self, _velocity: f64, _orientation: f64, rng: &mut dyn RngCore) -> Steering {
        Steering {
            dv: 0.0,
            dtheta: self.noise.sample(rng),
        }
    }

    fn name(&self) -> &str { "brownian" }

    fn clone_box(&self) -> Box<dyn Behavior> {
        Box::new(self.clone())
    }
}

pub struct BehaviorRegistry {
    behaviors: HashMap<String, Box<dyn Fn() -> Box<dyn Behavior> + Send + Sync>>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            behaviors: HashMap::new(),
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register("ballistic", || Box::new(Ballistic));
        self.register("base", || Box::new(Ballistic));
        self.register("brownian", || Box::new(Brownian::default()));
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Behavior> + Send + Sync + 'static,
    {
        self.behaviors.insert(name.to_lowercase(), Box::new(factory));
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Behavior>> {
        self.behaviors
            .get(&name.to_lowercase())
            .map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.behaviors.contains_key(&name.to_lowercase())
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.behaviors.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn global() -> &'static BehaviorRegistry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<BehaviorRegistry> = OnceLock::new();
        REGISTRY.get_or_init(BehaviorRegistry::new)
    }
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
