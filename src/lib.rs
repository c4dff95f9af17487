//! Convex-shape collision detection and impulse-based rigid body
//! response.
//!
//! # Architecture
//!
//! The simulation runs in a fixed timestep loop. Each fixed step:
//!
//! 1. Clear per-body collision flags and the contact-event list
//! 2. Enumerate shape pairs in a fixed order (player-vs-objects,
//!    object-vs-object, objects-vs-scene, player-vs-scene)
//! 3. Broadphase filtering (bounding spheres, plane distance)
//! 4. Narrowphase detection (GJK over the Minkowski difference)
//! 5. Contact geometry extraction (barycentric weights, per-shape
//!    normal/depth policy)
//! 6. Impulse response (normal + friction + penetration bias)
//! 7. Integrate dynamic bodies (semi-implicit Euler)
//! 8. Apply deferred structural commands

pub mod body;
pub mod broadphase;
pub mod contact;
pub mod error;
pub mod integrator;
pub mod math;
pub mod narrowphase;
pub mod solver;

use glam::Vec3;

// Re-export commonly used types
pub use body::{Body, ShapeKind};
pub use contact::Contact;
pub use error::PhysicsError;
pub use narrowphase::{Simplex, SupportPoint};

// Re-export glam for convenience
pub use glam;

/// Configuration for the physics simulation.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector. Default: (0, -9.81, 0).
    pub gravity: Vec3,
    /// Fixed timestep for physics updates in seconds. Default: 1/60.
    pub fixed_timestep: f64,
    /// Maximum number of sub-steps per frame. Default: 4.
    pub max_substeps: u32,
    /// Iteration cap for the GJK loop. Default: 64.
    pub gjk_max_iterations: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 4,
            gjk_max_iterations: 64,
        }
    }
}

/// Handle to a body stored in a [`PhysicsWorld`].
///
/// Handles are slot indices; slots are reused after removal, so a
/// handle kept across a removal may alias a newer body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(usize);

/// Which partition of the simulation a body belongs to.
///
/// Scene bodies are immovable by convention and are never paired
/// against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Player,
    Object,
    Scene,
}

/// Deferred structural change, applied after pair iteration completes.
enum Command {
    Spawn { body: Body, group: Group },
    Remove(BodyHandle),
}

/// The main physics world managing simulation state.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    accumulator: f64,
    bodies: Vec<Option<Body>>,
    player: Option<BodyHandle>,
    objects: Vec<BodyHandle>,
    scene: Vec<BodyHandle>,
    commands: Vec<Command>,
    events: Vec<(BodyHandle, BodyHandle)>,
}

impl PhysicsWorld {
    /// Create a new physics world with the given configuration.
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            accumulator: 0.0,
            bodies: Vec::new(),
            player: None,
            objects: Vec::new(),
            scene: Vec::new(),
            commands: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Add a body immediately. Spawning a second player body takes
    /// over the player role; the previous body stays in the world
    /// until removed.
    pub fn spawn(&mut self, body: Body, group: Group) -> BodyHandle {
        let handle = self.insert(body);
        match group {
            Group::Player => self.player = Some(handle),
            Group::Object => self.objects.push(handle),
            Group::Scene => self.scene.push(handle),
        }
        handle
    }

    /// Queue a spawn for the end of the next fixed step.
    pub fn queue_spawn(&mut self, body: Body, group: Group) {
        self.commands.push(Command::Spawn { body, group });
    }

    /// Queue a removal for the end of the next fixed step.
    pub fn queue_remove(&mut self, handle: BodyHandle) {
        self.commands.push(Command::Remove(handle));
    }

    /// Remove a body immediately. For removal in reaction to a contact,
    /// use [`queue_remove`](Self::queue_remove) instead.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body> {
        let body = self.bodies.get_mut(handle.0)?.take()?;
        if self.player == Some(handle) {
            self.player = None;
        }
        self.objects.retain(|&h| h != handle);
        self.scene.retain(|&h| h != handle);
        Some(body)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle.0)?.as_ref()
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle.0)?.as_mut()
    }

    /// Pairs that produced a contact during the most recent fixed step.
    pub fn contact_events(&self) -> &[(BodyHandle, BodyHandle)] {
        &self.events
    }

    /// Step the physics simulation forward by `delta_time` seconds.
    ///
    /// Uses a fixed timestep accumulator to ensure deterministic
    /// simulation.
    pub fn step(&mut self, delta_time: f64) -> Result<(), PhysicsError> {
        self.accumulator += delta_time;

        let mut substeps = 0u32;
        while self.accumulator >= self.config.fixed_timestep && substeps < self.config.max_substeps
        {
            self.fixed_step(self.config.fixed_timestep as f32)?;
            self.accumulator -= self.config.fixed_timestep;
            substeps += 1;
        }

        // Clamp accumulator to avoid spiral of death
        if self.accumulator > self.config.fixed_timestep * self.config.max_substeps as f64 {
            self.accumulator = 0.0;
        }

        Ok(())
    }

    fn fixed_step(&mut self, dt: f32) -> Result<(), PhysicsError> {
        // 1. Clear per-step collision state
        for body in self.bodies.iter_mut().flatten() {
            body.colliding = false;
        }
        self.events.clear();

        // 2-6. Detect and resolve contacts in fixed pair order
        for (handle_a, handle_b) in self.collision_pairs() {
            let Some((a, b)) = two_mut(&mut self.bodies, handle_a.0, handle_b.0) else {
                continue;
            };
            if !broadphase::maybe_colliding(a, b)? {
                continue;
            }
            let Some(found) = narrowphase::intersects(a, b, self.config.gjk_max_iterations)?
            else {
                continue;
            };
            solver::resolve(a, b, &found, dt);
            a.colliding = true;
            b.colliding = true;
            self.events.push((handle_a, handle_b));
        }
        tracing::trace!(contacts = self.events.len(), "fixed step resolved");

        // 7. Integrate player and object bodies
        let gravity = self.config.gravity;
        if let Some(player) = self.player {
            if let Some(body) = self.bodies.get_mut(player.0).and_then(Option::as_mut) {
                integrator::step(body, gravity, dt);
            }
        }
        for &handle in &self.objects {
            if let Some(body) = self.bodies.get_mut(handle.0).and_then(Option::as_mut) {
                integrator::step(body, gravity, dt);
            }
        }

        // 8. Apply deferred structural commands
        self.apply_commands();

        Ok(())
    }

    /// Pair enumeration order: player-vs-objects, object-vs-object,
    /// objects-vs-scene, player-vs-scene. Insertion order within each
    /// phase. The single-pass solver makes results order-dependent, so
    /// this order is part of the simulation's observable behavior.
    fn collision_pairs(&self) -> Vec<(BodyHandle, BodyHandle)> {
        let mut pairs = Vec::new();
        if let Some(player) = self.player {
            for &object in &self.objects {
                pairs.push((player, object));
            }
        }
        for (i, &object_a) in self.objects.iter().enumerate() {
            for &object_b in &self.objects[i + 1..] {
                pairs.push((object_a, object_b));
            }
        }
        for &object in &self.objects {
            for &scene in &self.scene {
                pairs.push((object, scene));
            }
        }
        if let Some(player) = self.player {
            for &scene in &self.scene {
                pairs.push((player, scene));
            }
        }
        pairs
    }

    fn insert(&mut self, body: Body) -> BodyHandle {
        if let Some(slot) = self.bodies.iter().position(Option::is_none) {
            self.bodies[slot] = Some(body);
            BodyHandle(slot)
        } else {
            self.bodies.push(Some(body));
            BodyHandle(self.bodies.len() - 1)
        }
    }

    fn apply_commands(&mut self) {
        let commands = std::mem::take(&mut self.commands);
        for command in commands {
            match command {
                Command::Spawn { body, group } => {
                    self.spawn(body, group);
                }
                Command::Remove(handle) => {
                    self.remove(handle);
                }
            }
        }
    }
}

/// Mutably borrow two distinct slots at once.
fn two_mut(bodies: &mut [Option<Body>], i: usize, j: usize) -> Option<(&mut Body, &mut Body)> {
    debug_assert_ne!(i, j);
    if i >= bodies.len() || j >= bodies.len() {
        return None;
    }
    if i < j {
        let (left, right) = bodies.split_at_mut(j);
        match (left[i].as_mut(), right[0].as_mut()) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    } else {
        let (left, right) = bodies.split_at_mut(i);
        match (right[0].as_mut(), left[j].as_mut()) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}
