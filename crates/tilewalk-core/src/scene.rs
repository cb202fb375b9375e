//! Scene lifecycle callbacks driven by an explicit scheduler

use anyhow::Result;

/// Callbacks a scene implements; every hook defaults to doing nothing
pub trait SceneLifecycle {
    fn on_preload(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_create(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_update(&mut self, _delta_ms: f32) {}

    fn on_pause(&mut self) {}

    fn on_resume(&mut self) {}

    fn on_shutdown(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Idle,
    Preloaded,
    Running,
    Paused,
    Shutdown,
}

/// Owns a scene and only invokes callbacks on valid transitions
pub struct SceneScheduler<S: SceneLifecycle> {
    scene: S,
    state: SceneState,
}

impl<S: SceneLifecycle> SceneScheduler<S> {
    pub fn new(scene: S) -> Self {
        Self {
            scene,
            state: SceneState::Idle,
        }
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// Preload then create; a failing hook leaves the scene where it stopped
    pub fn start(&mut self) -> Result<()> {
        if self.state == SceneState::Idle {
            self.scene.on_preload()?;
            self.state = SceneState::Preloaded;
        }
        if self.state == SceneState::Preloaded {
            self.scene.on_create()?;
            self.state = SceneState::Running;
            log::debug!("Scene running");
        }
        Ok(())
    }

    pub fn update(&mut self, delta_ms: f32) {
        if self.state == SceneState::Running {
            self.scene.on_update(delta_ms);
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.state != SceneState::Running {
            return false;
        }
        self.scene.on_pause();
        self.state = SceneState::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != SceneState::Paused {
            return false;
        }
        self.scene.on_resume();
        self.state = SceneState::Running;
        true
    }

    pub fn shutdown(&mut self) {
        if self.state == SceneState::Shutdown {
            return;
        }
        self.scene.on_shutdown();
        self.state = SceneState::Shutdown;
        log::debug!("Scene shut down");
    }

    pub fn into_scene(self) -> S {
        self.scene
    }
}
