use crate::config::StaminaConfig;

/// Shared energy the climb spends, owned by the avatar's vital-stat model.
///
/// The controller only drains, regenerates and reads it; how the maximum is
/// derived (health, hunger, cold) is the owner's business.
pub trait StaminaResource {
    fn energy(&self) -> f32;
    fn max_energy(&self) -> f32;
    fn is_exhausted(&self) -> bool;
    fn set_exhausted(&mut self, exhausted: bool);
    /// Remove up to `amount`, returning what was actually removed.
    fn drain(&mut self, amount: f32) -> f32;
    /// Add up to `amount` without exceeding the maximum.
    fn regen(&mut self, amount: f32);
}

/// Plain energy pool, enough for avatars without a vital-stat model.
#[derive(Clone, Debug, PartialEq)]
pub struct EnergyPool {
    pub energy: f32,
    pub max_energy: f32,
    pub exhausted: bool,
}

impl EnergyPool {
    pub fn full(max_energy: f32) -> Self {
        let max_energy = max_energy.max(0.0);
        Self {
            energy: max_energy,
            max_energy,
            exhausted: false,
        }
    }

    /// Lower or raise the ceiling, clamping the current energy to it.
    pub fn set_max_energy(&mut self, max_energy: f32) {
        self.max_energy = max_energy.max(0.0);
        self.energy = self.energy.min(self.max_energy);
    }
}

impl Default for EnergyPool {
    fn default() -> Self {
        Self::full(100.0)
    }
}

impl StaminaResource for EnergyPool {
    fn energy(&self) -> f32 {
        self.energy
    }

    fn max_energy(&self) -> f32 {
        self.max_energy
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn set_exhausted(&mut self, exhausted: bool) {
        self.exhausted = exhausted;
    }

    fn drain(&mut self, amount: f32) -> f32 {
        let taken = amount.max(0.0).min(self.energy);
        self.energy -= taken;
        taken
    }

    fn regen(&mut self, amount: f32) {
        self.energy = (self.energy + amount.max(0.0)).min(self.max_energy);
    }
}

/// What the gate did this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StaminaOutcome {
    /// Gripping: `drained` energy was spent.
    Draining { drained: f32 },
    /// This tick's drain emptied the pool.
    Exhausted { drained: f32 },
    /// Not gripping: energy came back (possibly zero if gated on ground).
    Regenerating,
    /// Energy crossed the recovery threshold; grabbing is allowed again.
    Recovered,
}

impl StaminaOutcome {
    pub fn drained(&self) -> f32 {
        match *self {
            StaminaOutcome::Draining { drained } | StaminaOutcome::Exhausted { drained } => drained,
            StaminaOutcome::Regenerating | StaminaOutcome::Recovered => 0.0,
        }
    }
}

/// Drains while gripping, regenerates otherwise, with hysteresis on the
/// exhausted flag.
#[derive(Clone, Debug)]
pub struct StaminaGate {
    config: StaminaConfig,
}

impl StaminaGate {
    pub fn new(config: StaminaConfig) -> Self {
        Self { config }
    }

    /// Threshold energy must reach before exhaustion clears. Always above
    /// zero and never above the pool's current ceiling.
    pub fn recover_threshold(&self, stamina: &dyn StaminaResource) -> f32 {
        self.config
            .recover_threshold
            .min(stamina.max_energy())
            .max(f32::EPSILON)
    }

    pub fn tick(
        &self,
        stamina: &mut dyn StaminaResource,
        gripping: bool,
        grounded: bool,
        dt: f32,
    ) -> StaminaOutcome {
        if gripping {
            let drained = stamina.drain(self.config.drain_per_second * dt);
            if stamina.energy() <= 0.0 && !stamina.is_exhausted() {
                stamina.set_exhausted(true);
                log::debug!("Stamina exhausted");
                return StaminaOutcome::Exhausted { drained };
            }
            return StaminaOutcome::Draining { drained };
        }

        if !self.config.regen_requires_grounded || grounded {
            stamina.regen(self.config.regen_per_second * dt);
        }

        if stamina.is_exhausted() && stamina.energy() >= self.recover_threshold(stamina) {
            stamina.set_exhausted(false);
            log::debug!("Stamina recovered at {:.1}", stamina.energy());
            return StaminaOutcome::Recovered;
        }
        StaminaOutcome::Regenerating
    }
}
