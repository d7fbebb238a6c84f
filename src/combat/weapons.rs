//! Player firearms: clip, ammo and fire rate bookkeeping.

use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::components::ProjectileSpec;
use crate::core::WeaponKind;

/// Weapon tuning, read from the encounter config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponStats {
    pub kind: WeaponKind,
    /// Minimum time between shots.
    pub fire_rate_ms: u64,
    pub clip_size: u32,
    /// Total rounds, clip included. `None` is unlimited.
    pub starting_ammo: Option<u32>,
    pub damage: f32,
    pub projectile_speed: f32,
    pub projectile_max_travel: f32,
}

impl WeaponStats {
    pub fn pistol() -> Self {
        Self {
            kind: WeaponKind::Pistol,
            fire_rate_ms: 600,
            clip_size: 8,
            starting_ammo: None,
            damage: 25.0,
            projectile_speed: 150.0,
            projectile_max_travel: 350.0,
        }
    }

    pub fn auto_rifle() -> Self {
        Self {
            kind: WeaponKind::AutoRifle,
            fire_rate_ms: 100,
            clip_size: 30,
            starting_ammo: Some(120),
            damage: 10.0,
            projectile_speed: 500.0,
            projectile_max_travel: 350.0,
        }
    }

    pub fn projectile(&self) -> ProjectileSpec {
        ProjectileSpec {
            damage: self.damage,
            speed: self.projectile_speed,
            max_travel: self.projectile_max_travel,
        }
    }
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self::auto_rifle()
    }
}

/// Result of pulling the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireResult {
    /// A round left the barrel.
    Fired,
    /// The clip is empty.
    Empty,
    /// Still inside the fire rate window.
    Cooling,
}

/// One carried firearm.
#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    stats: WeaponStats,
    clip: u32,
    ammo: Option<u32>,
    last_fire: Option<Duration>,
}

impl Weapon {
    /// A weapon with a full clip.
    pub fn new(stats: WeaponStats) -> Self {
        let clip = match stats.starting_ammo {
            Some(ammo) => ammo.min(stats.clip_size),
            None => stats.clip_size,
        };
        Self {
            clip,
            ammo: stats.starting_ammo,
            last_fire: None,
            stats,
        }
    }

    pub fn kind(&self) -> WeaponKind {
        self.stats.kind
    }

    pub fn stats(&self) -> &WeaponStats {
        &self.stats
    }

    pub fn clip(&self) -> u32 {
        self.clip
    }

    pub fn ammo(&self) -> Option<u32> {
        self.ammo
    }

    /// Try to fire at elapsed time `now`.
    ///
    /// An empty pull still starts the fire rate window, so the no-ammo click
    /// repeats at the weapon's rate rather than every frame.
    pub fn try_fire(&mut self, now: Duration) -> FireResult {
        let rate = Duration::from_millis(self.stats.fire_rate_ms);
        if let Some(last) = self.last_fire {
            if now.saturating_sub(last) < rate {
                return FireResult::Cooling;
            }
        }
        self.last_fire = Some(now);

        if self.clip == 0 {
            return FireResult::Empty;
        }
        self.clip -= 1;
        if let Some(ammo) = self.ammo.as_mut() {
            *ammo = ammo.saturating_sub(1);
        }
        FireResult::Fired
    }

    /// Top the clip up from the rounds not already in it.
    pub fn reload(&mut self) {
        let size = self.stats.clip_size;
        match self.ammo {
            None => self.clip = size,
            Some(ammo) => {
                let reserve = ammo.saturating_sub(self.clip);
                self.clip += reserve.min(size.saturating_sub(self.clip));
            }
        }
    }

    /// No effect on unlimited weapons.
    pub fn add_ammo(&mut self, rounds: u32) {
        if let Some(ammo) = self.ammo.as_mut() {
            *ammo = ammo.saturating_add(rounds);
        }
    }
}

/// Both guns the player carries and which one is drawn.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Loadout {
    pistol: Weapon,
    auto_rifle: Weapon,
    active: WeaponKind,
}

impl Loadout {
    /// Starts with the rifle drawn.
    pub fn new(pistol: WeaponStats, auto_rifle: WeaponStats) -> Self {
        Self {
            pistol: Weapon::new(pistol),
            auto_rifle: Weapon::new(auto_rifle),
            active: WeaponKind::default(),
        }
    }

    pub fn active_kind(&self) -> WeaponKind {
        self.active
    }

    pub fn active(&self) -> &Weapon {
        match self.active {
            WeaponKind::Pistol => &self.pistol,
            WeaponKind::AutoRifle => &self.auto_rifle,
        }
    }

    pub fn active_mut(&mut self) -> &mut Weapon {
        match self.active {
            WeaponKind::Pistol => &mut self.pistol,
            WeaponKind::AutoRifle => &mut self.auto_rifle,
        }
    }

    /// Draw `kind`. Returns false if it was already drawn.
    pub fn select(&mut self, kind: WeaponKind) -> bool {
        if self.active == kind {
            return false;
        }
        self.active = kind;
        true
    }

    /// Draw the other gun.
    pub fn swap(&mut self) -> WeaponKind {
        let other = match self.active {
            WeaponKind::Pistol => WeaponKind::AutoRifle,
            WeaponKind::AutoRifle => WeaponKind::Pistol,
        };
        self.active = other;
        other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn fire_rate_gates_shots() {
        let mut pistol = Weapon::new(WeaponStats::pistol());
        assert_eq!(pistol.try_fire(ms(1000)), FireResult::Fired);
        assert_eq!(pistol.try_fire(ms(1599)), FireResult::Cooling);
        assert_eq!(pistol.try_fire(ms(1600)), FireResult::Fired);
        assert_eq!(pistol.clip(), 6);
        assert_eq!(pistol.ammo(), None);
    }

    #[test]
    fn empty_clip_clicks_and_reload_refills() {
        let mut pistol = Weapon::new(WeaponStats::pistol());
        for i in 0..8 {
            assert_eq!(pistol.try_fire(ms(i * 600)), FireResult::Fired);
        }
        assert_eq!(pistol.try_fire(ms(8 * 600)), FireResult::Empty);
        assert_eq!(pistol.try_fire(ms(8 * 600 + 10)), FireResult::Cooling);

        pistol.reload();
        assert_eq!(pistol.clip(), 8);
    }

    #[test]
    fn rifle_reload_draws_from_reserve() {
        let mut stats = WeaponStats::auto_rifle();
        stats.starting_ammo = Some(35);
        let mut rifle = Weapon::new(stats);
        assert_eq!(rifle.clip(), 30);

        for i in 0..10 {
            rifle.try_fire(ms(i * 100));
        }
        assert_eq!((rifle.clip(), rifle.ammo()), (20, Some(25)));

        // Only 5 rounds outside the clip.
        rifle.reload();
        assert_eq!(rifle.clip(), 25);

        rifle.add_ammo(30);
        rifle.reload();
        assert_eq!((rifle.clip(), rifle.ammo()), (30, Some(55)));
    }

    #[test]
    fn loadout_swaps_between_guns() {
        let mut loadout = Loadout::new(WeaponStats::pistol(), WeaponStats::auto_rifle());
        assert_eq!(loadout.active_kind(), WeaponKind::AutoRifle);
        assert!(!loadout.select(WeaponKind::AutoRifle));

        assert_eq!(loadout.swap(), WeaponKind::Pistol);
        assert_eq!(loadout.active().clip(), 8);
        assert!(loadout.select(WeaponKind::AutoRifle));
        assert_eq!(loadout.active().ammo(), Some(120));
    }
}
