use bracket_random::prelude::RandomNumberGenerator;
use specs::prelude::{Entity, WorldExt};

use super::{EcsWorld, components::Melee, resources::Rules, turn::capitalize};

impl EcsWorld {
    fn d6(&mut self) -> i32 {
        self.specs_world
            .write_resource::<RandomNumberGenerator>()
            .roll_dice(1, 6)
    }

    /// Melee bump. On a hit the damage is queued on the defender and
    /// lands on its next turn; the message previews the result.
    pub fn bump(&mut self, attacker: Entity, defender: Entity) -> bool {
        let threshold = self.specs_world.read_resource::<Rules>().hit_threshold;
        let damage = self
            .specs_world
            .read_component::<Melee>()
            .get(attacker)
            .map_or(1, |melee| melee.bump_damage);
        let roll = self.d6();
        let attacker_name = capitalize(&self.name_of(attacker));
        let defender_name = self.name_of(defender);

        if roll <= threshold {
            let es = if attacker == self.player { "" } else { "es" };
            self.log(format!("{attacker_name} miss{es} {defender_name}."));
            return false;
        }

        self.add_pending_hp(defender, -damage, Some(attacker));
        let preview = self.vitals(defender).map_or(0, |v| v.hp) + self.pending(defender).hp;
        self.log(format!(
            "{attacker_name} hit{} {defender_name} ({} hp left).",
            if attacker == self.player { "" } else { "s" },
            preview.max(0)
        ));
        true
    }

    /// A drainer spends `cost` of its own time to sap the player's. The
    /// player resists on a high enough roll; otherwise the loss is
    /// immediate.
    pub fn sap_player(&mut self, drainer: Entity, cost: i32) -> bool {
        self.add_pending_tp(drainer, -cost);
        let (resist, amount) = {
            let rules = self.specs_world.read_resource::<Rules>();
            (rules.resist_threshold, rules.drain_amount)
        };
        let name = self.name_of(drainer);
        if self.d6() > resist {
            self.log(format!("You resist {name}'s pull on your time."));
            return false;
        }

        let player = self.player;
        self.add_pending_tp(player, -amount);
        if self.update_tp(player) {
            self.log(format!("{} drained your time!", capitalize(&name)));
            true
        } else {
            self.log(format!("{} finds no time left to take.", capitalize(&name)));
            false
        }
    }
}
