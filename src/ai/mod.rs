use bracket_geometry::prelude::{DistanceAlg, Point, line2d_bresenham};
use bracket_random::prelude::RandomNumberGenerator;

use crate::{
    ecs::components::Brain,
    map::{Floor, NEIGHBOURS},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnemyMode {
    Wander,
    Attack,
}

/// How a species chooses its action. Every variant is resolved by
/// [`decide`]; there is no per-species code elsewhere.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Behavior {
    Hunter,
    /// Never leaves its post unless the player comes within reach.
    Sentinel,
    /// Saps the player's time points on every `rate`-th turn in sight.
    Drainer { rate: u32, cost: i32 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Wait,
    Bump,
    Step(Point),
    /// Spend `cost` of its own tp to sap the player's.
    Drain { cost: i32 },
}

/// What an enemy knows about the player when it decides.
#[derive(Clone, Debug)]
pub struct BehaviorContext {
    pub player: Point,
    /// Line of sight between the player and this enemy.
    pub spotted: bool,
}

impl BehaviorContext {
    pub const fn new(player: Point, spotted: bool) -> Self {
        Self { player, spotted }
    }
}

pub fn chebyshev(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

pub fn decide(
    brain: &mut Brain,
    me: Point,
    own_tp: i32,
    ctx: &BehaviorContext,
    floor: &Floor,
    rng: &mut RandomNumberGenerator,
) -> Decision {
    let distance = chebyshev(me, ctx.player);
    let in_sight = ctx.spotted && distance <= brain.sight;
    let mode = if in_sight && distance <= brain.reach {
        EnemyMode::Attack
    } else {
        EnemyMode::Wander
    };
    if mode != brain.mode {
        log::debug!("enemy at {},{} switches to {mode:?}", me.x, me.y);
        brain.mode = mode;
    }

    match brain.behavior {
        Behavior::Drainer { rate, cost } if in_sight => {
            brain.cadence += 1;
            if rate > 0 && brain.cadence % rate == 0 && own_tp >= cost {
                return Decision::Drain { cost };
            }
            hunt(mode, me, ctx.player, floor, rng)
        }
        Behavior::Hunter | Behavior::Drainer { .. } => hunt(mode, me, ctx.player, floor, rng),
        Behavior::Sentinel => match mode {
            EnemyMode::Attack => attack(me, ctx.player, floor),
            EnemyMode::Wander => Decision::Wait,
        },
    }
}

fn hunt(
    mode: EnemyMode,
    me: Point,
    player: Point,
    floor: &Floor,
    rng: &mut RandomNumberGenerator,
) -> Decision {
    match mode {
        EnemyMode::Attack => attack(me, player, floor),
        EnemyMode::Wander => wander(me, floor, rng),
    }
}

fn attack(me: Point, player: Point, floor: &Floor) -> Decision {
    if chebyshev(me, player) <= 1 {
        return Decision::Bump;
    }
    step_towards(me, player, floor).map_or(Decision::Wait, Decision::Step)
}

fn step_towards(from: Point, to: Point, floor: &Floor) -> Option<Point> {
    let direct = line2d_bresenham(from, to)
        .into_iter()
        .find(|point| *point != from);
    if let Some(next) = direct {
        if floor.is_open(next) {
            return Some(next - from);
        }
    }

    NEIGHBOURS
        .iter()
        .map(|step| from + *step)
        .filter(|point| floor.is_open(*point))
        .min_by(|a, b| {
            let da = DistanceAlg::Pythagoras.distance2d(*a, to);
            let db = DistanceAlg::Pythagoras.distance2d(*b, to);
            da.total_cmp(&db)
        })
        .map(|point| point - from)
}

fn wander(me: Point, floor: &Floor, rng: &mut RandomNumberGenerator) -> Decision {
    let open: Vec<Point> = NEIGHBOURS
        .iter()
        .copied()
        .filter(|step| floor.is_open(me + *step))
        .collect();
    if open.is_empty() {
        return Decision::Wait;
    }
    Decision::Step(open[rng.range(0, open.len() as i32) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{FloorId, Terrain};

    fn brain(behavior: Behavior) -> Brain {
        Brain {
            mode: EnemyMode::Wander,
            behavior,
            sight: 6,
            reach: 4,
            cadence: 0,
        }
    }

    fn room() -> Floor {
        Floor::open_room(FloorId(0), 12, 12)
    }

    #[test]
    fn adjacent_player_is_bumped() {
        let mut b = brain(Behavior::Hunter);
        let mut rng = RandomNumberGenerator::seeded(1);
        let ctx = BehaviorContext::new(Point::new(5, 5), true);
        let decision = decide(&mut b, Point::new(6, 6), 0, &ctx, &room(), &mut rng);
        assert_eq!(decision, Decision::Bump);
        assert_eq!(b.mode, EnemyMode::Attack);
    }

    #[test]
    fn engaged_enemy_closes_distance() {
        let mut b = brain(Behavior::Hunter);
        let mut rng = RandomNumberGenerator::seeded(1);
        let ctx = BehaviorContext::new(Point::new(2, 5), true);
        let decision = decide(&mut b, Point::new(5, 5), 0, &ctx, &room(), &mut rng);
        assert_eq!(decision, Decision::Step(Point::new(-1, 0)));
    }

    #[test]
    fn blocked_line_falls_back_to_open_neighbour() {
        let mut floor = room();
        floor.set_terrain(Point::new(4, 5), Terrain::Wall);
        let mut b = brain(Behavior::Hunter);
        let mut rng = RandomNumberGenerator::seeded(1);
        let ctx = BehaviorContext::new(Point::new(2, 5), true);
        match decide(&mut b, Point::new(5, 5), 0, &ctx, &floor, &mut rng) {
            Decision::Step(step) => {
                assert_eq!(step.x, -1);
                assert_ne!(step.y, 0);
            }
            other => panic!("expected a detour, got {other:?}"),
        }
    }

    #[test]
    fn unseen_player_leaves_enemy_wandering() {
        let mut b = brain(Behavior::Hunter);
        b.mode = EnemyMode::Attack;
        let mut rng = RandomNumberGenerator::seeded(9);
        let ctx = BehaviorContext::new(Point::new(5, 6), false);
        let decision = decide(&mut b, Point::new(5, 5), 0, &ctx, &room(), &mut rng);
        assert_eq!(b.mode, EnemyMode::Wander);
        assert!(matches!(decision, Decision::Step(_)));
    }

    #[test]
    fn boxed_in_wanderer_waits() {
        let mut floor = room();
        for step in NEIGHBOURS {
            floor.set_terrain(Point::new(5, 5) + step, Terrain::Wall);
        }
        let mut b = brain(Behavior::Hunter);
        let mut rng = RandomNumberGenerator::seeded(2);
        let ctx = BehaviorContext::new(Point::new(1, 1), false);
        let decision = decide(&mut b, Point::new(5, 5), 0, &ctx, &floor, &mut rng);
        assert_eq!(decision, Decision::Wait);
    }

    #[test]
    fn sentinel_holds_position_out_of_reach() {
        let mut b = brain(Behavior::Sentinel);
        let mut rng = RandomNumberGenerator::seeded(4);
        let ctx = BehaviorContext::new(Point::new(1, 1), false);
        let decision = decide(&mut b, Point::new(8, 8), 0, &ctx, &room(), &mut rng);
        assert_eq!(decision, Decision::Wait);
    }

    #[test]
    fn drainer_drains_on_cadence() {
        let mut b = brain(Behavior::Drainer { rate: 4, cost: 1 });
        b.reach = 0;
        let mut rng = RandomNumberGenerator::seeded(4);
        let ctx = BehaviorContext::new(Point::new(2, 2), true);
        let decisions: Vec<Decision> = (0..4)
            .map(|_| decide(&mut b, Point::new(6, 6), 2, &ctx, &room(), &mut rng))
            .collect();
        assert_eq!(decisions[3], Decision::Drain { cost: 1 });
        assert!(
            decisions[..3]
                .iter()
                .all(|d| !matches!(d, Decision::Drain { .. }))
        );
    }

    #[test]
    fn exhausted_drainer_cannot_drain() {
        let mut b = brain(Behavior::Drainer { rate: 1, cost: 1 });
        let mut rng = RandomNumberGenerator::seeded(4);
        let ctx = BehaviorContext::new(Point::new(2, 2), true);
        let decision = decide(&mut b, Point::new(6, 6), 0, &ctx, &room(), &mut rng);
        assert!(!matches!(decision, Decision::Drain { .. }));
    }
}
