/// Chronokinetic abilities the player can learn.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SkillKind {
    Rewind,
    Freeze,
    Push,
    DiagonalBurst,
    Teleport,
}

#[derive(Clone, Debug)]
pub struct SkillSpec {
    pub kind: SkillKind,
    pub name: &'static str,
    pub key: char,
    pub cost: i32,
    pub damage: i32,
    /// Player level at which the skill is learned.
    pub level: u32,
    pub description: &'static str,
}

pub const SKILLS: [SkillSpec; 5] = [
    SkillSpec {
        kind: SkillKind::Rewind,
        name: "Rewind",
        key: 'r',
        cost: 2,
        damage: 0,
        level: 1,
        description: "Step back along your own timeline.",
    },
    SkillSpec {
        kind: SkillKind::Freeze,
        name: "Freeze",
        key: 'f',
        cost: 1,
        damage: 0,
        level: 2,
        description: "Lock an adjacent foe in a moment.",
    },
    SkillSpec {
        kind: SkillKind::Push,
        name: "Push",
        key: 'p',
        cost: 2,
        damage: 1,
        level: 3,
        description: "Hurl the first foe in a line further away.",
    },
    SkillSpec {
        kind: SkillKind::DiagonalBurst,
        name: "Diagonal Burst",
        key: 'x',
        cost: 3,
        damage: 2,
        level: 4,
        description: "Shatter time at your four corners.",
    },
    SkillSpec {
        kind: SkillKind::Teleport,
        name: "Teleport",
        key: 't',
        cost: 3,
        damage: 0,
        level: 5,
        description: "Skip ahead along a line.",
    },
];

/// Total xp needed to reach level `index + 1`.
pub const LEVEL_THRESHOLDS: [i32; 5] = [0, 4, 10, 18, 28];

impl SkillKind {
    pub fn spec(self) -> &'static SkillSpec {
        SKILLS
            .iter()
            .find(|spec| spec.kind == self)
            .unwrap_or(&SKILLS[0])
    }

    /// Whether the skill needs a direction from the player.
    pub fn is_directed(self) -> bool {
        matches!(
            self,
            SkillKind::Freeze | SkillKind::Push | SkillKind::Teleport
        )
    }

    pub fn from_key(key: char) -> Option<Self> {
        SKILLS
            .iter()
            .find(|spec| spec.key == key)
            .map(|spec| spec.kind)
    }
}

pub fn level_for_xp(xp: i32) -> u32 {
    LEVEL_THRESHOLDS
        .iter()
        .filter(|threshold| xp >= **threshold)
        .count()
        .max(1) as u32
}

pub fn skills_for_level(level: u32) -> impl Iterator<Item = SkillKind> {
    SKILLS
        .iter()
        .filter(move |spec| spec.level <= level)
        .map(|spec| spec.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(3, 1)]
    #[case(4, 2)]
    #[case(17, 3)]
    #[case(28, 5)]
    #[case(500, 5)]
    fn levels_follow_thresholds(#[case] xp: i32, #[case] level: u32) {
        assert_eq!(level_for_xp(xp), level);
    }

    #[test]
    fn first_level_knows_only_rewind() {
        let known: Vec<_> = skills_for_level(1).collect();
        assert_eq!(known, vec![SkillKind::Rewind]);
    }

    #[test]
    fn keys_round_trip() {
        for spec in &SKILLS {
            assert_eq!(SkillKind::from_key(spec.key), Some(spec.kind));
        }
    }
}
