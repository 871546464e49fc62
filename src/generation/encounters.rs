//! # Encounter Generation
//!
//! Creature templates and the weighted pick that turns them into entities.
//! Deeper templates only join the pool once their minimum depth is reached.

use crate::{
    Ai, Attributes, Component, DelveError, DelveResult, Entity, EntityKind, Fighter, GameRng,
    Leveler,
};

/// Data for one kind of creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatureTemplate {
    pub name: &'static str,
    pub glyph: char,
    pub color: &'static str,
    /// Base health before vitality
    pub health: i32,
    /// Base damage before power
    pub damage: i32,
    /// Experience granted per level when slain
    pub experience: u32,
    /// Relative weight in the spawn pick
    pub spawn_chance: u32,
    /// Shallowest floor the creature appears on
    pub min_depth: u32,
}

/// The standard bestiary.
pub const CREATURES: &[CreatureTemplate] = &[
    CreatureTemplate {
        name: "Rat",
        glyph: 'r',
        color: "brown",
        health: 6,
        damage: 2,
        experience: 3,
        spawn_chance: 40,
        min_depth: 0,
    },
    CreatureTemplate {
        name: "Goblin",
        glyph: 'g',
        color: "green",
        health: 10,
        damage: 4,
        experience: 5,
        spawn_chance: 30,
        min_depth: 0,
    },
    CreatureTemplate {
        name: "Skeleton",
        glyph: 's',
        color: "white",
        health: 14,
        damage: 5,
        experience: 6,
        spawn_chance: 20,
        min_depth: 1,
    },
    CreatureTemplate {
        name: "Orc",
        glyph: 'o',
        color: "dark_green",
        health: 20,
        damage: 7,
        experience: 8,
        spawn_chance: 15,
        min_depth: 2,
    },
    CreatureTemplate {
        name: "Troll",
        glyph: 'T',
        color: "olive",
        health: 35,
        damage: 10,
        experience: 12,
        spawn_chance: 5,
        min_depth: 4,
    },
];

impl CreatureTemplate {
    /// Creates a creature from this template.
    ///
    /// Creatures start with one point in every attribute plus the random
    /// starting points a leveler hands out, and wander until they notice the
    /// player.
    pub fn instantiate(&self, rng: &mut GameRng) -> Entity {
        let entity = Entity::new(rng, self.name, self.glyph, self.color, EntityKind::Creature);
        let leveler = Leveler::new(1, self.experience);
        let mut attributes = Attributes::uniform(1);
        attributes += leveler.roll_starting_attributes(rng);

        entity
            .with_component(Component::Fighter(Fighter::new(
                self.health,
                1,
                self.damage,
                attributes,
            )))
            .with_component(Component::Leveler(leveler))
            .with_component(Component::Ai(Ai::new()))
    }
}

/// Picks a template for a floor by weight among those allowed at `depth`.
pub fn pick_creature<'a>(
    templates: &'a [CreatureTemplate],
    depth: u32,
    rng: &mut GameRng,
) -> DelveResult<&'a CreatureTemplate> {
    let eligible: Vec<&CreatureTemplate> = templates
        .iter()
        .filter(|template| template.min_depth <= depth)
        .collect();
    if eligible.is_empty() {
        return Err(DelveError::InvariantViolation(format!(
            "no creature template allowed at depth {}",
            depth
        )));
    }

    let weights: Vec<u32> = eligible.iter().map(|template| template.spawn_chance).collect();
    rng.weighted_choice(&eligible, &weights).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiate_creature() {
        let mut rng = GameRng::new(1);
        let goblin = CREATURES[1].instantiate(&mut rng);

        assert_eq!(goblin.name, "Goblin");
        assert_eq!(goblin.kind, EntityKind::Creature);
        assert!(goblin.blocking);
        assert!(goblin.ai().is_some());

        let fighter = goblin.fighter().unwrap();
        assert_eq!(fighter.base_health, 10);
        assert_eq!(fighter.health, fighter.max_health());
        let attrs = fighter.attributes;
        assert_eq!(attrs.agility + attrs.power + attrs.sage + attrs.vitality, 7);

        assert_eq!(goblin.leveler().unwrap().experience_drop(), 5);
    }

    #[test]
    fn test_pick_respects_depth() {
        let mut rng = GameRng::new(2);
        for _ in 0..200 {
            let template = pick_creature(CREATURES, 0, &mut rng).unwrap();
            assert_eq!(template.min_depth, 0);
        }
    }

    #[test]
    fn test_pick_without_eligible_templates_fails() {
        let mut rng = GameRng::new(3);
        let deep_only = [CreatureTemplate {
            min_depth: 9,
            ..CREATURES[0]
        }];
        assert!(matches!(
            pick_creature(&deep_only, 0, &mut rng),
            Err(DelveError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_bestiary_weights_are_positive() {
        assert!(CREATURES.iter().all(|template| template.spawn_chance > 0));
        assert!(CREATURES.iter().any(|template| template.min_depth == 0));
    }
}
