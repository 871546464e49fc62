//! # Item Generation
//!
//! Item templates grouped by factory. Rolling an item is a two-step weighted
//! pick: first a factory (weapon, staff, armor, potion), then a template from
//! that factory's pool.

use crate::{
    Component, Consumable, DelveError, DelveResult, Entity, EntityKind, EquipSlot, Equippable,
    GameRng, GenerationConfig, Generator, ItemKind, ProjectileEffect, Projectable, Resource,
};

/// Item families, each with its own template pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemFactory {
    Weapon,
    Staff,
    Armor,
    Potion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponTemplate {
    pub name: &'static str,
    pub color: &'static str,
    pub damage_bonus: i32,
    pub spawn_chance: u32,
}

/// A staff is wieldable like a weapon and also carries charges of an effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaffTemplate {
    pub name: &'static str,
    pub color: &'static str,
    pub damage_bonus: i32,
    pub effect: ProjectileEffect,
    pub uses: u32,
    pub magicka_cost: i32,
    pub spawn_chance: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmorTemplate {
    pub name: &'static str,
    pub color: &'static str,
    pub slot: EquipSlot,
    pub damage_reduction: i32,
    pub coverage: f64,
    pub spawn_chance: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PotionTemplate {
    pub name: &'static str,
    pub color: &'static str,
    pub resource: Resource,
    pub amount: i32,
    pub spawn_chance: u32,
}

pub const WEAPONS: &[WeaponTemplate] = &[
    WeaponTemplate {
        name: "Dagger",
        color: "silver",
        damage_bonus: 2,
        spawn_chance: 40,
    },
    WeaponTemplate {
        name: "Short Sword",
        color: "silver",
        damage_bonus: 4,
        spawn_chance: 30,
    },
    WeaponTemplate {
        name: "Longsword",
        color: "steel_blue",
        damage_bonus: 6,
        spawn_chance: 20,
    },
    WeaponTemplate {
        name: "War Axe",
        color: "grey",
        damage_bonus: 8,
        spawn_chance: 10,
    },
];

pub const STAVES: &[StaffTemplate] = &[
    StaffTemplate {
        name: "Staff of Lightning",
        color: "yellow",
        damage_bonus: 1,
        effect: ProjectileEffect::Lightning { damage: 12 },
        uses: 5,
        magicka_cost: 10,
        spawn_chance: 30,
    },
    StaffTemplate {
        name: "Staff of Healing",
        color: "green",
        damage_bonus: 1,
        effect: ProjectileEffect::Healing { amount: 20 },
        uses: 4,
        magicka_cost: 15,
        spawn_chance: 25,
    },
    StaffTemplate {
        name: "Staff of Confusion",
        color: "purple",
        damage_bonus: 1,
        effect: ProjectileEffect::Confusion { turns: 5 },
        uses: 4,
        magicka_cost: 10,
        spawn_chance: 20,
    },
    StaffTemplate {
        name: "Staff of Freezing",
        color: "cyan",
        damage_bonus: 1,
        effect: ProjectileEffect::Freeze { turns: 3 },
        uses: 3,
        magicka_cost: 12,
        spawn_chance: 15,
    },
    StaffTemplate {
        name: "Staff of Charming",
        color: "pink",
        damage_bonus: 1,
        effect: ProjectileEffect::Charm { turns: 8 },
        uses: 2,
        magicka_cost: 20,
        spawn_chance: 10,
    },
];

pub const ARMOR: &[ArmorTemplate] = &[
    ArmorTemplate {
        name: "Leather Cap",
        color: "brown",
        slot: EquipSlot::Head,
        damage_reduction: 1,
        coverage: 0.5,
        spawn_chance: 40,
    },
    ArmorTemplate {
        name: "Iron Helm",
        color: "grey",
        slot: EquipSlot::Head,
        damage_reduction: 2,
        coverage: 0.6,
        spawn_chance: 20,
    },
    ArmorTemplate {
        name: "Leather Jerkin",
        color: "brown",
        slot: EquipSlot::Torso,
        damage_reduction: 1,
        coverage: 0.8,
        spawn_chance: 40,
    },
    ArmorTemplate {
        name: "Chainmail",
        color: "grey",
        slot: EquipSlot::Torso,
        damage_reduction: 3,
        coverage: 0.8,
        spawn_chance: 20,
    },
    ArmorTemplate {
        name: "Greaves",
        color: "grey",
        slot: EquipSlot::Legs,
        damage_reduction: 2,
        coverage: 0.5,
        spawn_chance: 30,
    },
];

pub const POTIONS: &[PotionTemplate] = &[
    PotionTemplate {
        name: "Health Potion",
        color: "red",
        resource: Resource::Health,
        amount: 25,
        spawn_chance: 60,
    },
    PotionTemplate {
        name: "Greater Health Potion",
        color: "crimson",
        resource: Resource::Health,
        amount: 50,
        spawn_chance: 20,
    },
    PotionTemplate {
        name: "Magicka Potion",
        color: "blue",
        resource: Resource::Magicka,
        amount: 30,
        spawn_chance: 40,
    },
];

/// Factory weights of the standard tables.
pub const FACTORY_WEIGHTS: &[(ItemFactory, u32)] = &[
    (ItemFactory::Weapon, 20),
    (ItemFactory::Staff, 100),
    (ItemFactory::Armor, 20),
    (ItemFactory::Potion, 20),
];

impl WeaponTemplate {
    pub fn instantiate(&self, rng: &mut GameRng) -> Entity {
        Entity::new(rng, self.name, ')', self.color, EntityKind::Item(ItemKind::Weapon))
            .with_component(Component::Equippable(Equippable::wieldable(self.damage_bonus)))
    }
}

impl StaffTemplate {
    pub fn instantiate(&self, rng: &mut GameRng) -> Entity {
        Entity::new(rng, self.name, '/', self.color, EntityKind::Item(ItemKind::Staff))
            .with_component(Component::Equippable(Equippable::wieldable(self.damage_bonus)))
            .with_component(Component::Projectable(Projectable::new(
                self.effect,
                self.uses,
                self.magicka_cost,
            )))
    }
}

impl ArmorTemplate {
    pub fn instantiate(&self, rng: &mut GameRng) -> Entity {
        Entity::new(rng, self.name, '[', self.color, EntityKind::Item(ItemKind::Armor))
            .with_component(Component::Equippable(Equippable::wearable(
                self.slot,
                self.damage_reduction,
                self.coverage,
            )))
    }
}

impl PotionTemplate {
    pub fn instantiate(&self, rng: &mut GameRng) -> Entity {
        Entity::new(rng, self.name, '!', self.color, EntityKind::Item(ItemKind::Potion))
            .with_component(Component::Consumable(Consumable::restore(
                self.resource,
                self.amount,
            )))
    }
}

/// All item template pools plus the factory weights.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemTables {
    pub factories: Vec<(ItemFactory, u32)>,
    pub weapons: Vec<WeaponTemplate>,
    pub staves: Vec<StaffTemplate>,
    pub armor: Vec<ArmorTemplate>,
    pub potions: Vec<PotionTemplate>,
}

impl ItemTables {
    /// The standard item tables.
    pub fn standard() -> Self {
        Self {
            factories: FACTORY_WEIGHTS.to_vec(),
            weapons: WEAPONS.to_vec(),
            staves: STAVES.to_vec(),
            armor: ARMOR.to_vec(),
            potions: POTIONS.to_vec(),
        }
    }

    /// Rolls a factory, then a template from its pool.
    pub fn roll(&self, rng: &mut GameRng) -> DelveResult<Entity> {
        let (factories, weights): (Vec<ItemFactory>, Vec<u32>) =
            self.factories.iter().copied().unzip();
        let factory = *rng.weighted_choice(&factories, &weights)?;

        let item = match factory {
            ItemFactory::Weapon => {
                let weights: Vec<u32> = self.weapons.iter().map(|t| t.spawn_chance).collect();
                rng.weighted_choice(&self.weapons, &weights)?.instantiate(rng)
            }
            ItemFactory::Staff => {
                let weights: Vec<u32> = self.staves.iter().map(|t| t.spawn_chance).collect();
                rng.weighted_choice(&self.staves, &weights)?.instantiate(rng)
            }
            ItemFactory::Armor => {
                let weights: Vec<u32> = self.armor.iter().map(|t| t.spawn_chance).collect();
                rng.weighted_choice(&self.armor, &weights)?.instantiate(rng)
            }
            ItemFactory::Potion => {
                let weights: Vec<u32> = self.potions.iter().map(|t| t.spawn_chance).collect();
                rng.weighted_choice(&self.potions, &weights)?.instantiate(rng)
            }
        };

        log::debug!("Rolled {:?} item: {}", factory, item.name);
        Ok(item)
    }
}

impl Default for ItemTables {
    fn default() -> Self {
        Self::standard()
    }
}

impl Generator<Entity> for ItemTables {
    fn generate(&self, _config: &GenerationConfig, rng: &mut GameRng) -> DelveResult<Entity> {
        self.roll(rng)
    }

    fn validate(&self, item: &Entity, _config: &GenerationConfig) -> DelveResult<()> {
        let usable = item.equippable().is_some()
            || item.consumable().is_some()
            || item.projectable().is_some();
        if !item.is_item() || !usable {
            return Err(DelveError::GenerationFailed(format!(
                "{} is not a usable item",
                item.name
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "ItemTables"
    }
}
