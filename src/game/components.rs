//! # Components
//!
//! Capability units attached to entities. An entity is not a fighter or an
//! inventory holder by type; it carries a [`Fighter`] or an [`Inventory`]
//! component under the matching [`ComponentKind`] tag, and callers look it up
//! and get `None` when it is absent.

use crate::utils::capped_chance;
use crate::{Entity, EntityId, GameRng};
use serde::{Deserialize, Serialize};

/// Experience needed per level: reaching level `n + 1` costs `n` times this.
pub const XP_PER_LEVEL: u32 = 25;

/// Unallocated attribute points granted on each level up.
pub const ATTRIBUTE_POINTS_PER_LEVEL: u32 = 2;

/// Points distributed at random when a leveler rolls starting attributes.
pub const STARTING_ATTRIBUTE_POINTS: u32 = 3;

/// Health and magicka gained per point of vitality and sage.
const POOL_PER_POINT: i32 = 5;

/// Tag under which a component is attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Fighter,
    Leveler,
    Inventory,
    Equippable,
    Consumable,
    Projectable,
    Ai,
}

/// A component instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    Fighter(Fighter),
    Leveler(Leveler),
    Inventory(Inventory),
    Equippable(Equippable),
    Consumable(Consumable),
    Projectable(Projectable),
    Ai(Ai),
}

impl Component {
    /// Gets the tag this component is stored under.
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Fighter(_) => ComponentKind::Fighter,
            Component::Leveler(_) => ComponentKind::Leveler,
            Component::Inventory(_) => ComponentKind::Inventory,
            Component::Equippable(_) => ComponentKind::Equippable,
            Component::Consumable(_) => ComponentKind::Consumable,
            Component::Projectable(_) => ComponentKind::Projectable,
            Component::Ai(_) => ComponentKind::Ai,
        }
    }
}

/// The four trainable attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Agility,
    Power,
    Sage,
    Vitality,
}

impl Attribute {
    /// All attributes, in allocation order.
    pub const ALL: [Attribute; 4] = [
        Attribute::Agility,
        Attribute::Power,
        Attribute::Sage,
        Attribute::Vitality,
    ];
}

/// Attribute scores of a fighter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Accuracy, criticals and double hits
    pub agility: i32,
    /// Flat melee damage
    pub power: i32,
    /// Magicka pool
    pub sage: i32,
    /// Health pool
    pub vitality: i32,
}

impl Attributes {
    /// Creates attributes with every score set to `value`.
    pub fn uniform(value: i32) -> Self {
        Self {
            agility: value,
            power: value,
            sage: value,
            vitality: value,
        }
    }

    /// Gets the score of one attribute.
    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Agility => self.agility,
            Attribute::Power => self.power,
            Attribute::Sage => self.sage,
            Attribute::Vitality => self.vitality,
        }
    }

    fn get_mut(&mut self, attribute: Attribute) -> &mut i32 {
        match attribute {
            Attribute::Agility => &mut self.agility,
            Attribute::Power => &mut self.power,
            Attribute::Sage => &mut self.sage,
            Attribute::Vitality => &mut self.vitality,
        }
    }
}

impl std::ops::AddAssign for Attributes {
    fn add_assign(&mut self, other: Self) {
        self.agility += other.agility;
        self.power += other.power;
        self.sage += other.sage;
        self.vitality += other.vitality;
    }
}

/// Health, magicka and the combat formulas derived from attributes.
///
/// # Examples
///
/// ```
/// use delve::{Attributes, Fighter};
///
/// let mut fighter = Fighter::new(20, 0, 4, Attributes::default());
/// assert_eq!(fighter.max_health(), 20);
/// assert!(!fighter.take_damage(5));
/// assert!(fighter.take_damage(15));
/// assert!(fighter.is_dead());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    /// Health before vitality bonuses
    pub base_health: i32,
    /// Magicka before sage bonuses
    pub base_magicka: i32,
    /// Unarmed damage before power bonuses
    pub base_damage: i32,
    /// Attribute scores
    pub attributes: Attributes,
    /// Current health
    pub health: i32,
    /// Current magicka
    pub magicka: i32,
    dead: bool,
}

impl Fighter {
    /// Creates a fighter at full health and magicka.
    pub fn new(base_health: i32, base_magicka: i32, base_damage: i32, attributes: Attributes) -> Self {
        let mut fighter = Self {
            base_health,
            base_magicka,
            base_damage,
            attributes,
            health: 0,
            magicka: 0,
            dead: false,
        };
        fighter.refill();
        fighter
    }

    pub fn max_health(&self) -> i32 {
        self.base_health + POOL_PER_POINT * self.attributes.vitality
    }

    pub fn max_magicka(&self) -> i32 {
        self.base_magicka + POOL_PER_POINT * self.attributes.sage
    }

    /// Damage of a regular hit, before equipment.
    pub fn damage(&self) -> i32 {
        self.base_damage + self.attributes.power
    }

    /// Damage of a critical hit, before equipment.
    pub fn critical_damage(&self) -> i32 {
        self.damage() * 3 / 2
    }

    pub fn hit_chance(&self) -> f64 {
        capped_chance(0.75 + 0.02 * self.attributes.agility as f64, 0.95)
    }

    pub fn critical_chance(&self) -> f64 {
        capped_chance(0.05 + 0.01 * self.attributes.agility as f64, 0.5)
    }

    pub fn double_hit_chance(&self) -> f64 {
        capped_chance(0.03 + 0.01 * self.attributes.agility as f64, 0.5)
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Subtracts health. Returns `true` only on the hit that kills.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if self.dead {
            return false;
        }
        self.health -= amount.max(0);
        if self.health <= 0 {
            self.health = 0;
            self.dead = true;
            return true;
        }
        false
    }

    /// Restores health up to the maximum. Returns the amount restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if self.dead {
            return 0;
        }
        let before = self.health;
        self.health = (self.health + amount.max(0)).min(self.max_health());
        self.health - before
    }

    /// Restores magicka up to the maximum. Returns the amount restored.
    pub fn restore_magicka(&mut self, amount: i32) -> i32 {
        let before = self.magicka;
        self.magicka = (self.magicka + amount.max(0)).min(self.max_magicka());
        self.magicka - before
    }

    /// Pays a magicka cost if affordable.
    pub fn spend_magicka(&mut self, cost: i32) -> bool {
        if self.magicka < cost {
            return false;
        }
        self.magicka -= cost;
        true
    }

    /// Raises one attribute by a point, growing the matching pool with it.
    pub fn raise(&mut self, attribute: Attribute) {
        *self.attributes.get_mut(attribute) += 1;
        match attribute {
            Attribute::Vitality => self.health += POOL_PER_POINT,
            Attribute::Sage => self.magicka += POOL_PER_POINT,
            Attribute::Agility | Attribute::Power => {}
        }
    }

    /// Sets health and magicka to their maximums.
    pub fn refill(&mut self) {
        self.health = self.max_health();
        self.magicka = self.max_magicka();
    }
}

/// Level, experience and unallocated attribute points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leveler {
    pub level: u32,
    /// Experience toward the next level
    pub experience: u32,
    /// Points waiting to be allocated
    pub attribute_points: u32,
    /// Experience granted per level of this entity when it is slain
    pub base_drop_amount: u32,
}

impl Leveler {
    pub fn new(start_level: u32, base_drop_amount: u32) -> Self {
        Self {
            level: start_level.max(1),
            experience: 0,
            attribute_points: 0,
            base_drop_amount,
        }
    }

    pub fn experience_to_next_level(&self) -> u32 {
        XP_PER_LEVEL * self.level
    }

    /// Experience handed to whoever slays this entity.
    pub fn experience_drop(&self) -> u32 {
        self.base_drop_amount * self.level
    }

    /// Adds experience and returns the number of levels gained.
    pub fn gain_experience(&mut self, amount: u32) -> u32 {
        self.experience += amount;
        let mut gained = 0;
        while self.experience >= self.experience_to_next_level() {
            self.experience -= self.experience_to_next_level();
            self.level += 1;
            self.attribute_points += ATTRIBUTE_POINTS_PER_LEVEL;
            gained += 1;
        }
        gained
    }

    /// Consumes one unallocated point if any is left.
    pub fn spend_point(&mut self) -> bool {
        if self.attribute_points == 0 {
            return false;
        }
        self.attribute_points -= 1;
        true
    }

    /// Spends a point on one of the fighter's attributes.
    pub fn allocate(&mut self, attribute: Attribute, fighter: &mut Fighter) -> bool {
        if !self.spend_point() {
            return false;
        }
        fighter.raise(attribute);
        true
    }

    /// Distributes the starting points over random attributes.
    pub fn roll_starting_attributes(&self, rng: &mut GameRng) -> Attributes {
        let mut rolled = Attributes::default();
        for _ in 0..STARTING_ATTRIBUTE_POINTS {
            if let Some(attribute) = rng.choose(&Attribute::ALL) {
                *rolled.get_mut(*attribute) += 1;
            }
        }
        rolled
    }
}

/// Bounded, ordered list of held items.
///
/// The inventory owns the item entities outright: picking an item up moves it
/// out of the floor's entity list and into here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub max_slots: usize,
    items: Vec<Entity>,
}

impl Inventory {
    pub fn new(max_slots: usize) -> Self {
        Self {
            max_slots,
            items: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_slots
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Entity] {
        &self.items
    }

    /// Adds an item, handing it back untouched when there is no free slot.
    pub fn add(&mut self, item: Entity) -> Result<(), Entity> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    /// Removes and returns the item with the given id.
    pub fn remove(&mut self, item_id: EntityId) -> Option<Entity> {
        let index = self.items.iter().position(|item| item.id == item_id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, item_id: EntityId) -> Option<&Entity> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn get_mut(&mut self, item_id: EntityId) -> Option<&mut Entity> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    pub fn contains(&self, item_id: EntityId) -> bool {
        self.get(item_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.items.iter_mut()
    }
}

/// Body slot an equippable occupies. One item per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    Weapon,
    Head,
    Torso,
    Legs,
}

/// Stat modifier granted while equipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EquipBonus {
    /// Added to every hit
    Wieldable { damage_bonus: i32 },
    /// Subtracted from incoming hits that land on the covered area
    Wearable { damage_reduction: i32, coverage: f64 },
}

/// Wearable or wieldable stat modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equippable {
    pub slot: EquipSlot,
    pub bonus: EquipBonus,
    pub equipped: bool,
}

impl Equippable {
    pub fn wieldable(damage_bonus: i32) -> Self {
        Self {
            slot: EquipSlot::Weapon,
            bonus: EquipBonus::Wieldable { damage_bonus },
            equipped: false,
        }
    }

    pub fn wearable(slot: EquipSlot, damage_reduction: i32, coverage: f64) -> Self {
        Self {
            slot,
            bonus: EquipBonus::Wearable {
                damage_reduction,
                coverage,
            },
            equipped: false,
        }
    }

    pub fn damage_bonus(&self) -> i32 {
        match self.bonus {
            EquipBonus::Wieldable { damage_bonus } => damage_bonus,
            EquipBonus::Wearable { .. } => 0,
        }
    }
}

/// Pool a consumable restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resource {
    Health,
    Magicka,
}

/// Single-use restorative effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumable {
    pub resource: Resource,
    pub amount: i32,
}

impl Consumable {
    pub fn restore(resource: Resource, amount: i32) -> Self {
        Self { resource, amount }
    }
}

/// What a staff does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileEffect {
    Lightning { damage: i32 },
    Healing { amount: i32 },
    Confusion { turns: u32 },
    Freeze { turns: u32 },
    Charm { turns: u32 },
}

impl ProjectileEffect {
    /// Whether the effect lands on the wielder instead of a creature.
    pub fn targets_self(&self) -> bool {
        matches!(self, ProjectileEffect::Healing { .. })
    }
}

/// Limited-charge ranged effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectable {
    pub effect: ProjectileEffect,
    pub uses_left: u32,
    pub magicka_cost: i32,
}

impl Projectable {
    pub fn new(effect: ProjectileEffect, uses: u32, magicka_cost: i32) -> Self {
        Self {
            effect,
            uses_left: uses,
            magicka_cost,
        }
    }

    pub fn has_charges(&self) -> bool {
        self.uses_left > 0
    }

    /// Uses up one charge; never drops below zero.
    pub fn spend_charge(&mut self) -> bool {
        if self.uses_left == 0 {
            return false;
        }
        self.uses_left -= 1;
        true
    }
}

/// Behavior state of an AI-driven creature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    #[default]
    Wandering,
    Hostile,
}

/// Temporary condition inflicted by a staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    /// Stumbles in random directions
    Confused,
    /// Loses its turns
    Frozen,
    /// Fights on the player's side
    Charmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub turns_remaining: u32,
}

/// AI component: the current behavior state plus any status effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ai {
    pub state: AiState,
    pub status: Option<StatusEffect>,
}

impl Ai {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_kind(&self) -> Option<StatusKind> {
        self.status.map(|status| status.kind)
    }

    pub fn is_charmed(&self) -> bool {
        self.status_kind() == Some(StatusKind::Charmed)
    }

    /// Replaces any current status effect.
    pub fn apply_status(&mut self, kind: StatusKind, turns: u32) {
        self.status = (turns > 0).then_some(StatusEffect {
            kind,
            turns_remaining: turns,
        });
    }

    /// Counts down the status effect. Returns its kind when it wears off.
    pub fn tick_status(&mut self) -> Option<StatusKind> {
        let status = self.status.as_mut()?;
        status.turns_remaining = status.turns_remaining.saturating_sub(1);
        if status.turns_remaining == 0 {
            let kind = status.kind;
            self.status = None;
            return Some(kind);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityKind, ItemKind};

    fn potion(rng: &mut GameRng) -> Entity {
        Entity::new(rng, "Potion", '!', "red", EntityKind::Item(ItemKind::Potion))
            .with_component(Component::Consumable(Consumable::restore(Resource::Health, 10)))
    }

    #[test]
    fn test_fighter_derived_stats() {
        let fighter = Fighter::new(100, 100, 8, Attributes::uniform(1));
        assert_eq!(fighter.max_health(), 105);
        assert_eq!(fighter.max_magicka(), 105);
        assert_eq!(fighter.health, 105);
        assert_eq!(fighter.damage(), 9);
        assert_eq!(fighter.critical_damage(), 13);
        assert!((fighter.hit_chance() - 0.77).abs() < 1e-9);
        assert!((fighter.critical_chance() - 0.06).abs() < 1e-9);
        assert!((fighter.double_hit_chance() - 0.04).abs() < 1e-9);
    }

    #[test]
    fn test_fighter_chances_are_capped() {
        let fighter = Fighter::new(10, 0, 1, Attributes::uniform(100));
        assert_eq!(fighter.hit_chance(), 0.95);
        assert_eq!(fighter.critical_chance(), 0.5);
        assert_eq!(fighter.double_hit_chance(), 0.5);
    }

    #[test]
    fn test_fighter_dies_exactly_once() {
        let mut fighter = Fighter::new(10, 0, 1, Attributes::default());
        assert!(!fighter.take_damage(9));
        assert!(fighter.is_alive());
        assert!(fighter.take_damage(1));
        assert_eq!(fighter.health, 0);
        assert!(!fighter.take_damage(5));
        assert!(fighter.is_dead());
        assert_eq!(fighter.heal(10), 0);
    }

    #[test]
    fn test_fighter_heal_and_magicka() {
        let mut fighter = Fighter::new(20, 10, 1, Attributes::default());
        fighter.take_damage(15);
        assert_eq!(fighter.heal(100), 15);
        assert!(fighter.spend_magicka(10));
        assert!(!fighter.spend_magicka(1));
        assert_eq!(fighter.restore_magicka(4), 4);
    }

    #[test]
    fn test_fighter_raise_grows_pools() {
        let mut fighter = Fighter::new(20, 10, 1, Attributes::default());
        fighter.raise(Attribute::Vitality);
        assert_eq!(fighter.max_health(), 25);
        assert_eq!(fighter.health, 25);
        fighter.raise(Attribute::Power);
        assert_eq!(fighter.damage(), 2);
    }

    #[test]
    fn test_leveler_gain_experience() {
        let mut leveler = Leveler::new(1, 5);
        assert_eq!(leveler.experience_to_next_level(), 25);
        assert_eq!(leveler.gain_experience(20), 0);
        assert_eq!(leveler.gain_experience(10), 1);
        assert_eq!(leveler.level, 2);
        assert_eq!(leveler.experience, 5);
        assert_eq!(leveler.attribute_points, ATTRIBUTE_POINTS_PER_LEVEL);

        // 50 for level 2 -> 3, 75 for level 3 -> 4
        assert_eq!(leveler.gain_experience(120), 2);
        assert_eq!(leveler.level, 4);
    }

    #[test]
    fn test_leveler_drop_scales_with_level() {
        let mut leveler = Leveler::new(3, 5);
        assert_eq!(leveler.experience_drop(), 15);
        assert!(!leveler.spend_point());
        leveler.attribute_points = 1;
        assert!(leveler.spend_point());
        assert_eq!(leveler.attribute_points, 0);
    }

    #[test]
    fn test_starting_attributes_total() {
        let leveler = Leveler::new(1, 0);
        let mut rng = GameRng::new(10);
        let rolled = leveler.roll_starting_attributes(&mut rng);
        let total = rolled.agility + rolled.power + rolled.sage + rolled.vitality;
        assert_eq!(total, STARTING_ATTRIBUTE_POINTS as i32);
    }

    #[test]
    fn test_inventory_capacity() {
        let mut rng = GameRng::new(1);
        let mut inventory = Inventory::new(2);

        assert!(inventory.add(potion(&mut rng)).is_ok());
        assert!(inventory.add(potion(&mut rng)).is_ok());
        assert!(inventory.is_full());

        let rejected = potion(&mut rng);
        let rejected_id = rejected.id;
        let handed_back = inventory.add(rejected).unwrap_err();
        assert_eq!(handed_back.id, rejected_id);
        assert_eq!(inventory.size(), 2);
    }

    #[test]
    fn test_inventory_remove() {
        let mut rng = GameRng::new(1);
        let mut inventory = Inventory::new(4);
        let item = potion(&mut rng);
        let id = item.id;
        inventory.add(item).unwrap();

        assert!(inventory.contains(id));
        assert_eq!(inventory.remove(id).map(|e| e.id), Some(id));
        assert!(inventory.remove(id).is_none());
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_projectable_charges() {
        let mut staff = Projectable::new(ProjectileEffect::Lightning { damage: 5 }, 1, 3);
        assert!(staff.spend_charge());
        assert!(!staff.has_charges());
        assert!(!staff.spend_charge());
        assert_eq!(staff.uses_left, 0);
    }

    #[test]
    fn test_ai_status_expires() {
        let mut ai = Ai::new();
        assert_eq!(ai.state, AiState::Wandering);

        ai.apply_status(StatusKind::Frozen, 2);
        assert_eq!(ai.tick_status(), None);
        assert_eq!(ai.tick_status(), Some(StatusKind::Frozen));
        assert!(ai.status.is_none());

        ai.apply_status(StatusKind::Charmed, 0);
        assert!(!ai.is_charmed());
    }
}
