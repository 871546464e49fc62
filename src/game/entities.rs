//! # Entity System
//!
//! Everything that occupies a cell: the player, creatures, items and staircase
//! markers. An entity is plain data plus a map of attached components; its
//! capabilities are whatever components it carries.

use crate::{
    new_entity_id, Ai, Component, ComponentKind, Consumable, EntityId, EquipBonus, Equippable,
    Fighter, GameRng, Inventory, Leveler, Position, Projectable, StairDirection,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Who decides what an actor does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorRole {
    /// Driven by intents from the caller
    Player,
    /// Driven by the AI decision module
    Ai,
}

/// Drawing tier. Tiers earlier in declaration order are drawn on top.
///
/// A floor keeps its entity list sorted by tier so presentation can simply
/// draw it back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RenderOrder {
    Actor,
    Item,
    Staircase,
    Corpse,
}

/// Item categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Weapon,
    Armor,
    Potion,
    Staff,
    /// The story-mode quest item
    Relic,
}

/// What an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Creature,
    Item(ItemKind),
    Staircase(StairDirection),
}

/// A thing in the dungeon.
///
/// # Examples
///
/// ```
/// use delve::{Attributes, Component, Entity, EntityKind, Fighter, GameRng};
///
/// let mut rng = GameRng::new(1);
/// let rat = Entity::new(&mut rng, "Rat", 'r', "brown", EntityKind::Creature)
///     .with_component(Component::Fighter(Fighter::new(8, 0, 2, Attributes::default())));
///
/// assert!(rat.blocking);
/// assert!(rat.fighter().is_some());
/// assert!(rat.inventory().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub position: Position,
    pub glyph: char,
    /// Presentation color name; the core never interprets it
    pub color: String,
    pub blocking: bool,
    pub render_order: RenderOrder,
    pub kind: EntityKind,
    pub role: Option<ActorRole>,
    components: BTreeMap<ComponentKind, Component>,
}

macro_rules! component_accessors {
    ($($variant:ident: $ty:ty => $get:ident, $get_mut:ident;)*) => {
        impl Entity {
            $(
                #[doc = concat!("Gets the attached [`", stringify!($ty), "`], if any.")]
                pub fn $get(&self) -> Option<&$ty> {
                    match self.components.get(&ComponentKind::$variant) {
                        Some(Component::$variant(component)) => Some(component),
                        _ => None,
                    }
                }

                #[doc = concat!("Gets the attached [`", stringify!($ty), "`] mutably, if any.")]
                pub fn $get_mut(&mut self) -> Option<&mut $ty> {
                    match self.components.get_mut(&ComponentKind::$variant) {
                        Some(Component::$variant(component)) => Some(component),
                        _ => None,
                    }
                }
            )*
        }
    };
}

component_accessors! {
    Fighter: Fighter => fighter, fighter_mut;
    Leveler: Leveler => leveler, leveler_mut;
    Inventory: Inventory => inventory, inventory_mut;
    Equippable: Equippable => equippable, equippable_mut;
    Consumable: Consumable => consumable, consumable_mut;
    Projectable: Projectable => projectable, projectable_mut;
    Ai: Ai => ai, ai_mut;
}

impl Entity {
    /// Creates an entity with the defaults for its kind.
    ///
    /// Players and creatures block movement and draw in the actor tier;
    /// items and staircases do neither. The id is drawn from `rng`.
    pub fn new(
        rng: &mut GameRng,
        name: impl Into<String>,
        glyph: char,
        color: impl Into<String>,
        kind: EntityKind,
    ) -> Self {
        let (blocking, render_order, role) = match kind {
            EntityKind::Player => (true, RenderOrder::Actor, Some(ActorRole::Player)),
            EntityKind::Creature => (true, RenderOrder::Actor, Some(ActorRole::Ai)),
            EntityKind::Item(_) => (false, RenderOrder::Item, None),
            EntityKind::Staircase(_) => (false, RenderOrder::Staircase, None),
        };

        Self {
            id: new_entity_id(rng),
            name: name.into(),
            position: Position::new(0, 0),
            glyph,
            color: color.into(),
            blocking,
            render_order,
            kind,
            role,
            components: BTreeMap::new(),
        }
    }

    /// Attaches a component, builder style.
    pub fn with_component(mut self, component: Component) -> Self {
        self.add_component(component);
        self
    }

    /// Places the entity, builder style.
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Attaches a component, returning the one it replaced.
    pub fn add_component(&mut self, component: Component) -> Option<Component> {
        self.components.insert(component.kind(), component)
    }

    pub fn remove_component(&mut self, kind: ComponentKind) -> Option<Component> {
        self.components.remove(&kind)
    }

    pub fn component(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.get(&kind)
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    pub fn is_player(&self) -> bool {
        self.role == Some(ActorRole::Player)
    }

    pub fn is_item(&self) -> bool {
        matches!(self.kind, EntityKind::Item(_))
    }

    pub fn item_kind(&self) -> Option<ItemKind> {
        match self.kind {
            EntityKind::Item(kind) => Some(kind),
            _ => None,
        }
    }

    /// Whether this entity fights and has not died.
    pub fn is_alive(&self) -> bool {
        self.fighter().is_some_and(Fighter::is_alive)
    }

    /// An AI actor currently fighting on the player's side.
    pub fn is_ally(&self) -> bool {
        self.ai().is_some_and(Ai::is_charmed)
    }

    /// Turns a slain actor into a corpse. The caller re-sorts the floor list.
    pub fn become_corpse(&mut self) {
        self.blocking = false;
        self.render_order = RenderOrder::Corpse;
        self.glyph = '%';
        self.remove_component(ComponentKind::Ai);
    }

    /// Items currently equipped from this entity's inventory.
    pub fn equipped_items(&self) -> impl Iterator<Item = &Entity> {
        self.inventory()
            .into_iter()
            .flat_map(Inventory::iter)
            .filter(|item| item.equippable().is_some_and(|e| e.equipped))
    }

    /// Sum of the damage bonuses of equipped weapons.
    pub fn damage_bonus(&self) -> i32 {
        self.equipped_items()
            .filter_map(Entity::equippable)
            .map(Equippable::damage_bonus)
            .sum()
    }

    /// `(damage_reduction, coverage)` of every equipped armor piece.
    pub fn armor_pieces(&self) -> Vec<(i32, f64)> {
        self.equipped_items()
            .filter_map(Entity::equippable)
            .filter_map(|equippable| match equippable.bonus {
                EquipBonus::Wearable {
                    damage_reduction,
                    coverage,
                } => Some((damage_reduction, coverage)),
                EquipBonus::Wieldable { .. } => None,
            })
            .collect()
    }

    /// Regular hit damage including equipment.
    pub fn attack_damage(&self) -> i32 {
        self.fighter().map_or(0, Fighter::damage) + self.damage_bonus()
    }

    /// Critical hit damage including equipment.
    pub fn critical_attack_damage(&self) -> i32 {
        self.fighter().map_or(0, Fighter::critical_damage) + self.damage_bonus()
    }

    /// Whether the inventory holds an item of the given kind.
    pub fn carries(&self, kind: ItemKind) -> bool {
        self.inventory()
            .is_some_and(|inventory| inventory.iter().any(|item| item.item_kind() == Some(kind)))
    }
}
