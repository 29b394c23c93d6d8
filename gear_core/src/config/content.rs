//! Content library - every authored definition, validated and resolved to handles
//!
//! Invalid values are replaced with safe defaults and unknown references are
//! dropped. Each offending definition is warned about once while loading and
//! the messages are kept in [`ContentLibrary::warnings`].

use super::{ConfigError, Tunables};
use crate::ability::{AbilityDefinition, AbilityEffect};
use crate::gear::GearDefinition;
use crate::selection::SelectionDefinition;
use crate::types::{AbilityId, GearDefId};
use crate::world::{CreatureDef, ItemDef, ThingDef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// On-disk layout of a content file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentFile {
    #[serde(default)]
    pub tunables: Tunables,
    #[serde(default)]
    pub apparel: Vec<ItemDef>,
    #[serde(default)]
    pub thing: Vec<ThingDef>,
    #[serde(default)]
    pub creature: Vec<CreatureDef>,
    #[serde(default)]
    pub ability: Vec<AbilityDefinition>,
    #[serde(default)]
    pub gear: Vec<GearDefinition>,
    #[serde(default)]
    pub selection: Vec<SelectionDefinition>,
}

/// Resolved definitions
#[derive(Debug, Default)]
pub struct ContentLibrary {
    tunables: Tunables,
    items: HashMap<String, ItemDef>,
    things: HashMap<String, ThingDef>,
    creatures: HashMap<String, CreatureDef>,
    abilities: Vec<AbilityDefinition>,
    ability_names: HashMap<String, AbilityId>,
    gears: Vec<GearDefinition>,
    gear_names: HashMap<String, GearDefId>,
    selections: Vec<SelectionDefinition>,
    warnings: Vec<String>,
}

/// Load and compile a content file
pub fn load_content(path: &Path) -> Result<ContentLibrary, ConfigError> {
    let file: ContentFile = super::load_toml(path)?;
    Ok(ContentLibrary::compile(file))
}

/// Compile content from a TOML string
pub fn parse_content(content: &str) -> Result<ContentLibrary, ConfigError> {
    let file: ContentFile = super::parse_toml(content)?;
    Ok(ContentLibrary::compile(file))
}

/// The bundled demo content
pub fn default_content() -> Result<ContentLibrary, ConfigError> {
    parse_content(include_str!("../../config/default.toml"))
}

impl ContentLibrary {
    /// Validate and resolve a parsed content file. Order matters: abilities
    /// and apparel before gear, gear before selections.
    pub fn compile(file: ContentFile) -> Self {
        let mut library = ContentLibrary::default();
        library.set_tunables(file.tunables);
        for def in file.apparel {
            library.add_item(def);
        }
        for def in file.thing {
            library.add_thing(def);
        }
        for def in file.creature {
            library.add_creature(def);
        }
        for def in file.ability {
            library.add_ability(def);
        }
        for def in file.gear {
            library.add_gear(def);
        }
        for def in file.selection {
            library.add_selection(def);
        }
        library
    }

    fn report(&mut self, kind: &str, name: &str, issues: Vec<String>) {
        if issues.is_empty() {
            return;
        }
        tracing::warn!(kind, definition = name, issues = %issues.join("; "), "definition adjusted");
        self.warnings
            .extend(issues.into_iter().map(|issue| format!("{kind} '{name}': {issue}")));
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    // === Tunables ===

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn set_tunables(&mut self, tunables: Tunables) {
        let (tunables, issues) = tunables.sanitized();
        self.report("tunables", "tunables", issues);
        self.tunables = tunables;
    }

    // === Leaf definitions ===

    pub fn add_item(&mut self, def: ItemDef) {
        self.items.insert(def.name.clone(), def);
    }

    pub fn item_def(&self, name: &str) -> Option<&ItemDef> {
        self.items.get(name)
    }

    pub fn add_thing(&mut self, def: ThingDef) {
        self.things.insert(def.name.clone(), def);
    }

    pub fn thing_def(&self, name: &str) -> Option<&ThingDef> {
        self.things.get(name)
    }

    pub fn add_creature(&mut self, def: CreatureDef) {
        self.creatures.insert(def.name.clone(), def);
    }

    pub fn creature_def(&self, name: &str) -> Option<&CreatureDef> {
        self.creatures.get(name)
    }

    // === Abilities ===

    /// Register an ability and hand out its handle. A duplicate name is ignored.
    pub fn add_ability(&mut self, mut def: AbilityDefinition) -> AbilityId {
        if let Some(&id) = self.ability_names.get(&def.name) {
            self.report("ability", &def.name, vec!["duplicate definition ignored".to_string()]);
            return id;
        }
        let mut issues = def.sanitize();
        for effect in &def.effects {
            match effect {
                AbilityEffect::SpawnThing(s) if !self.things.contains_key(&s.thing) => {
                    issues.push(format!("unknown thing '{}'", s.thing));
                }
                AbilityEffect::Summon(s) if !self.creatures.contains_key(&s.creature) => {
                    issues.push(format!("unknown creature '{}'", s.creature));
                }
                _ => {}
            }
        }
        self.report("ability", &def.name, issues);

        let id = AbilityId(self.abilities.len() as u32 + 1);
        def.id = id;
        self.ability_names.insert(def.name.clone(), id);
        self.abilities.push(def);
        id
    }

    pub fn ability(&self, id: AbilityId) -> Option<&AbilityDefinition> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.abilities.get(index)
    }

    pub fn ability_id(&self, name: &str) -> Option<AbilityId> {
        self.ability_names.get(name).copied()
    }

    pub fn abilities(&self) -> impl Iterator<Item = &AbilityDefinition> {
        self.abilities.iter()
    }

    // === Gear ===

    /// Register a gear definition, resolving ability and costume names
    pub fn add_gear(&mut self, mut def: GearDefinition) -> GearDefId {
        if let Some(&id) = self.gear_names.get(&def.name) {
            self.report("gear", &def.name, vec!["duplicate definition ignored".to_string()]);
            return id;
        }
        let mut issues = def.sanitize();

        def.ability_ids.clear();
        let mut granted = Vec::new();
        for name in std::mem::take(&mut def.abilities) {
            match self.ability_names.get(&name) {
                Some(&id) => {
                    def.ability_ids.push(id);
                    granted.push(name);
                }
                None => issues.push(format!("unknown ability '{name}' dropped")),
            }
        }
        def.abilities = granted;

        if let Some(transform) = &mut def.transformation {
            let items = &self.items;
            transform.costume.retain(|name| {
                let known = items.contains_key(name);
                if !known {
                    issues.push(format!("unknown costume item '{name}' dropped"));
                }
                known
            });
        }
        if !self.items.contains_key(&def.item) {
            issues.push(format!("gear item '{}' has no apparel definition", def.item));
        }
        self.report("gear", &def.name, issues);

        let id = GearDefId(self.gears.len() as u32 + 1);
        def.id = id;
        self.gear_names.insert(def.name.clone(), id);
        self.gears.push(def);
        id
    }

    pub fn gear(&self, id: GearDefId) -> Option<&GearDefinition> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.gears.get(index)
    }

    pub fn gear_id(&self, name: &str) -> Option<GearDefId> {
        self.gear_names.get(name).copied()
    }

    /// Like [`gear_id`](Self::gear_id) but an error for callers that cannot continue without it
    pub fn require_gear(&self, name: &str) -> Result<GearDefId, ConfigError> {
        self.gear_id(name)
            .ok_or_else(|| ConfigError::ValidationError(format!("gear '{name}' is not defined")))
    }

    pub fn gears(&self) -> impl Iterator<Item = &GearDefinition> {
        self.gears.iter()
    }

    // === Selections ===

    /// Register a selection definition. One naming unknown gear is dropped.
    pub fn add_selection(&mut self, mut def: SelectionDefinition) {
        let mut issues = def.sanitize(self.tunables.periodic_check_ticks);
        let Some(gear) = self.gear_id(&def.gear) else {
            issues.push(format!("unknown gear '{}', selection dropped", def.gear));
            self.report("selection", &def.name, issues);
            return;
        };
        def.gear_id = gear;
        self.report("selection", &def.name, issues);
        self.selections.push(def);
    }

    pub fn selections(&self) -> &[SelectionDefinition] {
        &self.selections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = r#"
[tunables]
cost_multiplier = 1.5

[[apparel]]
name = "brooch"
covers = ["torso"]
layers = ["belt"]

[[apparel]]
name = "sailor_uniform"
covers = ["torso"]
layers = ["skin", "shell"]

[[ability]]
name = "moon_heal"

[[ability.effects]]
type = "cost"
cost = 0.1

[[ability.effects]]
type = "heal"
amount = 10.0

[[gear]]
name = "moon_brooch"
item = "brooch"
abilities = ["moon_heal", "missing_ability"]

[gear.transformation]
costume = ["sailor_uniform", "missing_boots"]

[[selection]]
name = "moon_chosen"
gear = "moon_brooch"

[[selection.triggers]]
type = "actor_joined"

[[selection]]
name = "orphan"
gear = "no_such_gear"
"#;

    #[test]
    fn test_compile_resolves_names() {
        let library = parse_content(CONTENT).unwrap();
        assert!((library.tunables().cost_multiplier - 1.5).abs() < f64::EPSILON);

        let heal = library.ability_id("moon_heal").unwrap();
        assert_eq!(library.ability(heal).unwrap().name, "moon_heal");

        let gear = library.gear(library.gear_id("moon_brooch").unwrap()).unwrap();
        assert_eq!(gear.ability_ids, vec![heal]);
        assert_eq!(gear.abilities, vec!["moon_heal".to_string()]);
        assert_eq!(
            gear.transformation.as_ref().unwrap().costume,
            vec!["sailor_uniform".to_string()]
        );

        assert_eq!(library.selections().len(), 1);
        assert_eq!(library.selections()[0].gear_id, gear.id);
    }

    #[test]
    fn test_warnings_are_collected() {
        let library = parse_content(CONTENT).unwrap();
        let warnings = library.warnings();
        assert!(warnings.iter().any(|w| w.contains("missing_ability")));
        assert!(warnings.iter().any(|w| w.contains("missing_boots")));
        assert!(warnings.iter().any(|w| w.contains("no_such_gear")));
    }

    #[test]
    fn test_handles_are_stable() {
        let mut library = ContentLibrary::default();
        let a = library.add_ability(AbilityDefinition::new("a"));
        let b = library.add_ability(AbilityDefinition::new("b"));
        assert_eq!(library.add_ability(AbilityDefinition::new("a")), a);
        assert_ne!(a, b);
        assert!(library.ability(AbilityId(0)).is_none());
    }

    #[test]
    fn test_default_content_loads() {
        let library = default_content().unwrap();
        assert!(library.gears().count() > 0);
        assert!(library.selections().len() > 0);
        assert!(library.warnings().is_empty(), "{:?}", library.warnings());
    }

    #[test]
    fn test_require_gear() {
        let library = ContentLibrary::default();
        assert!(matches!(
            library.require_gear("nope"),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
