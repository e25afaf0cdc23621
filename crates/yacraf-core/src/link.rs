//! Graph Linker: resolves id references into bidirectional associations.
//!
//! Records stay immutable; every association is stored in [`Links`], an index from record id
//! to the ids it is associated with. [`ModelBuilder`] drives the build in a fixed order and
//! rejects out-of-order steps with a [`BuildOrderError`].

use crate::entities::{EntityId, EntityKind};
use crate::error::{BuildOrderError, Result};
use crate::load::Document;
use crate::model::YacrafModel;
use crate::tree::{AttackTree, TreeOptions, build_forest};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttackEventLinks {
    pub defenses: Vec<EntityId>,
    pub loss_events: Vec<EntityId>,
    /// At most one abuse case; only meaningful on tree roots.
    pub abuse_case: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DefenseLinks {
    pub attack_events: Vec<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActorLinks {
    pub loss_events: Vec<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LossEventLinks {
    pub abuse_cases: Vec<EntityId>,
    pub attack_events: Vec<EntityId>,
    pub actor: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AbuseCaseLinks {
    pub attacker: Option<EntityId>,
    pub loss_events: Vec<EntityId>,
    pub attack_events: Vec<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttackerLinks {
    pub abuse_cases: Vec<EntityId>,
}

/// Association lists for every record of a [`Document`], keyed like the document collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Links {
    pub attack_events: IndexMap<EntityId, AttackEventLinks>,
    pub defenses: IndexMap<EntityId, DefenseLinks>,
    pub actors: IndexMap<EntityId, ActorLinks>,
    pub loss_events: IndexMap<EntityId, LossEventLinks>,
    pub abuse_cases: IndexMap<EntityId, AbuseCaseLinks>,
    pub attackers: IndexMap<EntityId, AttackerLinks>,
}

impl Links {
    fn empty_for(doc: &Document) -> Self {
        Self {
            attack_events: doc.attack_events.keys().map(|&id| (id, Default::default())).collect(),
            defenses: doc.defenses.keys().map(|&id| (id, Default::default())).collect(),
            actors: doc.actors.keys().map(|&id| (id, Default::default())).collect(),
            loss_events: doc.loss_events.keys().map(|&id| (id, Default::default())).collect(),
            abuse_cases: doc.abuse_cases.keys().map(|&id| (id, Default::default())).collect(),
            attackers: doc.attackers.keys().map(|&id| (id, Default::default())).collect(),
        }
    }
}

fn push_unique(list: &mut Vec<EntityId>, id: EntityId) {
    if !list.contains(&id) {
        list.push(id);
    }
}

fn dangling(from: EntityKind, from_id: EntityId, to: EntityKind, to_id: EntityId) {
    tracing::warn!(
        from = %from,
        from_id,
        to = %to,
        to_id,
        "dangling reference dropped"
    );
}

/// Where the builder is in the build sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Loaded,
    DefensesLinked,
    ActorsLinked,
    LossEventsLinked,
    AbuseCasesLinked,
    TreesBuilt,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildStage::Loaded => "freshly loaded",
            BuildStage::DefensesLinked => "linked up to defenses",
            BuildStage::ActorsLinked => "linked up to actors",
            BuildStage::LossEventsLinked => "linked up to loss events",
            BuildStage::AbuseCasesLinked => "fully linked",
            BuildStage::TreesBuilt => "finalized (attack trees built)",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStep {
    LinkDefenses,
    LinkActors,
    LinkLossEvents,
    LinkAbuseCases,
    BuildTrees,
    Finish,
}

impl BuildStep {
    /// The only stage this step may run from.
    fn required_stage(self) -> BuildStage {
        match self {
            BuildStep::LinkDefenses => BuildStage::Loaded,
            BuildStep::LinkActors => BuildStage::DefensesLinked,
            BuildStep::LinkLossEvents => BuildStage::ActorsLinked,
            BuildStep::LinkAbuseCases => BuildStage::LossEventsLinked,
            BuildStep::BuildTrees => BuildStage::AbuseCasesLinked,
            BuildStep::Finish => BuildStage::TreesBuilt,
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildStep::LinkDefenses => "link defenses",
            BuildStep::LinkActors => "link actors",
            BuildStep::LinkLossEvents => "link loss events",
            BuildStep::LinkAbuseCases => "link abuse cases",
            BuildStep::BuildTrees => "build attack trees",
            BuildStep::Finish => "finish the model",
        })
    }
}

/// Staged builder turning a loaded [`Document`] into a [`YacrafModel`].
///
/// The steps must run in this order:
///
/// 1. [`ModelBuilder::link_defenses`]
/// 2. [`ModelBuilder::link_actors`]
/// 3. [`ModelBuilder::link_loss_events`]
/// 4. [`ModelBuilder::link_abuse_cases`]
/// 5. [`ModelBuilder::build_trees`]
/// 6. [`ModelBuilder::finish`]
///
/// [`ModelBuilder::link_all`] runs 1-4. A step requested out of order fails with
/// [`crate::Error::BuildOrder`] and leaves the builder unchanged.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    document: Document,
    links: Links,
    trees: Vec<AttackTree>,
    stage: BuildStage,
}

impl ModelBuilder {
    pub fn new(document: Document) -> Self {
        let links = Links::empty_for(&document);
        Self {
            document,
            links,
            trees: Vec::new(),
            stage: BuildStage::Loaded,
        }
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    fn enter(&self, step: BuildStep) -> Result<()> {
        if self.stage == step.required_stage() {
            Ok(())
        } else {
            Err(BuildOrderError {
                step,
                stage: self.stage,
            }
            .into())
        }
    }

    /// Defense `children` -> attack events, both directions.
    pub fn link_defenses(&mut self) -> Result<()> {
        self.enter(BuildStep::LinkDefenses)?;
        for defense in self.document.defenses.values() {
            for &target in defense.children.keys() {
                let Some(event) = self.links.attack_events.get_mut(&target) else {
                    dangling(EntityKind::Defense, defense.id, EntityKind::AttackEvent, target);
                    continue;
                };
                push_unique(&mut event.defenses, defense.id);
                if let Some(links) = self.links.defenses.get_mut(&defense.id) {
                    push_unique(&mut links.attack_events, target);
                }
            }
        }
        self.stage = BuildStage::DefensesLinked;
        Ok(())
    }

    /// Actor `loss_events` -> loss events, setting each loss event's actor.
    pub fn link_actors(&mut self) -> Result<()> {
        self.enter(BuildStep::LinkActors)?;
        let pairs: Vec<(EntityId, EntityId)> = self
            .document
            .actors
            .values()
            .flat_map(|actor| actor.loss_events.keys().map(move |&le| (actor.id, le)))
            .collect();
        for (actor, target) in pairs {
            if !self.links.loss_events.contains_key(&target) {
                dangling(EntityKind::Actor, actor, EntityKind::LossEvent, target);
                continue;
            }
            self.attach_actor(actor, target);
        }
        self.stage = BuildStage::ActorsLinked;
        Ok(())
    }

    fn attach_actor(&mut self, actor: EntityId, loss_event: EntityId) {
        if let Some(le) = self.links.loss_events.get_mut(&loss_event) {
            if let Some(previous) = le.actor.replace(actor) {
                if previous != actor {
                    tracing::debug!(
                        loss_event,
                        previous,
                        actor,
                        "loss event actor overwritten; last writer wins"
                    );
                    if let Some(prev) = self.links.actors.get_mut(&previous) {
                        prev.loss_events.retain(|&id| id != loss_event);
                    }
                }
            }
        }
        if let Some(links) = self.links.actors.get_mut(&actor) {
            push_unique(&mut links.loss_events, loss_event);
        }
    }

    /// Loss event `abuse_cases`, `attack_events` and declared `actor`.
    pub fn link_loss_events(&mut self) -> Result<()> {
        self.enter(BuildStep::LinkLossEvents)?;
        for le in self.document.loss_events.values() {
            for &target in le.abuse_cases.keys() {
                let Some(ac) = self.links.abuse_cases.get_mut(&target) else {
                    dangling(EntityKind::LossEvent, le.id, EntityKind::AbuseCase, target);
                    continue;
                };
                push_unique(&mut ac.loss_events, le.id);
                if let Some(links) = self.links.loss_events.get_mut(&le.id) {
                    push_unique(&mut links.abuse_cases, target);
                }
            }
            for &target in le.attack_events.keys() {
                let Some(ae) = self.links.attack_events.get_mut(&target) else {
                    dangling(EntityKind::LossEvent, le.id, EntityKind::AttackEvent, target);
                    continue;
                };
                push_unique(&mut ae.loss_events, le.id);
                if let Some(links) = self.links.loss_events.get_mut(&le.id) {
                    push_unique(&mut links.attack_events, target);
                }
            }
        }
        let declared: Vec<(EntityId, EntityId)> = self
            .document
            .loss_events
            .values()
            .filter_map(|le| le.actor.map(|actor| (le.id, actor)))
            .collect();
        for (loss_event, actor) in declared {
            if !self.links.actors.contains_key(&actor) {
                dangling(EntityKind::LossEvent, loss_event, EntityKind::Actor, actor);
                continue;
            }
            self.attach_actor(actor, loss_event);
        }
        self.stage = BuildStage::LossEventsLinked;
        Ok(())
    }

    /// Abuse case `attacker` and `attack_events`.
    pub fn link_abuse_cases(&mut self) -> Result<()> {
        self.enter(BuildStep::LinkAbuseCases)?;
        for ac in self.document.abuse_cases.values() {
            if let Some(attacker) = ac.attacker {
                match self.links.attackers.get_mut(&attacker) {
                    Some(links) => {
                        push_unique(&mut links.abuse_cases, ac.id);
                        if let Some(own) = self.links.abuse_cases.get_mut(&ac.id) {
                            own.attacker = Some(attacker);
                        }
                    }
                    None => dangling(EntityKind::AbuseCase, ac.id, EntityKind::Attacker, attacker),
                }
            }
            for &target in ac.attack_events.keys() {
                let Some(ae) = self.links.attack_events.get_mut(&target) else {
                    dangling(EntityKind::AbuseCase, ac.id, EntityKind::AttackEvent, target);
                    continue;
                };
                if let Some(previous) = ae.abuse_case.replace(ac.id) {
                    if previous != ac.id {
                        tracing::debug!(
                            attack_event = target,
                            previous,
                            abuse_case = ac.id,
                            "attack event abuse case overwritten; last writer wins"
                        );
                        if let Some(prev) = self.links.abuse_cases.get_mut(&previous) {
                            prev.attack_events.retain(|&id| id != target);
                        }
                    }
                }
                if let Some(links) = self.links.abuse_cases.get_mut(&ac.id) {
                    push_unique(&mut links.attack_events, target);
                }
            }
        }
        self.stage = BuildStage::AbuseCasesLinked;
        Ok(())
    }

    /// Runs every linking step in the required order.
    pub fn link_all(&mut self) -> Result<()> {
        self.link_defenses()?;
        self.link_actors()?;
        self.link_loss_events()?;
        self.link_abuse_cases()
    }

    /// Builds one attack tree per root. Requires a fully linked model; afterwards nothing can be
    /// linked any more.
    pub fn build_trees(&mut self, options: &TreeOptions) -> Result<()> {
        self.enter(BuildStep::BuildTrees)?;
        self.trees = build_forest(&self.document.attack_events, options);
        self.stage = BuildStage::TreesBuilt;
        tracing::info!(trees = self.trees.len(), "attack trees finalized");
        Ok(())
    }

    pub fn finish(self) -> Result<YacrafModel> {
        self.enter(BuildStep::Finish)?;
        Ok(YacrafModel::new(self.document, self.links, self.trees))
    }
}

/// Links every association of `document` in the required order.
pub fn link(document: Document) -> Result<ModelBuilder> {
    let mut builder = ModelBuilder::new(document);
    builder.link_all()?;
    Ok(builder)
}
