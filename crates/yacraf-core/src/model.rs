use crate::entities::{
    AbuseCase, Actor, AttackEvent, Attacker, AttributeBag, Defense, EntityId, EntityKind,
    EntityRef, LossEvent,
};
use crate::link::{
    AbuseCaseLinks, ActorLinks, AttackEventLinks, AttackerLinks, DefenseLinks, Links,
    LossEventLinks,
};
use crate::load::Document;
use crate::tree::AttackTree;
use serde::Serialize;
use std::fmt::Write as _;

/// A fully linked YACRAF model: records, associations and attack trees.
///
/// Immutable once built; rendering only reads from it.
#[derive(Debug, Clone, Serialize)]
pub struct YacrafModel {
    document: Document,
    links: Links,
    trees: Vec<AttackTree>,
}

impl YacrafModel {
    pub(crate) fn new(document: Document, links: Links, trees: Vec<AttackTree>) -> Self {
        Self {
            document,
            links,
            trees,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn attack_trees(&self) -> &[AttackTree] {
        &self.trees
    }

    /// Root attack events, one per tree.
    pub fn tree_roots(&self) -> impl Iterator<Item = &AttackEvent> + '_ {
        self.trees
            .iter()
            .filter_map(|t| self.document.attack_events.get(&t.root_event()))
    }

    pub fn is_tree_root(&self, id: EntityId) -> bool {
        self.trees.iter().any(|t| t.root_event() == id)
    }

    pub fn attack_event(&self, id: EntityId) -> Option<&AttackEvent> {
        self.document.attack_events.get(&id)
    }

    pub fn defense(&self, id: EntityId) -> Option<&Defense> {
        self.document.defenses.get(&id)
    }

    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.document.actors.get(&id)
    }

    pub fn loss_event(&self, id: EntityId) -> Option<&LossEvent> {
        self.document.loss_events.get(&id)
    }

    pub fn abuse_case(&self, id: EntityId) -> Option<&AbuseCase> {
        self.document.abuse_cases.get(&id)
    }

    pub fn attacker(&self, id: EntityId) -> Option<&Attacker> {
        self.document.attackers.get(&id)
    }

    pub fn attack_event_links(&self, id: EntityId) -> Option<&AttackEventLinks> {
        self.links.attack_events.get(&id)
    }

    pub fn defense_links(&self, id: EntityId) -> Option<&DefenseLinks> {
        self.links.defenses.get(&id)
    }

    pub fn actor_links(&self, id: EntityId) -> Option<&ActorLinks> {
        self.links.actors.get(&id)
    }

    pub fn loss_event_links(&self, id: EntityId) -> Option<&LossEventLinks> {
        self.links.loss_events.get(&id)
    }

    pub fn abuse_case_links(&self, id: EntityId) -> Option<&AbuseCaseLinks> {
        self.links.abuse_cases.get(&id)
    }

    pub fn attacker_links(&self, id: EntityId) -> Option<&AttackerLinks> {
        self.links.attackers.get(&id)
    }

    /// Name of any record, looked up by kind-qualified id.
    pub fn name_of(&self, entity: EntityRef) -> Option<&str> {
        let doc = &self.document;
        match entity.kind {
            EntityKind::AttackEvent => doc.attack_events.get(&entity.id).map(|e| e.name.as_str()),
            EntityKind::Defense => doc.defenses.get(&entity.id).map(|e| e.name.as_str()),
            EntityKind::Actor => doc.actors.get(&entity.id).map(|e| e.name.as_str()),
            EntityKind::LossEvent => doc.loss_events.get(&entity.id).map(|e| e.name.as_str()),
            EntityKind::AbuseCase => doc.abuse_cases.get(&entity.id).map(|e| e.name.as_str()),
            EntityKind::Attacker => doc.attackers.get(&entity.id).map(|e| e.name.as_str()),
        }
    }

    pub fn attributes_of(&self, entity: EntityRef) -> Option<&AttributeBag> {
        let doc = &self.document;
        match entity.kind {
            EntityKind::AttackEvent => doc.attack_events.get(&entity.id).map(|e| &e.attributes),
            EntityKind::Defense => doc.defenses.get(&entity.id).map(|e| &e.attributes),
            EntityKind::Actor => doc.actors.get(&entity.id).map(|e| &e.attributes),
            EntityKind::LossEvent => doc.loss_events.get(&entity.id).map(|e| &e.attributes),
            EntityKind::AbuseCase => doc.abuse_cases.get(&entity.id).map(|e| &e.attributes),
            EntityKind::Attacker => doc.attackers.get(&entity.id).map(|e| &e.attributes),
        }
    }

    /// Loss events of `actor`, in link order.
    pub fn actor_loss_events(&self, actor: EntityId) -> impl Iterator<Item = &LossEvent> + '_ {
        self.links
            .actors
            .get(&actor)
            .into_iter()
            .flat_map(|l| l.loss_events.iter())
            .filter_map(|id| self.document.loss_events.get(id))
    }

    /// Abuse cases reachable from `actor`, breadth-first over its loss events.
    ///
    /// An abuse case shared by two loss events of the actor is yielded once per loss event.
    pub fn actor_abuse_cases(&self, actor: EntityId) -> impl Iterator<Item = &AbuseCase> + '_ {
        self.links
            .actors
            .get(&actor)
            .into_iter()
            .flat_map(|l| l.loss_events.iter())
            .filter_map(|le| self.links.loss_events.get(le))
            .flat_map(|l| l.abuse_cases.iter())
            .filter_map(|id| self.document.abuse_cases.get(id))
    }

    /// Abuse cases that list `attack_event` among their attack events, in document order.
    pub fn abuse_cases_targeting(
        &self,
        attack_event: EntityId,
    ) -> impl Iterator<Item = &AbuseCase> + '_ {
        self.links
            .abuse_cases
            .iter()
            .filter(move |(_, l)| l.attack_events.contains(&attack_event))
            .filter_map(|(id, _)| self.document.abuse_cases.get(id))
    }

    /// Indented `id name` outline of an attack tree.
    pub fn outline(&self, tree: &AttackTree) -> String {
        let mut out = String::new();
        for (_, node) in tree.depth_first() {
            let (name, gate) = self
                .document
                .attack_events
                .get(&node.event)
                .map(|e| (e.name.as_str(), e.gate.as_str()))
                .unwrap_or(("?", "?"));
            let _ = writeln!(
                out,
                "{:indent$}{:>3} [{gate}] {name}",
                "",
                node.event,
                indent = node.depth * 2
            );
        }
        out
    }
}
