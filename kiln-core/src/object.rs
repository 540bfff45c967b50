// Copyright (c) 2019-present Dmitry Stepanov and Fyrox Engine contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Engine object model as seen by the editor: identity lookup, actor hierarchy, scripts and
//! prefab links.

use crate::reflect::ObjectRef;
use fxhash::FxHashMap;
use std::rc::Rc;
use uuid::Uuid;

/// Read-only view of the engine's scene graph.
pub trait ObjectModel {
    fn find(&self, id: Uuid) -> Option<ObjectRef>;

    /// Parent actor of an actor, or the owning actor of a script.
    fn parent(&self, object: &ObjectRef) -> Option<ObjectRef>;

    fn children(&self, actor: &ObjectRef) -> Vec<ObjectRef>;

    fn scripts(&self, actor: &ObjectRef) -> Vec<ObjectRef>;

    fn is_actor(&self, object: &ObjectRef) -> bool;

    fn is_script(&self, object: &ObjectRef) -> bool;

    fn is_scene(&self, actor: &ObjectRef) -> bool;

    fn is_prefab_root(&self, actor: &ObjectRef) -> bool;

    /// Id of the object inside the prefab this object was instantiated from.
    fn prefab_object_id(&self, object: &ObjectRef) -> Option<Uuid>;

    /// The object of the prefab template this object was instantiated from.
    fn prefab_reference(&self, object: &ObjectRef) -> Option<ObjectRef>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Scene,
    Actor,
    Script,
    Other,
}

/// Prefab link of an instantiated object.
#[derive(Clone, Debug)]
pub struct PrefabLink {
    pub prefab_object_id: Uuid,
    pub is_root: bool,
    pub reference: Option<ObjectRef>,
}

struct Entry {
    object: ObjectRef,
    kind: EntryKind,
    parent: Option<Uuid>,
    children: Vec<Uuid>,
    scripts: Vec<Uuid>,
    prefab: Option<PrefabLink>,
}

/// In-memory object model keyed by object id.
#[derive(Default)]
pub struct World {
    entries: FxHashMap<Uuid, Entry>,
}

fn id_of(object: &ObjectRef) -> Option<Uuid> {
    object.try_borrow().ok().map(|o| o.id())
}

impl World {
    fn add(&mut self, object: ObjectRef, kind: EntryKind, parent: Option<Uuid>) -> Uuid {
        let id = id_of(&object).unwrap_or_default();
        self.entries.insert(
            id,
            Entry {
                object,
                kind,
                parent,
                children: Default::default(),
                scripts: Default::default(),
                prefab: None,
            },
        );
        id
    }

    pub fn add_scene(&mut self, scene: ObjectRef) -> Uuid {
        self.add(scene, EntryKind::Scene, None)
    }

    /// Adds an actor, linking it to the parent actor if the parent exists.
    pub fn add_actor(&mut self, actor: ObjectRef, parent: Option<Uuid>) -> Uuid {
        let parent = parent.filter(|p| self.entries.contains_key(p));
        let id = self.add(actor, EntryKind::Actor, parent);
        if let Some(parent) = parent.and_then(|p| self.entries.get_mut(&p)) {
            parent.children.push(id);
        }
        id
    }

    /// Attaches a script to an actor. Returns `None` if there is no such actor.
    pub fn add_script(&mut self, script: ObjectRef, actor: Uuid) -> Option<Uuid> {
        if !self.entries.contains_key(&actor) {
            return None;
        }
        let id = self.add(script, EntryKind::Script, Some(actor));
        self.entries.get_mut(&actor)?.scripts.push(id);
        Some(id)
    }

    /// Adds an object that is not part of the hierarchy (an asset, for example).
    pub fn add_object(&mut self, object: ObjectRef) -> Uuid {
        self.add(object, EntryKind::Other, None)
    }

    pub fn link_prefab(&mut self, id: Uuid, link: PrefabLink) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.prefab = Some(link);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<ObjectRef> {
        let entry = self.entries.remove(&id)?;
        if let Some(parent) = entry.parent.and_then(|p| self.entries.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
            parent.scripts.retain(|s| *s != id);
        }
        Some(entry.object)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, object: &ObjectRef) -> Option<&Entry> {
        id_of(object).and_then(|id| self.entries.get(&id))
    }

    fn objects(&self, ids: &[Uuid]) -> Vec<ObjectRef> {
        ids.iter()
            .filter_map(|id| self.entries.get(id))
            .map(|e| e.object.clone())
            .collect()
    }
}

impl ObjectModel for World {
    fn find(&self, id: Uuid) -> Option<ObjectRef> {
        self.entries.get(&id).map(|e| e.object.clone())
    }

    fn parent(&self, object: &ObjectRef) -> Option<ObjectRef> {
        self.entry(object)?
            .parent
            .and_then(|p| self.entries.get(&p))
            .map(|e| e.object.clone())
    }

    fn children(&self, actor: &ObjectRef) -> Vec<ObjectRef> {
        self.entry(actor)
            .map(|e| self.objects(&e.children))
            .unwrap_or_default()
    }

    fn scripts(&self, actor: &ObjectRef) -> Vec<ObjectRef> {
        self.entry(actor)
            .map(|e| self.objects(&e.scripts))
            .unwrap_or_default()
    }

    fn is_actor(&self, object: &ObjectRef) -> bool {
        self.entry(object)
            .is_some_and(|e| matches!(e.kind, EntryKind::Actor | EntryKind::Scene))
    }

    fn is_script(&self, object: &ObjectRef) -> bool {
        self.entry(object)
            .is_some_and(|e| e.kind == EntryKind::Script)
    }

    fn is_scene(&self, actor: &ObjectRef) -> bool {
        self.entry(actor).is_some_and(|e| e.kind == EntryKind::Scene)
    }

    fn is_prefab_root(&self, actor: &ObjectRef) -> bool {
        self.entry(actor)
            .and_then(|e| e.prefab.as_ref())
            .is_some_and(|p| p.is_root)
    }

    fn prefab_object_id(&self, object: &ObjectRef) -> Option<Uuid> {
        self.entry(object)
            .and_then(|e| e.prefab.as_ref())
            .map(|p| p.prefab_object_id)
    }

    fn prefab_reference(&self, object: &ObjectRef) -> Option<ObjectRef> {
        self.entry(object)
            .and_then(|e| e.prefab.as_ref())
            .and_then(|p| p.reference.clone())
    }
}

/// Finds an object in the subtree of the actor (the actor itself, then its scripts, then its
/// children recursively) that was instantiated from the given prefab object.
pub fn find_prefab_instance(
    model: &dyn ObjectModel,
    actor: &ObjectRef,
    prefab_object_id: Uuid,
) -> Option<ObjectRef> {
    if model.prefab_object_id(actor) == Some(prefab_object_id) {
        return Some(actor.clone());
    }
    if let Some(script) = model
        .scripts(actor)
        .into_iter()
        .find(|s| model.prefab_object_id(s) == Some(prefab_object_id))
    {
        return Some(script);
    }
    model
        .children(actor)
        .iter()
        .find_map(|child| find_prefab_instance(model, child, prefab_object_id))
}

/// Nearest prefab root among the actor and its ancestors. Stops at the scene.
pub fn find_prefab_root(model: &dyn ObjectModel, actor: &ObjectRef) -> Option<ObjectRef> {
    let mut current = Some(actor.clone());
    while let Some(actor) = current {
        if model.is_scene(&actor) {
            return None;
        }
        if model.is_prefab_root(&actor) {
            return Some(actor);
        }
        current = model.parent(&actor);
    }
    None
}

/// Shared object model handle used by editor hosts.
pub type SharedObjectModel = Rc<dyn ObjectModel>;

#[cfg(test)]
mod test {
    use super::{find_prefab_instance, find_prefab_root, ObjectModel, PrefabLink, World};
    use crate::reflect::{builtin, Object};
    use std::rc::Rc;
    use uuid::Uuid;

    #[test]
    fn hierarchy() {
        let mut world = World::default();
        let scene = Object::new(builtin::ACTOR).into_ref();
        let scene_id = world.add_scene(scene.clone());
        let actor = Object::new(builtin::ACTOR).into_ref();
        let actor_id = world.add_actor(actor.clone(), Some(scene_id));
        let script = Object::new(builtin::SCRIPT).into_ref();
        world.add_script(script.clone(), actor_id).unwrap();

        assert!(Rc::ptr_eq(&world.parent(&actor).unwrap(), &scene));
        assert!(Rc::ptr_eq(&world.parent(&script).unwrap(), &actor));
        assert_eq!(world.children(&scene).len(), 1);
        assert_eq!(world.scripts(&actor).len(), 1);
        assert!(world.is_script(&script));
        assert!(world.is_actor(&actor));
        assert!(world.is_scene(&scene));
        assert!(world.add_script(Object::new(builtin::SCRIPT).into_ref(), Uuid::new_v4()).is_none());

        world.remove(actor_id);
        assert!(world.children(&scene).is_empty());
        assert!(world.find(actor_id).is_none());
    }

    #[test]
    fn prefab_lookup() {
        let mut world = World::default();
        let scene_id = world.add_scene(Object::new(builtin::ACTOR).into_ref());
        let root = Object::new(builtin::ACTOR).into_ref();
        let root_id = world.add_actor(root.clone(), Some(scene_id));
        let child = Object::new(builtin::ACTOR).into_ref();
        let child_id = world.add_actor(child.clone(), Some(root_id));
        let script = Object::new(builtin::SCRIPT).into_ref();
        let script_id = world.add_script(script.clone(), child_id).unwrap();

        let (root_prefab, script_prefab) = (Uuid::new_v4(), Uuid::new_v4());
        world.link_prefab(
            root_id,
            PrefabLink {
                prefab_object_id: root_prefab,
                is_root: true,
                reference: None,
            },
        );
        world.link_prefab(
            script_id,
            PrefabLink {
                prefab_object_id: script_prefab,
                is_root: false,
                reference: None,
            },
        );

        let found_root = find_prefab_root(&world, &child).unwrap();
        assert!(Rc::ptr_eq(&found_root, &root));
        let found = find_prefab_instance(&world, &found_root, script_prefab).unwrap();
        assert!(Rc::ptr_eq(&found, &script));
        assert!(find_prefab_instance(&world, &found_root, Uuid::new_v4()).is_none());

        // The scene itself is never searched.
        let loose = Object::new(builtin::ACTOR).into_ref();
        world.add_actor(loose.clone(), Some(scene_id));
        assert!(find_prefab_root(&world, &loose).is_none());
    }
}
